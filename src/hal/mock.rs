//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the relay and timing traits,
//! enabling development and testing on desktop without a relay board.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockDriver`] | [`ButtonDriver`] | Records every assert/release, can inject failures |
//! | [`MockClock`] | [`Clock`] + [`Delay`] | Virtual time; delays advance it instantly |
//!
//! Both mocks are cheap handles over shared state: clone one, hand the clone
//! to a [`RemoteController`](crate::RemoteController), and inspect the
//! original afterwards.
//!
//! # Example
//!
//! ```rust
//! use rs_aluprof::{RemoteConfig, RemoteController};
//! use rs_aluprof::hal::{MockClock, MockDriver};
//! use rs_aluprof::traits::Button;
//!
//! let driver = MockDriver::new();
//! let clock = MockClock::new();
//! let remote = RemoteController::new(RemoteConfig::default(), driver.clone(), clock.clone());
//!
//! remote.press_button(Button::Increase).unwrap();
//!
//! // First press waits out the unknown sleep window, then wakes the remote.
//! assert_eq!(driver.presses(), vec![Button::Increase, Button::Increase]);
//! assert_eq!(remote.channels().get(), 1);
//! ```
//!
//! [`ButtonDriver`]: crate::traits::ButtonDriver
//! [`Clock`]: crate::traits::Clock
//! [`Delay`]: crate::traits::Delay

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use crate::traits::{Button, ButtonDriver, Clock, Delay};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Clock Mock
// ============================================================================

/// Mock clock for testing.
///
/// Provides a controllable time source. Every [`Delay::delay_ms`] call is
/// recorded and advances the clock by the requested amount without
/// sleeping, so a full sleep window runs in microseconds.
///
/// # Example
///
/// ```rust
/// use rs_aluprof::hal::MockClock;
/// use rs_aluprof::traits::{Clock, Delay};
///
/// let clock = MockClock::new();
/// clock.set(1000);
/// clock.delay_ms(500);
///
/// assert_eq!(clock.now_ms(), 1500);
/// assert_eq!(clock.delays(), vec![500]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    current_ms: Arc<AtomicU64>,
    delays: Arc<Mutex<Vec<u64>>>,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current time in milliseconds.
    pub fn set(&self, ms: u64) {
        self.current_ms.store(ms, Ordering::SeqCst);
    }

    /// Advances the clock without recording a delay.
    pub fn advance(&self, ms: u64) {
        self.current_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Every delay requested so far, in order.
    pub fn delays(&self) -> Vec<u64> {
        lock(&self.delays).clone()
    }

    /// Sum of all requested delays.
    pub fn total_delay_ms(&self) -> u64 {
        lock(&self.delays).iter().sum()
    }

    /// Forget recorded delays (time is left as is).
    pub fn clear_delays(&self) {
        lock(&self.delays).clear();
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }
}

impl Delay for MockClock {
    fn delay_ms(&self, ms: u64) {
        lock(&self.delays).push(ms);
        self.advance(ms);
    }
}

// ============================================================================
// Driver Mock
// ============================================================================

/// One output change seen by [`MockDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverEvent {
    /// Button whose output changed.
    pub button: Button,
    /// `true` when asserted, `false` when released.
    pub pressed: bool,
    /// Virtual time of the change, if a clock was attached.
    pub at_ms: u64,
    /// Thread that made the change.
    pub thread: ThreadId,
}

/// Error injected by [`MockDriver::fail_on`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockDriverError(pub Button);

impl fmt::Display for MockDriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "simulated relay fault on {}", self.0)
    }
}

#[derive(Debug, Default)]
struct DriverState {
    events: Vec<DriverEvent>,
    fail_on: Option<Button>,
    fail_next_release: Option<Button>,
}

/// Mock relay driver for testing.
///
/// Records every assert and release. Attach a [`MockClock`] with
/// [`with_clock`](Self::with_clock) to timestamp the events.
///
/// # Example
///
/// ```rust
/// use rs_aluprof::hal::MockDriver;
/// use rs_aluprof::traits::{Button, ButtonDriver};
///
/// let mut driver = MockDriver::new();
/// driver.fail_on(Some(Button::GoDown));
///
/// assert!(driver.set_pressed(Button::GoDown, true).is_err());
/// assert!(driver.set_pressed(Button::Stop, true).is_ok());
/// assert!(driver.is_pressed(Button::Stop));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<DriverState>>,
    clock: Option<MockClock>,
}

impl MockDriver {
    /// Creates a driver with no recorded events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp events with `clock`.
    pub fn with_clock(mut self, clock: MockClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Make every change to `button` fail (or clear the fault with `None`).
    pub fn fail_on(&self, button: Option<Button>) {
        lock(&self.state).fail_on = button;
    }

    /// Make only the next release of `button` fail; asserts still succeed
    /// and later releases work again.
    pub fn fail_next_release(&self, button: Button) {
        lock(&self.state).fail_next_release = Some(button);
    }

    /// All recorded output changes.
    pub fn events(&self) -> Vec<DriverEvent> {
        lock(&self.state).events.clone()
    }

    /// Buttons that were asserted, in order.
    pub fn presses(&self) -> Vec<Button> {
        lock(&self.state)
            .events
            .iter()
            .filter(|e| e.pressed)
            .map(|e| e.button)
            .collect()
    }

    /// Whether the last recorded change to `button` asserted it.
    pub fn is_pressed(&self, button: Button) -> bool {
        lock(&self.state)
            .events
            .iter()
            .rev()
            .find(|e| e.button == button)
            .is_some_and(|e| e.pressed)
    }

    /// Forget recorded events.
    pub fn clear(&self) {
        lock(&self.state).events.clear();
    }
}

impl ButtonDriver for MockDriver {
    type Error = MockDriverError;

    fn set_pressed(&mut self, button: Button, pressed: bool) -> Result<(), MockDriverError> {
        let at_ms = self.clock.as_ref().map_or(0, Clock::now_ms);
        let mut state = lock(&self.state);
        if state.fail_on == Some(button) {
            return Err(MockDriverError(button));
        }
        if !pressed && state.fail_next_release == Some(button) {
            state.fail_next_release = None;
            return Err(MockDriverError(button));
        }
        state.events.push(DriverEvent {
            button,
            pressed,
            at_ms,
            thread: thread::current().id(),
        });
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
