//! Hardware abstraction traits for relay outputs and timing.
//!
//! This module defines the interfaces that let the remote controller run
//! against real relay pins, a simulation driver, or test doubles.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`ButtonDriver`] | Asserts/releases the relay behind a logical button |
//! | [`Clock`] | Monotonic millisecond time source |
//! | [`Delay`] | Blocking delay used for press timing and sleep waits |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For real pins, wrap any `embedded-hal`
//! output pins in a [`RelayBank`](crate::hal::RelayBank).
//!
//! # Example
//!
//! ```rust
//! use rs_aluprof::traits::{Button, ButtonDriver};
//! use rs_aluprof::hal::MockDriver;
//!
//! let mut driver = MockDriver::new();
//! driver.set_pressed(Button::Stop, true).unwrap();
//! driver.set_pressed(Button::Stop, false).unwrap();
//!
//! assert_eq!(driver.presses(), vec![Button::Stop]);
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

/// Logical buttons of the remote.
///
/// Only [`Increase`](Self::Increase) and [`Decrease`](Self::Decrease) move the
/// selected channel. The other three act on the currently selected channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Button {
    /// Selects the previous channel.
    Decrease,
    /// Selects the next channel.
    Increase,
    /// Moves the selected channel toward its upper boundary.
    MoveUp,
    /// Stops movement on the selected channel.
    Stop,
    /// Moves the selected channel toward its lower boundary.
    GoDown,
}

impl Button {
    /// Every button, in pin-table order.
    pub const ALL: [Button; 5] = [
        Button::Decrease,
        Button::MoveUp,
        Button::Stop,
        Button::Increase,
        Button::GoDown,
    ];

    /// Returns the button name as used in config files and JSON.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_aluprof::traits::Button;
    ///
    /// assert_eq!(Button::MoveUp.as_str(), "MOVE_UP");
    /// assert_eq!(Button::Increase.as_str(), "INCREASE");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Button::Decrease => "DECREASE",
            Button::Increase => "INCREASE",
            Button::MoveUp => "MOVE_UP",
            Button::Stop => "STOP",
            Button::GoDown => "GO_DOWN",
        }
    }

    /// Parse a button id from a URL segment or text input.
    ///
    /// Accepts the canonical names, the short action names and the physical
    /// position names of the handheld remote. Input is trimmed and
    /// case-insensitive; `-` is treated as `_`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_aluprof::traits::Button;
    ///
    /// assert_eq!(Button::from_id("increase"), Some(Button::Increase));
    /// assert_eq!(Button::from_id("right"), Some(Button::Increase));
    /// assert_eq!(Button::from_id("LEFT"), Some(Button::Decrease));
    /// assert_eq!(Button::from_id("up"), Some(Button::MoveUp));
    /// assert_eq!(Button::from_id("go-down"), Some(Button::GoDown));
    /// assert_eq!(Button::from_id("middle"), Some(Button::Stop));
    /// assert_eq!(Button::from_id("p2"), None);
    /// ```
    pub fn from_id(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "increase" | "right" => Some(Button::Increase),
            "decrease" | "left" => Some(Button::Decrease),
            "up" | "move_up" => Some(Button::MoveUp),
            "down" | "go_down" => Some(Button::GoDown),
            "stop" | "middle" => Some(Button::Stop),
            _ => None,
        }
    }

    /// Returns the channel step this button performs, if any.
    #[inline]
    pub const fn channel_step(&self) -> Option<StepDirection> {
        match self {
            Button::Increase => Some(StepDirection::Increase),
            Button::Decrease => Some(StepDirection::Decrease),
            Button::MoveUp | Button::Stop | Button::GoDown => None,
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a single channel step on the ring of channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepDirection {
    /// `value + 1`, wrapping from the last channel to 0.
    Increase,
    /// `value - 1`, wrapping from 0 to the last channel.
    Decrease,
}

impl StepDirection {
    /// The button that performs this step.
    #[inline]
    pub const fn button(&self) -> Button {
        match self {
            StepDirection::Increase => Button::Increase,
            StepDirection::Decrease => Button::Decrease,
        }
    }

    /// Returns the direction as an upper-case string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            StepDirection::Increase => "INCREASE",
            StepDirection::Decrease => "DECREASE",
        }
    }
}

/// Relay driver trait - asserts or releases the output behind a button.
///
/// Implementations only change output levels; press timing (how long the
/// relay is held, how long to wait after release) is applied by the
/// [`RemoteController`](crate::RemoteController) from the button table.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use rs_aluprof::traits::{Button, ButtonDriver};
///
/// struct MyRelays { /* hardware handles */ }
///
/// impl ButtonDriver for MyRelays {
///     type Error = std::io::Error;
///
///     fn set_pressed(&mut self, button: Button, pressed: bool) -> Result<(), Self::Error> {
///         // Drive the relay input for `button`...
///         Ok(())
///     }
/// }
/// ```
pub trait ButtonDriver {
    /// Error type for output operations.
    type Error: fmt::Display;

    /// Assert (`true`) or release (`false`) the output for `button`.
    fn set_pressed(&mut self, button: Button, pressed: bool) -> Result<(), Self::Error>;

    /// Drive every output to its released level.
    ///
    /// Attempts every button even if one fails and reports the first error.
    fn release_all(&mut self) -> Result<(), Self::Error> {
        let mut first_err = None;
        for button in Button::ALL {
            if let Err(e) = self.set_pressed(button, false) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Time source trait.
///
/// Provides monotonic time in milliseconds for the sleep/wake inference.
/// On desktop this wraps `std::time::Instant`; tests use
/// [`MockClock`](crate::hal::MockClock).
///
/// # Example
///
/// ```rust
/// use rs_aluprof::traits::Clock;
/// use rs_aluprof::hal::MockClock;
///
/// let clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

/// Blocking delay trait.
///
/// Every wait in the controller (press hold, release delay, wake
/// stabilization, uncertain-zone wait, explicit delay commands) goes through
/// this trait so tests can run them in virtual time.
pub trait Delay {
    /// Block the calling thread for `ms` milliseconds.
    fn delay_ms(&self, ms: u64);
}
