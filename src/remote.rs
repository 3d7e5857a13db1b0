//! The remote controller that ties everything together.
//!
//! This module provides [`RemoteController`], which owns the channel
//! counter, the sleep clock and the relay driver, and turns commands into
//! correctly timed button presses.
//!
//! # Overview
//!
//! The controller:
//! - Wakes the remote first when it is (or may be) asleep
//! - Navigates to a channel along the shorter way round the ring
//! - Presses the terminal button, or waits, for each batch item
//! - Serializes batches, single presses, syncs and resets under one lock
//! - Answers state queries without waiting for a running batch
//!
//! # Example
//!
//! ```rust
//! use rs_aluprof::{RemoteConfig, RemoteController};
//! use rs_aluprof::hal::{MockClock, MockDriver};
//! use rs_aluprof::messages::CommandResult;
//! use serde_json::json;
//!
//! let driver = MockDriver::new();
//! let clock = MockClock::new();
//! let remote = RemoteController::new(RemoteConfig::default(), driver.clone(), clock);
//!
//! let outcome = remote.run_batch(&[
//!     json!({"nr": 2, "action": "UP"}),
//!     json!({"nr": 15, "action": "STOP"}),
//! ]);
//!
//! assert_eq!(outcome.current_state, 15);
//! assert!(outcome.results.iter().all(|r| !r.is_error()));
//! ```
//!
//! # Thread Safety
//!
//! Every method takes `&self`; share the controller with `Arc`. Operations
//! that press buttons hold the driver lock for their whole duration, so a
//! second batch's first press happens after the first batch's last press.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::Value;

use crate::channel::ChannelStore;
use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::messages::{Action, BatchOutcome, Command, CommandResult, GotoDetails};
use crate::planner::{plan, Plan};
use crate::sleep::{SleepClock, SleepZone};
use crate::store::Persist;
use crate::traits::{Button, ButtonDriver, Clock, Delay};

/// Snapshot for status queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemoteStatus {
    /// Channel the remote is believed to be on.
    pub current_value: u8,
    /// Highest channel.
    pub max_value: u8,
    /// Inferred power state.
    #[serde(flatten)]
    pub sleep: SleepZone,
    /// `true`/`false` when certain, `null` otherwise.
    pub is_device_asleep: Option<bool>,
}

/// Relay-driven remote with inferred channel and sleep state.
///
/// # Type Parameters
///
/// - `D`: The relay driver ([`ButtonDriver`] trait)
/// - `C`: Time source and delay ([`Clock`] + [`Delay`])
pub struct RemoteController<D, C> {
    config: RemoteConfig,
    channels: ChannelStore,
    sleep: SleepClock,
    clock: C,
    driver: Mutex<D>,
}

impl<D: ButtonDriver, C: Clock + Delay> RemoteController<D, C> {
    /// Create a controller with an in-memory channel counter starting at 0.
    pub fn new(config: RemoteConfig, driver: D, clock: C) -> Self {
        let channels = ChannelStore::in_memory(config.max_channel);
        Self::from_parts(config, channels, driver, clock)
    }

    /// Create a controller whose channel counter is restored from and saved
    /// to `persist`.
    pub fn with_persistence(
        config: RemoteConfig,
        persist: impl Persist + 'static,
        driver: D,
        clock: C,
    ) -> Self {
        let channels = ChannelStore::open(config.max_channel, persist);
        Self::from_parts(config, channels, driver, clock)
    }

    fn from_parts(config: RemoteConfig, channels: ChannelStore, driver: D, clock: C) -> Self {
        let sleep = SleepClock::new(config.sleep_delay_ms, config.sleep_threshold_ms);
        Self {
            config,
            channels,
            sleep,
            clock,
            driver: Mutex::new(driver),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The channel counter.
    pub fn channels(&self) -> &ChannelStore {
        &self.channels
    }

    /// The sleep/wake inference.
    pub fn sleep(&self) -> &SleepClock {
        &self.sleep
    }

    /// Active configuration.
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// The injected clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Current channel and inferred power state. Never blocks on a batch.
    pub fn state(&self) -> RemoteStatus {
        let snapshot = self.channels.describe();
        let sleep = self.sleep.classify(self.clock.now_ms());
        RemoteStatus {
            current_value: snapshot.value,
            max_value: snapshot.max,
            sleep,
            is_device_asleep: sleep.is_asleep(),
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Run a batch of raw command items in order.
    ///
    /// Each item is validated before anything is pressed for it. Invalid
    /// items and failed presses become error results; the batch carries on
    /// with the next item either way.
    pub fn run_batch(&self, items: &[Value]) -> BatchOutcome {
        let mut driver = self.lock_driver();
        tracing::info!(items = items.len(), "batch started");

        let results: Vec<CommandResult> = items
            .iter()
            .map(|item| self.run_item(&mut driver, item))
            .collect();

        let current_state = self.channels.get();
        tracing::info!(
            items = results.len(),
            errors = results.iter().filter(|r| r.is_error()).count(),
            current_state,
            "batch completed"
        );
        BatchOutcome {
            results,
            current_state,
        }
    }

    /// Press a single button, waking the remote first if needed.
    ///
    /// Channel buttons also step the counter. Returns the channel afterwards.
    pub fn press_button(&self, button: Button) -> Result<u8, RemoteError> {
        let mut driver = self.lock_driver();
        self.wake_if_needed(&mut driver)?;
        self.press(&mut driver, button)?;
        let value = match button.channel_step() {
            Some(direction) => self.channels.step(direction),
            None => self.channels.get(),
        };
        tracing::info!(%button, value, "single press");
        Ok(value)
    }

    /// Overwrite the channel counter with what the remote actually shows.
    ///
    /// Nothing is pressed.
    pub fn sync(&self, value: i64) -> Result<u8, RemoteError> {
        let _driver = self.lock_driver();
        let new_value = self.channels.set(value)?;
        tracing::info!(new_value, "channel synchronized");
        Ok(new_value)
    }

    /// Pulse every output, release them all and forget the sleep state.
    ///
    /// The channel counter is left alone; use [`sync`](Self::sync) to realign
    /// it. The next press always waits out the full sleep window.
    pub fn reset(&self) -> Result<u8, RemoteError> {
        let mut driver = self.lock_driver();
        tracing::info!(pulse_ms = self.config.reset_pulse_ms, "resetting outputs");

        let mut first_err = None;
        for button in Button::ALL {
            if let Err(e) = driver.set_pressed(button, true) {
                tracing::warn!(%button, error = %e, "reset pulse failed");
                first_err.get_or_insert(RemoteError::Driver {
                    button,
                    message: e.to_string(),
                });
            }
        }
        self.clock.delay_ms(self.config.reset_pulse_ms);

        let released = self.release_locked(&mut driver);
        self.clock.delay_ms(self.longest_release_ms());
        self.sleep.forget();

        if let Some(e) = first_err {
            return Err(e);
        }
        released?;
        Ok(self.channels.get())
    }

    /// Drive every output to its released level.
    pub fn release_all(&self) -> Result<(), RemoteError> {
        let mut driver = self.lock_driver();
        self.release_locked(&mut driver)
    }

    // ========================================================================
    // Sequencing
    // ========================================================================

    fn run_item(&self, driver: &mut D, item: &Value) -> CommandResult {
        let cmd = match Command::parse(item, self.channels.max(), self.config.max_wait_ms) {
            Ok(cmd) => cmd,
            Err(e) => {
                tracing::warn!(error = %e, "rejected batch item");
                return CommandResult::rejected(&e);
            }
        };

        match self.execute(driver, &cmd) {
            Ok(result) => result,
            Err(e) => {
                let final_value = self.channels.get();
                tracing::warn!(
                    target_nr = cmd.target,
                    action = cmd.action.as_str(),
                    error = %e,
                    "command failed"
                );
                CommandResult::Error {
                    details: e.to_string(),
                    target_nr: Some(cmd.target),
                    final_value: Some(final_value),
                }
            }
        }
    }

    fn execute(&self, driver: &mut D, cmd: &Command) -> Result<CommandResult, RemoteError> {
        self.wake_if_needed(driver)?;
        let goto_details = self.navigate(driver, cmd.target)?;

        if let Action::Delay { ms } = cmd.action {
            tracing::debug!(ms, "delay command");
            self.clock.delay_ms(ms);
            return Ok(CommandResult::DelayCommand {
                target_nr: cmd.target,
                action: cmd.action.as_str().to_owned(),
                duration: cmd.duration_secs.unwrap_or(ms as f64 / 1000.0),
                goto_details,
                final_value: self.channels.get(),
            });
        }

        if let Some(button) = cmd.action.button() {
            self.press(driver, button)?;
        }
        Ok(CommandResult::SequencedCommand {
            target_nr: cmd.target,
            action: cmd.action.as_str().to_owned(),
            goto_details,
            final_value: self.channels.get(),
        })
    }

    /// Press the wake button if the remote is asleep. Returns whether it did.
    fn wake_if_needed(&self, driver: &mut D) -> Result<bool, RemoteError> {
        if !self.sleep.resolve(&self.clock) {
            return Ok(false);
        }
        let button = self.config.wake_button;
        tracing::debug!(%button, "waking remote");
        self.press(driver, button)?;
        self.clock.delay_ms(self.config.wake_delay_ms);
        Ok(true)
    }

    fn navigate(&self, driver: &mut D, target: u8) -> Result<GotoDetails, RemoteError> {
        let initial_value = self.channels.get();
        let (direction, steps) = match plan(initial_value, target, self.channels.max())? {
            Plan::AtTarget => {
                return Ok(GotoDetails::AlreadyAtTarget {
                    final_value: initial_value,
                    steps_taken: 0,
                })
            }
            Plan::Move { direction, steps } => (direction, steps),
        };

        for step in 1..=steps {
            self.press(driver, direction.button())?;
            let value = self.channels.step(direction);
            tracing::debug!(step, steps, value, "channel step");
        }

        let final_value = self.channels.get();
        tracing::info!(
            initial_value,
            final_value,
            target_nr = target,
            steps,
            direction = direction.as_str(),
            "navigation complete"
        );
        Ok(GotoDetails::MovedToTarget {
            initial_value,
            final_value,
            steps_taken: steps,
            direction,
        })
    }

    /// One timed press: assert, hold, release, then wait before the next one.
    fn press(&self, driver: &mut D, button: Button) -> Result<(), RemoteError> {
        let timing = *self.config.buttons.get(button);
        let fail = |e: D::Error| RemoteError::Driver {
            button,
            message: e.to_string(),
        };

        tracing::debug!(%button, hold_ms = timing.hold_ms, "press");
        if let Err(e) = driver.set_pressed(button, true) {
            // Never leave a half-driven output behind.
            let _ = driver.set_pressed(button, false);
            tracing::warn!(%button, error = %e, "press failed");
            return Err(fail(e));
        }
        self.clock.delay_ms(timing.hold_ms);
        if let Err(e) = driver.set_pressed(button, false) {
            tracing::warn!(%button, error = %e, "release failed, releasing every output");
            if let Err(cleanup) = driver.release_all() {
                tracing::warn!(error = %cleanup, "releasing outputs failed");
            }
            return Err(fail(e));
        }

        self.sleep.touch(self.clock.now_ms());
        self.clock.delay_ms(timing.release_ms);
        Ok(())
    }

    fn release_locked(&self, driver: &mut D) -> Result<(), RemoteError> {
        driver.release_all().map_err(|e| {
            tracing::warn!(error = %e, "releasing outputs failed");
            RemoteError::Release(e.to_string())
        })
    }

    fn longest_release_ms(&self) -> u64 {
        Button::ALL
            .into_iter()
            .map(|b| self.config.buttons.get(b).release_ms)
            .max()
            .unwrap_or(0)
    }

    fn lock_driver(&self) -> MutexGuard<'_, D> {
        // A panic mid-batch leaves the driver usable; outputs are re-driven
        // on every press.
        self.driver.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<D, C> core::fmt::Debug for RemoteController<D, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RemoteController")
            .field("channels", &self.channels)
            .field("sleep", &self.sleep)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockClock, MockDriver};
    use serde_json::json;

    fn remote() -> (RemoteController<MockDriver, MockClock>, MockDriver, MockClock) {
        let clock = MockClock::new();
        let driver = MockDriver::new().with_clock(clock.clone());
        let remote = RemoteController::new(RemoteConfig::default(), driver.clone(), clock.clone());
        (remote, driver, clock)
    }

    /// Put the remote in the awake zone so no wake press is needed.
    fn awake(remote: &RemoteController<MockDriver, MockClock>, driver: &MockDriver) {
        remote.sleep().touch(remote.clock().now_ms());
        driver.clear();
        remote.clock().clear_delays();
    }

    // ========================================================================
    // Press timing
    // ========================================================================

    #[test]
    fn press_holds_for_configured_time() {
        let (remote, driver, clock) = remote();
        awake(&remote, &driver);

        remote.press_button(Button::Stop).unwrap();

        let events = driver.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].at_ms - events[0].at_ms, 300);
        assert_eq!(clock.delays(), vec![300, 100]);
    }

    #[test]
    fn channel_press_steps_counter() {
        let (remote, driver, _) = remote();
        awake(&remote, &driver);

        assert_eq!(remote.press_button(Button::Decrease).unwrap(), 15);
        assert_eq!(remote.press_button(Button::MoveUp).unwrap(), 15);
        assert_eq!(remote.press_button(Button::Increase).unwrap(), 0);
    }

    #[test]
    fn press_refreshes_sleep_clock() {
        let (remote, driver, clock) = remote();
        awake(&remote, &driver);
        clock.advance(5_000);

        remote.press_button(Button::Stop).unwrap();
        assert_eq!(remote.sleep().last_action_ms(), Some(clock.now_ms() - 100));
    }

    // ========================================================================
    // Wake handling
    // ========================================================================

    #[test]
    fn first_press_waits_and_wakes() {
        let (remote, driver, clock) = remote();

        remote.press_button(Button::Stop).unwrap();

        assert_eq!(driver.presses(), vec![Button::Increase, Button::Stop]);
        assert_eq!(clock.delays()[0], 9_000);
        assert_eq!(remote.channels().get(), 0, "wake press does not step");
    }

    #[test]
    fn awake_remote_is_not_woken() {
        let (remote, driver, clock) = remote();
        awake(&remote, &driver);
        clock.advance(3_500);

        remote.press_button(Button::GoDown).unwrap();
        assert_eq!(driver.presses(), vec![Button::GoDown]);
    }

    #[test]
    fn asleep_remote_is_woken_without_waiting() {
        let (remote, driver, clock) = remote();
        awake(&remote, &driver);
        clock.advance(15_000);

        remote.press_button(Button::Stop).unwrap();
        assert_eq!(driver.presses(), vec![Button::Increase, Button::Stop]);
        // wake hold, wake release, wake settle, stop hold, stop release
        assert_eq!(clock.delays(), vec![100, 100, 500, 300, 100]);
    }

    // ========================================================================
    // Batches
    // ========================================================================

    #[test]
    fn batch_navigates_and_presses() {
        let (remote, driver, _) = remote();
        awake(&remote, &driver);

        let outcome = remote.run_batch(&[json!({"nr": 3, "action": "UP"})]);

        assert_eq!(outcome.current_state, 3);
        assert_eq!(
            driver.presses(),
            vec![Button::Increase, Button::Increase, Button::Increase, Button::MoveUp]
        );
        match &outcome.results[0] {
            CommandResult::SequencedCommand {
                goto_details,
                final_value,
                ..
            } => {
                assert_eq!(*final_value, 3);
                assert_eq!(goto_details.steps_taken(), 3);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn delay_item_waits_without_pressing() {
        let (remote, driver, clock) = remote();
        awake(&remote, &driver);

        let outcome = remote.run_batch(&[json!({"nr": 0, "action": "DELAY", "duration": 2.5})]);

        assert!(driver.presses().is_empty());
        assert_eq!(clock.delays(), vec![2_500]);
        assert!(matches!(
            outcome.results[0],
            CommandResult::DelayCommand { duration, .. } if duration == 2.5
        ));
    }

    #[test]
    fn invalid_item_presses_nothing() {
        let (remote, driver, _) = remote();

        let outcome = remote.run_batch(&[json!({"nr": 99, "action": "UP"})]);

        assert!(outcome.results[0].is_error());
        assert!(driver.events().is_empty());
    }

    #[test]
    fn failed_step_keeps_counter_consistent() {
        let (remote, driver, _) = remote();
        awake(&remote, &driver);
        driver.fail_on(Some(Button::Decrease));

        let outcome = remote.run_batch(&[
            json!({"nr": 14, "action": "STOP"}),
            json!({"nr": 2, "action": "STOP"}),
        ]);

        match &outcome.results[0] {
            CommandResult::Error {
                target_nr,
                final_value,
                details,
            } => {
                assert_eq!(*target_nr, Some(14));
                assert_eq!(*final_value, Some(0));
                assert!(details.contains("DECREASE"));
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(!outcome.results[1].is_error());
        assert_eq!(outcome.current_state, 2);
    }

    #[test]
    fn failed_release_does_not_leave_relay_closed() {
        let (remote, driver, _) = remote();
        awake(&remote, &driver);
        driver.fail_next_release(Button::MoveUp);

        let outcome = remote.run_batch(&[
            json!({"nr": 1, "action": "UP"}),
            json!({"nr": 1, "action": "STOP"}),
        ]);

        assert!(outcome.results[0].is_error());
        assert!(!outcome.results[1].is_error());
        for button in Button::ALL {
            assert!(!driver.is_pressed(button), "{button} left pressed");
        }

        // Nothing else is asserted while MOVE_UP is still closed.
        let events = driver.events();
        let up = events
            .iter()
            .position(|e| e.button == Button::MoveUp && e.pressed)
            .unwrap();
        let released = events
            .iter()
            .skip(up)
            .position(|e| e.button == Button::MoveUp && !e.pressed)
            .unwrap()
            + up;
        assert!(events[up..released].iter().all(|e| !e.pressed || e.button == Button::MoveUp));
    }

    #[test]
    fn failed_release_skips_sleep_refresh() {
        let (remote, driver, clock) = remote();
        awake(&remote, &driver);
        let before = remote.sleep().last_action_ms();
        clock.advance(1_000);
        driver.fail_next_release(Button::Stop);

        assert!(remote.press_button(Button::Stop).is_err());
        assert_eq!(remote.sleep().last_action_ms(), before);
        assert!(!driver.is_pressed(Button::Stop));
    }

    // ========================================================================
    // Sync and reset
    // ========================================================================

    #[test]
    fn sync_sets_counter_without_pressing() {
        let (remote, driver, _) = remote();
        assert_eq!(remote.sync(9), Ok(9));
        assert_eq!(
            remote.sync(16),
            Err(RemoteError::ChannelOutOfRange { value: 16, max: 15 })
        );
        assert_eq!(remote.channels().get(), 9);
        assert!(driver.events().is_empty());
    }

    #[test]
    fn reset_pulses_everything_and_forgets_sleep() {
        let (remote, driver, _) = remote();
        awake(&remote, &driver);
        remote.sync(6).unwrap();

        assert_eq!(remote.reset(), Ok(6));

        assert_eq!(driver.presses().len(), Button::ALL.len());
        for button in Button::ALL {
            assert!(!driver.is_pressed(button));
        }
        assert_eq!(remote.sleep().last_action_ms(), None);
        assert_eq!(remote.channels().get(), 6);
    }

    #[test]
    fn reset_reports_driver_failure() {
        let (remote, driver, _) = remote();
        driver.fail_on(Some(Button::Stop));

        assert!(matches!(
            remote.reset(),
            Err(RemoteError::Driver {
                button: Button::Stop,
                ..
            })
        ));
        assert_eq!(remote.sleep().last_action_ms(), None);
    }

    // ========================================================================
    // State
    // ========================================================================

    #[test]
    fn state_reports_sleep_zone() {
        let (remote, _, clock) = remote();
        assert_eq!(remote.state().sleep, SleepZone::Unknown);
        assert_eq!(remote.state().is_device_asleep, None);

        remote.sleep().touch(0);
        clock.set(1_000);
        assert_eq!(remote.state().is_device_asleep, Some(false));

        clock.set(20_000);
        let json = serde_json::to_value(remote.state()).unwrap();
        assert_eq!(json["sleep_zone"], "asleep");
        assert_eq!(json["is_device_asleep"], true);
        assert_eq!(json["current_value"], 0);
        assert_eq!(json["max_value"], 15);
    }
}
