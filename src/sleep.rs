//! Sleep/wake inference for a remote that gives no feedback.
//!
//! The remote powers down after `sleep_delay` of inactivity, and the first
//! press on a sleeping remote only wakes it. The controller cannot observe
//! this, so it infers the state from the time since the last press:
//!
//! ```text
//!  elapsed:  0 ........ delay-threshold ........ delay+threshold ........
//!            |   Awake        |      Uncertain         |     Asleep
//!            |  no wait       | wait until +threshold  |    no wait
//! ```
//!
//! A remote that has never been pressed is treated as uncertain for the full
//! `delay + threshold` window: the controller never assumes the remote is
//! awake without a recent press or a full wait.
//!
//! # Example
//!
//! ```rust
//! use rs_aluprof::sleep::{SleepClock, SleepZone};
//! use rs_aluprof::hal::MockClock;
//!
//! let sleep = SleepClock::new(8_000, 1_000);
//! sleep.touch(0);
//!
//! assert_eq!(sleep.classify(6_900), SleepZone::Awake);
//! assert_eq!(sleep.classify(7_300), SleepZone::Uncertain { remaining_ms: 1_700 });
//! assert_eq!(sleep.classify(9_100), SleepZone::Asleep);
//!
//! // Resolving in the uncertain zone waits it out.
//! let clock = MockClock::new();
//! clock.set(7_300);
//! assert!(sleep.resolve(&clock));
//! assert_eq!(clock.now_ms(), 9_000);
//! # use rs_aluprof::traits::Clock;
//! ```

use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::traits::{Clock, Delay};

/// Inferred power state of the remote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "sleep_zone", rename_all = "snake_case")]
pub enum SleepZone {
    /// Pressed recently; still awake.
    Awake,
    /// Close to the sleep delay; waiting `remaining_ms` settles it.
    Uncertain {
        /// Time until the remote is certainly asleep.
        remaining_ms: u64,
    },
    /// Idle long enough to be certainly asleep.
    Asleep,
    /// Never pressed since start-up.
    Unknown,
}

impl SleepZone {
    /// `Some(asleep)` when the zone is certain, `None` otherwise.
    pub fn is_asleep(&self) -> Option<bool> {
        match self {
            SleepZone::Awake => Some(false),
            SleepZone::Asleep => Some(true),
            SleepZone::Uncertain { .. } | SleepZone::Unknown => None,
        }
    }

    /// Lower-case zone name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepZone::Awake => "awake",
            SleepZone::Uncertain { .. } => "uncertain",
            SleepZone::Asleep => "asleep",
            SleepZone::Unknown => "unknown",
        }
    }
}

/// Tracks the last press and classifies the remote's power state.
#[derive(Debug)]
pub struct SleepClock {
    sleep_delay_ms: u64,
    threshold_ms: u64,
    last_action_ms: Mutex<Option<u64>>,
}

impl SleepClock {
    /// Create a clock that has never seen a press.
    pub fn new(sleep_delay_ms: u64, threshold_ms: u64) -> Self {
        Self {
            sleep_delay_ms,
            threshold_ms,
            last_action_ms: Mutex::new(None),
        }
    }

    /// Record a press at `now_ms`.
    pub fn touch(&self, now_ms: u64) {
        *self.last() = Some(now_ms);
    }

    /// Forget the last press; the next check waits the full window.
    pub fn forget(&self) {
        *self.last() = None;
    }

    /// Time of the last recorded press.
    pub fn last_action_ms(&self) -> Option<u64> {
        *self.last()
    }

    /// Full uncertainty window: `sleep_delay + threshold`.
    #[inline]
    pub fn certain_asleep_after_ms(&self) -> u64 {
        self.sleep_delay_ms.saturating_add(self.threshold_ms)
    }

    /// Classify the remote at `now_ms` without waiting.
    pub fn classify(&self, now_ms: u64) -> SleepZone {
        let Some(last) = self.last_action_ms() else {
            return SleepZone::Unknown;
        };

        let elapsed = now_ms.saturating_sub(last);
        let awake_until = self.sleep_delay_ms.saturating_sub(self.threshold_ms);
        let asleep_from = self.certain_asleep_after_ms();

        if elapsed < awake_until {
            SleepZone::Awake
        } else if elapsed < asleep_from {
            SleepZone::Uncertain {
                remaining_ms: asleep_from - elapsed,
            }
        } else {
            SleepZone::Asleep
        }
    }

    /// Decide whether the remote is asleep, waiting out any uncertainty.
    ///
    /// Returns `false` only in the awake zone. In the uncertain zone, and
    /// when no press was ever recorded, this blocks on `clock` until the
    /// remote is certainly asleep and then returns `true`.
    pub fn resolve<C: Clock + Delay>(&self, clock: &C) -> bool {
        match self.classify(clock.now_ms()) {
            SleepZone::Awake => false,
            SleepZone::Asleep => true,
            SleepZone::Uncertain { remaining_ms } => {
                tracing::debug!(wait_ms = remaining_ms, "sleep state uncertain, waiting it out");
                clock.delay_ms(remaining_ms);
                true
            }
            SleepZone::Unknown => {
                let wait_ms = self.certain_asleep_after_ms();
                tracing::debug!(wait_ms, "no press recorded yet, waiting full sleep window");
                clock.delay_ms(wait_ms);
                true
            }
        }
    }

    fn last(&self) -> std::sync::MutexGuard<'_, Option<u64>> {
        self.last_action_ms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockClock;

    fn clock_at(last_ms: u64, now_ms: u64) -> (SleepClock, MockClock) {
        let sleep = SleepClock::new(8_000, 1_000);
        sleep.touch(last_ms);
        let clock = MockClock::new();
        clock.set(now_ms);
        (sleep, clock)
    }

    // ========================================================================
    // Zone 1: awake
    // ========================================================================

    #[test]
    fn awake_zone_returns_immediately() {
        for elapsed in [0, 1_000, 3_500, 6_900, 6_999] {
            let (sleep, clock) = clock_at(1_000, 1_000 + elapsed);
            assert!(!sleep.resolve(&clock), "awake at {elapsed}ms");
            assert!(clock.delays().is_empty(), "no wait at {elapsed}ms");
        }
    }

    // ========================================================================
    // Zone 2: uncertain
    // ========================================================================

    #[test]
    fn uncertain_zone_waits_then_reports_asleep() {
        let cases = [
            (7_000, 2_000),
            (7_300, 1_700),
            (8_000, 1_000),
            (8_200, 800),
            (8_900, 100),
        ];
        for (elapsed, expected_wait) in cases {
            let (sleep, clock) = clock_at(1_000, 1_000 + elapsed);
            assert!(sleep.resolve(&clock), "asleep after wait at {elapsed}ms");
            assert_eq!(clock.delays(), vec![expected_wait], "wait at {elapsed}ms");
        }
    }

    // ========================================================================
    // Zone 3: asleep
    // ========================================================================

    #[test]
    fn asleep_zone_returns_immediately() {
        for elapsed in [9_000, 9_100, 15_000] {
            let (sleep, clock) = clock_at(1_000, 1_000 + elapsed);
            assert!(sleep.resolve(&clock), "asleep at {elapsed}ms");
            assert!(clock.delays().is_empty(), "no wait at {elapsed}ms");
        }
    }

    // ========================================================================
    // Never pressed
    // ========================================================================

    #[test]
    fn never_pressed_waits_full_window() {
        let sleep = SleepClock::new(8_000, 1_000);
        let clock = MockClock::new();

        assert_eq!(sleep.classify(0), SleepZone::Unknown);
        assert!(sleep.resolve(&clock));
        assert_eq!(clock.delays(), vec![9_000]);
    }

    #[test]
    fn forget_returns_to_unknown() {
        let sleep = SleepClock::new(8_000, 1_000);
        sleep.touch(500);
        sleep.forget();
        assert_eq!(sleep.classify(600), SleepZone::Unknown);
        assert_eq!(sleep.last_action_ms(), None);
    }

    #[test]
    fn classify_does_not_touch() {
        let sleep = SleepClock::new(8_000, 1_000);
        sleep.touch(100);
        let _ = sleep.classify(50_000);
        assert_eq!(sleep.last_action_ms(), Some(100));
    }

    #[test]
    fn zone_certainty() {
        assert_eq!(SleepZone::Awake.is_asleep(), Some(false));
        assert_eq!(SleepZone::Asleep.is_asleep(), Some(true));
        assert_eq!(SleepZone::Unknown.is_asleep(), None);
        assert_eq!(
            SleepZone::Uncertain { remaining_ms: 1 }.is_asleep(),
            None
        );
    }

    #[test]
    fn zero_threshold_has_no_uncertain_zone() {
        let sleep = SleepClock::new(8_000, 0);
        sleep.touch(0);
        assert_eq!(sleep.classify(7_999), SleepZone::Awake);
        assert_eq!(sleep.classify(8_000), SleepZone::Asleep);
    }
}
