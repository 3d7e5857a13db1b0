//! Wall-clock time for the desktop and Raspberry Pi builds.

use std::time::{Duration, Instant};

use crate::traits::{Clock, Delay};

/// Monotonic clock backed by [`Instant`], delaying with `thread::sleep`.
///
/// Time is counted from construction.
///
/// # Example
///
/// ```rust
/// use rs_aluprof::hal::SystemClock;
/// use rs_aluprof::traits::{Clock, Delay};
///
/// let clock = SystemClock::new();
/// clock.delay_ms(5);
/// assert!(clock.now_ms() >= 5);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Creates a clock reading 0 now.
    #[inline]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl Delay for SystemClock {
    fn delay_ms(&self, ms: u64) {
        if ms > 0 {
            std::thread::sleep(Duration::from_millis(ms));
        }
    }
}
