//! The authoritative channel counter.
//!
//! [`ChannelStore`] owns the channel the remote is believed to be on. The
//! value always lies in `0..=max`; steps wrap around the ring. Every change is
//! handed to a [`Persist`] backend so the value survives restarts, but the
//! in-memory value stays authoritative even when persistence fails.
//!
//! The store has its own lock so that state queries stay responsive while a
//! batch holds the controller's batch lock.
//!
//! # Example
//!
//! ```rust
//! use rs_aluprof::channel::ChannelStore;
//!
//! let store = ChannelStore::in_memory(15);
//! assert_eq!(store.decrement(), 15);
//! assert_eq!(store.increment(), 0);
//! assert!(store.set(16).is_err());
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::error::RemoteError;
use crate::store::{NoPersist, Persist, PersistedState};
use crate::traits::StepDirection;

/// Point-in-time view of the counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ChannelSnapshot {
    /// Current channel.
    pub value: u8,
    /// Highest valid channel.
    pub max: u8,
}

/// Thread-safe channel counter with best-effort persistence.
pub struct ChannelStore {
    max: u8,
    value: Mutex<u8>,
    persist: Box<dyn Persist>,
}

impl ChannelStore {
    /// Open the store, restoring the last persisted value.
    ///
    /// Falls back to channel 0 when nothing was persisted or the persisted
    /// value does not fit the current range.
    pub fn open(max: u8, persist: impl Persist + 'static) -> Self {
        let value = match persist.load() {
            Some(saved) if saved.current_value <= max => {
                tracing::info!(value = saved.current_value, "restored channel from state file");
                saved.current_value
            }
            Some(saved) => {
                tracing::warn!(
                    value = saved.current_value,
                    max,
                    "persisted channel out of range, using 0"
                );
                0
            }
            None => 0,
        };

        Self {
            max,
            value: Mutex::new(value),
            persist: Box::new(persist),
        }
    }

    /// Store without persistence, starting at channel 0.
    pub fn in_memory(max: u8) -> Self {
        Self::open(max, NoPersist)
    }

    /// Highest valid channel.
    #[inline]
    pub fn max(&self) -> u8 {
        self.max
    }

    /// Current channel.
    pub fn get(&self) -> u8 {
        *self.lock()
    }

    /// Set the channel directly.
    ///
    /// Leaves the value unchanged and returns
    /// [`RemoteError::ChannelOutOfRange`] unless `0 <= value <= max`.
    pub fn set(&self, value: i64) -> Result<u8, RemoteError> {
        let checked = u8::try_from(value)
            .ok()
            .filter(|v| *v <= self.max)
            .ok_or(RemoteError::ChannelOutOfRange {
                value,
                max: self.max,
            })?;

        let mut guard = self.lock();
        *guard = checked;
        self.persist.save(PersistedState::now(checked, self.max));
        Ok(checked)
    }

    /// Move one channel up, wrapping from `max` to 0.
    pub fn increment(&self) -> u8 {
        self.step(StepDirection::Increase)
    }

    /// Move one channel down, wrapping from 0 to `max`.
    pub fn decrement(&self) -> u8 {
        self.step(StepDirection::Decrease)
    }

    /// Move one channel in `direction` and return the new value.
    pub fn step(&self, direction: StepDirection) -> u8 {
        let mut guard = self.lock();
        let next = match direction {
            StepDirection::Increase if *guard >= self.max => 0,
            StepDirection::Increase => *guard + 1,
            StepDirection::Decrease if *guard == 0 => self.max,
            StepDirection::Decrease => *guard - 1,
        };
        *guard = next;
        self.persist.save(PersistedState::now(next, self.max));
        next
    }

    /// Consistent snapshot of value and range.
    pub fn describe(&self) -> ChannelSnapshot {
        let guard = self.lock();
        ChannelSnapshot {
            value: *guard,
            max: self.max,
        }
    }

    fn lock(&self) -> MutexGuard<'_, u8> {
        // A u8 cannot be left half-written, so a poisoned lock is still valid.
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl core::fmt::Debug for ChannelStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChannelStore")
            .field("value", &self.get())
            .field("max", &self.max)
            .finish()
    }
}
