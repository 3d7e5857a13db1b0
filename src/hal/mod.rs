//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `gpio`: Relay pins on a Linux GPIO chip (feature `gpio`, Linux only)
//! - `mock`: Test doubles with virtual time
//! - `relay`: Relay board over any `embedded-hal` output pins
//! - `sim`: Logging driver for running without hardware
//! - `system`: Wall-clock [`Clock`](crate::traits::Clock) and
//!   [`Delay`](crate::traits::Delay)

#[cfg(all(feature = "gpio", target_os = "linux"))]
pub mod gpio;
pub mod mock;
pub mod relay;
pub mod sim;
pub mod system;

#[cfg(all(feature = "gpio", target_os = "linux"))]
pub use gpio::{open_relays, GpioError, GpioRelays};
pub use mock::*;
pub use relay::{RelayBank, RelayError};
pub use sim::SimulatedRelays;
pub use system::SystemClock;
