//! Trait definitions for hardware abstraction.
//!
//! This module defines the abstractions that allow rs-aluprof to:
//! - Drive real relay pins or a simulation driver
//! - Run every timed wait against a real or virtual clock
//!
//! # Hardware Abstraction
//!
//! - [`ButtonDriver`]: assert/release the relay behind a logical [`Button`]
//! - [`Clock`]: millisecond time source for sleep/wake inference
//! - [`Delay`]: blocking waits

pub mod hardware;

pub use hardware::*;
