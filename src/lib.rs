//! # rs-aluprof
//!
//! A channel-tracking controller for a multi-channel shutter/display remote
//! driven through relays, with an HTTP API.
//!
//! ## Features
//!
//! - **Inferred channel**: The remote gives no feedback; the selected channel
//!   is a persisted counter kept in step by pressing the right buttons
//! - **Shortest path**: Channels form a ring and navigation takes the shorter way round
//! - **Sleep inference**: Wake presses are inserted when the remote may have powered down
//! - **Batches**: Ordered navigate-then-act commands, serialized against each other
//! - **Hardware abstraction**: Relay outputs, time and delays are traits, so
//!   everything runs on desktop with mocks
//!
//! ## Architecture
//!
//! - `traits` - Button driver, clock and delay abstractions
//! - `channel` / `store` - The channel counter and its state file
//! - `planner` - Shortest-path planning on the ring
//! - `sleep` - Sleep/wake inference
//! - `remote` - Main controller that ties everything together
//! - `hal` - Concrete implementations (mock for testing, relay bank, system clock)
//! - `services` - Axum HTTP API (feature `web`)
//!
//! ## Example
//!
//! ```rust
//! use rs_aluprof::{RemoteConfig, RemoteController};
//! use rs_aluprof::hal::{MockClock, MockDriver};
//! use rs_aluprof::traits::Button;
//! use serde_json::json;
//!
//! let driver = MockDriver::new();
//! let remote = RemoteController::new(RemoteConfig::default(), driver.clone(), MockClock::new());
//!
//! // Select channel 14 and raise it: 0 -> 15 -> 14 is two presses down.
//! let outcome = remote.run_batch(&[json!({"nr": 14, "action": "UP"})]);
//! assert_eq!(outcome.current_state, 14);
//!
//! // Wake press, two DECREASE steps, then MOVE_UP.
//! assert_eq!(
//!     driver.presses(),
//!     vec![Button::Increase, Button::Decrease, Button::Decrease, Button::MoveUp]
//! );
//! ```

#![warn(missing_docs)]

/// The authoritative channel counter.
pub mod channel;
/// Shared configuration for the controller, state file and web server.
pub mod config;
/// Error types.
pub mod error;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Batch command parsing and result records.
pub mod messages;
/// Shortest-path planning on the channel ring.
pub mod planner;
/// Main controller that coordinates presses, navigation and sleep handling.
pub mod remote;
/// Sleep/wake inference.
pub mod sleep;
/// State file persistence.
pub mod store;
/// Core traits for hardware abstraction.
pub mod traits;

/// Network services for the HTTP API (feature-gated).
#[cfg(feature = "web")]
pub mod services;

// Re-exports for convenience
pub use channel::{ChannelSnapshot, ChannelStore};
pub use error::{CommandError, ConfigError, RemoteError, StoreError};
pub use messages::{Action, BatchOutcome, Command, CommandResult, GotoDetails};
pub use planner::{plan, Plan};
pub use remote::{RemoteController, RemoteStatus};
pub use sleep::{SleepClock, SleepZone};
pub use store::{JsonFileStore, NoPersist, Persist, PersistedState};
pub use traits::{Button, ButtonDriver, Clock, Delay, StepDirection};

// Config re-exports
pub use config::{ButtonConfig, ButtonTable, Config, RemoteConfig, StorageConfig, WebConfig};
