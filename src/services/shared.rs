//! Shared remote state for the web service.
//!
//! The HTTP layer only needs a handful of operations, so it talks to the
//! controller through [`RemoteBackend`] instead of naming the driver and
//! clock types. One `Arc` of the backend is shared by every request.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_aluprof::services::{build_router, WebServerConfig};
//!
//! let remote = Arc::new(RemoteController::new(config, driver, SystemClock::new()));
//! let router = build_router(Arc::clone(&remote), &WebServerConfig::default());
//!
//! // The same Arc can release the relays on shutdown.
//! remote.release_all()?;
//! ```

use serde_json::Value;

use crate::error::RemoteError;
use crate::messages::BatchOutcome;
use crate::remote::{RemoteController, RemoteStatus};
use crate::traits::{Button, ButtonDriver, Clock, Delay};

/// Operations the HTTP API needs from the remote.
///
/// Every method except [`state`](Self::state) may block for seconds and must
/// be called off the async executor.
pub trait RemoteBackend: Send + Sync + 'static {
    /// Current channel and inferred power state.
    fn state(&self) -> RemoteStatus;

    /// Current channel only.
    fn current_value(&self) -> u8;

    /// Run a batch of raw command items.
    fn run_batch(&self, items: &[Value]) -> BatchOutcome;

    /// Press one button.
    fn press_button(&self, button: Button) -> Result<u8, RemoteError>;

    /// Overwrite the channel counter.
    fn sync(&self, value: i64) -> Result<u8, RemoteError>;

    /// Pulse and release every output.
    fn reset(&self) -> Result<u8, RemoteError>;
}

impl<D, C> RemoteBackend for RemoteController<D, C>
where
    D: ButtonDriver + Send + 'static,
    C: Clock + Delay + Send + Sync + 'static,
{
    fn state(&self) -> RemoteStatus {
        RemoteController::state(self)
    }

    fn current_value(&self) -> u8 {
        self.channels().get()
    }

    fn run_batch(&self, items: &[Value]) -> BatchOutcome {
        RemoteController::run_batch(self, items)
    }

    fn press_button(&self, button: Button) -> Result<u8, RemoteError> {
        RemoteController::press_button(self, button)
    }

    fn sync(&self, value: i64) -> Result<u8, RemoteError> {
        RemoteController::sync(self, value)
    }

    fn reset(&self) -> Result<u8, RemoteError> {
        RemoteController::reset(self)
    }
}
