//! API request and response types for HTTP communication.

use serde::{Deserialize, Serialize};

use crate::messages::CommandResult;
use crate::traits::Button;

// Re-export shared types from the core
pub use crate::messages::SyncRequest;
pub use crate::remote::RemoteStatus as StateResponse;

// ============================================================================
// Response Types
// ============================================================================

/// Error body used by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable reason
    pub error: String,
    /// Channel at the time of the error, where relevant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<u8>,
}

impl ErrorResponse {
    /// Create an error body
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            current_value: None,
        }
    }

    /// Attach the current channel
    pub fn with_current_value(mut self, value: u8) -> Self {
        self.current_value = Some(value);
        self
    }
}

/// `POST /sync` success
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    /// Always `synchronized`
    pub status: String,
    /// Channel now stored
    pub new_value: u8,
}

impl SyncResponse {
    /// Sync applied
    pub fn synchronized(new_value: u8) -> Self {
        Self {
            status: "synchronized".into(),
            new_value,
        }
    }
}

/// `POST /actions` success
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    /// Always `batch_completed`
    pub status: String,
    /// Channel after the batch
    pub current_state: u8,
    /// One record per item
    pub results: Vec<CommandResult>,
}

impl BatchResponse {
    /// Batch ran to completion
    pub fn completed(current_state: u8, results: Vec<CommandResult>) -> Self {
        Self {
            status: "batch_completed".into(),
            current_state,
            results,
        }
    }
}

/// `POST /press/{button}` success
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressResponse {
    /// Always `pressed`
    pub status: String,
    /// Canonical button name
    pub button: Button,
    /// Channel after the press
    pub current_value: u8,
}

impl PressResponse {
    /// Button pressed
    pub fn pressed(button: Button, current_value: u8) -> Self {
        Self {
            status: "pressed".into(),
            button,
            current_value,
        }
    }
}

/// `POST /reset` success
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetResponse {
    /// Always `reset`
    pub status: String,
    /// Channel counter (unchanged by a reset)
    pub current_value: u8,
}

impl ResetResponse {
    /// Outputs reset
    pub fn reset(current_value: u8) -> Self {
        Self {
            status: "reset".into(),
            current_value,
        }
    }
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok`
    pub status: String,
    /// Crate version
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}
