//! HTTP API handler logic, independent of the server framework.
//!
//! # Design
//!
//! The `HttpApiHandler` struct contains the business logic for all API
//! endpoints: body parsing, validation, status codes and JSON rendering.
//! The Axum routes in [`web`](super::web) only move requests onto the
//! blocking pool and hand the [`ApiResult`] back.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rs_aluprof::{RemoteConfig, RemoteController};
//! use rs_aluprof::hal::{MockClock, MockDriver};
//! use rs_aluprof::services::HttpApiHandler;
//!
//! let remote = RemoteController::new(RemoteConfig::default(), MockDriver::new(), MockClock::new());
//! let handler = HttpApiHandler::new(Arc::new(remote));
//!
//! let result = handler.handle_sync(br#"{"value": 4}"#);
//! assert_eq!(result.status(), 200);
//! assert_eq!(result.body(), r#"{"status":"synchronized","new_value":4}"#);
//!
//! assert_eq!(handler.handle_sync(br#"{"value": 40}"#).status(), 400);
//! ```

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::RemoteError;
use crate::messages::SyncRequest;
use crate::traits::Button;

use super::api::{
    BatchResponse, ErrorResponse, HealthResponse, PressResponse, ResetResponse, SyncResponse,
};
use super::shared::RemoteBackend;

// ============================================================================
// API Response Types
// ============================================================================

/// Result of an API operation: status code plus JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResult {
    status: u16,
    body: String,
}

impl ApiResult {
    /// Serialize `value` as the body.
    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, body },
            Err(e) => {
                tracing::error!(error = %e, "response serialization failed");
                Self::error(500, "Internal server error")
            }
        }
    }

    /// Create a success response.
    pub fn ok<T: Serialize>(value: &T) -> Self {
        Self::json(200, value)
    }

    /// Create an `{"error": ...}` response.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let body = serde_json::json!({ "error": message.into() }).to_string();
        Self { status, body }
    }

    /// Create a bad request (400) error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::error(400, message)
    }

    /// Create an internal server error (500).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::error(500, message)
    }

    /// Check if this is a success response.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the JSON body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }
}

// Axum integration: allow ApiResult to be returned directly from handlers
impl axum::response::IntoResponse for ApiResult {
    fn into_response(self) -> axum::response::Response {
        use axum::http::{header, StatusCode};

        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, "application/json")], self.body).into_response()
    }
}

// ============================================================================
// HTTP API Handler
// ============================================================================

/// HTTP API handler over a shared [`RemoteBackend`].
///
/// Cloning is cheap; every clone drives the same remote. All methods except
/// [`handle_get_state`](Self::handle_get_state) and
/// [`handle_health`](Self::handle_health) may block while buttons are pressed.
pub struct HttpApiHandler<S> {
    backend: Arc<S>,
}

impl<S> Clone for HttpApiHandler<S> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<S: RemoteBackend> HttpApiHandler<S> {
    /// Create a new handler for `backend`.
    pub fn new(backend: Arc<S>) -> Self {
        Self { backend }
    }

    /// The shared backend.
    pub fn backend(&self) -> &Arc<S> {
        &self.backend
    }

    /// GET /state - current channel and inferred power state.
    pub fn handle_get_state(&self) -> ApiResult {
        ApiResult::ok(&self.backend.state())
    }

    /// GET /health - liveness and version.
    pub fn handle_health(&self) -> ApiResult {
        ApiResult::ok(&HealthResponse::default())
    }

    /// POST /sync - overwrite the channel counter.
    ///
    /// Accepts JSON: `{"value": 5}`
    pub fn handle_sync(&self, body: &[u8]) -> ApiResult {
        let Ok(req) = serde_json::from_slice::<SyncRequest>(body) else {
            return ApiResult::bad_request(r#"Request body must be {"value": <integer>}"#);
        };

        match self.backend.sync(req.value) {
            Ok(new_value) => ApiResult::ok(&SyncResponse::synchronized(new_value)),
            Err(e) => ApiResult::bad_request(e.to_string()),
        }
    }

    /// POST /actions - run a batch.
    ///
    /// Accepts a JSON array:
    /// `[{"nr": 1, "action": "UP"}, {"nr": 1, "action": "DELAY", "duration": 2}]`
    pub fn handle_actions(&self, body: &[u8]) -> ApiResult {
        let items = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Array(items)) => items,
            Ok(_) => return ApiResult::bad_request("Request body must be a JSON array of actions."),
            Err(e) => return ApiResult::bad_request(format!("Invalid JSON body: {e}")),
        };

        let outcome = self.backend.run_batch(&items);
        ApiResult::ok(&BatchResponse::completed(
            outcome.current_state,
            outcome.results,
        ))
    }

    /// POST /press/{button} - press one button.
    pub fn handle_press(&self, id: &str) -> ApiResult {
        let Some(button) = Button::from_id(id) else {
            return ApiResult::bad_request(RemoteError::UnknownButton(id.to_owned()).to_string());
        };

        match self.backend.press_button(button) {
            Ok(value) => ApiResult::ok(&PressResponse::pressed(button, value)),
            Err(e) => ApiResult::internal(e.to_string()),
        }
    }

    /// POST /reset - pulse and release every output.
    pub fn handle_reset(&self) -> ApiResult {
        match self.backend.reset() {
            Ok(value) => ApiResult::ok(&ResetResponse::reset(value)),
            Err(e) => ApiResult::json(
                500,
                &ErrorResponse::new(e.to_string()).with_current_value(self.backend.current_value()),
            ),
        }
    }
}
