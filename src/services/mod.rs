//! Network services: the HTTP API.
//!
//! The web service talks to the controller through the [`RemoteBackend`]
//! trait, sharing a single `RemoteController` via `Arc`:
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_aluprof::services::{build_router, WebServerConfig};
//!
//! let remote = Arc::new(controller);
//! let router = build_router(Arc::clone(&remote), &WebServerConfig::default());
//! ```

pub mod api;
pub mod http_handler;
pub mod shared;
pub mod web;

// Re-exports
pub use api::*;
pub use http_handler::*;
pub use shared::*;
pub use web::*;
