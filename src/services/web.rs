//! Axum-based HTTP server for the remote controller API.
//!
//! Provides REST endpoints for:
//! - GET `/state` - Current channel and inferred sleep state
//! - POST `/sync` - Overwrite the channel counter
//! - POST `/actions` - Run a batch of navigate-then-act commands
//! - POST `/press/{button}` - Press a single button
//! - POST `/reset` - Pulse and release every output
//! - GET `/health` - Liveness and version
//!
//! Anything that presses a button runs on tokio's blocking pool, so a batch
//! waiting out the sleep window never stalls the executor or `GET /state`.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::WebConfig;

use super::http_handler::{ApiResult, HttpApiHandler};
use super::shared::RemoteBackend;

// ============================================================================
// Route Handlers
// ============================================================================

/// Run `f` on the blocking pool, turning a panic into a 500.
async fn blocking<F>(f: F) -> ApiResult
where
    F: FnOnce() -> ApiResult + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "request task failed");
            ApiResult::internal("Internal server error")
        }
    }
}

/// GET /state
async fn get_state<S: RemoteBackend>(State(api): State<HttpApiHandler<S>>) -> ApiResult {
    api.handle_get_state()
}

/// GET /health
async fn health<S: RemoteBackend>(State(api): State<HttpApiHandler<S>>) -> ApiResult {
    api.handle_health()
}

/// POST /sync
///
/// Accepts JSON: `{"value": 5}`
async fn sync<S: RemoteBackend>(State(api): State<HttpApiHandler<S>>, body: Bytes) -> ApiResult {
    blocking(move || api.handle_sync(&body)).await
}

/// POST /actions
///
/// Accepts a JSON array of `{"nr", "action", "duration"?}` items.
async fn actions<S: RemoteBackend>(
    State(api): State<HttpApiHandler<S>>,
    body: Bytes,
) -> ApiResult {
    blocking(move || api.handle_actions(&body)).await
}

/// POST /press/{button}
async fn press<S: RemoteBackend>(
    State(api): State<HttpApiHandler<S>>,
    Path(button): Path<String>,
) -> ApiResult {
    blocking(move || api.handle_press(&button)).await
}

/// POST /reset
async fn reset<S: RemoteBackend>(State(api): State<HttpApiHandler<S>>) -> ApiResult {
    blocking(move || api.handle_reset()).await
}

/// Fallback handler for 404
async fn not_found() -> ApiResult {
    ApiResult::error(404, "Not found")
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self::from_config(&WebConfig::default())
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

/// Build the Axum router with all routes
pub fn build_router<S: RemoteBackend>(backend: Arc<S>, config: &WebServerConfig) -> Router {
    let mut router = Router::new()
        .route("/state", get(get_state::<S>))
        .route("/health", get(health::<S>))
        .route("/sync", post(sync::<S>))
        .route("/actions", post(actions::<S>))
        .route("/press/:button", post(press::<S>))
        .route("/reset", post(reset::<S>))
        .fallback(not_found)
        .with_state(HttpApiHandler::new(backend));

    // Add CORS if requested
    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.layer(TraceLayer::new_for_http())
}

/// Serve the API until `shutdown` resolves.
pub async fn run_server<S, F>(
    backend: Arc<S>,
    config: WebServerConfig,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    S: RemoteBackend,
    F: Future<Output = ()> + Send + 'static,
{
    let router = build_router(backend, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "web server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
