//! HTTP server implementation using Axum.

use crate::handlers::{handle_backup, handle_export_csv, handle_health, handle_rpc};
use crate::session::SessionStore;
use axum::{
    routing::{get, post},
    Router,
};
use ghostfest_core::config::AuthConfig;
use ghostfest_core::GhostfestApi;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Requests processed at once; the store serializes writes anyway.
const MAX_CONCURRENT_REQUESTS: usize = 64;

/// Application state shared across handlers.
pub struct AppState {
    /// Core API (registration, lookup, admin operations)
    pub api: Arc<GhostfestApi>,
    /// Logged-in staff, keyed by bearer token
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(api: GhostfestApi) -> Self {
        Self {
            api: Arc::new(api),
            sessions: SessionStore::new(AuthConfig::SESSION_TTL),
        }
    }
}

/// Build the router with every route and middleware layer.
pub fn build_router(state: Arc<AppState>) -> Router {
    // The dashboard may be served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/healthz", get(handle_health))
        .route("/rpc", post(handle_rpc))
        .route("/admin/export.csv", get(handle_export_csv))
        .route("/admin/backup", get(handle_backup))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the JSON-RPC HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(api: GhostfestApi, host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let state = Arc::new(AppState::new(api));
    let app = build_router(state);

    // Parse the address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    // Bind to the address
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    // Spawn the server in the background
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}
