//! # shop-server: HTTP API for ProShop
//!
//! Thin orchestration layer over [`shop_db`]: handlers resolve identity,
//! validate through [`shop_core`], call a repository, and serialize the
//! result. Exposed as a library so route tests can drive the router
//! without binding a socket.

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
use shop_db::Database;

/// Shared application state.
///
/// Handed to handlers by axum; the database handle is injected here at
/// bootstrap, never looked up from a global.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the full application router with tracing middleware.
pub fn router(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
