//! # Route Modules
//!
//! One module per resource, each exposing a `router()` that the app
//! assembles into the full API surface.

pub mod backup;
pub mod health;
pub mod products;
pub mod reports;
pub mod sales;
pub mod users;

use axum::Router;

use crate::AppState;

/// The full API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .merge(sales::router())
        .merge(reports::router())
        .merge(users::router())
        .merge(backup::router())
}
