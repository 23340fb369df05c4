//! HTTP + WebSocket surface.
//!
//! Only the ingest boundary, queue-status observability, token refresh, and
//! the admin WebSocket are in scope — listing/searching/assigning alerts is
//! explicitly out of scope.

pub mod handlers;
pub mod routes;
pub mod state;
pub mod ws;

pub use state::AppState;

use axum::Router;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

/// Build the complete application router.
pub fn create_app(state: AppState) -> Router {
    routes::routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
