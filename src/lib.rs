// Library exports for Panchayath Connect
// This allows integration tests and the binary to share one router

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod media;
pub mod payments;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Largest accepted request body; five video attachments fit comfortably.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// The full HTTP application with layers and state applied.
pub fn build_app(state: AppState) -> Router {
    routes::router()
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
