//! HTTP router setup.

use crate::handlers;
use crate::middleware;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::listing))
        .route("/health", get(handlers::health))
        .route("/nft/{slug}", get(handlers::detail))
        .route("/nft/{slug}/mint", post(handlers::mint))
        .route("/nft/{slug}/dialog/close", post(handlers::close_dialog))
        .layer(axum::middleware::from_fn(middleware::inject_request_id))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(ConcurrencyLimitLayer::new(1024))
        .with_state(state)
}
