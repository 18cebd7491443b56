//! HTTP route handlers and router configuration

mod health;
mod search;
mod status;

use crate::state::AppState;
use crate::telemetry;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the main application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        // Liveness and operator visibility
        .route("/health", get(health::health))
        // Search: decide, search, select, consume
        .route("/v1/find-nearest", post(search::find_nearest))
        // Peek: decision without consuming
        .route("/v1/status", get(status::status))
        .with_state(state.clone());

    // Correlation span around every request
    router = router.layer(middleware::from_fn_with_state(
        state.clone(),
        telemetry::request_context,
    ));
    router = router.layer(TraceLayer::new_for_http());

    if state.config.cors_enabled {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}
