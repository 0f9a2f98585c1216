use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::ApiState;

pub fn create_router(state: Arc<ApiState>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    Router::new()
        .route("/api/rate-limit/check", post(handlers::check_limit))
        .route("/api/rate-limit/retention", post(handlers::get_retention))
        .route("/_readiness", get(handlers::readiness))
        .route("/_health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware)
}
