use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    Json,
};

use crate::limiter::RateLimitDecision;

use super::types::{
    CheckLimitRequest, ErrorResponse, ReadinessResponse, RetentionRequest, RetentionResponse,
};
use super::ApiState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

pub async fn check_limit(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CheckLimitRequest>,
) -> ApiResult<RateLimitDecision> {
    if request.id.trim().is_empty() {
        return Err(bad_request("invalid_entity_id", "id cannot be empty"));
    }

    let decision = state
        .limiter
        .check_limit(&request.id, request.entity_type, request.limit_type);

    Ok(Json(decision))
}

pub async fn get_retention(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<RetentionRequest>,
) -> ApiResult<RetentionResponse> {
    if request.target_id.trim().is_empty() {
        return Err(bad_request("invalid_target_id", "targetId cannot be empty"));
    }

    Ok(Json(RetentionResponse {
        retention: state.limiter.get_retention(&request.target_id),
    }))
}

pub async fn readiness(
    State(state): State<Arc<ApiState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let ready = state.limiter.readiness();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ReadinessResponse { ready }))
}

pub async fn health_check(State(state): State<Arc<ApiState>>) -> ApiResult<serde_json::Value> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "rate-limit",
        "refresh_interval_ms": state.config.refresh_interval_ms,
        "warning_threshold_percent": state.config.warning_threshold_percent
    })))
}

/// Prometheus text exposition; 404 when no recorder was installed.
pub async fn metrics(
    State(state): State<Arc<ApiState>>,
) -> Result<([(header::HeaderName, &'static str); 1], String), StatusCode> {
    let handle = state.metrics.as_ref().ok_or(StatusCode::NOT_FOUND)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}

fn bad_request(code: &str, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}
