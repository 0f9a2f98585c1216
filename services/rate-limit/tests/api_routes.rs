mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{acme, Harness};
use edge_rate_limit::{create_router, telemetry, ApiState, RateLimitConfig};
use metrics_exporter_prometheus::PrometheusBuilder;

fn router_for(harness: &Harness) -> Router {
    create_router(Arc::new(ApiState::new(
        harness.limiter.clone(),
        RateLimitConfig::default(),
    )))
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn check_limit_for_organization_and_target() {
    let harness = Harness::new(vec![acme(1_000)], &[("t1", 1_500)]);
    harness.limiter.start().await;
    let router = router_for(&harness);

    let expected = json!({ "current": 1500, "quota": 1000, "limited": true });

    let (status, body) = post_json(
        router.clone(),
        "/api/rate-limit/check",
        json!({ "id": "o1", "entityType": "organization", "type": "operations-reporting" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, expected);

    let (status, body) = post_json(
        router,
        "/api/rate-limit/check",
        json!({ "id": "t1", "entityType": "target", "type": "operations-reporting" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, expected);

    harness.limiter.stop();
}

#[tokio::test]
async fn check_limit_unknowns_answer_sentinel() {
    let harness = Harness::new(vec![acme(1_000)], &[("t1", 1_500)]);
    harness.limiter.start().await;
    let router = router_for(&harness);
    let unknown = json!({ "current": -1, "quota": -1, "limited": false });

    let (status, body) = post_json(
        router.clone(),
        "/api/rate-limit/check",
        json!({ "id": "nope", "entityType": "target", "type": "operations-reporting" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, unknown);

    let (status, body) = post_json(
        router,
        "/api/rate-limit/check",
        json!({ "id": "o1", "entityType": "organization", "type": "schema-pushes" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, unknown);

    harness.limiter.stop();
}

#[tokio::test]
async fn check_limit_rejects_empty_id() {
    let harness = Harness::new(vec![], &[]);
    let router = router_for(&harness);

    let (status, body) = post_json(
        router,
        "/api/rate-limit/check",
        json!({ "id": " ", "entityType": "target", "type": "operations-reporting" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("invalid_entity_id"));
}

#[tokio::test]
async fn retention_lookup() {
    let harness = Harness::new(vec![acme(1_000)], &[]);
    harness.limiter.start().await;
    let router = router_for(&harness);

    let (status, body) = post_json(
        router.clone(),
        "/api/rate-limit/retention",
        json!({ "targetId": "t1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "retention": 7 }));

    let (_, body) = post_json(
        router,
        "/api/rate-limit/retention",
        json!({ "targetId": "unknown-target" }),
    )
    .await;
    assert_eq!(body, json!({ "retention": 30 }));

    harness.limiter.stop();
}

#[tokio::test]
async fn readiness_follows_scheduler() {
    let harness = Harness::new(vec![acme(1_000)], &[]);
    let router = router_for(&harness);

    let (status, body) = get(router.clone(), "/_readiness").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({ "ready": false }));

    harness.limiter.start().await;
    let (status, _) = get(router.clone(), "/_readiness").await;
    assert_eq!(status, StatusCode::OK);

    harness.limiter.stop();
    let (status, _) = get(router, "/_readiness").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn health_check_reports_service() {
    let harness = Harness::new(vec![], &[]);
    let (status, body) = get(router_for(&harness), "/_health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], json!("rate-limit"));
    assert_eq!(body["refresh_interval_ms"], json!(60_000));
    assert_eq!(body["warning_threshold_percent"], Value::Null);
}

#[tokio::test]
async fn metrics_route_renders_limited_organizations() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    metrics::with_local_recorder(&recorder, || {
        telemetry::record_limited_organization("o1", "Acme");
    });

    let harness = Harness::new(vec![], &[]);
    let state =
        ApiState::new(harness.limiter.clone(), RateLimitConfig::default()).with_metrics(handle);
    let router = create_router(Arc::new(state));

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("rate_limit_operations_event_org{"));
    assert!(text.contains(r#"org_name="Acme""#));
}

#[tokio::test]
async fn metrics_route_without_recorder_is_not_found() {
    let harness = Harness::new(vec![], &[]);
    let (status, _) = get(router_for(&harness), "/metrics").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
