//! HTTP surface, driven through the router without binding a socket.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use fraud_form::context::{AppConfig, AppContext};
use fraud_form::types::TransactionInput;
use fraud_form::web;

const MODEL_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/models/model.json");
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

fn app() -> (Router, Arc<AppContext>) {
    let ctx = Arc::new(AppContext::new(AppConfig {
        model_path: MODEL_PATH.into(),
        locator_step: Duration::ZERO,
    }));
    (web::router(ctx.clone(), STATIC_DIR), ctx)
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_predict_endpoint_flags_drained_transfer() {
    let (app, ctx) = app();
    let body = serde_json::json!({
        "step": 1, "type": "TRANSFER", "amount": 181.0,
        "oldbalanceOrg": 181.0, "newbalanceOrig": 0.0,
        "oldbalanceDest": 0.0, "newbalanceDest": 0.0,
        "nameOrig": "C1305486145", "nameDest": "C553264065",
        "isFraud": 1, "isFlaggedFraud": false
    });

    let (status, json) = send(app, post_json("/api/predict", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["label"], 1);
    assert_eq!(json["verdict"], "fraudulent");
    assert_eq!(json["gauge"]["band"], "red");
    assert_eq!(ctx.latency_stats().count, 1);
}

#[tokio::test]
async fn test_predict_endpoint_rejects_negative_amount() {
    let (app, _) = app();
    let body = serde_json::json!({ "type": "PAYMENT", "amount": -1.0 });

    let (status, json) = send(app, post_json("/api/predict", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_health_reports_trained_schema() {
    let (app, _) = app();
    let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();

    let (status, json) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["model"], "paysim-forest");
    assert_eq!(json["trees"], 2);
    assert_eq!(json["features"].as_array().map(Vec::len), Some(7));
}

#[tokio::test]
async fn test_health_fails_without_artifact() {
    let ctx = Arc::new(AppContext::new(AppConfig {
        model_path: "missing.json".into(),
        locator_step: Duration::ZERO,
    }));
    let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();

    let (status, _) = send(web::router(ctx, STATIC_DIR), req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_sample_endpoint_returns_valid_fraud_pattern() {
    let (app, _) = app();
    let req = Request::builder().uri("/api/sample?fraud=true").body(Body::empty()).unwrap();

    let (status, json) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    let tx: TransactionInput = serde_json::from_value(json).unwrap();
    tx.validate().unwrap();
    assert_eq!(tx.new_balance_origin, 0.0);
}

#[tokio::test]
async fn test_form_page_is_served() {
    let (app, _) = app();
    let req = Request::builder().uri("/index.html").body(Body::empty()).unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
