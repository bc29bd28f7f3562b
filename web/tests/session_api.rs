//! HTTP contract tests for the session store routes.
//!
//! Drives the full router (middleware included) with `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use chrono::Duration;
use credit_meter_core::constants::{SESSION_HEADER, routes};
use credit_meter_core::{CreditInfo, CreditReceipt, ManualClock, SessionInfo};
use credit_meter_ledger::{InMemoryLedger, LedgerConfig};
use credit_meter_web::{AppState, build_router};
use serde_json::Value;
use tower::ServiceExt;

fn app_with(ledger: InMemoryLedger<ManualClock>) -> Router {
    build_router(AppState::new(ledger), &["http://localhost:3000".to_string()])
}

fn app(credits: u32) -> Router {
    app_with(InMemoryLedger::with_clock(
        LedgerConfig::new(credits),
        ManualClock::default(),
    ))
}

async fn send(app: &Router, method: Method, uri: &str, session: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, body)
}

async fn create(app: &Router) -> SessionInfo {
    let (status, body) = send(app, Method::POST, routes::CREATE_SESSION, None).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_value(body).unwrap()
}

#[tokio::test]
async fn test_create_session_returns_grant() {
    let app = app(6);

    let info = create(&app).await;

    assert_eq!(info.credits_remaining, 6);
    assert!(!info.session_id.as_str().is_empty());
}

#[tokio::test]
async fn test_credits_for_fresh_session() {
    let app = app(6);
    let info = create(&app).await;

    let (status, body) = send(&app, Method::GET, routes::CREDITS, Some(info.session_id.as_str())).await;

    assert_eq!(status, StatusCode::OK);
    let credits: CreditInfo = serde_json::from_value(body).unwrap();
    assert_eq!(credits, CreditInfo { credits_remaining: 6, session_valid: true });
}

#[tokio::test]
async fn test_six_uses_then_payment_required() {
    let app = app(6);
    let id = create(&app).await.session_id;

    for expected in (0..6).rev() {
        let (status, body) = send(&app, Method::POST, routes::USE_CREDIT, Some(id.as_str())).await;
        assert_eq!(status, StatusCode::OK);

        let receipt: CreditReceipt = serde_json::from_value(body).unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.credits_remaining, expected);
        assert_eq!(receipt.message, format!("{expected} credits remaining"));
    }

    let (status, body) = send(&app, Method::POST, routes::USE_CREDIT, Some(id.as_str())).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["detail"], "No credits remaining. Please sign up to continue.");

    let (_, body) = send(&app, Method::GET, routes::CREDITS, Some(id.as_str())).await;
    assert_eq!(body["credits_remaining"], 0);
}

#[tokio::test]
async fn test_unknown_session_is_404_mentioning_session() {
    let app = app(6);

    for (method, uri) in [(Method::GET, routes::CREDITS), (Method::POST, routes::USE_CREDIT)] {
        let (status, body) = send(&app, method, uri, Some("not-a-session")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].as_str().unwrap().contains("Session"));
    }
}

#[tokio::test]
async fn test_missing_header_is_400() {
    let app = app(6);

    for (method, uri) in [(Method::GET, routes::CREDITS), (Method::POST, routes::USE_CREDIT)] {
        let (status, body) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn test_idle_session_expires_to_404() {
    let clock = ManualClock::default();
    let app = app_with(InMemoryLedger::with_clock(
        LedgerConfig::new(6).with_idle_ttl(Duration::hours(24)),
        clock.clone(),
    ));
    let id = create(&app).await.session_id;

    clock.advance(Duration::hours(25));

    let (status, _) = send(&app, Method::POST, routes::USE_CREDIT, Some(id.as_str())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_use_credit_requests_each_spend_once() {
    let app = app(6);
    let id = create(&app).await.session_id;

    let (a, b) = tokio::join!(
        send(&app, Method::POST, routes::USE_CREDIT, Some(id.as_str())),
        send(&app, Method::POST, routes::USE_CREDIT, Some(id.as_str())),
    );

    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);

    let mut remaining = [a.1["credits_remaining"].as_u64(), b.1["credits_remaining"].as_u64()];
    remaining.sort_unstable();
    assert_eq!(remaining, [Some(4), Some(5)]);
}

#[tokio::test]
async fn test_root_and_health() {
    let app = app(6);

    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
