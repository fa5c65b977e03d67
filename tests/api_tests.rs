mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{subject_seed, test_config, MockLedger, SUBJECT};
use memograde::api::{FlowResponse, TransactionSummary};
use memograde::flows::GradingService;
use memograde::server::build_router;
use tower::ServiceExt; // for oneshot

fn app(auth_token: Option<String>) -> (Arc<MockLedger>, axum::Router) {
    let ledger = Arc::new(MockLedger::with_accounts());
    let service = GradingService::new(test_config(), ledger.clone()).unwrap();
    (ledger, build_router(Arc::new(service), auth_token))
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn read_flow(response: axum::response::Response) -> FlowResponse {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn auth_body() -> serde_json::Value {
    serde_json::json!({
        "publicKey": SUBJECT,
        "studentId": "S1",
        "pin": "1234",
        "secretKey": subject_seed(),
    })
}

#[tokio::test]
async fn authorization_endpoint_happy_path() {
    let (_ledger, app) = app(None);
    let response = app
        .oneshot(post_json("/authorization/new", auth_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let flow = read_flow(response).await;
    assert_eq!(flow.status, "OK");
    assert!(!flow.transaction_hash.is_empty());
    assert!(flow.error_log.is_empty());
}

#[tokio::test]
async fn missing_field_is_a_400_with_the_uniform_envelope() {
    let (ledger, app) = app(None);
    let body = serde_json::json!({ "publicKey": SUBJECT, "pin": "1234" });
    let response = app
        .oneshot(post_json("/authorization/new", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let flow = read_flow(response).await;
    assert_eq!(flow.status, "Fail");
    assert!(flow.transaction_hash.is_empty());
    assert!(!flow.error_log.is_empty());
    // No ledger call may happen on a validation failure.
    assert_eq!(ledger.submit_count.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn duplicate_authorization_maps_to_conflict() {
    let (_ledger, app) = app(None);
    let first = app
        .clone()
        .oneshot(post_json("/authorization/new", auth_body()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(post_json("/authorization/new", auth_body()))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let flow = read_flow(second).await;
    assert_eq!(flow.status, "Fail");
}

#[tokio::test]
async fn submit_and_check_endpoints() {
    let (_ledger, app) = app(None);
    app.clone()
        .oneshot(post_json("/authorization/new", auth_body()))
        .await
        .unwrap();

    let submit_body = serde_json::json!({
        "publicKey": SUBJECT,
        "studentId": "S1",
        "pin": "1234",
        "code": "ABC",
    });
    let response = app
        .clone()
        .oneshot(post_json("/submit", submit_body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let flow = read_flow(response).await;
    assert_eq!(flow.status, "OK");

    let response = app
        .clone()
        .oneshot(post_json("/check", submit_body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let flow = read_flow(response).await;
    assert_eq!(flow.status, "OK");
    assert!(flow.transaction_hash.is_empty());

    let wrong = serde_json::json!({
        "publicKey": SUBJECT,
        "studentId": "S1",
        "pin": "1234",
        "code": "WRONG",
    });
    let response = app.oneshot(post_json("/check", wrong)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn check_before_authorization_is_unauthorized() {
    let (_ledger, app) = app(None);
    let body = serde_json::json!({
        "publicKey": SUBJECT,
        "studentId": "S1",
        "pin": "1234",
        "code": "",
    });
    let response = app.oneshot(post_json("/check", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn transaction_history_endpoint() {
    let (_ledger, app) = app(None);
    app.clone()
        .oneshot(post_json("/authorization/new", auth_body()))
        .await
        .unwrap();

    let request = Request::builder()
        .uri("/transaction/ISSUER")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    let history: Vec<TransactionSummary> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].operations.len(), 4);
    assert_eq!(history[0].operations[1].type_name, "change_trust");
}

#[tokio::test]
async fn ledger_outage_maps_to_service_unavailable() {
    let (ledger, app) = app(None);
    ledger
        .unavailable
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let response = app
        .oneshot(post_json("/authorization/new", auth_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let flow = read_flow(response).await;
    assert_eq!(flow.status, "Fail");
    assert!(flow.transaction_hash.is_empty());
    assert!(!flow.error_log.is_empty());
}

#[tokio::test]
async fn ledger_rejection_maps_to_bad_gateway() {
    let (ledger, app) = app(None);
    ledger
        .reject_next
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let response = app
        .oneshot(post_json("/authorization/new", auth_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let flow = read_flow(response).await;
    assert_eq!(flow.status, "Fail");
    assert!(flow.transaction_hash.is_empty());
    assert!(!flow.error_log.is_empty());
}

#[tokio::test]
async fn bearer_guard_when_configured() {
    let (_ledger, app) = app(Some("sekrit".to_string()));

    let response = app
        .clone()
        .oneshot(post_json("/authorization/new", auth_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut request = post_json("/authorization/new", auth_body());
    request
        .headers_mut()
        .insert("authorization", "Bearer sekrit".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
