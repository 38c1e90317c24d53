use super::*;
use crate::error::ApiError;
use crate::fetcher::DataFetcher;
use crate::service::test_helpers::{StubFetcher, create_test_service_with, sample_request};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot


/// Build a router plus its backing service over a temp database
async fn create_test_app(
    fetcher: Arc<dyn DataFetcher>,
    modify: impl FnOnce(&mut Config),
) -> (Router, Arc<DownloadService>, TempDir) {
    let (service, dir) = create_test_service_with(fetcher, modify).await;
    let service = Arc::new(service);
    let config = service.config.clone();
    let app = create_router(service.clone(), config);
    (app, service, dir)
}

/// Default app: succeeding fetcher, no token, everyone allowed
async fn default_app() -> (Router, Arc<DownloadService>, TempDir) {
    create_test_app(StubFetcher::succeeding(), |_| {}).await
}

/// Build a POST /download request carrying the standard test identity
fn submit_request(body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/download")
        .header("X-Username", "alice")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

/// Build an authenticated GET request
fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Username", "alice")
        .body(Body::empty())
        .expect("request builds")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&body).expect("body is JSON")
}

/// The standard request body used by the submission tests
fn sample_body() -> serde_json::Value {
    serde_json::to_value(sample_request()).expect("request serializes")
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (service, _dir) = create_test_service_with(StubFetcher::succeeding(), |config| {
        config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    })
    .await;
    let service = Arc::new(service);
    let config = service.config.clone();

    let api_handle = tokio::spawn(async move { start_api_server(service, config).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    api_handle.abort();
}

#[tokio::test]
async fn test_cors_headers_present_when_enabled() {
    let (app, _service, _dir) = create_test_app(StubFetcher::succeeding(), |config| {
        config.api.cors_enabled = true;
        config.api.cors_origins = vec!["*".to_string()];
    })
    .await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_token_required_when_configured() {
    let (app, _service, _dir) = create_test_app(StubFetcher::succeeding(), |config| {
        config.api.api_token = Some("test-secret".to_string());
    })
    .await;

    // Username alone is not enough when a token is configured
    let response = app.clone().oneshot(get_request("/jobs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong token is rejected
    let request = Request::builder()
        .uri("/jobs")
        .header("X-Username", "alice")
        .header("X-Api-Token", "wrong")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Correct token and username passes
    let request = Request::builder()
        .uri("/jobs")
        .header("X-Username", "alice")
        .header("X-Api-Token", "test-secret")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Health stays open regardless
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_path_returns_not_found() {
    // Auth only guards matched job routes; unmatched paths fall through
    // to the router's 404 instead of being intercepted with a 401
    let (app, _service, _dir) = create_test_app(StubFetcher::succeeding(), |config| {
        config.api.api_token = Some("test-secret".to_string());
    })
    .await;

    let request = Request::builder()
        .uri("/no-such-route")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_username_rejected_on_job_routes() {
    let (app, _service, _dir) = default_app().await;

    let request = Request::builder().uri("/jobs").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    let error: ApiError = serde_json::from_value(body).unwrap();
    assert_eq!(error.error.code, "unauthorized");
}

#[tokio::test]
async fn test_disallowed_user_forbidden() {
    let (app, _service, _dir) = create_test_app(StubFetcher::succeeding(), |config| {
        config.api.allowed_users = vec!["alice".to_string()];
    })
    .await;

    let request = Request::builder()
        .uri("/jobs")
        .header("X-Username", "mallory")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "forbidden");
    assert!(body["error"]["message"].as_str().unwrap().contains("mallory"));
}
