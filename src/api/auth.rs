//! Authentication middleware for the REST API
//!
//! Two layers guard the job endpoints:
//! - `require_api_token` checks the shared-secret X-Api-Token header when one
//!   is configured (401 on missing or wrong token)
//! - `require_user` reads the caller identity from the X-Username header,
//!   checks it against the configured allow-list, and stashes it in request
//!   extensions for the handlers (401 when missing, 403 when not allowed)

use crate::config::Config;
use crate::error::ApiError;
use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Caller identity extracted by [`require_user`], available to handlers via
/// `Extension<AuthenticatedUser>`
#[derive(Clone, Debug)]
pub struct AuthenticatedUser(pub String);

/// Middleware that checks for a valid API token in the X-Api-Token header
pub async fn require_api_token(
    State(expected_token): State<Option<String>>,
    request: Request,
    next: Next,
) -> Response {
    // If no token is configured, allow all requests through
    let Some(expected) = expected_token else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get("x-api-token")
        .and_then(|value| value.to_str().ok());

    // Constant-time comparison to prevent timing side-channel attacks
    match provided {
        Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => {
            next.run(request).await
        }
        Some(_) => unauthorized_response("Invalid API token"),
        None => unauthorized_response("Missing X-Api-Token header"),
    }
}

/// Middleware that extracts the caller identity from the X-Username header
/// and enforces the configured user allow-list
pub async fn require_user(
    State(config): State<Arc<Config>>,
    mut request: Request,
    next: Next,
) -> Response {
    let username = request
        .headers()
        .get("x-username")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(String::from);

    let Some(username) = username else {
        return unauthorized_response("Missing X-Username header");
    };

    if !config.api.is_user_allowed(&username) {
        let body = Json(ApiError::new(
            "forbidden",
            format!("user '{}' is not allowed to use this service", username),
        ));
        return (StatusCode::FORBIDDEN, body).into_response();
    }

    request.extensions_mut().insert(AuthenticatedUser(username));
    next.run(request).await
}

/// Constant-time byte comparison to prevent timing side-channel attacks.
/// Always compares all bytes regardless of where the first mismatch occurs.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn unauthorized_response(message: &str) -> Response {
    let body = Json(ApiError::unauthorized(message));
    (StatusCode::UNAUTHORIZED, body).into_response()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Extension, Router,
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
    };
    use tower::ServiceExt; // for oneshot

    async fn token_handler() -> impl IntoResponse {
        (StatusCode::OK, "Success")
    }

    async fn whoami(Extension(user): Extension<AuthenticatedUser>) -> impl IntoResponse {
        (StatusCode::OK, user.0)
    }

    fn token_app(token: Option<String>) -> Router {
        Router::new()
            .route("/test", get(token_handler))
            .layer(middleware::from_fn_with_state(token, require_api_token))
    }

    fn user_app(allowed_users: Vec<String>) -> Router {
        let config = Arc::new(Config {
            api: crate::config::ApiConfig {
                allowed_users,
                ..Default::default()
            },
            ..Default::default()
        });
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(config, require_user))
    }

    async fn body_string(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_no_token_configured_allows_all() {
        let app = token_app(None);
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_valid_token_passes() {
        let app = token_app(Some("secret-token".to_string()));
        let request = Request::builder()
            .uri("/test")
            .header("X-Api-Token", "secret-token")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_token_rejected() {
        let app = token_app(Some("correct-token".to_string()));
        let request = Request::builder()
            .uri("/test")
            .header("X-Api-Token", "wrong-token")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response).await.contains("Invalid API token"));
    }

    #[tokio::test]
    async fn test_missing_token_rejected() {
        let app = token_app(Some("required-token".to_string()));
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(
            body_string(response)
                .await
                .contains("Missing X-Api-Token header")
        );
    }

    #[tokio::test]
    async fn test_token_comparison_is_exact() {
        let app = token_app(Some("CaseSensitive".to_string()));
        let request = Request::builder()
            .uri("/test")
            .header("X-Api-Token", "casesensitive")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_username_rejected() {
        let app = user_app(vec![]);
        let request = Request::builder()
            .uri("/whoami")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(
            body_string(response)
                .await
                .contains("Missing X-Username header")
        );
    }

    #[tokio::test]
    async fn test_blank_username_rejected() {
        let app = user_app(vec![]);
        let request = Request::builder()
            .uri("/whoami")
            .header("X-Username", "   ")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_any_user_allowed_with_empty_list() {
        let app = user_app(vec![]);
        let request = Request::builder()
            .uri("/whoami")
            .header("X-Username", "anyone")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "anyone");
    }

    #[tokio::test]
    async fn test_listed_user_allowed() {
        let app = user_app(vec!["alice".to_string()]);
        let request = Request::builder()
            .uri("/whoami")
            .header("X-Username", "alice")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "alice");
    }

    #[tokio::test]
    async fn test_unlisted_user_forbidden() {
        let app = user_app(vec!["alice".to_string()]);
        let request = Request::builder()
            .uri("/whoami")
            .header("X-Username", "mallory")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(body_string(response).await.contains("mallory"));
    }
}
