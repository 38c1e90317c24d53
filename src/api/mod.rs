//! REST API server module
//!
//! Provides the HTTP surface over [`DownloadService`]: job submission and
//! queries behind header-based authentication, plus open system endpoints
//! (service info, health, OpenAPI spec, Swagger UI).

use crate::{Config, DownloadService, Result};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Jobs (authenticated)
/// - `POST /download` - Submit a download job
/// - `GET /jobs` - List jobs, newest first
/// - `GET /jobs/:id` - Get a single job
/// - `GET /jobs/:id/status` - Get a job's lifecycle status
///
/// ## System (open)
/// - `GET /` - Service info
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
///
/// Job routes require an X-Username header naming an allowed user, and an
/// X-Api-Token header when a token is configured. System routes are open.
pub fn create_router(service: Arc<DownloadService>, config: Arc<Config>) -> Router {
    let state = AppState::new(service, config.clone());

    // Job routes sit behind identity and (optionally) token checks
    let mut protected = Router::new()
        .route("/download", post(routes::submit_job))
        .route("/jobs", get(routes::list_jobs))
        .route("/jobs/:id", get(routes::get_job))
        .route("/jobs/:id/status", get(routes::get_job_status))
        .route_layer(middleware::from_fn_with_state(
            config.clone(),
            auth::require_user,
        ));

    // Token check is the outer layer, so a bad token rejects before the
    // username is inspected. route_layer keeps unmatched paths out of the
    // auth middleware so they still fall through to 404.
    if config.api.api_token.is_some() {
        protected = protected.route_layer(middleware::from_fn_with_state(
            config.api.api_token.clone(),
            auth::require_api_token,
        ));
    }

    let router = Router::new()
        .route("/", get(routes::service_info))
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .merge(protected);

    // Merge Swagger UI routes if enabled in config (before applying state).
    // SwaggerUi serves its own copy of the spec under /api-docs to avoid
    // colliding with the /openapi.json route above.
    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state);

    // Apply CORS middleware if enabled in config
    if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// An empty list or a literal "*" allows any origin; otherwise only the
/// listed origins are allowed. All methods and headers are permitted either
/// way.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Binds a TCP listener and serves the router until the server stops, either
/// due to an error or shutdown.
pub async fn start_api_server(service: Arc<DownloadService>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(service, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
