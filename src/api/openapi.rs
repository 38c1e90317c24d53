//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the tardis-dl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the tardis-dl REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "tardis-dl REST API",
        version = "0.1.0",
        description = "REST API for submitting and monitoring historical market data download jobs",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Jobs
        crate::api::routes::submit_job,
        crate::api::routes::list_jobs,
        crate::api::routes::get_job,
        crate::api::routes::get_job_status,

        // System
        crate::api::routes::service_info,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::JobStatus,
        crate::types::DownloadRequest,
        crate::types::JobInfo,
        crate::types::JobSubmitResponse,
        crate::types::JobListResponse,
        crate::types::JobStatusResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "jobs", description = "Download jobs - Submit and monitor historical data downloads"),
        (name = "system", description = "System endpoints - Service info, health checks, OpenAPI spec"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security addon to add the API token and username header schemes to the spec
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "api_token",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Api-Token"),
                    ),
                ),
            );
            components.add_security_scheme(
                "username",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Username"),
                    ),
                ),
            );
        }
    }
}
