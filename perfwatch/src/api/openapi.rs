//! OpenAPI documentation configuration.
//!
//! The generated document is served as JSON at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::api::models::{
    ComponentHealth, HealthResponse, LivenessResponse, LoggingConfigResponse, ModuleInfo,
    TestNotificationResponse, UpdateLogFilterRequest,
};
use crate::domain::{NotificationSettings, Watch};

/// OpenAPI documentation for the perfwatch API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "perfwatch API",
        version = "0.1.0",
        description = "Notification settings, test subscriptions and delivery method management for performance test results.",
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "health", description = "Health check endpoints for monitoring and orchestration"),
        (name = "notifications", description = "Delivery methods and notification settings"),
        (name = "subscriptions", description = "Users and teams watching a test"),
        (name = "teams", description = "Team membership used to notify members of watching teams"),
        (name = "logging", description = "Logging configuration endpoints")
    ),
    paths(
        // Health endpoints
        crate::api::routes::health::health_check,
        crate::api::routes::health::liveness_check,
        // Notification endpoints
        crate::api::routes::notifications::list_methods,
        crate::api::routes::notifications::get_settings,
        crate::api::routes::notifications::update_settings,
        crate::api::routes::notifications::test_notifications,
        // Subscription endpoints
        crate::api::routes::subscriptions::get_watch,
        crate::api::routes::subscriptions::update_watch,
        crate::api::routes::subscriptions::add_name,
        crate::api::routes::subscriptions::remove_name,
        // Team endpoints
        crate::api::routes::teams::list_members,
        crate::api::routes::teams::add_member,
        crate::api::routes::teams::remove_member,
        // Logging endpoints
        crate::api::routes::logging::get_logging_config,
        crate::api::routes::logging::update_logging_config,
    ),
    components(
        schemas(
            HealthResponse,
            ComponentHealth,
            LivenessResponse,
            crate::api::error::ApiErrorResponse,
            NotificationSettings,
            TestNotificationResponse,
            Watch,
            UpdateLogFilterRequest,
            LoggingConfigResponse,
            ModuleInfo,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme addon for Bearer JWT authentication.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
