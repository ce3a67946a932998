//! API route modules.
//!
//! Organizes routes by resource type. Everything under `/api` except the
//! method listing and the OpenAPI document requires a valid token.

pub mod health;
pub mod logging;
pub mod notifications;
pub mod subscriptions;
pub mod teams;

use axum::{Json, Router, routing::get};
use utoipa::OpenApi;

use crate::api::middleware::JwtAuthLayer;
use crate::api::openapi::ApiDoc;
use crate::api::server::AppState;

/// Create the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/api/notifications", notifications::protected_router())
        .nest("/api/subscriptions", subscriptions::router())
        .nest("/api/teams", teams::router())
        .nest("/api/logging", logging::router())
        .route_layer(JwtAuthLayer::new(state.jwt_service.clone()));

    Router::new()
        .route("/api/notifications/methods", get(notifications::list_methods))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/health", health::router())
        .merge(protected)
        .with_state(state)
}
