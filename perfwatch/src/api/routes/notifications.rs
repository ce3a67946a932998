//! Notification settings and delivery method routes.
//!
//! # Endpoints
//!
//! - `GET /api/notifications/methods` - Registered delivery methods (public)
//! - `GET /api/notifications/settings` - Settings of a user or team
//! - `POST /api/notifications/settings` - Replace settings of a user or team
//! - `POST /api/notifications/test` - Send test notifications (admin)

use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::api::auth::{require_act_as, require_any_role};
use crate::api::error::ApiResult;
use crate::api::jwt::{Claims, ROLE_ADMIN, ROLE_TESTER, ROLE_VIEWER};
use crate::api::models::{SettingsQuery, TestNotificationQuery, TestNotificationResponse};
use crate::api::server::AppState;
use crate::domain::NotificationSettings;

const SETTINGS_ROLES: &[&str] = &[ROLE_VIEWER, ROLE_TESTER, ROLE_ADMIN];

/// Routes that require authentication. `/methods` is mounted separately.
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings).post(update_settings))
        .route("/test", post(test_notifications))
}

#[utoipa::path(
    get,
    path = "/api/notifications/methods",
    tag = "notifications",
    responses(
        (status = 200, description = "Registered delivery methods", body = Vec<String>)
    )
)]
pub async fn list_methods(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.notification_service.methods())
}

#[utoipa::path(
    get,
    path = "/api/notifications/settings",
    tag = "notifications",
    params(SettingsQuery),
    responses(
        (status = 200, description = "Notification settings", body = Vec<NotificationSettings>),
        (status = 403, description = "Caller may not act as the owner", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<SettingsQuery>,
) -> ApiResult<Json<Vec<NotificationSettings>>> {
    require_any_role(&claims, SETTINGS_ROLES)?;
    require_act_as(&claims, &query.name, query.team)?;

    let settings = state
        .notification_service
        .settings(&query.name, query.team)
        .await?;
    Ok(Json(settings))
}

#[utoipa::path(
    post,
    path = "/api/notifications/settings",
    tag = "notifications",
    params(SettingsQuery),
    request_body = Vec<NotificationSettings>,
    responses(
        (status = 204, description = "Settings replaced"),
        (status = 400, description = "Unknown delivery method", body = crate::api::error::ApiErrorResponse),
        (status = 403, description = "Caller may not act as the owner", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<SettingsQuery>,
    Json(settings): Json<Vec<NotificationSettings>>,
) -> ApiResult<axum::http::StatusCode> {
    require_any_role(&claims, SETTINGS_ROLES)?;
    require_act_as(&claims, &query.name, query.team)?;

    state
        .notification_service
        .update_settings(&query.name, query.team, settings)
        .await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/notifications/test",
    tag = "notifications",
    params(TestNotificationQuery),
    request_body(content = String, content_type = "text/plain", description = "Plugin configuration to test with"),
    responses(
        (status = 200, description = "Test notifications sent", body = TestNotificationResponse),
        (status = 400, description = "Unknown method or failed delivery", body = crate::api::error::ApiErrorResponse),
        (status = 403, description = "Admin role required", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn test_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<TestNotificationQuery>,
    data: String,
) -> ApiResult<Json<TestNotificationResponse>> {
    require_any_role(&claims, &[ROLE_ADMIN])?;

    let method = query.method.as_deref().filter(|m| !m.is_empty());
    state
        .notification_service
        .test_notifications(method, &data)
        .await?;

    let tested = match method {
        Some(method) => vec![method.to_string()],
        None => state.notification_service.methods(),
    };
    Ok(Json(TestNotificationResponse { tested }))
}
