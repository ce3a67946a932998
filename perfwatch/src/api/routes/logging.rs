//! Logging configuration routes (admin only).

use axum::{Extension, Json, Router, extract::State, routing::get};

use crate::api::auth::require_any_role;
use crate::api::error::{ApiError, ApiResult};
use crate::api::jwt::{Claims, ROLE_ADMIN};
use crate::api::models::{LoggingConfigResponse, ModuleInfo, UpdateLogFilterRequest};
use crate::api::server::AppState;
use crate::logging::{LoggingConfig, available_modules};

/// Create the logging router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_logging_config).put(update_logging_config))
}

fn logging_config(state: &AppState) -> ApiResult<&LoggingConfig> {
    state
        .logging_config
        .as_deref()
        .ok_or_else(|| ApiError::service_unavailable("Logging configuration not available"))
}

fn response(filter: String) -> LoggingConfigResponse {
    let available_modules = available_modules()
        .into_iter()
        .map(|(name, desc)| ModuleInfo {
            name: name.to_string(),
            description: desc.to_string(),
        })
        .collect();
    LoggingConfigResponse {
        filter,
        available_modules,
    }
}

#[utoipa::path(
    get,
    path = "/api/logging",
    tag = "logging",
    responses(
        (status = 200, description = "Logging configuration", body = LoggingConfigResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_logging_config(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<LoggingConfigResponse>> {
    require_any_role(&claims, &[ROLE_ADMIN])?;
    let config = logging_config(&state)?;
    Ok(Json(response(config.get_filter())))
}

#[utoipa::path(
    put,
    path = "/api/logging",
    tag = "logging",
    request_body = UpdateLogFilterRequest,
    responses(
        (status = 200, description = "Logging configuration updated", body = LoggingConfigResponse),
        (status = 400, description = "Invalid filter", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_logging_config(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<UpdateLogFilterRequest>,
) -> ApiResult<Json<LoggingConfigResponse>> {
    require_any_role(&claims, &[ROLE_ADMIN])?;
    let config = logging_config(&state)?;

    config.set_filter(&request.filter)?;
    tracing::info!(user = %claims.sub, filter = %request.filter, "Log filter changed via API");

    Ok(Json(response(request.filter)))
}
