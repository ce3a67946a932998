//! Test watch (subscription) routes.
//!
//! # Endpoints
//!
//! - `GET /api/subscriptions/{test_id}` - Who watches a test
//! - `POST /api/subscriptions/{test_id}` - Replace the watch (tester/admin)
//! - `POST /api/subscriptions/{test_id}/{list}/{name}` - Add a name to a list
//! - `DELETE /api/subscriptions/{test_id}/{list}/{name}` - Remove a name from a list
//!
//! `list` is one of `users`, `teams` or `optout`. Callers may always manage
//! themselves and their own teams; anything else needs tester or admin.

use std::str::FromStr;

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::api::auth::require_any_role;
use crate::api::error::{ApiError, ApiResult};
use crate::api::jwt::{Claims, ROLE_ADMIN, ROLE_TESTER, ROLE_VIEWER, TEAM_ROLE_SUFFIX};
use crate::api::server::AppState;
use crate::database::models::WatchList;
use crate::domain::Watch;

const READ_ROLES: &[&str] = &[ROLE_VIEWER, ROLE_TESTER, ROLE_ADMIN];
const WRITE_ROLES: &[&str] = &[ROLE_TESTER, ROLE_ADMIN];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{test_id}", get(get_watch).post(update_watch))
        .route("/{test_id}/{list}/{name}", post(add_name).delete(remove_name))
}

fn parse_list(list: &str) -> ApiResult<WatchList> {
    WatchList::from_str(list)
        .map_err(|_| ApiError::bad_request(format!("Unknown watch list '{}'", list)))
}

/// Managing one's own entry needs any role; other names need a write role.
fn authorize_name(claims: &Claims, list: WatchList, name: &str) -> ApiResult<()> {
    let is_team = match list {
        WatchList::Users => false,
        WatchList::Teams => true,
        WatchList::Optout => name.ends_with(TEAM_ROLE_SUFFIX),
    };
    if claims.has_any_role(READ_ROLES) && claims.can_act_as(name, is_team) {
        return Ok(());
    }
    require_any_role(claims, WRITE_ROLES)
}

#[utoipa::path(
    get,
    path = "/api/subscriptions/{test_id}",
    tag = "subscriptions",
    params(("test_id" = i64, Path, description = "Test ID")),
    responses(
        (status = 200, description = "Watch of the test", body = Watch)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_watch(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> ApiResult<Json<Watch>> {
    require_any_role(&claims, READ_ROLES)?;
    Ok(Json(state.watch_repository.get_watch(test_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/{test_id}",
    tag = "subscriptions",
    params(("test_id" = i64, Path, description = "Test ID")),
    request_body = Watch,
    responses(
        (status = 200, description = "Updated watch", body = Watch),
        (status = 403, description = "Tester or admin role required", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_watch(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
    Json(mut watch): Json<Watch>,
) -> ApiResult<Json<Watch>> {
    require_any_role(&claims, WRITE_ROLES)?;

    watch.test_id = test_id;
    let updated = state.watch_repository.replace_watch(&watch).await?;
    tracing::info!(test_id, user = %claims.sub, "Watch updated");
    Ok(Json(updated))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/{test_id}/{list}/{name}",
    tag = "subscriptions",
    params(
        ("test_id" = i64, Path, description = "Test ID"),
        ("list" = String, Path, description = "users, teams or optout"),
        ("name" = String, Path, description = "Username or team name")
    ),
    responses(
        (status = 200, description = "Updated watch", body = Watch),
        (status = 400, description = "Unknown list", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_name(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((test_id, list, name)): Path<(i64, String, String)>,
) -> ApiResult<Json<Watch>> {
    let list = parse_list(&list)?;
    authorize_name(&claims, list, &name)?;
    Ok(Json(state.watch_repository.add_name(test_id, list, &name).await?))
}

#[utoipa::path(
    delete,
    path = "/api/subscriptions/{test_id}/{list}/{name}",
    tag = "subscriptions",
    params(
        ("test_id" = i64, Path, description = "Test ID"),
        ("list" = String, Path, description = "users, teams or optout"),
        ("name" = String, Path, description = "Username or team name")
    ),
    responses(
        (status = 200, description = "Updated watch", body = Watch),
        (status = 400, description = "Unknown list", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_name(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((test_id, list, name)): Path<(i64, String, String)>,
) -> ApiResult<Json<Watch>> {
    let list = parse_list(&list)?;
    authorize_name(&claims, list, &name)?;
    Ok(Json(state.watch_repository.remove_name(test_id, list, &name).await?))
}
