//! Team membership routes.
//!
//! # Endpoints
//!
//! - `GET /api/teams/{team}/members` - List members of a team
//! - `POST /api/teams/{team}/members/{username}` - Add a member
//! - `DELETE /api/teams/{team}/members/{username}` - Remove a member
//!
//! Membership decides which users are notified when their team watches a
//! test. Only admins and holders of the team role may change it.

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::api::auth::{require_act_as, require_any_role};
use crate::api::error::{ApiError, ApiResult};
use crate::api::jwt::{Claims, ROLE_ADMIN, ROLE_TESTER, ROLE_VIEWER, TEAM_ROLE_SUFFIX};
use crate::api::server::AppState;

const READ_ROLES: &[&str] = &[ROLE_VIEWER, ROLE_TESTER, ROLE_ADMIN];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{team}/members", get(list_members))
        .route("/{team}/members/{username}", post(add_member).delete(remove_member))
}

fn check_team_name(team: &str) -> ApiResult<()> {
    if team.ends_with(TEAM_ROLE_SUFFIX) && team.len() > TEAM_ROLE_SUFFIX.len() {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "Team name must end with '{}'",
            TEAM_ROLE_SUFFIX
        )))
    }
}

fn authorize_change(claims: &Claims, team: &str) -> ApiResult<()> {
    check_team_name(team)?;
    require_act_as(claims, team, true)
}

#[utoipa::path(
    get,
    path = "/api/teams/{team}/members",
    tag = "teams",
    params(("team" = String, Path, description = "Team name")),
    responses(
        (status = 200, description = "Members of the team", body = Vec<String>),
        (status = 400, description = "Not a team name", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_members(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(team): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    require_any_role(&claims, READ_ROLES)?;
    check_team_name(&team)?;
    Ok(Json(state.team_repository.members(&team).await?))
}

#[utoipa::path(
    post,
    path = "/api/teams/{team}/members/{username}",
    tag = "teams",
    params(
        ("team" = String, Path, description = "Team name"),
        ("username" = String, Path, description = "User to add")
    ),
    responses(
        (status = 200, description = "Members after the change", body = Vec<String>),
        (status = 403, description = "Admin or team role required", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_member(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((team, username)): Path<(String, String)>,
) -> ApiResult<Json<Vec<String>>> {
    authorize_change(&claims, &team)?;

    state.team_repository.add_member(&team, &username).await?;
    tracing::info!(team = %team, member = %username, user = %claims.sub, "Team member added");
    Ok(Json(state.team_repository.members(&team).await?))
}

#[utoipa::path(
    delete,
    path = "/api/teams/{team}/members/{username}",
    tag = "teams",
    params(
        ("team" = String, Path, description = "Team name"),
        ("username" = String, Path, description = "User to remove")
    ),
    responses(
        (status = 200, description = "Members after the change", body = Vec<String>),
        (status = 403, description = "Admin or team role required", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((team, username)): Path<(String, String)>,
) -> ApiResult<Json<Vec<String>>> {
    authorize_change(&claims, &team)?;

    state.team_repository.remove_member(&team, &username).await?;
    tracing::info!(team = %team, member = %username, user = %claims.sub, "Team member removed");
    Ok(Json(state.team_repository.members(&team).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn claims(sub: &str, roles: &[&str]) -> Claims {
        Claims {
            sub: sub.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            iss: String::new(),
            aud: String::new(),
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn test_team_role_holder_may_change_membership() {
        let lead = claims("alice", &["viewer", "perf-team"]);
        assert!(authorize_change(&lead, "perf-team").is_ok());
        assert!(authorize_change(&lead, "qe-team").is_err());
    }

    #[test]
    fn test_tester_without_team_role_is_forbidden() {
        let tester = claims("bob", &["tester"]);
        let err = authorize_change(&tester, "perf-team").unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_admin_may_change_any_team() {
        let admin = claims("root", &["admin"]);
        assert!(authorize_change(&admin, "qe-team").is_ok());
    }

    #[test]
    fn test_non_team_name_is_rejected() {
        let admin = claims("root", &["admin"]);
        let err = authorize_change(&admin, "alice").unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(check_team_name("-team").is_err());
    }
}
