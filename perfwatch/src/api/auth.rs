//! Role checks for authenticated handlers.

use crate::api::error::{ApiError, ApiResult};
use crate::api::jwt::Claims;

/// Fail with 403 unless the caller holds at least one of `roles`.
pub fn require_any_role(claims: &Claims, roles: &[&str]) -> ApiResult<()> {
    if claims.has_any_role(roles) {
        Ok(())
    } else {
        tracing::debug!(user = %claims.sub, required = ?roles, "Missing required role");
        Err(ApiError::forbidden(format!(
            "This operation requires one of the roles: {}",
            roles.join(", ")
        )))
    }
}

/// Fail with 403 unless the caller may act as the owner `name`.
pub fn require_act_as(claims: &Claims, name: &str, is_team: bool) -> ApiResult<()> {
    if claims.can_act_as(name, is_team) {
        Ok(())
    } else {
        let kind = if is_team { "team" } else { "user" };
        Err(ApiError::forbidden(format!(
            "User {} cannot manage notifications of {} {}",
            claims.sub, kind, name
        )))
    }
}
