//! API request and response DTOs.
//!
//! Domain types that are already serializable (`NotificationSettings`,
//! `Watch`) are exposed directly; this module holds the wrappers around them.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// ============================================================================
// Notification DTOs
// ============================================================================

/// Owner of a settings collection.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SettingsQuery {
    /// Username or team name
    pub name: String,
    /// Whether `name` is a team
    #[serde(default)]
    pub team: bool,
}

/// Selects which plugin a self-test targets.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TestNotificationQuery {
    /// Method name; every registered plugin is tested when absent
    pub method: Option<String>,
}

/// Outcome of a successful self-test run.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TestNotificationResponse {
    /// Methods that were exercised
    pub tested: Vec<String>,
}

// ============================================================================
// Logging DTOs
// ============================================================================

/// Request to update the log filter.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLogFilterRequest {
    pub filter: String,
}

/// Current logging configuration.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoggingConfigResponse {
    pub filter: String,
    pub available_modules: Vec<ModuleInfo>,
}

/// A log target that can be tuned.
#[derive(Debug, Serialize, ToSchema)]
pub struct ModuleInfo {
    pub name: String,
    pub description: String,
}

// ============================================================================
// Health DTOs
// ============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub components: Vec<ComponentHealth>,
}

/// Component health status.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Liveness check response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LivenessResponse {
    /// Always "alive" if responding
    pub status: String,
    pub uptime_secs: u64,
}
