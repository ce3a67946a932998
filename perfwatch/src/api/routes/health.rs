//! Health check routes.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::api::models::{ComponentHealth, HealthResponse, LivenessResponse};
use crate::api::server::AppState;

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness_check))
}

async fn database_health(state: &AppState) -> Option<ComponentHealth> {
    let pool = state.db_pool.as_ref()?;
    let health = match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => ComponentHealth {
            name: "database".to_string(),
            status: "healthy".to_string(),
            message: None,
        },
        Err(e) => ComponentHealth {
            name: "database".to_string(),
            status: "unhealthy".to_string(),
            message: Some(e.to_string()),
        },
    };
    Some(health)
}

/// Overall health; 503 when any component is unhealthy.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "A component is unhealthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mut components = Vec::new();
    if let Some(db) = database_health(&state).await {
        components.push(db);
    }
    components.push(ComponentHealth {
        name: "notification_plugins".to_string(),
        status: "healthy".to_string(),
        message: Some(state.notification_service.methods().join(",")),
    });

    let healthy = components.iter().all(|c| c.status == "healthy");
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        components,
    };
    (status, Json(response))
}

/// Liveness check - is the service alive?
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Service is responsive", body = LivenessResponse)
    )
)]
pub async fn liveness_check(State(state): State<AppState>) -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
