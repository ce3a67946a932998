//! API server setup and configuration.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::Request;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Span, info};

use crate::api::jwt::JwtService;
use crate::api::routes;
use crate::database::DbPool;
use crate::database::repositories::{TeamRepository, WatchRepository};
use crate::{Error, Result};
use crate::logging::LoggingConfig;
use crate::notification::NotificationService;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server bind address
    pub bind_address: String,
    /// Server port
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server start time for uptime calculation
    pub start_time: Instant,
    pub jwt_service: Arc<JwtService>,
    pub notification_service: Arc<NotificationService>,
    pub watch_repository: Arc<dyn WatchRepository>,
    pub team_repository: Arc<dyn TeamRepository>,
    /// Pool checked by the health endpoint
    pub db_pool: Option<DbPool>,
    /// Logging configuration for dynamic log level changes
    pub logging_config: Option<Arc<LoggingConfig>>,
}

impl AppState {
    pub fn new(
        jwt_service: Arc<JwtService>,
        notification_service: Arc<NotificationService>,
        watch_repository: Arc<dyn WatchRepository>,
        team_repository: Arc<dyn TeamRepository>,
    ) -> Self {
        Self {
            start_time: Instant::now(),
            jwt_service,
            notification_service,
            watch_repository,
            team_repository,
            db_pool: None,
            logging_config: None,
        }
    }

    /// Set the pool used for health checks.
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Set the logging configuration.
    pub fn with_logging_config(mut self, config: Arc<LoggingConfig>) -> Self {
        self.logging_config = Some(config);
        self
    }
}

/// API server.
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
    cancel_token: CancellationToken,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: AppState) -> Self {
        Self {
            config,
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Use an externally owned token for graceful shutdown.
    pub fn with_cancel_token(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    /// Routes plus CORS and request tracing.
    pub fn build_router(&self) -> Router {
        let mut router = routes::create_router(self.state.clone());
        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        let trace = TraceLayer::new_for_http()
            .make_span_with(|req: &Request| {
                // Health checks are polled constantly.
                if req.uri().path().starts_with("/health") {
                    return Span::none();
                }
                tracing::info_span!("http", method = %req.method(), path = %req.uri().path())
            })
            .on_request(())
            .on_response(|res: &axum::http::Response<_>, latency: Duration, span: &Span| {
                if !span.is_disabled() {
                    tracing::info!(status = res.status().as_u16(), latency_ms = latency.as_millis() as u64, "Request handled");
                }
            })
            .on_failure(|class: ServerErrorsFailureClass, latency: Duration, span: &Span| {
                if !span.is_disabled() {
                    tracing::error!(%class, latency_ms = latency.as_millis() as u64, "Request failed");
                }
            });

        router.layer(trace)
    }

    /// Serve until the cancel token fires.
    pub async fn run(&self) -> Result<()> {
        let ip: IpAddr = self.config.bind_address.parse().map_err(|e| {
            Error::config(format!("Invalid bind address '{}': {}", self.config.bind_address, e))
        })?;
        let addr = SocketAddr::new(ip, self.config.port);
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "API server listening");

        let cancel_token = self.cancel_token.clone();
        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("API server draining connections");
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ApiServerConfig::default();
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert!(config.enable_cors);
    }
}
