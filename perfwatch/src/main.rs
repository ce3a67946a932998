use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use perfwatch::api::jwt::JwtService;
use perfwatch::api::{ApiServer, AppState};
use perfwatch::config::AppConfig;
use perfwatch::database::{self, repositories};
use perfwatch::notification::{NotificationService, PluginRegistry};
use perfwatch::utils::http_client::install_rustls_provider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // Keep the guard alive so buffered file output is flushed on exit.
    let (logging_config, _log_guard) = perfwatch::logging::init_logging(&config.log_dir)?;
    install_rustls_provider();

    let pool = database::init_pool(&config.database_url).await?;
    let write_pool = database::init_write_pool(&config.database_url).await?;
    database::run_migrations(&write_pool).await?;
    info!(database_url = %config.database_url, "Database ready");

    let registry = PluginRegistry::from_methods(
        &config.notification_methods,
        &config.email,
        &config.webhook,
    )?;
    info!(methods = ?registry.methods(), "Notification plugins loaded");

    let notification_repo = Arc::new(repositories::SqlxNotificationRepository::new(
        pool.clone(),
        write_pool.clone(),
    ));
    let test_repo = Arc::new(repositories::SqlxTestRepository::new(pool.clone()));
    let watch_repo = Arc::new(repositories::SqlxWatchRepository::new(
        pool.clone(),
        write_pool.clone(),
    ));
    let team_repo = Arc::new(repositories::SqlxTeamRepository::new(
        pool.clone(),
        write_pool.clone(),
    ));

    let notification_service = Arc::new(NotificationService::new(
        Arc::new(registry),
        notification_repo,
        test_repo,
    ));
    let jwt_service = Arc::new(JwtService::from_config(&config.jwt));

    let state = AppState::new(jwt_service, notification_service, watch_repo, team_repo)
        .with_db_pool(pool.clone())
        .with_logging_config(logging_config.clone());

    let cancel_token = CancellationToken::new();
    logging_config.start_retention_cleanup(cancel_token.clone());

    let server = ApiServer::new(config.server.clone(), state).with_cancel_token(cancel_token.clone());
    let mut server_task = tokio::spawn(async move { server.run().await });

    let finished = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutdown signal received. Shutting down gracefully...");
            None
        }
        joined = &mut server_task => Some(joined),
    };
    cancel_token.cancel();

    let joined = match finished {
        Some(joined) => joined,
        None => server_task.await,
    };

    match joined {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "API server stopped with an error"),
        Err(e) => error!("API server task panicked: {:?}", e),
    }

    pool.close().await;
    write_pool.close().await;
    info!("perfwatch stopped");
    Ok(())
}
