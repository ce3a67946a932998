//! Tracing setup: console plus a daily rolling file, behind an `EnvFilter`
//! that admins can swap at runtime through the API.

use chrono::{Local, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    reload::{self, Handle},
    util::SubscriberInitExt,
};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "perfwatch=info,sqlx=warn";

/// Rolling log file prefix; rotated files get a `.YYYY-MM-DD` suffix.
const LOG_FILE_PREFIX: &str = "perfwatch.log";

/// Rotated files older than this many days are deleted.
const LOG_RETENTION_DAYS: i64 = 7;

const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Timestamps in the server's local timezone.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Reload handle for the active filter.
pub type FilterHandle = Handle<EnvFilter, Registry>;

/// Handle on the live logging configuration.
pub struct LoggingConfig {
    handle: FilterHandle,
    log_dir: PathBuf,
}

impl LoggingConfig {
    pub fn new(handle: FilterHandle, log_dir: PathBuf) -> Self {
        Self { handle, log_dir }
    }

    /// Current filter directive string.
    pub fn get_filter(&self) -> String {
        self.handle
            .with_current(|filter| filter.to_string())
            .unwrap_or_default()
    }

    /// Replace the filter, e.g. with `"perfwatch=debug,sqlx=warn"`.
    pub fn set_filter(&self, directive: &str) -> crate::Result<()> {
        let new_filter = EnvFilter::try_new(directive)
            .map_err(|e| crate::Error::validation(format!("Invalid filter directive: {}", e)))?;

        self.handle
            .reload(new_filter)
            .map_err(|e| crate::Error::Other(format!("Failed to reload filter: {}", e)))?;

        info!(directive = %directive, "Log filter updated");
        Ok(())
    }

    /// Prune rotated log files once a day until `cancel_token` fires.
    pub fn start_retention_cleanup(self: &Arc<Self>, cancel_token: CancellationToken) {
        let log_dir = self.log_dir.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(RETENTION_SWEEP_INTERVAL);
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = cleanup_old_logs(&log_dir, LOG_RETENTION_DAYS).await {
                            warn!(dir = %log_dir.display(), error = %e, "Log retention sweep failed");
                        }
                    }
                }
            }
            debug!("Log retention task stopped");
        });
    }
}

/// Date encoded in a rotated log file name, if it is one of ours.
fn rotated_file_date(filename: &str) -> Option<chrono::NaiveDate> {
    let date_str = filename.strip_prefix(LOG_FILE_PREFIX)?.strip_prefix('.')?;
    chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()
}

/// Delete rotated log files dated before the retention window.
async fn cleanup_old_logs(log_dir: &Path, retention_days: i64) -> std::io::Result<()> {
    let cutoff = (Utc::now() - chrono::Duration::days(retention_days)).date_naive();

    let mut expired = Vec::new();
    let mut entries = tokio::fs::read_dir(log_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let dated = entry.file_name().to_str().and_then(rotated_file_date);
        if dated.is_some_and(|date| date < cutoff) && entry.file_type().await?.is_file() {
            expired.push(entry.path());
        }
    }

    for path in &expired {
        tokio::fs::remove_file(path).await?;
        debug!(path = %path.display(), "Removed expired log file");
    }
    if !expired.is_empty() {
        info!(count = expired.len(), "Log retention sweep removed files");
    }
    Ok(())
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over [`DEFAULT_LOG_FILTER`]. Keep the returned
/// guard alive for the lifetime of the process or buffered file output is lost.
pub fn init_logging(log_dir: &str) -> crate::Result<(Arc<LoggingConfig>, WorkerGuard)> {
    let log_path = PathBuf::from(log_dir);
    std::fs::create_dir_all(&log_path)?;

    let file_appender = tracing_appender::rolling::daily(&log_path, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let initial_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let (filter_layer, filter_handle) = reload::Layer::new(initial_filter);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_ansi(true).with_timer(LocalTimer))
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_timer(LocalTimer),
        )
        .try_init()
        .map_err(|e| {
            crate::Error::Other(format!("Failed to set global default subscriber: {}", e))
        })?;

    let config = Arc::new(LoggingConfig::new(filter_handle, log_path));

    Ok((config, guard))
}

/// Log targets worth tuning, with a short description each.
pub fn available_modules() -> Vec<(&'static str, &'static str)> {
    vec![
        ("perfwatch", "Main application"),
        ("perfwatch::notification", "Notification dispatch and delivery"),
        ("perfwatch::api", "REST API"),
        ("sqlx", "Database queries"),
        ("reqwest", "HTTP requests"),
        ("tower_http", "HTTP middleware"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A config backed by a standalone reload layer, not installed globally.
    fn detached_config() -> LoggingConfig {
        let (_layer, handle) = reload::Layer::<EnvFilter, Registry>::new(EnvFilter::new(DEFAULT_LOG_FILTER));
        LoggingConfig::new(handle, PathBuf::from("logs"))
    }

    #[test]
    fn test_default_filter() {
        assert!(DEFAULT_LOG_FILTER.contains("perfwatch=info"));
        assert!(DEFAULT_LOG_FILTER.contains("sqlx=warn"));
    }

    #[test]
    fn test_rotated_file_date() {
        assert_eq!(
            rotated_file_date("perfwatch.log.2025-03-01"),
            chrono::NaiveDate::from_ymd_opt(2025, 3, 1)
        );
        assert!(rotated_file_date("perfwatch.log").is_none());
        assert!(rotated_file_date("other.log.2025-03-01").is_none());
    }

    #[test]
    fn test_invalid_directive_rejected() {
        let config = detached_config();
        let err = config.set_filter("perfwatch=loud").unwrap_err();
        assert!(matches!(err, crate::Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_cleanup_old_logs() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path();
        let old = dir.join("perfwatch.log.2000-01-01");
        let today = dir.join(format!("perfwatch.log.{}", Utc::now().format("%Y-%m-%d")));
        let unrelated = dir.join("notes.txt");
        for path in [&old, &today, &unrelated] {
            tokio::fs::write(path, b"x").await.unwrap();
        }

        cleanup_old_logs(dir, LOG_RETENTION_DAYS).await.unwrap();

        assert!(!old.exists());
        assert!(today.exists());
        assert!(unrelated.exists());
    }
}
