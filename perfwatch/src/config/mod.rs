//! Application configuration.
//!
//! Everything is read from environment variables once at startup. A `.env`
//! file in the working directory is loaded first when present.

use std::time::Duration;

use crate::api::server::ApiServerConfig;
use crate::notification::channels::{EmailConfig, WebhookConfig};
use crate::{Error, Result};

const DEFAULT_DATABASE_URL: &str = "sqlite://perfwatch.db?mode=rwc";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_JWT_ISSUER: &str = "perfwatch";
const DEFAULT_JWT_AUDIENCE: &str = "perfwatch-api";
const DEFAULT_METHODS: &[&str] = &["email", "webhook"];

/// Token signing and validation settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// Lifetime of issued tokens.
    pub expiration: Duration,
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_dir: String,
    pub server: ApiServerConfig,
    pub jwt: JwtConfig,
    /// Delivery methods to register, in registration order.
    pub notification_methods: Vec<String>,
    pub email: EmailConfig,
    pub webhook: WebhookConfig,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            return Err(Error::config(format!("Failed to load .env file: {}", e)));
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret = var("JWT_SECRET")
            .ok_or_else(|| Error::config("JWT_SECRET must be set"))?;

        let mut server = ApiServerConfig::default();
        if let Some(bind_address) = var("API_BIND_ADDRESS") {
            server.bind_address = bind_address;
        }
        if let Some(port) = var("API_PORT") {
            server.port = port
                .parse()
                .map_err(|_| Error::config(format!("Invalid API_PORT '{}'", port)))?;
        }

        let notification_methods = match var("NOTIFICATION_METHODS") {
            Some(list) => parse_method_list(&list),
            None => DEFAULT_METHODS.iter().map(|m| m.to_string()).collect(),
        };

        let mut email = EmailConfig::default();
        if let Some(from) = var("SMTP_FROM_ADDRESS") {
            email.from_address = from;
        }
        if let Some(prefix) = var("NOTIFICATION_SUBJECT_PREFIX") {
            email.subject_prefix = prefix;
        }
        email.public_url = var("PUBLIC_URL").map(|u| u.trim_end_matches('/').to_string());

        let mut webhook = WebhookConfig::default();
        if let Some(timeout) = var("WEBHOOK_TIMEOUT_SECS") {
            webhook.timeout_secs = timeout.parse().map_err(|_| {
                Error::config(format!("Invalid WEBHOOK_TIMEOUT_SECS '{}'", timeout))
            })?;
        }

        let expiration_secs = match var("JWT_EXPIRATION_SECS") {
            Some(secs) => secs
                .parse()
                .map_err(|_| Error::config(format!("Invalid JWT_EXPIRATION_SECS '{}'", secs)))?,
            None => 3600,
        };

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            log_dir: var("LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()),
            server,
            jwt: JwtConfig {
                secret,
                issuer: var("JWT_ISSUER").unwrap_or_else(|| DEFAULT_JWT_ISSUER.to_string()),
                audience: var("JWT_AUDIENCE").unwrap_or_else(|| DEFAULT_JWT_AUDIENCE.to_string()),
                expiration: Duration::from_secs(expiration_secs),
            },
            notification_methods,
            email,
            webhook,
        })
    }
}

/// Split a comma separated list, dropping blanks and repeats.
fn parse_method_list(list: &str) -> Vec<String> {
    let mut methods: Vec<String> = Vec::new();
    for method in list.split(',').map(str::trim).filter(|m| !m.is_empty()) {
        let method = method.to_ascii_lowercase();
        if !methods.contains(&method) {
            methods.push(method);
        }
    }
    methods
}
