//! Application-wide error types.

use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// A self-test that failed for one delivery method.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SelfTestFailure {
    pub method: String,
    pub error: String,
}

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseSqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid method {0}")]
    InvalidMethod(String),

    #[error("Method {0} is not available")]
    MethodUnavailable(String),

    #[error("Delivery via {method} failed: {message}")]
    Delivery { method: String, message: String },

    #[error("{} notification self-test(s) failed", .0.len())]
    SelfTests(Vec<SelfTestFailure>),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn delivery(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delivery {
            method: method.into(),
            message: message.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_method_message() {
        let err = Error::InvalidMethod("carrier-pigeon".to_string());
        assert_eq!(err.to_string(), "Invalid method carrier-pigeon");
    }

    #[test]
    fn test_self_tests_message_counts_failures() {
        let err = Error::SelfTests(vec![
            SelfTestFailure {
                method: "email".to_string(),
                error: "bad address".to_string(),
            },
            SelfTestFailure {
                method: "webhook".to_string(),
                error: "connection refused".to_string(),
            },
        ]);
        assert_eq!(err.to_string(), "2 notification self-test(s) failed");
    }
}
