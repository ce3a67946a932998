//! JWT authentication.
//!
//! Tokens are issued by the surrounding platform; this service validates them
//! and exposes the caller's identity and roles. Token generation exists for
//! tooling and tests.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::info;

use crate::config::JwtConfig;

/// Role allowed to read settings and watches.
pub const ROLE_VIEWER: &str = "viewer";
/// Role allowed to change watches.
pub const ROLE_TESTER: &str = "tester";
/// Role allowed to do anything, including acting on behalf of others.
pub const ROLE_ADMIN: &str = "admin";

/// Team roles carry this suffix, e.g. `perf-team`.
pub const TEAM_ROLE_SUFFIX: &str = "-team";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// Plain roles and team roles
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    /// Expiration timestamp (Unix)
    pub exp: u64,
    /// Issued at timestamp (Unix)
    pub iat: u64,
}

impl Claims {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    /// Teams the caller belongs to, taken from its team roles.
    pub fn teams(&self) -> impl Iterator<Item = &str> {
        self.roles
            .iter()
            .map(String::as_str)
            .filter(|r| r.ends_with(TEAM_ROLE_SUFFIX))
    }

    /// Whether the caller may manage the settings owned by `name`.
    ///
    /// A user may act as itself; acting as a team requires holding that
    /// team's role. Admins may act as anyone.
    pub fn can_act_as(&self, name: &str, is_team: bool) -> bool {
        if self.is_admin() {
            return true;
        }
        if is_team {
            name.ends_with(TEAM_ROLE_SUFFIX) && self.has_role(name)
        } else {
            self.sub == name
        }
    }
}

/// JWT service error types.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
    #[error("Token validation failed: {0}")]
    TokenValidation(String),
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token")]
    InvalidToken,
}

/// JWT service for token validation and generation.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    expiration: Duration,
}

impl JwtService {
    pub fn new(secret: &str, issuer: &str, audience: &str, expiration: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            expiration,
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        info!(
            "JWT service initialized (issuer: {}, audience: {}, expiration: {}s)",
            config.issuer,
            config.audience,
            config.expiration.as_secs()
        );
        Self::new(&config.secret, &config.issuer, &config.audience, config.expiration)
    }

    /// Issue a token for `username` with `roles`.
    pub fn generate_token(&self, username: &str, roles: &[&str]) -> Result<String, JwtError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))?
            .as_secs();

        let claims = Claims {
            sub: username.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: now + self.expiration.as_secs(),
            iat: now,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Validate a token and extract its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidToken,
                _ => JwtError::TokenValidation(e.to_string()),
            })
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration", &self.expiration)
            .finish()
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_token_round_trips_identity(
            username in "[a-zA-Z0-9_-]{1,50}",
            roles in prop::collection::vec("[a-z]{1,12}(-team)?", 0..5),
        ) {
            let service = JwtService::new(
                "test-secret-key-32-chars-long!!",
                "test-issuer",
                "test-audience",
                Duration::from_secs(3600),
            );
            let role_refs: Vec<&str> = roles.iter().map(String::as_str).collect();

            let token = service.generate_token(&username, &role_refs).unwrap();
            let claims = service.validate_token(&token).unwrap();

            prop_assert_eq!(&claims.sub, &username);
            prop_assert_eq!(&claims.roles, &roles);
        }

        #[test]
        fn prop_non_admin_never_acts_as_other_user(
            me in "[a-z]{1,10}",
            other in "[a-z]{1,10}",
            roles in prop::collection::vec("(viewer|tester|[a-z]{1,8}-team)", 0..4),
        ) {
            prop_assume!(me != other);
            let claims = Claims {
                sub: me,
                roles,
                iss: String::new(),
                aud: String::new(),
                exp: 0,
                iat: 0,
            };
            prop_assert!(!claims.can_act_as(&other, false));
        }
    }
}
