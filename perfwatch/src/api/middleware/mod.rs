//! API middleware.

pub mod jwt_auth;

pub use jwt_auth::{JwtAuthLayer, JwtAuthService};
