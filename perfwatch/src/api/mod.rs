//! REST API server module.
//!
//! Provides HTTP endpoints for notification settings, test subscriptions,
//! delivery method self-tests and runtime logging configuration.

pub mod auth;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod server;

pub use server::{ApiServer, ApiServerConfig, AppState};
