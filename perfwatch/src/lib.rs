//! perfwatch library crate.
//!
//! Notification backend for a performance test results tracker: watches,
//! notification settings, delivery plugins and the REST API over them.

pub mod api;
pub mod config;
pub mod database;
pub mod domain;
pub mod error;
pub mod logging;
pub mod notification;
pub mod utils;

pub use error::{Error, Result};
