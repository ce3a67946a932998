//! Database models for perfwatch.
//!
//! These models map directly to the database schema.

pub mod notification;
pub mod watch;

pub use notification::*;
pub use watch::*;
