//! Repository layer for database access.
//!
//! Every table group sits behind a trait so services can be exercised
//! against in-memory fakes as well as SQLite.

pub mod notification;
pub mod team;
pub mod watch;

pub use notification::*;
pub use team::*;
pub use test::*;
pub use watch::*;
