//! Domain layer for perfwatch.
//!
//! External representations of persisted records, shared by the services and
//! the REST API.

pub mod notification_settings;
pub mod watch;

pub use notification_settings::NotificationSettings;
pub use watch::Watch;
