//! Notification dispatch.
//!
//! Routes regression-detection events to the users and teams watching a test,
//! through the delivery method each subscriber configured.
//!
//! # Example
//!
//! ```ignore
//! use perfwatch::notification::{NotificationService, PluginRegistry};
//! use perfwatch::notification::channels::{WebhookConfig, WebhookPlugin};
//!
//! let registry = PluginRegistry::new(vec![
//!     Arc::new(WebhookPlugin::new(WebhookConfig::default())?) as Arc<dyn DeliveryPlugin>,
//! ]);
//! let service = NotificationService::new(Arc::new(registry), notification_repo, test_repo);
//! service.notify_dataset_changed(&event).await?;
//! ```

pub mod channels;
pub mod events;
pub mod registry;
pub mod service;

pub use channels::{DeliveryPlugin, Notification};
pub use events::{
    Change, DatasetChangedEvent, DatasetRef, ExpectedRunEvent, MissingDatasetEvent,
    MissingValuesEvent, NotificationKind,
};
pub use registry::PluginRegistry;
pub use service::NotificationService;
