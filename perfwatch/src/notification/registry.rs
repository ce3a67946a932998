//! Delivery plugin registry.
//!
//! Built once at startup from the enabled plugins and shared read-only.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use super::channels::{
    DeliveryPlugin, EmailConfig, EmailPlugin, LoggingMailer, WebhookConfig, WebhookPlugin,
};
use crate::{Error, Result};

/// Maps method names to delivery plugins.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: HashMap<&'static str, Arc<dyn DeliveryPlugin>>,
}

impl PluginRegistry {
    /// Register every plugin under its method name. On a name collision the
    /// later plugin replaces the earlier one.
    pub fn new(plugins: impl IntoIterator<Item = Arc<dyn DeliveryPlugin>>) -> Self {
        let mut map: HashMap<&'static str, Arc<dyn DeliveryPlugin>> = HashMap::new();
        for plugin in plugins {
            let method = plugin.method();
            if map.insert(method, plugin).is_some() {
                warn!(method, "Duplicate delivery plugin registered; keeping the last one");
            }
        }
        info!(count = map.len(), "Delivery plugins registered");
        Self { plugins: map }
    }

    /// Build the registry for the configured method names.
    ///
    /// Email goes through [`LoggingMailer`] until a relay is wired in.
    pub fn from_methods(
        methods: &[String],
        email: &EmailConfig,
        webhook: &WebhookConfig,
    ) -> Result<Self> {
        let mut plugins: Vec<Arc<dyn DeliveryPlugin>> = Vec::with_capacity(methods.len());
        for method in methods {
            match method.as_str() {
                EmailPlugin::METHOD => plugins.push(Arc::new(EmailPlugin::new(
                    email.clone(),
                    Arc::new(LoggingMailer),
                ))),
                WebhookPlugin::METHOD => plugins.push(Arc::new(WebhookPlugin::new(webhook.clone())?)),
                other => {
                    return Err(Error::config(format!("Unknown notification method '{}'", other)));
                }
            }
        }
        Ok(Self::new(plugins))
    }

    pub fn get(&self, method: &str) -> Option<&Arc<dyn DeliveryPlugin>> {
        self.plugins.get(method)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.plugins.contains_key(method)
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.plugins.keys().map(|m| m.to_string()).collect();
        methods.sort();
        methods
    }

    /// Plugins ordered by method name.
    pub fn plugins(&self) -> Vec<&Arc<dyn DeliveryPlugin>> {
        let mut plugins: Vec<_> = self.plugins.iter().collect();
        plugins.sort_by_key(|(method, _)| **method);
        plugins.into_iter().map(|(_, plugin)| plugin).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::channels::Notification;
    use async_trait::async_trait;

    struct NamedPlugin {
        method: &'static str,
        tag: &'static str,
    }

    #[async_trait]
    impl DeliveryPlugin for NamedPlugin {
        fn method(&self) -> &'static str {
            self.method
        }

        fn create(&self, _recipient: &str, _data: &str) -> Result<Box<dyn Notification>> {
            Err(crate::Error::Other(self.tag.to_string()))
        }

        async fn test(&self, _data: &str) -> Result<()> {
            Ok(())
        }
    }

    fn plugin(method: &'static str, tag: &'static str) -> Arc<dyn DeliveryPlugin> {
        Arc::new(NamedPlugin { method, tag })
    }

    #[test]
    fn test_methods_sorted() {
        let registry = PluginRegistry::new(vec![plugin("webhook", "w"), plugin("email", "e")]);
        assert_eq!(registry.methods(), vec!["email", "webhook"]);
        assert!(registry.contains("email"));
        assert!(!registry.contains("sms"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_last_registered_wins() {
        let registry = PluginRegistry::new(vec![plugin("email", "first"), plugin("email", "second")]);
        assert_eq!(registry.len(), 1);

        let err = registry.get("email").unwrap().create("alice", "").err().unwrap();
        assert_eq!(err.to_string(), "second");
    }

    #[test]
    fn test_from_methods() {
        crate::utils::http_client::install_rustls_provider();
        let registry = PluginRegistry::from_methods(
            &["webhook".to_string(), "email".to_string()],
            &EmailConfig::default(),
            &WebhookConfig::default(),
        )
        .unwrap();
        assert_eq!(registry.methods(), vec!["email", "webhook"]);

        let err = PluginRegistry::from_methods(
            &["pager".to_string()],
            &EmailConfig::default(),
            &WebhookConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("pager"));
    }

    #[test]
    fn test_empty_registry() {
        let registry = PluginRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.methods().is_empty());
    }
}
