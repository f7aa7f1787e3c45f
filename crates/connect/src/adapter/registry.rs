//! Registry of platform adapters keyed by platform id.

use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

use super::traits::PlatformAdapter;

#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn PlatformAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter, replacing any previous one for the same platform.
    pub fn register(&mut self, adapter: Arc<dyn PlatformAdapter>) {
        let platform_id = adapter.platform_id().to_string();
        if self
            .adapters
            .insert(platform_id.clone(), adapter)
            .is_some()
        {
            warn!("Replaced adapter for platform '{}'", platform_id);
        } else {
            debug!("Registered adapter for platform '{}'", platform_id);
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn PlatformAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, platform_id: &str) -> Option<Arc<dyn PlatformAdapter>> {
        self.adapters.get(platform_id).cloned()
    }

    /// Registered platform ids, sorted.
    pub fn platform_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.adapters.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterError;
    use async_trait::async_trait;
    use storesync_core::connections::PlatformConnection;
    use storesync_core::sync::{DomainSet, SyncCounts};

    struct FixedAdapter(&'static str, u32);

    #[async_trait]
    impl PlatformAdapter for FixedAdapter {
        fn platform_id(&self) -> &str {
            self.0
        }

        async fn sync(
            &self,
            _connection: &PlatformConnection,
            _domains: &DomainSet,
        ) -> Result<SyncCounts, AdapterError> {
            Ok(SyncCounts::new(self.1, self.1, 0))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = AdapterRegistry::new()
            .with_adapter(Arc::new(FixedAdapter("shopify", 1)))
            .with_adapter(Arc::new(FixedAdapter("etsy", 2)));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.platform_ids(), vec!["etsy", "shopify"]);
        assert!(registry.get("shopify").is_some());
        assert!(registry.get("ebay").is_none());
    }

    #[test]
    fn test_register_replaces_same_platform() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(FixedAdapter("shopify", 1)));
        registry.register(Arc::new(FixedAdapter("shopify", 2)));
        assert_eq!(registry.len(), 1);
    }
}
