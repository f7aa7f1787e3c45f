use async_trait::async_trait;
use log::{debug, error, warn};
use std::sync::Arc;

use super::sync_settings_model::{SyncSettings, SyncSettingsUpdate};
use super::sync_settings_traits::{SyncSettingsRepositoryTrait, SyncSettingsServiceTrait};
use crate::errors::{Error, Result};
use crate::sync::{parse_domains, DomainSet, SyncDomain};

pub struct SyncSettingsService {
    repository: Arc<dyn SyncSettingsRepositoryTrait>,
}

impl SyncSettingsService {
    pub fn new(repository: Arc<dyn SyncSettingsRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl SyncSettingsServiceTrait for SyncSettingsService {
    fn resolve_domains(
        &self,
        tenant_id: &str,
        explicit_domains: Option<&[String]>,
    ) -> Result<DomainSet> {
        if let Some(requested) = explicit_domains.filter(|d| !d.is_empty()) {
            let (domains, dropped) = parse_domains(requested);
            if !dropped.is_empty() {
                warn!(
                    "Ignoring unknown sync domains {:?} for tenant {}",
                    dropped, tenant_id
                );
            }
            if !domains.is_empty() {
                return Ok(domains);
            }
            debug!(
                "No recognized explicit domains for tenant {}, using stored settings",
                tenant_id
            );
        }

        let settings = self.repository.get(tenant_id).map_err(|e| {
            error!("Failed to load sync settings for tenant {}: {}", tenant_id, e);
            Error::Configuration(format!(
                "Failed to load sync settings for tenant {}: {}",
                tenant_id, e
            ))
        })?;

        let Some(settings) = settings else {
            return Ok(SyncDomain::all());
        };

        let domains = settings.enabled_domains();
        if domains.is_empty() {
            return Err(Error::Configuration(format!(
                "No synchronization domains enabled for tenant {}",
                tenant_id
            )));
        }
        Ok(domains)
    }

    async fn get_settings(&self, tenant_id: &str) -> Result<SyncSettings> {
        if let Some(settings) = self.repository.get(tenant_id)? {
            return Ok(settings);
        }
        debug!("Creating default sync settings for tenant {}", tenant_id);
        self.repository
            .upsert(SyncSettings::new_default(tenant_id))
            .await
    }

    async fn update_settings(
        &self,
        tenant_id: &str,
        update: SyncSettingsUpdate,
    ) -> Result<SyncSettings> {
        update.validate()?;
        let mut settings = self
            .repository
            .get(tenant_id)?
            .unwrap_or_else(|| SyncSettings::new_default(tenant_id));
        update.apply_to(&mut settings);
        self.repository.upsert(settings).await
    }

    fn list_auto_sync_tenants(&self) -> Result<Vec<SyncSettings>> {
        self.repository.list_auto_sync_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DatabaseError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockSyncSettingsRepository {
        rows: Mutex<HashMap<String, SyncSettings>>,
        fail_reads: bool,
    }

    #[async_trait]
    impl SyncSettingsRepositoryTrait for MockSyncSettingsRepository {
        fn get(&self, tenant_id: &str) -> Result<Option<SyncSettings>> {
            if self.fail_reads {
                return Err(DatabaseError::ConnectionFailed("pool exhausted".into()).into());
            }
            Ok(self.rows.lock().unwrap().get(tenant_id).cloned())
        }

        async fn upsert(&self, settings: SyncSettings) -> Result<SyncSettings> {
            self.rows
                .lock()
                .unwrap()
                .insert(settings.tenant_id.clone(), settings.clone());
            Ok(settings)
        }

        fn list_auto_sync_enabled(&self) -> Result<Vec<SyncSettings>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.auto_sync)
                .cloned()
                .collect())
        }
    }

    fn service_with(rows: Vec<SyncSettings>) -> SyncSettingsService {
        let repo = MockSyncSettingsRepository::default();
        for row in rows {
            repo.rows.lock().unwrap().insert(row.tenant_id.clone(), row);
        }
        SyncSettingsService::new(Arc::new(repo))
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_explicit_domains_are_validated() {
        let svc = service_with(vec![]);
        let requested = strings(&["prices", "bogus"]);

        let domains = svc.resolve_domains("t1", Some(&requested)).unwrap();
        assert_eq!(domains, DomainSet::from([SyncDomain::Prices]));
    }

    #[test]
    fn test_no_settings_row_means_all_domains() {
        let svc = service_with(vec![]);
        assert_eq!(svc.resolve_domains("t1", None).unwrap(), SyncDomain::all());
        assert_eq!(
            svc.resolve_domains("t1", Some(&[])).unwrap(),
            SyncDomain::all()
        );
    }

    #[test]
    fn test_unrecognized_explicit_domains_fall_through_to_settings() {
        let mut settings = SyncSettings::new_default("t1");
        settings.sync_prices = false;
        settings.sync_products = false;
        let svc = service_with(vec![settings]);
        let requested = strings(&["bogus"]);

        let domains = svc.resolve_domains("t1", Some(&requested)).unwrap();
        assert_eq!(
            domains,
            DomainSet::from([SyncDomain::Inventory, SyncDomain::Orders])
        );
    }

    #[test]
    fn test_all_flags_disabled_is_configuration_error() {
        let mut settings = SyncSettings::new_default("t1");
        settings.sync_inventory = false;
        settings.sync_prices = false;
        settings.sync_orders = false;
        settings.sync_products = false;
        let svc = service_with(vec![settings]);

        let err = svc.resolve_domains("t1", None).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_lookup_failure_is_configuration_error() {
        let svc = SyncSettingsService::new(Arc::new(MockSyncSettingsRepository {
            fail_reads: true,
            ..Default::default()
        }));

        let err = svc.resolve_domains("t1", None).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_explicit_domains_skip_settings_lookup() {
        let svc = SyncSettingsService::new(Arc::new(MockSyncSettingsRepository {
            fail_reads: true,
            ..Default::default()
        }));
        let requested = strings(&["orders"]);

        let domains = svc.resolve_domains("t1", Some(&requested)).unwrap();
        assert_eq!(domains, DomainSet::from([SyncDomain::Orders]));
    }

    #[tokio::test]
    async fn test_get_settings_creates_defaults() {
        let svc = service_with(vec![]);

        let settings = svc.get_settings("t1").await.unwrap();

        assert_eq!(settings.tenant_id, "t1");
        assert!(settings.sync_inventory && settings.sync_products);
        assert!(!settings.auto_sync);
        assert_eq!(settings.sync_interval_minutes, 60);
        assert_eq!(svc.get_settings("t1").await.unwrap(), settings);
    }

    #[tokio::test]
    async fn test_update_settings_applies_partial_patch() {
        let svc = service_with(vec![SyncSettings::new_default("t1")]);

        let updated = svc
            .update_settings(
                "t1",
                SyncSettingsUpdate {
                    sync_orders: Some(false),
                    auto_sync: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!updated.sync_orders);
        assert!(updated.sync_prices);
        assert!(updated.auto_sync);
        assert_eq!(svc.list_auto_sync_tenants().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_settings_rejects_short_interval() {
        let svc = service_with(vec![]);
        let err = svc
            .update_settings(
                "t1",
                SyncSettingsUpdate {
                    sync_interval_minutes: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
