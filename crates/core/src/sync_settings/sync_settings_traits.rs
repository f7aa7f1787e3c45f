use async_trait::async_trait;

use super::sync_settings_model::{SyncSettings, SyncSettingsUpdate};
use crate::errors::Result;
use crate::sync::DomainSet;

/// Persistence for tenant sync settings.
#[async_trait]
pub trait SyncSettingsRepositoryTrait: Send + Sync {
    /// The tenant's row, if any.
    fn get(&self, tenant_id: &str) -> Result<Option<SyncSettings>>;

    /// Inserts or replaces the tenant's row.
    async fn upsert(&self, settings: SyncSettings) -> Result<SyncSettings>;

    fn list_auto_sync_enabled(&self) -> Result<Vec<SyncSettings>>;
}

/// Resolves and manages what a tenant synchronizes.
#[async_trait]
pub trait SyncSettingsServiceTrait: Send + Sync {
    /// Resolves the domains for a run.
    ///
    /// Recognized explicit domains win. Otherwise the tenant's enabled flags
    /// apply, or every domain when the tenant has no settings row. Fails with
    /// `Error::Configuration` when the lookup errors or nothing is enabled.
    fn resolve_domains(
        &self,
        tenant_id: &str,
        explicit_domains: Option<&[String]>,
    ) -> Result<DomainSet>;

    /// Returns the tenant's settings, creating the defaults on first access.
    async fn get_settings(&self, tenant_id: &str) -> Result<SyncSettings>;

    async fn update_settings(
        &self,
        tenant_id: &str,
        update: SyncSettingsUpdate,
    ) -> Result<SyncSettings>;

    /// Settings of every tenant with auto-sync turned on.
    fn list_auto_sync_tenants(&self) -> Result<Vec<SyncSettings>>;
}
