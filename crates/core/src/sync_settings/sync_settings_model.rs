//! Tenant synchronization preferences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};
use crate::sync::{DomainSet, SyncDomain};

pub const DEFAULT_SYNC_INTERVAL_MINUTES: u32 = 60;
pub const MIN_SYNC_INTERVAL_MINUTES: u32 = 5;

/// Persisted per-tenant sync preferences. One row per tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    pub tenant_id: String,
    pub sync_inventory: bool,
    pub sync_prices: bool,
    pub sync_orders: bool,
    pub sync_products: bool,
    /// Scheduler triggers runs for this tenant
    pub auto_sync: bool,
    pub sync_interval_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncSettings {
    /// Defaults: every domain enabled, auto-sync off, hourly interval.
    pub fn new_default(tenant_id: &str) -> Self {
        let now = Utc::now();
        Self {
            tenant_id: tenant_id.to_string(),
            sync_inventory: true,
            sync_prices: true,
            sync_orders: true,
            sync_products: true,
            auto_sync: false,
            sync_interval_minutes: DEFAULT_SYNC_INTERVAL_MINUTES,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_enabled(&self, domain: SyncDomain) -> bool {
        match domain {
            SyncDomain::Inventory => self.sync_inventory,
            SyncDomain::Prices => self.sync_prices,
            SyncDomain::Orders => self.sync_orders,
            SyncDomain::Products => self.sync_products,
        }
    }

    /// Domains whose flag is set.
    pub fn enabled_domains(&self) -> DomainSet {
        SyncDomain::ALL
            .into_iter()
            .filter(|d| self.is_enabled(*d))
            .collect()
    }
}

/// Partial update of a tenant's settings. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettingsUpdate {
    pub sync_inventory: Option<bool>,
    pub sync_prices: Option<bool>,
    pub sync_orders: Option<bool>,
    pub sync_products: Option<bool>,
    pub auto_sync: Option<bool>,
    pub sync_interval_minutes: Option<u32>,
}

impl SyncSettingsUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(minutes) = self.sync_interval_minutes {
            if minutes < MIN_SYNC_INTERVAL_MINUTES {
                return Err(ValidationError::InvalidInput(format!(
                    "syncIntervalMinutes must be at least {}, got {}",
                    MIN_SYNC_INTERVAL_MINUTES, minutes
                ))
                .into());
            }
        }
        Ok(())
    }

    pub fn apply_to(&self, settings: &mut SyncSettings) {
        if let Some(v) = self.sync_inventory {
            settings.sync_inventory = v;
        }
        if let Some(v) = self.sync_prices {
            settings.sync_prices = v;
        }
        if let Some(v) = self.sync_orders {
            settings.sync_orders = v;
        }
        if let Some(v) = self.sync_products {
            settings.sync_products = v;
        }
        if let Some(v) = self.auto_sync {
            settings.auto_sync = v;
        }
        if let Some(v) = self.sync_interval_minutes {
            settings.sync_interval_minutes = v;
        }
        settings.updated_at = Utc::now();
    }
}
