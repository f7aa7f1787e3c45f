//! Database model for sync settings.

use diesel::prelude::*;

use storesync_core::errors::{Error, Result};
use storesync_core::sync_settings::SyncSettings;

use crate::utils::{format_timestamp, parse_timestamp};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::sync_settings)]
#[diesel(primary_key(tenant_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncSettingsDB {
    pub tenant_id: String,
    pub sync_inventory: bool,
    pub sync_prices: bool,
    pub sync_orders: bool,
    pub sync_products: bool,
    pub auto_sync: bool,
    pub sync_interval_minutes: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<SyncSettingsDB> for SyncSettings {
    type Error = Error;

    fn try_from(db: SyncSettingsDB) -> Result<Self> {
        Ok(Self {
            created_at: parse_timestamp(&db.created_at)?,
            updated_at: parse_timestamp(&db.updated_at)?,
            tenant_id: db.tenant_id,
            sync_inventory: db.sync_inventory,
            sync_prices: db.sync_prices,
            sync_orders: db.sync_orders,
            sync_products: db.sync_products,
            auto_sync: db.auto_sync,
            sync_interval_minutes: u32::try_from(db.sync_interval_minutes.max(0)).unwrap_or(0),
        })
    }
}

impl From<&SyncSettings> for SyncSettingsDB {
    fn from(domain: &SyncSettings) -> Self {
        Self {
            tenant_id: domain.tenant_id.clone(),
            sync_inventory: domain.sync_inventory,
            sync_prices: domain.sync_prices,
            sync_orders: domain.sync_orders,
            sync_products: domain.sync_products,
            auto_sync: domain.auto_sync,
            sync_interval_minutes: i32::try_from(domain.sync_interval_minutes)
                .unwrap_or(i32::MAX),
            created_at: format_timestamp(&domain.created_at),
            updated_at: format_timestamp(&domain.updated_at),
        }
    }
}
