//! Repository for tenant sync settings.

use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use storesync_core::errors::Result;
use storesync_core::sync_settings::{SyncSettings, SyncSettingsRepositoryTrait};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::sync_settings;

use super::model::SyncSettingsDB;

pub struct SyncSettingsRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SyncSettingsRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SyncSettingsRepositoryTrait for SyncSettingsRepository {
    fn get(&self, tenant_id: &str) -> Result<Option<SyncSettings>> {
        let mut conn = get_connection(&self.pool)?;

        sync_settings::table
            .find(tenant_id)
            .select(SyncSettingsDB::as_select())
            .first::<SyncSettingsDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(SyncSettings::try_from)
            .transpose()
    }

    async fn upsert(&self, settings: SyncSettings) -> Result<SyncSettings> {
        self.writer
            .exec(move |conn| {
                let row = SyncSettingsDB::from(&settings);

                // created_at is kept from the first insert.
                diesel::insert_into(sync_settings::table)
                    .values(&row)
                    .on_conflict(sync_settings::tenant_id)
                    .do_update()
                    .set((
                        sync_settings::sync_inventory.eq(row.sync_inventory),
                        sync_settings::sync_prices.eq(row.sync_prices),
                        sync_settings::sync_orders.eq(row.sync_orders),
                        sync_settings::sync_products.eq(row.sync_products),
                        sync_settings::auto_sync.eq(row.auto_sync),
                        sync_settings::sync_interval_minutes.eq(row.sync_interval_minutes),
                        sync_settings::updated_at.eq(&row.updated_at),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let stored = sync_settings::table
                    .find(&row.tenant_id)
                    .select(SyncSettingsDB::as_select())
                    .first::<SyncSettingsDB>(conn)
                    .map_err(StorageError::from)?;
                SyncSettings::try_from(stored)
            })
            .await
    }

    fn list_auto_sync_enabled(&self) -> Result<Vec<SyncSettings>> {
        let mut conn = get_connection(&self.pool)?;

        sync_settings::table
            .filter(sync_settings::auto_sync.eq(true))
            .order(sync_settings::tenant_id.asc())
            .select(SyncSettingsDB::as_select())
            .load::<SyncSettingsDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(SyncSettings::try_from)
            .collect()
    }
}
