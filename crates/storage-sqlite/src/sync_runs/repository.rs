//! Repository for sync run history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use storesync_core::errors::{DatabaseError, Error, Result};
use storesync_core::sync::{
    FinalizeOutcome, SyncRun, SyncRunCompletion, SyncRunRepositoryTrait, SyncRunStatus,
};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::sync_runs;
use crate::utils::format_timestamp;

use super::model::SyncRunDB;

pub struct SyncRunRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SyncRunRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn find_run(conn: &mut SqliteConnection, run_id: &str) -> Result<Option<SyncRun>> {
    sync_runs::table
        .find(run_id)
        .select(SyncRunDB::as_select())
        .first::<SyncRunDB>(conn)
        .optional()
        .map_err(StorageError::from)?
        .map(SyncRun::try_from)
        .transpose()
}

#[async_trait]
impl SyncRunRepositoryTrait for SyncRunRepository {
    async fn create(&self, run: SyncRun) -> Result<SyncRun> {
        self.writer
            .exec(move |conn| {
                let row = SyncRunDB::try_from(&run)?;

                diesel::insert_into(sync_runs::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                SyncRun::try_from(row)
            })
            .await
    }

    async fn finalize(
        &self,
        run_id: &str,
        completion: SyncRunCompletion,
    ) -> Result<FinalizeOutcome> {
        let run_id = run_id.to_string();
        self.writer
            .exec(move |conn| {
                let stored = find_run(conn, &run_id)?.ok_or_else(|| {
                    Error::Database(DatabaseError::NotFound(format!(
                        "Sync run {} not found",
                        run_id
                    )))
                })?;
                if stored.is_finalized() {
                    return Ok(FinalizeOutcome::AlreadyFinalized(stored));
                }

                let finalized = stored.finalized_with(&completion, Utc::now());
                let row = SyncRunDB::try_from(&finalized)?;

                // Guarded on status so a finalized row is never overwritten.
                let updated = diesel::update(
                    sync_runs::table
                        .find(&run_id)
                        .filter(sync_runs::status.eq(SyncRunStatus::InProgress.as_str())),
                )
                .set((
                    sync_runs::status.eq(&row.status),
                    sync_runs::platform_results.eq(&row.platform_results),
                    sync_runs::items_processed.eq(row.items_processed),
                    sync_runs::items_succeeded.eq(row.items_succeeded),
                    sync_runs::items_failed.eq(row.items_failed),
                    sync_runs::finished_at.eq(&row.finished_at),
                    sync_runs::duration_seconds.eq(row.duration_seconds),
                    sync_runs::error.eq(&row.error),
                    sync_runs::updated_at.eq(&row.updated_at),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;

                if updated == 0 {
                    let current = find_run(conn, &run_id)?.ok_or_else(|| {
                        Error::Database(DatabaseError::NotFound(format!(
                            "Sync run {} not found",
                            run_id
                        )))
                    })?;
                    return Ok(FinalizeOutcome::AlreadyFinalized(current));
                }

                SyncRun::try_from(row).map(FinalizeOutcome::Finalized)
            })
            .await
    }

    fn get_by_id(&self, run_id: &str) -> Result<Option<SyncRun>> {
        let mut conn = get_connection(&self.pool)?;
        find_run(&mut conn, run_id)
    }

    fn list_for_tenant(&self, tenant_id: &str, limit: i64) -> Result<Vec<SyncRun>> {
        let mut conn = get_connection(&self.pool)?;

        sync_runs::table
            .filter(sync_runs::tenant_id.eq(tenant_id))
            .order((sync_runs::started_at.desc(), sync_runs::id.desc()))
            .limit(limit)
            .select(SyncRunDB::as_select())
            .load::<SyncRunDB>(&mut conn)
            .into_core()?
            .into_iter()
            .map(SyncRun::try_from)
            .collect()
    }

    fn list_in_progress_started_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<SyncRun>> {
        let mut conn = get_connection(&self.pool)?;

        sync_runs::table
            .filter(sync_runs::status.eq(SyncRunStatus::InProgress.as_str()))
            .filter(sync_runs::started_at.lt(format_timestamp(&cutoff)))
            .order(sync_runs::started_at.asc())
            .select(SyncRunDB::as_select())
            .load::<SyncRunDB>(&mut conn)
            .into_core()?
            .into_iter()
            .map(SyncRun::try_from)
            .collect()
    }
}
