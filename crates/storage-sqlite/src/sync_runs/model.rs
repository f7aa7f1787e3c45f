//! Database model for sync runs.

use diesel::prelude::*;

use storesync_core::errors::{Error, Result};
use storesync_core::sync::{DomainSet, PlatformResult, SyncCounts, SyncRun};

use crate::errors::IntoCore;
use crate::utils::{
    count_from_db, format_timestamp, parse_column, parse_optional_timestamp, parse_timestamp,
};

/// Database model for sync runs.
///
/// Domains and per-platform results are JSON text columns.
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::sync_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncRunDB {
    pub id: String,
    pub tenant_id: String,
    pub scope: String,
    pub requested_domains: String,
    pub status: String,
    pub platform_results: String,
    pub items_processed: i64,
    pub items_succeeded: i64,
    pub items_failed: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: i64,
    pub initiated_by: String,
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<SyncRunDB> for SyncRun {
    type Error = Error;

    fn try_from(db: SyncRunDB) -> Result<Self> {
        let requested_domains: DomainSet =
            serde_json::from_str(&db.requested_domains).into_core()?;
        let platform_results: Vec<PlatformResult> =
            serde_json::from_str(&db.platform_results).into_core()?;

        Ok(Self {
            status: parse_column("sync_runs.status", &db.status)?,
            initiated_by: parse_column("sync_runs.initiated_by", &db.initiated_by)?,
            totals: SyncCounts::new(
                count_from_db(db.items_processed),
                count_from_db(db.items_succeeded),
                count_from_db(db.items_failed),
            ),
            started_at: parse_timestamp(&db.started_at)?,
            finished_at: parse_optional_timestamp(db.finished_at.as_deref())?,
            duration_seconds: u64::try_from(db.duration_seconds).unwrap_or(0),
            created_at: parse_timestamp(&db.created_at)?,
            updated_at: parse_timestamp(&db.updated_at)?,
            id: db.id,
            tenant_id: db.tenant_id,
            scope: db.scope,
            requested_domains,
            platform_results,
            error: db.error,
        })
    }
}

impl TryFrom<&SyncRun> for SyncRunDB {
    type Error = Error;

    fn try_from(domain: &SyncRun) -> Result<Self> {
        Ok(Self {
            id: domain.id.clone(),
            tenant_id: domain.tenant_id.clone(),
            scope: domain.scope.clone(),
            requested_domains: serde_json::to_string(&domain.requested_domains).into_core()?,
            status: domain.status.as_str().to_string(),
            platform_results: serde_json::to_string(&domain.platform_results).into_core()?,
            items_processed: i64::from(domain.totals.items_processed),
            items_succeeded: i64::from(domain.totals.items_succeeded),
            items_failed: i64::from(domain.totals.items_failed),
            started_at: format_timestamp(&domain.started_at),
            finished_at: domain.finished_at.as_ref().map(format_timestamp),
            duration_seconds: i64::try_from(domain.duration_seconds).unwrap_or(i64::MAX),
            initiated_by: domain.initiated_by.as_str().to_string(),
            error: domain.error.clone(),
            created_at: format_timestamp(&domain.created_at),
            updated_at: format_timestamp(&domain.updated_at),
        })
    }
}
