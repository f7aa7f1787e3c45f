//! Sync history repository and service traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use super::sync_domain::DomainSet;
use super::sync_run_model::{FinalizeOutcome, InitiatedBy, SyncRun, SyncRunCompletion};
use crate::connections::PlatformConnection;
use crate::errors::Result;

/// Trait for SyncRun persistence operations.
#[async_trait]
pub trait SyncRunRepositoryTrait: Send + Sync {
    /// Inserts a new in-progress run.
    async fn create(&self, run: SyncRun) -> Result<SyncRun>;

    /// Finalizes an in-progress run in one atomic conditional update.
    ///
    /// Returns `AlreadyFinalized` with the stored record when the run is no
    /// longer in progress, and `DatabaseError::NotFound` when it does not exist.
    async fn finalize(
        &self,
        run_id: &str,
        completion: SyncRunCompletion,
    ) -> Result<FinalizeOutcome>;

    fn get_by_id(&self, run_id: &str) -> Result<Option<SyncRun>>;

    /// Most recent runs for a tenant, newest first.
    fn list_for_tenant(&self, tenant_id: &str, limit: i64) -> Result<Vec<SyncRun>>;

    /// In-progress runs started before the cutoff.
    fn list_in_progress_started_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<SyncRun>>;
}

/// Trait for the history recorder.
#[async_trait]
pub trait SyncHistoryServiceTrait: Send + Sync {
    /// Writes the in-progress record before any adapter is called.
    async fn begin_run(
        &self,
        tenant_id: &str,
        domains: &DomainSet,
        connections: &[PlatformConnection],
        initiated_by: InitiatedBy,
    ) -> Result<SyncRun>;

    /// Finalizes a run exactly once.
    ///
    /// A repeated call with the same outcome is a no-op; a differing outcome
    /// fails with `Error::RunAlreadyFinalized`. A missing run or an
    /// in-progress completion fails with `Error::Persistence`.
    async fn finalize_run(&self, run_id: &str, completion: SyncRunCompletion) -> Result<SyncRun>;

    /// Closes in-progress runs older than `max_age` as failed, skipping runs
    /// for which `is_live` returns true. Returns how many were closed.
    async fn reap_stale_runs(
        &self,
        max_age: Duration,
        is_live: &(dyn for<'r> Fn(&'r SyncRun) -> bool + Send + Sync),
    ) -> Result<usize>;

    fn get_run(&self, run_id: &str) -> Result<SyncRun>;

    fn list_runs(&self, tenant_id: &str, limit: i64) -> Result<Vec<SyncRun>>;

    fn latest_run(&self, tenant_id: &str) -> Result<Option<SyncRun>>;
}
