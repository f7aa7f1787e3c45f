//! Multi-platform sync orchestrator.
//!
//! One call to [`SyncOrchestrator::run`] is one run: resolve domains, select
//! eligible connections, record the in-progress run, fan out to the platform
//! adapters and finalize the run with the aggregated outcome.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use log::{debug, error, info, warn};

use storesync_core::connections::{ConnectionServiceTrait, PlatformConnection};
use storesync_core::errors::{Result, ValidationError};
use storesync_core::sync::{
    aggregate_status, scope_label, DomainSet, PlatformResult, SyncCounts,
    SyncHistoryServiceTrait, SyncRun, SyncRunCompletion, TenantLeaseManager,
};
use storesync_core::sync_settings::SyncSettingsServiceTrait;

use super::models::{SyncRequest, SyncRunResult};
use super::progress::SyncProgressReporter;
use super::retry::SyncConfig;
use super::sanitize::sanitize_detail;
use crate::adapter::{AdapterError, AdapterRegistry, PlatformAdapter, RetryClass};

/// Services the orchestrator coordinates.
#[derive(Clone)]
pub struct SyncServices {
    pub settings: Arc<dyn SyncSettingsServiceTrait>,
    pub connections: Arc<dyn ConnectionServiceTrait>,
    pub history: Arc<dyn SyncHistoryServiceTrait>,
}

/// Orchestrates synchronization runs across a tenant's platforms.
///
/// Adapter failures of any kind (errors, timeouts, panics, missing adapters)
/// are contained to the platform they happened on and recorded in its
/// result. Only failures before the run exists (`Configuration`, `NotFound`,
/// `SyncInProgress`) and history-store failures are returned as errors.
///
/// # Example
///
/// ```ignore
/// let orchestrator = SyncOrchestrator::new(services, adapters, reporter, SyncConfig::default());
/// let result = orchestrator.run(SyncRequest::for_tenant("tenant-1")).await?;
/// ```
pub struct SyncOrchestrator<P: SyncProgressReporter> {
    services: SyncServices,
    adapters: AdapterRegistry,
    leases: TenantLeaseManager,
    progress_reporter: Arc<P>,
    config: SyncConfig,
}

impl<P: SyncProgressReporter> SyncOrchestrator<P> {
    pub fn new(
        services: SyncServices,
        adapters: AdapterRegistry,
        progress_reporter: Arc<P>,
        config: SyncConfig,
    ) -> Self {
        Self {
            services,
            adapters,
            leases: TenantLeaseManager::new(config.lease.clone()),
            progress_reporter,
            config,
        }
    }

    pub fn leases(&self) -> &TenantLeaseManager {
        &self.leases
    }

    /// Runs one synchronization for `request.tenant_id`.
    pub async fn run(&self, request: SyncRequest) -> Result<SyncRunResult> {
        let tenant_id = request.tenant_id.trim();
        if tenant_id.is_empty() {
            return Err(ValidationError::MissingField("tenantId".to_string()).into());
        }

        let domains = self
            .services
            .settings
            .resolve_domains(tenant_id, request.domains.as_deref())?;
        let eligible = self
            .services
            .connections
            .select_eligible(tenant_id, request.platform_ids.as_deref())?;

        let lease = self.leases.acquire(tenant_id).await?;
        let started = Instant::now();

        let run = self
            .services
            .history
            .begin_run(tenant_id, &domains, &eligible, request.initiated_by)
            .await?;
        info!(
            "Sync run {} started for tenant {} (scope: {}, platforms: {}, initiated by: {})",
            run.id,
            tenant_id,
            scope_label(&domains),
            eligible.len(),
            request.initiated_by.as_str()
        );
        self.progress_reporter.report_run_started(&run);

        // `buffered` keeps results in connection order whatever the completion order.
        // Each finished platform renews the tenant lease.
        let (lease, run_id, domains) = (&lease, run.id.as_str(), &domains);
        let calls: Vec<_> = eligible
            .iter()
            .map(|connection| async move {
                let result = self.sync_connection(run_id, connection, domains).await;
                if !lease.renew() {
                    warn!(
                        "Sync lease for tenant {} was taken over during run {}",
                        tenant_id, run_id
                    );
                }
                result
            })
            .collect();
        let platform_results: Vec<PlatformResult> = stream::iter(calls)
            .buffered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let status = aggregate_status(&platform_results);
        let completion =
            SyncRunCompletion::new(status, platform_results, started.elapsed().as_secs());

        let finalized = match self.services.history.finalize_run(&run.id, completion).await {
            Ok(run) => run,
            Err(err) => {
                error!("Failed to finalize sync run {}: {}", run.id, err);
                return Err(err);
            }
        };

        info!(
            "Sync run {} finished with status {} ({} processed, {} succeeded, {} failed)",
            finalized.id,
            finalized.status.as_str(),
            finalized.totals.items_processed,
            finalized.totals.items_succeeded,
            finalized.totals.items_failed
        );

        let result = SyncRunResult::from(finalized);
        self.progress_reporter.report_run_completed(&result);
        Ok(result)
    }

    /// Closes runs left in progress for longer than `stale_run_max_age`.
    ///
    /// Runs whose tenant lease is still held are executing and are left alone.
    pub async fn reap_stale_runs(&self) -> Result<usize> {
        let leases = &self.leases;
        let is_live = |run: &SyncRun| leases.is_held(&run.tenant_id);
        self.services
            .history
            .reap_stale_runs(self.config.stale_run_max_age, &is_live)
            .await
    }

    /// Syncs one connection and converts the outcome into its result entry.
    async fn sync_connection(
        &self,
        run_id: &str,
        connection: &PlatformConnection,
        domains: &DomainSet,
    ) -> PlatformResult {
        let result = match self.call_adapter(connection, domains).await {
            Ok(counts) => {
                debug!(
                    "Platform {} ({}) synced: {} processed",
                    connection.platform_id, connection.id, counts.items_processed
                );
                if let Err(err) = self
                    .services
                    .connections
                    .mark_synced(&connection.id, Utc::now())
                    .await
                {
                    warn!(
                        "Failed to record last sync time for connection {}: {}",
                        connection.id, err
                    );
                }
                PlatformResult::success(connection, counts)
            }
            Err(err) => {
                let detail = sanitize_detail(&err.to_string(), &connection.credentials_ref);
                warn!(
                    "Platform {} ({}) failed in run {}: {}",
                    connection.platform_id, connection.id, run_id, detail
                );
                PlatformResult::failure(connection, detail, err.partial_counts().unwrap_or_default())
            }
        };

        self.progress_reporter
            .report_platform_completed(run_id, &result);
        result
    }

    /// Calls the connection's adapter, retrying transient failures.
    async fn call_adapter(
        &self,
        connection: &PlatformConnection,
        domains: &DomainSet,
    ) -> std::result::Result<SyncCounts, AdapterError> {
        let adapter = self
            .adapters
            .get(&connection.platform_id)
            .ok_or_else(|| AdapterError::Unsupported(connection.platform_id.clone()))?;

        let policy = self.config.retry_policy_for(&connection.platform_id);
        let max_attempts = policy.attempts();
        let mut attempt = 1;
        loop {
            match self.attempt_once(adapter.as_ref(), connection, domains).await {
                Ok(counts) => return Ok(counts),
                Err(err)
                    if err.retry_class() == RetryClass::WithBackoff && attempt < max_attempts =>
                {
                    let delay = policy.backoff_for(attempt);
                    warn!(
                        "Platform {} attempt {}/{} failed: {}. Retrying in {:?}",
                        connection.platform_id, attempt, max_attempts, err, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// One time-bounded adapter call with panics turned into errors.
    async fn attempt_once(
        &self,
        adapter: &dyn PlatformAdapter,
        connection: &PlatformConnection,
        domains: &DomainSet,
    ) -> std::result::Result<SyncCounts, AdapterError> {
        let call = AssertUnwindSafe(adapter.sync(connection, domains)).catch_unwind();
        match tokio::time::timeout(self.config.adapter_timeout, call).await {
            Err(_) => Err(AdapterError::Timeout(self.config.adapter_timeout)),
            Ok(Err(panic)) => Err(AdapterError::Internal(panic_message(&*panic))),
            Ok(Ok(result)) => result,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("adapter panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("adapter panicked: {}", message)
    } else {
        "adapter panicked".to_string()
    }
}
