use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use super::sync_domain::DomainSet;
use super::sync_run_model::{
    FinalizeOutcome, InitiatedBy, SyncRun, SyncRunCompletion, SyncRunStatus,
};
use super::sync_run_traits::{SyncHistoryServiceTrait, SyncRunRepositoryTrait};
use crate::connections::PlatformConnection;
use crate::errors::{DatabaseError, Error, Result};

/// Records the lifecycle of synchronization runs.
pub struct SyncHistoryService {
    repository: Arc<dyn SyncRunRepositoryTrait>,
}

impl SyncHistoryService {
    pub fn new(repository: Arc<dyn SyncRunRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl SyncHistoryServiceTrait for SyncHistoryService {
    async fn begin_run(
        &self,
        tenant_id: &str,
        domains: &DomainSet,
        connections: &[PlatformConnection],
        initiated_by: InitiatedBy,
    ) -> Result<SyncRun> {
        if connections.is_empty() {
            return Err(Error::Persistence(format!(
                "Refusing to open a run without connections for tenant {}",
                tenant_id
            )));
        }
        let run = SyncRun::begin(tenant_id, domains, connections, initiated_by);
        debug!(
            "Opening sync run {} for tenant {} ({} platforms, scope {})",
            run.id,
            tenant_id,
            connections.len(),
            run.scope
        );
        self.repository.create(run).await
    }

    async fn finalize_run(&self, run_id: &str, completion: SyncRunCompletion) -> Result<SyncRun> {
        if !completion.status.is_final() {
            return Err(Error::Persistence(format!(
                "Cannot finalize run {} with status {}",
                run_id, completion.status
            )));
        }

        let expected = completion.clone();
        match self.repository.finalize(run_id, completion).await {
            Ok(FinalizeOutcome::Finalized(run)) => Ok(run),
            Ok(FinalizeOutcome::AlreadyFinalized(run)) => {
                if expected.same_outcome_as(&run) {
                    debug!("Sync run {} already finalized with the same outcome", run_id);
                    Ok(run)
                } else {
                    warn!(
                        "Rejected finalize of run {}: stored status {} differs from {}",
                        run_id, run.status, expected.status
                    );
                    Err(Error::RunAlreadyFinalized(run_id.to_string()))
                }
            }
            Err(Error::Database(DatabaseError::NotFound(_))) => Err(Error::Persistence(format!(
                "Sync run {} not found while finalizing",
                run_id
            ))),
            Err(e) => Err(e),
        }
    }

    async fn reap_stale_runs(
        &self,
        max_age: Duration,
        is_live: &(dyn for<'r> Fn(&'r SyncRun) -> bool + Send + Sync),
    ) -> Result<usize> {
        let now = Utc::now();
        let max_age =
            chrono::Duration::from_std(max_age).map_err(|e| Error::Unexpected(e.to_string()))?;
        let stale = self
            .repository
            .list_in_progress_started_before(now - max_age)?;

        let mut reaped = 0;
        for run in stale {
            if is_live(&run) {
                debug!(
                    "Sync run {} for tenant {} is past the stale age but still running",
                    run.id, run.tenant_id
                );
                continue;
            }
            let completion = SyncRunCompletion::abandoned(&run, now);
            match self.repository.finalize(&run.id, completion).await? {
                FinalizeOutcome::Finalized(_) => {
                    warn!(
                        "Reaped stale sync run {} for tenant {} (started {})",
                        run.id, run.tenant_id, run.started_at
                    );
                    reaped += 1;
                }
                // Finished between the listing and the update.
                FinalizeOutcome::AlreadyFinalized(_) => {}
            }
        }
        if reaped > 0 {
            info!("Reaped {} stale sync run(s)", reaped);
        }
        Ok(reaped)
    }

    fn get_run(&self, run_id: &str) -> Result<SyncRun> {
        self.repository
            .get_by_id(run_id)?
            .ok_or_else(|| Error::NotFound(format!("Sync run {} not found", run_id)))
    }

    fn list_runs(&self, tenant_id: &str, limit: i64) -> Result<Vec<SyncRun>> {
        self.repository.list_for_tenant(tenant_id, limit.max(1))
    }

    fn latest_run(&self, tenant_id: &str) -> Result<Option<SyncRun>> {
        Ok(self
            .repository
            .list_for_tenant(tenant_id, 1)?
            .into_iter()
            .next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::ConnectionStatus;
    use crate::sync::{PlatformOutcome, PlatformResult, SyncCounts, SyncDomain};
    use chrono::DateTime;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockSyncRunRepository {
        runs: Mutex<HashMap<String, SyncRun>>,
    }

    #[async_trait]
    impl SyncRunRepositoryTrait for MockSyncRunRepository {
        async fn create(&self, run: SyncRun) -> Result<SyncRun> {
            self.runs
                .lock()
                .unwrap()
                .insert(run.id.clone(), run.clone());
            Ok(run)
        }

        async fn finalize(
            &self,
            run_id: &str,
            completion: SyncRunCompletion,
        ) -> Result<FinalizeOutcome> {
            let mut runs = self.runs.lock().unwrap();
            let stored = runs
                .get(run_id)
                .cloned()
                .ok_or_else(|| Error::from(DatabaseError::NotFound(run_id.to_string())))?;
            if stored.is_finalized() {
                return Ok(FinalizeOutcome::AlreadyFinalized(stored));
            }
            let finalized = stored.finalized_with(&completion, Utc::now());
            runs.insert(run_id.to_string(), finalized.clone());
            Ok(FinalizeOutcome::Finalized(finalized))
        }

        fn get_by_id(&self, run_id: &str) -> Result<Option<SyncRun>> {
            Ok(self.runs.lock().unwrap().get(run_id).cloned())
        }

        fn list_for_tenant(&self, tenant_id: &str, limit: i64) -> Result<Vec<SyncRun>> {
            let mut runs: Vec<SyncRun> = self
                .runs
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.tenant_id == tenant_id)
                .cloned()
                .collect();
            runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
            runs.truncate(limit as usize);
            Ok(runs)
        }

        fn list_in_progress_started_before(
            &self,
            cutoff: DateTime<Utc>,
        ) -> Result<Vec<SyncRun>> {
            Ok(self
                .runs
                .lock()
                .unwrap()
                .values()
                .filter(|r| !r.is_finalized() && r.started_at < cutoff)
                .cloned()
                .collect())
        }
    }

    fn connection(id: &str, platform_id: &str) -> PlatformConnection {
        let now = Utc::now();
        PlatformConnection {
            id: id.to_string(),
            tenant_id: "tenant-1".to_string(),
            platform_id: platform_id.to_string(),
            display_name: platform_id.to_string(),
            status: ConnectionStatus::Active,
            credentials_ref: "ref".to_string(),
            last_sync_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn setup() -> (Arc<MockSyncRunRepository>, SyncHistoryService) {
        let repo = Arc::new(MockSyncRunRepository::default());
        (repo.clone(), SyncHistoryService::new(repo))
    }

    fn success_completion(run: &SyncRun) -> SyncRunCompletion {
        let results = run
            .platform_results
            .iter()
            .map(|p| PlatformResult {
                outcome: PlatformOutcome::Success,
                counts: SyncCounts::new(10, 10, 0),
                ..p.clone()
            })
            .collect();
        SyncRunCompletion::new(SyncRunStatus::Success, results, 2)
    }

    #[tokio::test]
    async fn test_begin_run_writes_pending_placeholders() {
        let (_repo, service) = setup();
        let connections = vec![connection("c1", "shopify"), connection("c2", "etsy")];

        let run = service
            .begin_run(
                "tenant-1",
                &SyncDomain::all(),
                &connections,
                InitiatedBy::Api,
            )
            .await
            .unwrap();

        assert_eq!(run.status, SyncRunStatus::InProgress);
        assert_eq!(run.scope, "full");
        assert_eq!(run.platform_results.len(), 2);
        assert!(run
            .platform_results
            .iter()
            .all(|p| p.outcome == PlatformOutcome::Pending));
        assert_eq!(run.totals, SyncCounts::default());
        assert!(run.finished_at.is_none());
    }

    #[tokio::test]
    async fn test_begin_run_without_connections_is_rejected() {
        let (repo, service) = setup();
        let result = service
            .begin_run("tenant-1", &SyncDomain::all(), &[], InitiatedBy::Api)
            .await;
        assert!(matches!(result, Err(Error::Persistence(_))));
        assert!(repo.runs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_finalize_is_idempotent_for_same_outcome() {
        let (_repo, service) = setup();
        let run = service
            .begin_run(
                "tenant-1",
                &SyncDomain::all(),
                &[connection("c1", "shopify")],
                InitiatedBy::User,
            )
            .await
            .unwrap();
        let completion = success_completion(&run);

        let first = service
            .finalize_run(&run.id, completion.clone())
            .await
            .unwrap();
        assert_eq!(first.status, SyncRunStatus::Success);
        assert_eq!(first.totals.items_processed, 10);
        assert!(first.finished_at.is_some());

        let second = service.finalize_run(&run.id, completion).await.unwrap();
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_finalize_with_different_outcome_is_rejected() {
        let (_repo, service) = setup();
        let run = service
            .begin_run(
                "tenant-1",
                &SyncDomain::all(),
                &[connection("c1", "shopify")],
                InitiatedBy::User,
            )
            .await
            .unwrap();
        service
            .finalize_run(&run.id, success_completion(&run))
            .await
            .unwrap();

        let failed = SyncRunCompletion::new(
            SyncRunStatus::Error,
            vec![PlatformResult::failure(
                &connection("c1", "shopify"),
                "boom",
                SyncCounts::default(),
            )],
            1,
        );
        let err = service.finalize_run(&run.id, failed).await.unwrap_err();
        assert!(matches!(err, Error::RunAlreadyFinalized(id) if id == run.id));

        let stored = service.get_run(&run.id).unwrap();
        assert_eq!(stored.status, SyncRunStatus::Success);
    }

    #[tokio::test]
    async fn test_finalize_missing_run_is_persistence_error() {
        let (_repo, service) = setup();
        let completion = SyncRunCompletion::new(SyncRunStatus::Error, vec![], 0);
        let err = service.finalize_run("nope", completion).await.unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[tokio::test]
    async fn test_finalize_with_in_progress_status_is_rejected() {
        let (_repo, service) = setup();
        let completion = SyncRunCompletion::new(SyncRunStatus::InProgress, vec![], 0);
        let err = service.finalize_run("any", completion).await.unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[tokio::test]
    async fn test_reap_closes_only_stale_runs() {
        let (repo, service) = setup();
        let connections = vec![connection("c1", "shopify")];
        let mut stale = SyncRun::begin(
            "tenant-1",
            &SyncDomain::all(),
            &connections,
            InitiatedBy::System,
        );
        stale.started_at = Utc::now() - chrono::Duration::hours(2);
        repo.create(stale.clone()).await.unwrap();
        let fresh = service
            .begin_run(
                "tenant-1",
                &SyncDomain::all(),
                &connections,
                InitiatedBy::Api,
            )
            .await
            .unwrap();

        let reaped = service
            .reap_stale_runs(Duration::from_secs(30 * 60), &|_: &SyncRun| false)
            .await
            .unwrap();
        assert_eq!(reaped, 1);

        let stale = service.get_run(&stale.id).unwrap();
        assert_eq!(stale.status, SyncRunStatus::Error);
        assert_eq!(
            stale.platform_results[0].detail.as_deref(),
            Some(crate::sync::ABANDONED_RUN_DETAIL)
        );
        assert_eq!(stale.platform_results[0].outcome, PlatformOutcome::Error);
        assert!(stale.duration_seconds >= 7200);

        let fresh = service.get_run(&fresh.id).unwrap();
        assert_eq!(fresh.status, SyncRunStatus::InProgress);
    }

    #[tokio::test]
    async fn test_reap_skips_live_runs() {
        let (repo, service) = setup();
        let connections = vec![connection("c1", "shopify")];
        let mut running = SyncRun::begin(
            "tenant-1",
            &SyncDomain::all(),
            &connections,
            InitiatedBy::Api,
        );
        running.started_at = Utc::now() - chrono::Duration::hours(2);
        repo.create(running.clone()).await.unwrap();

        let running_id = running.id.clone();
        let is_live = move |run: &SyncRun| run.id == running_id;
        let reaped = service
            .reap_stale_runs(Duration::from_secs(30 * 60), &is_live)
            .await
            .unwrap();

        assert_eq!(reaped, 0);
        let stored = service.get_run(&running.id).unwrap();
        assert_eq!(stored.status, SyncRunStatus::InProgress);
    }

    #[test]
    fn test_get_missing_run_is_not_found() {
        let (_repo, service) = setup();
        assert!(matches!(service.get_run("x"), Err(Error::NotFound(_))));
    }
}
