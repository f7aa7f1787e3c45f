//! Background scheduler for tenants with auto-sync enabled.
//!
//! Each tick reaps abandoned runs, then starts a run for every tenant whose
//! interval has elapsed since its latest run.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use storesync_connect::SyncRequest;
use storesync_core::sync::{InitiatedBy, SyncRun};
use storesync_core::sync_settings::SyncSettings;

use crate::main_lib::AppState;

/// Initial delay before the first tick, to let the server fully start.
const INITIAL_DELAY_SECS: u64 = 30;

/// Starts the background auto-sync scheduler.
pub fn start_sync_scheduler(state: Arc<AppState>, tick: Duration) {
    tokio::spawn(async move {
        info!("Auto-sync scheduler started ({:?} tick)", tick);
        tokio::time::sleep(Duration::from_secs(INITIAL_DELAY_SECS)).await;

        let mut ticker = interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            run_scheduled_tick(&state).await;
        }
    });
}

/// Whether a tenant's next scheduled run is due.
pub fn is_due(settings: &SyncSettings, latest: Option<&SyncRun>, now: DateTime<Utc>) -> bool {
    if !settings.auto_sync {
        return false;
    }
    match latest {
        None => true,
        Some(run) => {
            now - run.started_at >= ChronoDuration::minutes(i64::from(settings.sync_interval_minutes))
        }
    }
}

/// Runs one scheduler tick. Returns how many runs were started.
pub async fn run_scheduled_tick(state: &Arc<AppState>) -> usize {
    if let Err(e) = state.orchestrator.reap_stale_runs().await {
        warn!("Scheduled reap of stale sync runs failed: {}", e);
    }

    let tenants = match state.settings_service.list_auto_sync_tenants() {
        Ok(tenants) => tenants,
        Err(e) => {
            warn!("Failed to load auto-sync tenants: {}", e);
            return 0;
        }
    };

    let now = Utc::now();
    let mut started = 0;
    for settings in tenants {
        let latest = match state.history_service.latest_run(&settings.tenant_id) {
            Ok(latest) => latest,
            Err(e) => {
                warn!(
                    "Failed to load latest sync run for tenant {}: {}",
                    settings.tenant_id, e
                );
                continue;
            }
        };
        if !is_due(&settings, latest.as_ref(), now) {
            continue;
        }

        let request =
            SyncRequest::for_tenant(settings.tenant_id.as_str()).initiated_by(InitiatedBy::System);
        match state.orchestrator.run(request).await {
            Ok(result) => {
                started += 1;
                info!(
                    "Scheduled sync for tenant {} finished: {} ({} items)",
                    settings.tenant_id,
                    result.status.as_str(),
                    result.totals.items_processed
                );
            }
            Err(e) if e.is_pre_run_failure() => {
                debug!("Scheduled sync skipped for tenant {}: {}", settings.tenant_id, e);
            }
            Err(e) => {
                warn!("Scheduled sync for tenant {} failed: {}", settings.tenant_id, e);
            }
        }
    }
    started
}
