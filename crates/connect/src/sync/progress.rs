//! Progress reporting for sync runs.
//!
//! The orchestrator reports through this trait so the server can forward
//! progress to its event stream without the orchestrator knowing about it.

use storesync_core::sync::{PlatformResult, SyncRun};

use super::models::SyncRunResult;

/// Trait for reporting sync progress.
pub trait SyncProgressReporter: Send + Sync {
    /// The in-progress record was written and adapters are about to run.
    fn report_run_started(&self, run: &SyncRun);

    /// One platform finished, in completion order.
    fn report_platform_completed(&self, run_id: &str, result: &PlatformResult);

    /// The run was finalized.
    fn report_run_completed(&self, result: &SyncRunResult);
}

/// A no-op progress reporter for contexts where progress reporting is not needed.
#[derive(Debug, Clone, Default)]
pub struct NoOpProgressReporter;

impl SyncProgressReporter for NoOpProgressReporter {
    fn report_run_started(&self, _run: &SyncRun) {
        // No-op
    }

    fn report_platform_completed(&self, _run_id: &str, _result: &PlatformResult) {
        // No-op
    }

    fn report_run_completed(&self, _result: &SyncRunResult) {
        // No-op
    }
}
