//! Folds per-platform outcomes into one run status.

use super::sync_run_model::{PlatformResult, SyncRunStatus};

/// Aggregates platform outcomes.
///
/// Unanimous success is `Success`, no success at all is `Error`, anything in
/// between is `Partial`. Pending entries count as not successful. An empty
/// list is `Error`.
pub fn aggregate_status(results: &[PlatformResult]) -> SyncRunStatus {
    if results.is_empty() {
        return SyncRunStatus::Error;
    }
    let succeeded = results.iter().filter(|r| r.is_success()).count();
    if succeeded == results.len() {
        SyncRunStatus::Success
    } else if succeeded == 0 {
        SyncRunStatus::Error
    } else {
        SyncRunStatus::Partial
    }
}
