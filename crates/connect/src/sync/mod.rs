//! Run orchestration: retry policy, detail sanitizing, progress and the
//! orchestrator itself.

mod models;
mod orchestrator;
mod progress;
mod retry;
mod sanitize;

pub use models::{
    PlatformSummary, SyncRequest, SyncResponse, SyncResponseDetails, SyncRunResult,
};
pub use orchestrator::{SyncOrchestrator, SyncServices};
pub use progress::{NoOpProgressReporter, SyncProgressReporter};
pub use retry::{RetryPolicy, SyncConfig};
pub use sanitize::{sanitize_detail, MAX_DETAIL_CHARS};
