//! Request, result and response types for sync runs.

use serde::{Deserialize, Serialize};

use storesync_core::sync::{
    InitiatedBy, PlatformOutcome, PlatformResult, SyncCounts, SyncRun, SyncRunStatus,
};

/// A request to synchronize one tenant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub tenant_id: String,
    /// Restricts the run to these platform ids. Empty or absent means all.
    #[serde(default)]
    pub platform_ids: Option<Vec<String>>,
    /// Explicit domains. Unrecognized names are ignored.
    #[serde(default)]
    pub domains: Option<Vec<String>>,
    #[serde(default)]
    pub initiated_by: InitiatedBy,
}

impl SyncRequest {
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            ..Self::default()
        }
    }

    pub fn with_platforms(mut self, platform_ids: Vec<String>) -> Self {
        self.platform_ids = Some(platform_ids);
        self
    }

    pub fn with_domains(mut self, domains: Vec<String>) -> Self {
        self.domains = Some(domains);
        self
    }

    pub fn initiated_by(mut self, initiated_by: InitiatedBy) -> Self {
        self.initiated_by = initiated_by;
        self
    }
}

/// Outcome of a finalized run, as returned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRunResult {
    pub run_id: String,
    pub tenant_id: String,
    pub status: SyncRunStatus,
    #[serde(flatten)]
    pub totals: SyncCounts,
    /// One entry per eligible connection, in registry order.
    pub platform_results: Vec<PlatformResult>,
    pub duration_seconds: u64,
}

impl SyncRunResult {
    pub fn message(&self) -> &'static str {
        self.status.message()
    }
}

impl From<SyncRun> for SyncRunResult {
    fn from(run: SyncRun) -> Self {
        Self {
            run_id: run.id,
            tenant_id: run.tenant_id,
            status: run.status,
            totals: run.totals,
            platform_results: run.platform_results,
            duration_seconds: run.duration_seconds,
        }
    }
}

/// Wire response for a run that was started and finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub success: bool,
    pub message: String,
    pub details: SyncResponseDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponseDetails {
    pub sync_id: String,
    pub status: SyncRunStatus,
    #[serde(flatten)]
    pub totals: SyncCounts,
    /// Seconds.
    pub duration: u64,
    pub platforms: Vec<PlatformSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSummary {
    /// Platform slug.
    pub id: String,
    pub name: String,
    pub status: PlatformOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&PlatformResult> for PlatformSummary {
    fn from(result: &PlatformResult) -> Self {
        Self {
            id: result.platform_id.clone(),
            name: result.display_name.clone(),
            status: result.outcome,
            detail: result.detail.clone(),
        }
    }
}

impl From<&SyncRunResult> for SyncResponse {
    fn from(result: &SyncRunResult) -> Self {
        Self {
            // A run that reached finalization is a successful request, even
            // when every platform failed.
            success: true,
            message: result.message().to_string(),
            details: SyncResponseDetails {
                sync_id: result.run_id.clone(),
                status: result.status,
                totals: result.totals,
                duration: result.duration_seconds,
                platforms: result.platform_results.iter().map(PlatformSummary::from).collect(),
            },
        }
    }
}
