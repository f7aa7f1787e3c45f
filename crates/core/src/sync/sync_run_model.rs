//! Sync run (history record) domain models.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sync_domain::{scope_label, DomainSet};
use crate::connections::PlatformConnection;
use crate::errors::{Error, Result, ValidationError};

/// Detail recorded for placeholders of runs closed by the reaper.
pub const ABANDONED_RUN_DETAIL: &str = "Run abandoned before completion";

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    #[default]
    InProgress,
    Success,
    Partial,
    Error,
}

impl SyncRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncRunStatus::InProgress => "in_progress",
            SyncRunStatus::Success => "success",
            SyncRunStatus::Partial => "partial",
            SyncRunStatus::Error => "error",
        }
    }

    /// Whether the status is terminal.
    pub fn is_final(&self) -> bool {
        !matches!(self, SyncRunStatus::InProgress)
    }

    /// Human-readable summary used in API responses.
    pub fn message(&self) -> &'static str {
        match self {
            SyncRunStatus::InProgress => "Synchronization in progress",
            SyncRunStatus::Success => "Synchronization completed successfully",
            SyncRunStatus::Partial => "Synchronization partially completed",
            SyncRunStatus::Error => "Synchronization failed",
        }
    }
}

impl fmt::Display for SyncRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncRunStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "in_progress" => Ok(SyncRunStatus::InProgress),
            "success" => Ok(SyncRunStatus::Success),
            "partial" => Ok(SyncRunStatus::Partial),
            "error" => Ok(SyncRunStatus::Error),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown sync run status '{}'",
                other
            )))),
        }
    }
}

/// Outcome of one platform within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlatformOutcome {
    /// Placeholder while the run is in progress
    #[default]
    Pending,
    Success,
    Error,
}

impl PlatformOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformOutcome::Pending => "pending",
            PlatformOutcome::Success => "success",
            PlatformOutcome::Error => "error",
        }
    }
}

impl fmt::Display for PlatformOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who triggered a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InitiatedBy {
    User,
    System,
    #[default]
    Api,
}

impl InitiatedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitiatedBy::User => "user",
            InitiatedBy::System => "system",
            InitiatedBy::Api => "api",
        }
    }
}

impl fmt::Display for InitiatedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InitiatedBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(InitiatedBy::User),
            "system" => Ok(InitiatedBy::System),
            "api" => Ok(InitiatedBy::Api),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown initiator '{}'",
                other
            )))),
        }
    }
}

/// Item counters reported by an adapter and summed per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SyncCounts {
    pub items_processed: u32,
    pub items_succeeded: u32,
    pub items_failed: u32,
}

impl SyncCounts {
    pub fn new(items_processed: u32, items_succeeded: u32, items_failed: u32) -> Self {
        Self {
            items_processed,
            items_succeeded,
            items_failed,
        }
    }
}

impl Add for SyncCounts {
    type Output = SyncCounts;

    fn add(self, rhs: SyncCounts) -> SyncCounts {
        SyncCounts {
            items_processed: self.items_processed.saturating_add(rhs.items_processed),
            items_succeeded: self.items_succeeded.saturating_add(rhs.items_succeeded),
            items_failed: self.items_failed.saturating_add(rhs.items_failed),
        }
    }
}

impl Sum for SyncCounts {
    fn sum<I: Iterator<Item = SyncCounts>>(iter: I) -> Self {
        iter.fold(SyncCounts::default(), Add::add)
    }
}

impl<'a> Sum<&'a SyncCounts> for SyncCounts {
    fn sum<I: Iterator<Item = &'a SyncCounts>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Per-platform entry of a run. Owned by its run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformResult {
    /// Weak reference to the connection the entry was produced for
    pub connection_id: String,
    pub platform_id: String,
    pub display_name: String,
    pub outcome: PlatformOutcome,
    /// Sanitized failure detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(flatten)]
    pub counts: SyncCounts,
}

impl PlatformResult {
    /// Placeholder written when a run begins.
    pub fn pending(connection: &PlatformConnection) -> Self {
        Self {
            connection_id: connection.id.clone(),
            platform_id: connection.platform_id.clone(),
            display_name: connection.display_name.clone(),
            outcome: PlatformOutcome::Pending,
            detail: None,
            counts: SyncCounts::default(),
        }
    }

    pub fn success(connection: &PlatformConnection, counts: SyncCounts) -> Self {
        Self {
            outcome: PlatformOutcome::Success,
            counts,
            ..Self::pending(connection)
        }
    }

    pub fn failure(
        connection: &PlatformConnection,
        detail: impl Into<String>,
        counts: SyncCounts,
    ) -> Self {
        Self {
            outcome: PlatformOutcome::Error,
            detail: Some(detail.into()),
            counts,
            ..Self::pending(connection)
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == PlatformOutcome::Success
    }

    /// Resolves a pending placeholder as abandoned. Resolved entries are kept.
    fn abandoned(self) -> Self {
        if self.outcome != PlatformOutcome::Pending {
            return self;
        }
        Self {
            outcome: PlatformOutcome::Error,
            detail: Some(ABANDONED_RUN_DETAIL.to_string()),
            ..self
        }
    }
}

/// A persisted synchronization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRun {
    pub id: String,
    pub tenant_id: String,
    /// `full` or the comma-joined domains
    pub scope: String,
    pub requested_domains: DomainSet,
    pub status: SyncRunStatus,
    pub platform_results: Vec<PlatformResult>,
    #[serde(flatten)]
    pub totals: SyncCounts,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_seconds: u64,
    pub initiated_by: InitiatedBy,
    /// Run-level failure summary
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncRun {
    /// Opens an in-progress run with one pending placeholder per connection.
    pub fn begin(
        tenant_id: &str,
        domains: &DomainSet,
        connections: &[PlatformConnection],
        initiated_by: InitiatedBy,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            tenant_id: tenant_id.to_string(),
            scope: scope_label(domains),
            requested_domains: domains.clone(),
            status: SyncRunStatus::InProgress,
            platform_results: connections.iter().map(PlatformResult::pending).collect(),
            totals: SyncCounts::default(),
            started_at: now,
            finished_at: None,
            duration_seconds: 0,
            initiated_by,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.status.is_final()
    }

    pub fn message(&self) -> &'static str {
        self.status.message()
    }

    /// Applies a completion to this run, producing the finalized record.
    pub fn finalized_with(mut self, completion: &SyncRunCompletion, at: DateTime<Utc>) -> Self {
        self.status = completion.status;
        self.platform_results = completion.platform_results.clone();
        self.totals = completion.totals;
        self.duration_seconds = completion.duration_seconds;
        self.error = completion.error.clone();
        self.finished_at = Some(at);
        self.updated_at = at;
        self
    }
}

/// Everything a finalize call writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRunCompletion {
    pub status: SyncRunStatus,
    pub platform_results: Vec<PlatformResult>,
    pub totals: SyncCounts,
    pub duration_seconds: u64,
    pub error: Option<String>,
}

impl SyncRunCompletion {
    /// Builds a completion, summing totals and deriving the failure summary.
    pub fn new(
        status: SyncRunStatus,
        platform_results: Vec<PlatformResult>,
        duration_seconds: u64,
    ) -> Self {
        let totals = platform_results.iter().map(|r| &r.counts).sum();
        let failed = platform_results.iter().filter(|r| !r.is_success()).count();
        let error = (failed > 0).then(|| {
            format!(
                "{} of {} platforms failed",
                failed,
                platform_results.len()
            )
        });
        Self {
            status,
            platform_results,
            totals,
            duration_seconds,
            error,
        }
    }

    /// Completion used by the reaper for runs that never finished.
    pub fn abandoned(run: &SyncRun, now: DateTime<Utc>) -> Self {
        let platform_results = run
            .platform_results
            .iter()
            .cloned()
            .map(PlatformResult::abandoned)
            .collect();
        let elapsed = (now - run.started_at).num_seconds().max(0) as u64;
        Self {
            error: Some(ABANDONED_RUN_DETAIL.to_string()),
            ..Self::new(SyncRunStatus::Error, platform_results, elapsed)
        }
    }

    /// Whether an already-finalized run recorded this same outcome.
    ///
    /// Duration is ignored: a repeated finalize of the same work may be timed
    /// differently.
    pub fn same_outcome_as(&self, run: &SyncRun) -> bool {
        self.status == run.status
            && self.platform_results == run.platform_results
            && self.totals == run.totals
    }
}

/// Result of a conditional finalize at the repository.
#[derive(Debug, Clone)]
pub enum FinalizeOutcome {
    /// The in-progress row was updated.
    Finalized(SyncRun),
    /// The row was already finalized and left untouched.
    AlreadyFinalized(SyncRun),
}
