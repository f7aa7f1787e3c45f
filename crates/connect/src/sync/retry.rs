//! Retry policy and orchestrator configuration.

use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;

use storesync_core::errors::{Error, Result};
use storesync_core::sync::LeaseConfig;

/// Bounded exponential backoff for one adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero is treated as one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes a single attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Upper bound of the delay before retry number `attempt` (1-based),
    /// before jitter.
    pub fn base_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }

    /// Delay before retry number `attempt`, with up to 20% jitter removed so
    /// concurrent runs do not retry in lockstep. Never exceeds `max_backoff`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let base = self.base_backoff(attempt);
        let jitter_ceiling = (base.as_millis() / 5) as u64;
        if jitter_ceiling == 0 {
            return base;
        }
        let jitter = rand::thread_rng().gen_range(0..=jitter_ceiling);
        base.saturating_sub(Duration::from_millis(jitter))
    }
}

/// Configuration for sync runs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum adapter calls in flight per run.
    pub max_concurrency: usize,
    /// Time bound for a single adapter attempt.
    pub adapter_timeout: Duration,
    pub retry: RetryPolicy,
    /// Per-platform overrides of `retry`, keyed by platform id.
    pub platform_retry: HashMap<String, RetryPolicy>,
    pub lease: LeaseConfig,
    /// In-progress runs older than this are closed by the reaper.
    pub stale_run_max_age: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            adapter_timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
            platform_retry: HashMap::new(),
            lease: LeaseConfig::default(),
            stale_run_max_age: Duration::from_secs(30 * 60),
        }
    }
}

impl SyncConfig {
    pub fn retry_policy_for(&self, platform_id: &str) -> &RetryPolicy {
        self.platform_retry.get(platform_id).unwrap_or(&self.retry)
    }

    pub fn with_platform_retry(mut self, platform_id: impl Into<String>, policy: RetryPolicy) -> Self {
        self.platform_retry.insert(platform_id.into(), policy);
        self
    }

    /// Longest one adapter call can take, retries and backoff included.
    pub fn max_call_duration(&self) -> Duration {
        std::iter::once(&self.retry)
            .chain(self.platform_retry.values())
            .map(|policy| {
                let attempts = policy.attempts();
                let backoff: Duration = (1..attempts).map(|a| policy.base_backoff(a)).sum();
                self.adapter_timeout.saturating_mul(attempts) + backoff
            })
            .max()
            .unwrap_or(self.adapter_timeout)
    }

    /// Checks the timing relations the lease and the reaper depend on.
    ///
    /// The lease is renewed whenever a platform finishes, so its TTL must
    /// outlast the longest adapter call; the reaper must only consider runs
    /// older than an unrenewed lease.
    pub fn validate(&self) -> Result<()> {
        let max_call = self.max_call_duration();
        if self.lease.ttl <= max_call {
            return Err(Error::Configuration(format!(
                "Lease TTL {:?} must exceed the longest adapter call {:?}",
                self.lease.ttl, max_call
            )));
        }
        if self.stale_run_max_age <= self.lease.ttl {
            return Err(Error::Configuration(format!(
                "Stale run age {:?} must exceed the lease TTL {:?}",
                self.stale_run_max_age, self.lease.ttl
            )));
        }
        Ok(())
    }
}
