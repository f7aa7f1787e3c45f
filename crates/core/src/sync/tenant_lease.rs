//! Per-tenant run serialization.
//!
//! At most one run holds a tenant's lease at a time. The lease is released
//! when the guard drops, or taken over once it has gone unrenewed for the TTL.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::{Error, Result};

/// Lease timing.
#[derive(Debug, Clone)]
pub struct LeaseConfig {
    /// Time since the last renewal after which a held lease may be taken over.
    pub ttl: Duration,
    /// How long `acquire` waits for a busy tenant.
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(15 * 60),
            wait_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Debug)]
struct LeaseEntry {
    token: u64,
    renewed_at: Instant,
}

/// Hands out tenant leases.
#[derive(Clone)]
pub struct TenantLeaseManager {
    leases: Arc<DashMap<String, LeaseEntry>>,
    next_token: Arc<AtomicU64>,
    config: LeaseConfig,
}

impl TenantLeaseManager {
    pub fn new(config: LeaseConfig) -> Self {
        Self {
            leases: Arc::new(DashMap::new()),
            next_token: Arc::new(AtomicU64::new(1)),
            config,
        }
    }

    /// Takes the lease if it is free or expired.
    pub fn try_acquire(&self, tenant_id: &str) -> Option<TenantLease> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let entry = LeaseEntry {
            token,
            renewed_at: Instant::now(),
        };

        match self.leases.entry(tenant_id.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
            }
            Entry::Occupied(mut occupied) => {
                let held_for = occupied.get().renewed_at.elapsed();
                if held_for < self.config.ttl {
                    return None;
                }
                warn!(
                    "Taking over expired sync lease for tenant {} (held for {:?})",
                    tenant_id, held_for
                );
                occupied.insert(entry);
            }
        }

        debug!("Acquired sync lease for tenant {}", tenant_id);
        Some(TenantLease {
            leases: Arc::clone(&self.leases),
            tenant_id: tenant_id.to_string(),
            token,
        })
    }

    /// Waits up to `wait_timeout` for the lease.
    ///
    /// Fails with `Error::SyncInProgress` when the tenant stays busy.
    pub async fn acquire(&self, tenant_id: &str) -> Result<TenantLease> {
        let deadline = Instant::now() + self.config.wait_timeout;
        loop {
            if let Some(lease) = self.try_acquire(tenant_id) {
                return Ok(lease);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(Error::SyncInProgress(tenant_id.to_string()));
            }
            tokio::time::sleep(self.config.poll_interval.min(deadline - now)).await;
        }
    }

    pub fn is_held(&self, tenant_id: &str) -> bool {
        self.leases
            .get(tenant_id)
            .map(|e| e.renewed_at.elapsed() < self.config.ttl)
            .unwrap_or(false)
    }
}

impl Default for TenantLeaseManager {
    fn default() -> Self {
        Self::new(LeaseConfig::default())
    }
}

/// Guard for a held tenant lease.
#[derive(Debug)]
pub struct TenantLease {
    leases: Arc<DashMap<String, LeaseEntry>>,
    tenant_id: String,
    token: u64,
}

impl TenantLease {
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Restarts the TTL clock. Returns false once the lease was taken over.
    pub fn renew(&self) -> bool {
        match self.leases.get_mut(&self.tenant_id) {
            Some(mut entry) if entry.token == self.token => {
                entry.renewed_at = Instant::now();
                true
            }
            _ => false,
        }
    }
}

impl Drop for TenantLease {
    fn drop(&mut self) {
        // A taken-over lease belongs to someone else now.
        let token = self.token;
        self.leases
            .remove_if(&self.tenant_id, |_, entry| entry.token == token);
    }
}
