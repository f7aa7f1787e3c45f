//! Sync module - domains, run history, status aggregation and tenant leases.

mod history_service;
mod status_aggregator;
mod sync_domain;
mod sync_run_model;
mod sync_run_traits;
mod tenant_lease;

pub use history_service::SyncHistoryService;
pub use status_aggregator::aggregate_status;
pub use sync_domain::*;
pub use sync_run_model::*;
pub use sync_run_traits::*;
pub use tenant_lease::{LeaseConfig, TenantLease, TenantLeaseManager};
