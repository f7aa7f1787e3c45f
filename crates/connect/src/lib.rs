//! StoreSync Connect - platform adapters and the sync orchestrator.
//!
//! This crate turns a tenant's sync request into one recorded run: it fans
//! out to one [`PlatformAdapter`] per eligible connection and records every
//! outcome through the history service from `storesync-core`.

pub mod adapter;
pub mod sync;

// Re-export commonly used types
pub use adapter::{AdapterError, AdapterRegistry, HttpPlatformAdapter, PlatformAdapter, RetryClass};
pub use sync::{
    NoOpProgressReporter, RetryPolicy, SyncConfig, SyncOrchestrator, SyncProgressReporter,
    SyncRequest, SyncResponse, SyncRunResult, SyncServices,
};
