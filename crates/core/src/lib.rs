//! StoreSync Core - Domain entities, services, and traits.
//!
//! This crate contains the business logic for reconciling a tenant's store of
//! record with its connected commerce platforms. It is database-agnostic and
//! defines traits that are implemented by the `storage-sqlite` crate; the
//! orchestrator that drives platform adapters lives in the `connect` crate.

pub mod connections;
pub mod errors;
pub mod sync;
pub mod sync_settings;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
