//! SQLite storage implementation for StoreSync.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `storesync-core` and contains:
//! - Database connection pooling and management
//! - Embedded Diesel migrations
//! - The single-writer actor that serializes all writes
//! - Repository implementations for connections, settings and run history
//!
//! # Architecture
//!
//! This crate is the only place in the workspace where Diesel dependencies exist.
//! `core` and `connect` are database-agnostic and work with traits.
//!
//! ```text
//! core (domain)          connect (orchestrator)
//!       │                      │
//!       └──────────┬───────────┘
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod connections;
pub mod sync_runs;
pub mod sync_settings;

#[cfg(test)]
pub(crate) mod test_support;

pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

pub use errors::{IntoCore, StorageError};

pub use connections::ConnectionRepository;
pub use sync_runs::SyncRunRepository;
pub use sync_settings::SyncSettingsRepository;

// Re-export from storesync-core for convenience
pub use storesync_core::errors::{DatabaseError, Error, Result};
