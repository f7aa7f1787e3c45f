//! Shared setup for repository tests.

use std::sync::Arc;
use tempfile::{tempdir, TempDir};

use crate::db::{create_pool, init, run_migrations, spawn_writer, DbPool, WriteHandle};

/// Creates a migrated database in a temp dir.
///
/// Keep the returned `TempDir` alive for the duration of the test.
pub(crate) fn create_test_db() -> (Arc<DbPool>, WriteHandle, TempDir) {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    let db_path = init(&db_path.to_string_lossy()).expect("Failed to init database");

    let pool = create_pool(&db_path).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");
    let writer = spawn_writer(Arc::clone(&pool));

    (pool, writer, temp_dir)
}
