//! SQLite storage implementation for sync run history.

mod model;
mod repository;

pub use model::SyncRunDB;
pub use repository::SyncRunRepository;
