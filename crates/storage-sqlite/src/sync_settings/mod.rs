//! SQLite storage implementation for tenant sync settings.

mod model;
mod repository;

pub use model::SyncSettingsDB;
pub use repository::SyncSettingsRepository;
