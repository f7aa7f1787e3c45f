//! Sync settings module - per-tenant preferences and domain resolution.

mod sync_settings_model;
mod sync_settings_service;
mod sync_settings_traits;

pub use sync_settings_model::*;
pub use sync_settings_service::SyncSettingsService;
pub use sync_settings_traits::{SyncSettingsRepositoryTrait, SyncSettingsServiceTrait};
