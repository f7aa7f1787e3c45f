//! Connections module - the per-tenant registry of platform connections.

mod connections_model;
mod connections_service;
mod connections_traits;

pub use connections_model::{ConnectionStatus, NewPlatformConnection, PlatformConnection};
pub use connections_service::{
    filter_by_platform_ids, ConnectionService, NO_ACTIVE_PLATFORMS_MESSAGE,
};
pub use connections_traits::{ConnectionRepositoryTrait, ConnectionServiceTrait};
