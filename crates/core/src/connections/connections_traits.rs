//! Connection repository and service traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::connections_model::{ConnectionStatus, NewPlatformConnection, PlatformConnection};
use crate::errors::Result;

/// Trait defining the contract for platform connection persistence.
#[async_trait]
pub trait ConnectionRepositoryTrait: Send + Sync {
    /// Lists a tenant's connections ordered by id, optionally filtered by status.
    fn list_for_tenant(
        &self,
        tenant_id: &str,
        status_filter: Option<ConnectionStatus>,
    ) -> Result<Vec<PlatformConnection>>;

    /// Retrieves a connection by its ID.
    fn get_by_id(&self, connection_id: &str) -> Result<PlatformConnection>;

    /// Inserts a connection or updates the one with the same tenant and platform.
    async fn upsert(&self, new_connection: NewPlatformConnection) -> Result<PlatformConnection>;

    async fn update_status(
        &self,
        connection_id: &str,
        status: ConnectionStatus,
    ) -> Result<PlatformConnection>;

    async fn update_last_sync_at(&self, connection_id: &str, synced_at: DateTime<Utc>)
        -> Result<()>;
}

/// Trait defining the connection registry used by the orchestrator and API.
#[async_trait]
pub trait ConnectionServiceTrait: Send + Sync {
    /// All connections for a tenant regardless of status.
    fn list_connections(&self, tenant_id: &str) -> Result<Vec<PlatformConnection>>;

    /// Active connections in stable id order.
    fn list_active(&self, tenant_id: &str) -> Result<Vec<PlatformConnection>>;

    /// Active connections narrowed to the requested platforms.
    ///
    /// Fails with `Error::NotFound` when nothing is eligible.
    fn select_eligible(
        &self,
        tenant_id: &str,
        platform_ids: Option<&[String]>,
    ) -> Result<Vec<PlatformConnection>>;

    async fn upsert_connection(
        &self,
        new_connection: NewPlatformConnection,
    ) -> Result<PlatformConnection>;

    async fn set_status(
        &self,
        connection_id: &str,
        status: ConnectionStatus,
    ) -> Result<PlatformConnection>;

    /// Records a successful synchronization of the connection.
    async fn mark_synced(&self, connection_id: &str, synced_at: DateTime<Utc>) -> Result<()>;
}
