use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use std::sync::Arc;

use super::connections_model::{ConnectionStatus, NewPlatformConnection, PlatformConnection};
use super::connections_traits::{ConnectionRepositoryTrait, ConnectionServiceTrait};
use crate::errors::{Error, Result};

pub const NO_ACTIVE_PLATFORMS_MESSAGE: &str = "No active platforms to synchronize";

/// Narrows connections to the requested platform ids, keeping input order.
///
/// `None` or an empty list leaves the input unchanged. An empty result is an
/// `Error::NotFound`.
pub fn filter_by_platform_ids(
    connections: Vec<PlatformConnection>,
    platform_ids: Option<&[String]>,
) -> Result<Vec<PlatformConnection>> {
    let filtered: Vec<PlatformConnection> = match platform_ids {
        Some(ids) if !ids.is_empty() => connections
            .into_iter()
            .filter(|c| ids.iter().any(|id| id == &c.platform_id))
            .collect(),
        _ => connections,
    };

    if filtered.is_empty() {
        return Err(Error::NotFound(NO_ACTIVE_PLATFORMS_MESSAGE.to_string()));
    }
    Ok(filtered)
}

/// Registry of per-tenant platform connections.
pub struct ConnectionService {
    repository: Arc<dyn ConnectionRepositoryTrait>,
}

impl ConnectionService {
    pub fn new(repository: Arc<dyn ConnectionRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl ConnectionServiceTrait for ConnectionService {
    fn list_connections(&self, tenant_id: &str) -> Result<Vec<PlatformConnection>> {
        self.repository.list_for_tenant(tenant_id, None)
    }

    fn list_active(&self, tenant_id: &str) -> Result<Vec<PlatformConnection>> {
        let mut connections = self
            .repository
            .list_for_tenant(tenant_id, Some(ConnectionStatus::Active))?;
        connections.retain(PlatformConnection::is_sync_eligible);
        // Sort by id so runs keep a stable platform order.
        connections.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(connections)
    }

    fn select_eligible(
        &self,
        tenant_id: &str,
        platform_ids: Option<&[String]>,
    ) -> Result<Vec<PlatformConnection>> {
        let active = self.list_active(tenant_id)?;
        debug!(
            "Tenant {} has {} active connection(s), requested platforms: {:?}",
            tenant_id,
            active.len(),
            platform_ids
        );
        filter_by_platform_ids(active, platform_ids)
    }

    async fn upsert_connection(
        &self,
        new_connection: NewPlatformConnection,
    ) -> Result<PlatformConnection> {
        new_connection.validate()?;
        self.repository.upsert(new_connection).await
    }

    async fn set_status(
        &self,
        connection_id: &str,
        status: ConnectionStatus,
    ) -> Result<PlatformConnection> {
        self.repository.update_status(connection_id, status).await
    }

    async fn mark_synced(&self, connection_id: &str, synced_at: DateTime<Utc>) -> Result<()> {
        self.repository
            .update_last_sync_at(connection_id, synced_at)
            .await
    }
}
