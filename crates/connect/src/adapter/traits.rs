use async_trait::async_trait;

use storesync_core::connections::PlatformConnection;
use storesync_core::sync::{DomainSet, SyncCounts};

use super::errors::AdapterError;

/// Capability for synchronizing one type of external platform.
///
/// One implementation serves every connection whose `platform_id` matches
/// [`platform_id`](Self::platform_id).
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Platform slug this adapter serves, e.g. "shopify".
    fn platform_id(&self) -> &str;

    /// Reconciles the requested domains for one connection.
    async fn sync(
        &self,
        connection: &PlatformConnection,
        domains: &DomainSet,
    ) -> Result<SyncCounts, AdapterError>;
}
