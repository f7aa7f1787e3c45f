//! Database model for platform connections.

use diesel::prelude::*;

use storesync_core::connections::PlatformConnection;
use storesync_core::errors::{Error, Result};

use crate::utils::{format_timestamp, parse_column, parse_optional_timestamp, parse_timestamp};

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::platform_connections)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PlatformConnectionDB {
    pub id: String,
    pub tenant_id: String,
    pub platform_id: String,
    pub display_name: String,
    pub status: String,
    pub credentials_ref: String,
    pub last_sync_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<PlatformConnectionDB> for PlatformConnection {
    type Error = Error;

    fn try_from(db: PlatformConnectionDB) -> Result<Self> {
        Ok(Self {
            status: parse_column("platform_connections.status", &db.status)?,
            last_sync_at: parse_optional_timestamp(db.last_sync_at.as_deref())?,
            created_at: parse_timestamp(&db.created_at)?,
            updated_at: parse_timestamp(&db.updated_at)?,
            id: db.id,
            tenant_id: db.tenant_id,
            platform_id: db.platform_id,
            display_name: db.display_name,
            credentials_ref: db.credentials_ref,
        })
    }
}

impl From<&PlatformConnection> for PlatformConnectionDB {
    fn from(domain: &PlatformConnection) -> Self {
        Self {
            id: domain.id.clone(),
            tenant_id: domain.tenant_id.clone(),
            platform_id: domain.platform_id.clone(),
            display_name: domain.display_name.clone(),
            status: domain.status.as_str().to_string(),
            credentials_ref: domain.credentials_ref.clone(),
            last_sync_at: domain.last_sync_at.as_ref().map(format_timestamp),
            created_at: format_timestamp(&domain.created_at),
            updated_at: format_timestamp(&domain.updated_at),
        }
    }
}
