//! Repository for platform connection persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use storesync_core::connections::{
    ConnectionRepositoryTrait, ConnectionStatus, NewPlatformConnection, PlatformConnection,
};
use storesync_core::errors::{DatabaseError, Error, Result};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::platform_connections;
use crate::utils::format_timestamp;

use super::model::PlatformConnectionDB;

pub struct ConnectionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ConnectionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn load_by_id(conn: &mut SqliteConnection, connection_id: &str) -> Result<PlatformConnection> {
    platform_connections::table
        .find(connection_id)
        .select(PlatformConnectionDB::as_select())
        .first::<PlatformConnectionDB>(conn)
        .optional()
        .map_err(StorageError::from)?
        .ok_or_else(|| {
            Error::Database(DatabaseError::NotFound(format!(
                "Platform connection {} not found",
                connection_id
            )))
        })?
        .try_into()
}

#[async_trait]
impl ConnectionRepositoryTrait for ConnectionRepository {
    fn list_for_tenant(
        &self,
        tenant_id: &str,
        status_filter: Option<ConnectionStatus>,
    ) -> Result<Vec<PlatformConnection>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = platform_connections::table
            .select(PlatformConnectionDB::as_select())
            .filter(platform_connections::tenant_id.eq(tenant_id))
            .into_boxed();
        if let Some(status) = status_filter {
            query = query.filter(platform_connections::status.eq(status.as_str()));
        }

        query
            .order(platform_connections::id.asc())
            .load::<PlatformConnectionDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(PlatformConnection::try_from)
            .collect()
    }

    fn get_by_id(&self, connection_id: &str) -> Result<PlatformConnection> {
        let mut conn = get_connection(&self.pool)?;
        load_by_id(&mut conn, connection_id)
    }

    async fn upsert(&self, new_connection: NewPlatformConnection) -> Result<PlatformConnection> {
        self.writer
            .exec(move |conn| {
                let now = format_timestamp(&Utc::now());
                let existing_id = platform_connections::table
                    .filter(platform_connections::tenant_id.eq(&new_connection.tenant_id))
                    .filter(platform_connections::platform_id.eq(&new_connection.platform_id))
                    .select(platform_connections::id)
                    .first::<String>(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                let id = match existing_id {
                    Some(id) => {
                        diesel::update(platform_connections::table.find(&id))
                            .set((
                                platform_connections::display_name
                                    .eq(&new_connection.display_name),
                                platform_connections::credentials_ref
                                    .eq(&new_connection.credentials_ref),
                                platform_connections::updated_at.eq(&now),
                            ))
                            .execute(conn)
                            .map_err(StorageError::from)?;
                        if let Some(status) = new_connection.status {
                            diesel::update(platform_connections::table.find(&id))
                                .set(platform_connections::status.eq(status.as_str()))
                                .execute(conn)
                                .map_err(StorageError::from)?;
                        }
                        id
                    }
                    None => {
                        let row = PlatformConnectionDB {
                            id: uuid::Uuid::new_v4().to_string(),
                            tenant_id: new_connection.tenant_id.clone(),
                            platform_id: new_connection.platform_id.clone(),
                            display_name: new_connection.display_name.clone(),
                            status: new_connection
                                .status
                                .unwrap_or_default()
                                .as_str()
                                .to_string(),
                            credentials_ref: new_connection.credentials_ref.clone(),
                            last_sync_at: None,
                            created_at: now.clone(),
                            updated_at: now,
                        };
                        diesel::insert_into(platform_connections::table)
                            .values(&row)
                            .execute(conn)
                            .map_err(StorageError::from)?;
                        row.id
                    }
                };

                load_by_id(conn, &id)
            })
            .await
    }

    async fn update_status(
        &self,
        connection_id: &str,
        status: ConnectionStatus,
    ) -> Result<PlatformConnection> {
        let connection_id = connection_id.to_string();
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(platform_connections::table.find(&connection_id))
                    .set((
                        platform_connections::status.eq(status.as_str()),
                        platform_connections::updated_at.eq(format_timestamp(&Utc::now())),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "Platform connection {} not found",
                        connection_id
                    ))));
                }
                load_by_id(conn, &connection_id)
            })
            .await
    }

    async fn update_last_sync_at(
        &self,
        connection_id: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<()> {
        let connection_id = connection_id.to_string();
        self.writer
            .exec(move |conn| {
                let at = format_timestamp(&synced_at);
                let updated = diesel::update(platform_connections::table.find(&connection_id))
                    .set((
                        platform_connections::last_sync_at.eq(Some(&at)),
                        platform_connections::updated_at.eq(&at),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "Platform connection {} not found",
                        connection_id
                    ))));
                }
                Ok(())
            })
            .await
    }
}
