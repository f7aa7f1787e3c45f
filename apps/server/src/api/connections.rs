use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::{error::ApiResult, main_lib::AppState};
use storesync_core::connections::{ConnectionStatus, NewPlatformConnection, PlatformConnection};

async fn list_connections(
    Path(tenant_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<PlatformConnection>>> {
    let connections = state.connection_service.list_connections(&tenant_id)?;
    Ok(Json(connections))
}

/// Registers a connection, or re-authorizes the tenant's existing one for the platform.
async fn upsert_connection(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewPlatformConnection>,
) -> ApiResult<Json<PlatformConnection>> {
    let connection = state.connection_service.upsert_connection(payload).await?;
    tracing::info!(
        "Connection {} ({}) registered for tenant {}",
        connection.id,
        connection.platform_id,
        connection.tenant_id
    );
    Ok(Json(connection))
}

#[derive(Deserialize)]
struct StatusBody {
    status: ConnectionStatus,
}

async fn set_status(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<PlatformConnection>> {
    let connection = state.connection_service.set_status(&id, body.status).await?;
    Ok(Json(connection))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tenants/{tenant_id}/connections", get(list_connections))
        .route("/connections", post(upsert_connection))
        .route("/connections/{id}/status", put(set_status))
}
