use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::{error::ApiResult, main_lib::AppState};
use storesync_core::sync_settings::{SyncSettings, SyncSettingsUpdate};

async fn get_settings(
    Path(tenant_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SyncSettings>> {
    let settings = state.settings_service.get_settings(&tenant_id).await?;
    Ok(Json(settings))
}

async fn update_settings(
    Path(tenant_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SyncSettingsUpdate>,
) -> ApiResult<Json<SyncSettings>> {
    let settings = state
        .settings_service
        .update_settings(&tenant_id, payload)
        .await?;
    Ok(Json(settings))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/tenants/{tenant_id}/sync-settings",
        get(get_settings).put(update_settings),
    )
}
