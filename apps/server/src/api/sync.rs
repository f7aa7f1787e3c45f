use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use storesync_connect::{SyncRequest, SyncResponse};
use storesync_core::sync::SyncRun;

const DEFAULT_HISTORY_LIMIT: i64 = 20;
const MAX_HISTORY_LIMIT: i64 = 100;

/// Runs a synchronization and waits for it to finish.
async fn run_sync(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SyncRequest>,
) -> ApiResult<Json<SyncResponse>> {
    tracing::debug!(
        "Sync requested for tenant {} (platforms: {:?}, domains: {:?})",
        request.tenant_id,
        request.platform_ids,
        request.domains
    );
    let result = state.orchestrator.run(request).await?;
    Ok(Json(SyncResponse::from(&result)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryQuery {
    tenant_id: Option<String>,
    limit: Option<i64>,
}

async fn list_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<SyncRun>>> {
    let tenant_id = query
        .tenant_id
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("tenantId is required".to_string()))?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let runs = state.history_service.list_runs(tenant_id.trim(), limit)?;
    Ok(Json(runs))
}

async fn get_run(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SyncRun>> {
    let run = state.history_service.get_run(&id)?;
    Ok(Json(run))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sync", post(run_sync))
        .route("/sync/history", get(list_history))
        .route("/sync/runs/{id}", get(get_run))
}
