use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{error, instrument};
use uuid::Uuid;

use crate::state::AppState;

use super::dto::{Pagination, ScanHistoryEntry};
use super::repo;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/history", get(list_history))
        .route("/history/:analysis_id", delete(delete_history))
}

/// GET /history?limit&offset — recent scans, newest first.
#[instrument(skip(state))]
async fn list_history(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<ScanHistoryEntry>>, (StatusCode, String)> {
    let entries = repo::list_recent(&state.db, p.limit, p.offset)
        .await
        .map_err(|e| {
            error!(error = %e, "list history failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    Ok(Json(entries))
}

/// DELETE /history/:analysis_id
#[instrument(skip(state))]
async fn delete_history(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = repo::delete_scan(&state.db, analysis_id)
        .await
        .map_err(|e| {
            error!(error = %e, %analysis_id, "delete history failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Scan not found".into()))
    }
}
