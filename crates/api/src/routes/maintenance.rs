use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::error::ApiResult;
use crate::state::AppState;
use qynnovel_domain::sweep_orphan_content;
use qynnovel_types::CleanupReport;

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /maintenance/cleanup
pub async fn cleanup(State(state): State<AppState>) -> ApiResult<Json<CleanupReport>> {
    let report =
        sweep_orphan_content(state.content.as_ref(), state.chapter_repository.as_ref()).await?;

    tracing::info!(
        "Content sweep scanned {} blobs, removed {}, {} errors",
        report.scanned,
        report.orphaned_removed,
        report.errors.len()
    );
    Ok(Json(report))
}
