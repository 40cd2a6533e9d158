use axum::Json;
use axum::extract::{Query, State};

use super::PageParams;
use crate::error::ApiResult;
use crate::identity::CallerId;
use crate::state::AppState;
use qynnovel_types::{Page, ReadingHistory};

/// GET /history?page&size
///
/// The caller's reading history, most recent first.
pub async fn list(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<ReadingHistory>>> {
    Ok(Json(
        state
            .chapters
            .reading_history(user_id, params.request())
            .await?,
    ))
}
