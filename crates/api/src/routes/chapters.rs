use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use super::PageParams;
use crate::error::{ApiError, ApiResult};
use crate::identity::CallerId;
use crate::state::AppState;
use qynnovel_types::{Chapter, ChapterId, NewChapter, Page, ReadingHistory, StoryId};

const DEFAULT_LATEST_LIMIT: u32 = 5;

/// Request body for PUT /chapters/{id}/content.
#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct LatestParams {
    pub limit: Option<u32>,
}

/// GET /chapters/{id}
///
/// Metadata only; does not count a view.
pub async fn get(State(state): State<AppState>, Path(id): Path<ChapterId>) -> ApiResult<Json<Chapter>> {
    Ok(Json(state.chapters.get(id).await?))
}

/// GET /chapters/{id}/content
pub async fn read_with_content(
    State(state): State<AppState>,
    Path(id): Path<ChapterId>,
) -> ApiResult<Json<Chapter>> {
    Ok(Json(state.chapters.read_with_content(id).await?))
}

/// POST /chapters
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewChapter>,
) -> ApiResult<(StatusCode, Json<Chapter>)> {
    let chapter = state.chapters.create(body).await?;
    Ok((StatusCode::CREATED, Json(chapter)))
}

/// PUT /chapters/{id}/content
pub async fn update_content(
    State(state): State<AppState>,
    Path(id): Path<ChapterId>,
    Json(body): Json<ContentRequest>,
) -> ApiResult<Json<Chapter>> {
    Ok(Json(state.chapters.update_content(id, body.content).await?))
}

/// DELETE /chapters/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<ChapterId>) -> ApiResult<StatusCode> {
    state.chapters.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /chapters/story/{story_id}
pub async fn list(
    State(state): State<AppState>,
    Path(story_id): Path<StoryId>,
) -> ApiResult<Json<Vec<Chapter>>> {
    Ok(Json(state.chapters.list(story_id).await?))
}

/// GET /chapters/story/{story_id}/list?page&size
pub async fn list_page(
    State(state): State<AppState>,
    Path(story_id): Path<StoryId>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<Chapter>>> {
    Ok(Json(state.chapters.list_page(story_id, params.request()).await?))
}

/// GET /chapters/story/{story_id}/first
pub async fn first(
    State(state): State<AppState>,
    Path(story_id): Path<StoryId>,
) -> ApiResult<Json<Chapter>> {
    state
        .chapters
        .first(story_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Story {} has no chapters", story_id)))
}

/// GET /chapters/story/{story_id}/latest?limit
pub async fn latest(
    State(state): State<AppState>,
    Path(story_id): Path<StoryId>,
    Query(params): Query<LatestParams>,
) -> ApiResult<Json<Vec<Chapter>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LATEST_LIMIT);
    Ok(Json(state.chapters.latest(story_id, limit).await?))
}

/// GET /chapters/{id}/next
pub async fn next(State(state): State<AppState>, Path(id): Path<ChapterId>) -> ApiResult<Json<Chapter>> {
    state
        .chapters
        .next(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No chapter after {}", id)))
}

/// GET /chapters/{id}/previous
pub async fn previous(
    State(state): State<AppState>,
    Path(id): Path<ChapterId>,
) -> ApiResult<Json<Chapter>> {
    state
        .chapters
        .previous(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No chapter before {}", id)))
}

/// POST /chapters/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(id): Path<ChapterId>,
) -> ApiResult<Json<ReadingHistory>> {
    Ok(Json(state.chapters.mark_read(user_id, id).await?))
}
