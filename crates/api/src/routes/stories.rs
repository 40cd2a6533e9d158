use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::PageParams;
use crate::error::ApiResult;
use crate::identity::CallerId;
use crate::state::AppState;
use qynnovel_types::{
    NewStory, Page, Story, StoryFilter, StoryId, StoryOrder, StoryStats, StoryStatus,
    StoryUpdate, UserId,
};

/// Query parameters for GET /stories.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<StoryStatus>,
    pub author: Option<String>,
    pub user_id: Option<i64>,
    /// Title substring.
    pub q: Option<String>,
    /// Substring of the title, author or description.
    pub keyword: Option<String>,
    pub order: Option<StoryOrder>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl ListParams {
    fn filter(&self) -> StoryFilter {
        StoryFilter {
            status: self.status,
            author: self.author.clone(),
            user_id: self.user_id.map(UserId),
            title_contains: non_blank(&self.q),
            keyword: non_blank(&self.keyword),
            exclude_id: None,
        }
    }

    fn page(&self) -> PageParams {
        PageParams {
            page: self.page,
            size: self.size,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}

const DEFAULT_BY_AUTHOR_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikesResponse {
    pub total_likes: i64,
}

/// GET /stories
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Story>>> {
    let order = params.order.unwrap_or_default();
    Ok(Json(
        state
            .stories
            .list(&params.filter(), order, params.page().request())
            .await?,
    ))
}

/// POST /stories
pub async fn create(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Json(body): Json<NewStory>,
) -> ApiResult<(StatusCode, Json<Story>)> {
    let story = state.stories.create(user_id, body).await?;
    Ok((StatusCode::CREATED, Json(story)))
}

/// GET /stories/{id}
pub async fn get(State(state): State<AppState>, Path(id): Path<StoryId>) -> ApiResult<Json<Story>> {
    Ok(Json(state.stories.get(id).await?))
}

/// GET /stories/slug/{slug}
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Story>> {
    Ok(Json(state.stories.get_by_slug(&slug).await?))
}

/// PUT /stories/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<StoryId>,
    Json(body): Json<StoryUpdate>,
) -> ApiResult<Json<Story>> {
    Ok(Json(state.stories.update(id, body).await?))
}

/// DELETE /stories/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<StoryId>) -> ApiResult<StatusCode> {
    state.stories.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /stories/{id}/by-author?limit
pub async fn other_by_author(
    State(state): State<AppState>,
    Path(id): Path<StoryId>,
    Query(params): Query<LimitParams>,
) -> ApiResult<Json<Vec<Story>>> {
    let limit = params.limit.unwrap_or(DEFAULT_BY_AUTHOR_LIMIT);
    Ok(Json(state.stories.other_by_author(id, limit).await?))
}

/// POST /stories/{id}/like
pub async fn like(
    State(state): State<AppState>,
    Path(id): Path<StoryId>,
) -> ApiResult<Json<LikesResponse>> {
    let total_likes = state.stories.like(id).await?;
    Ok(Json(LikesResponse { total_likes }))
}

/// DELETE /stories/{id}/like
pub async fn unlike(
    State(state): State<AppState>,
    Path(id): Path<StoryId>,
) -> ApiResult<Json<LikesResponse>> {
    let total_likes = state.stories.unlike(id).await?;
    Ok(Json(LikesResponse { total_likes }))
}

/// GET /stories/{id}/stats
pub async fn stats(
    State(state): State<AppState>,
    Path(id): Path<StoryId>,
) -> ApiResult<Json<StoryStats>> {
    Ok(Json(state.stories.stats(id).await?))
}
