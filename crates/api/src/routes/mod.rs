//! HTTP routes.

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::identity::USER_ID_HEADER;
use crate::state::AppState;
use qynnovel_types::PageRequest;

mod chapters;
mod history;
mod maintenance;
mod stories;

/// `?page=&size=` query parameters, zero-based.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageParams {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(PageRequest::DEFAULT_SIZE),
        )
    }
}

/// Build the API router, all routes under `/api`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(maintenance::health))
        .route("/chapters", post(chapters::create))
        .route("/chapters/{id}", get(chapters::get).delete(chapters::delete))
        .route(
            "/chapters/{id}/content",
            get(chapters::read_with_content).put(chapters::update_content),
        )
        .route("/chapters/{id}/next", get(chapters::next))
        .route("/chapters/{id}/previous", get(chapters::previous))
        .route("/chapters/{id}/read", post(chapters::mark_read))
        .route("/chapters/story/{story_id}", get(chapters::list))
        .route("/chapters/story/{story_id}/list", get(chapters::list_page))
        .route("/chapters/story/{story_id}/first", get(chapters::first))
        .route("/chapters/story/{story_id}/latest", get(chapters::latest))
        .route("/stories", get(stories::list).post(stories::create))
        .route(
            "/stories/{id}",
            get(stories::get).put(stories::update).delete(stories::delete),
        )
        .route("/stories/slug/{slug}", get(stories::get_by_slug))
        .route(
            "/stories/{id}/like",
            post(stories::like).delete(stories::unlike),
        )
        .route("/stories/{id}/stats", get(stories::stats))
        .route("/stories/{id}/by-author", get(stories::other_by_author))
        .route("/history", get(history::list))
        .route("/maintenance/cleanup", post(maintenance::cleanup))
        .with_state(state);

    Router::new().nest("/api", api)
}

/// CORS policy admitting the configured front-end origin.
pub fn cors_layer(origin: &str) -> eyre::Result<CorsLayer> {
    let origin: HeaderValue = origin
        .parse()
        .map_err(|e| eyre::eyre!("Invalid CORS origin '{}': {}", origin, e))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static(USER_ID_HEADER),
        ]))
}
