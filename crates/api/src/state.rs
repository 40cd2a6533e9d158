//! Shared handler state and startup wiring.

use std::sync::Arc;

use qynnovel_domain::{ChapterService, StoryService};
use qynnovel_storage::{
    ChapterRepository, ContentStore, FilesystemContentStore, MemoryStore, PostgresStore,
    ReadingHistoryRepository, StoryRepository,
};

use crate::config::Settings;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub chapters: ChapterService,
    pub stories: StoryService,
    /// Used directly by the orphan-content sweep.
    pub content: Arc<dyn ContentStore>,
    pub chapter_repository: Arc<dyn ChapterRepository>,
}

impl AppState {
    /// Wire the services onto one metadata store and one content store.
    pub fn new<S>(metadata: Arc<S>, content: Arc<dyn ContentStore>) -> Self
    where
        S: StoryRepository + ChapterRepository + ReadingHistoryRepository + 'static,
    {
        Self {
            chapters: ChapterService::new(
                metadata.clone(),
                metadata.clone(),
                metadata.clone(),
                content.clone(),
            ),
            stories: StoryService::new(
                metadata.clone(),
                metadata.clone(),
                metadata.clone(),
                content.clone(),
            ),
            content,
            chapter_repository: metadata,
        }
    }
}

/// Prepare the content directories and the metadata store described by
/// `settings`.
pub async fn bootstrap(settings: &Settings) -> eyre::Result<AppState> {
    let content = FilesystemContentStore::new(&settings.storage.path);
    content.initialize().await?;
    tracing::info!("Chapter content stored under {}", settings.storage.path);
    let content: Arc<dyn ContentStore> = Arc::new(content);

    match &settings.database.url {
        Some(url) => {
            let store = PostgresStore::connect(url, settings.database.max_connections).await?;
            store.initialize().await?;
            tracing::info!("Using PostgreSQL metadata store");
            Ok(AppState::new(Arc::new(store), content))
        }
        None => {
            tracing::warn!("No database configured, metadata is kept in memory only");
            Ok(AppState::new(Arc::new(MemoryStore::new()), content))
        }
    }
}
