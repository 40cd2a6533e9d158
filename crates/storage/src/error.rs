//! Error types for the storage layer.

use qynnovel_types::{ChapterId, StoryId};
use thiserror::Error;

/// Errors that can occur during metadata or content storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Story not found: {id}")]
    StoryNotFound {
        id: StoryId,
        #[source]
        source: Option<eyre::Report>,
    },

    #[error("Story not found: slug={slug}")]
    SlugNotFound {
        slug: String,
        #[source]
        source: Option<eyre::Report>,
    },

    #[error("Chapter not found: {id}")]
    ChapterNotFound {
        id: ChapterId,
        #[source]
        source: Option<eyre::Report>,
    },

    #[error("Chapter content not found: story={story_id}, chapter={chapter_id}")]
    ContentNotFound {
        story_id: StoryId,
        chapter_id: ChapterId,
        #[source]
        source: Option<eyre::Report>,
    },

    #[error("Story slug already in use: {slug}")]
    DuplicateSlug {
        slug: String,
        #[source]
        source: Option<eyre::Report>,
    },

    #[error("Chapter number {chapter_number} already exists in story {story_id}")]
    DuplicateChapterNumber {
        story_id: StoryId,
        chapter_number: i32,
        #[source]
        source: Option<eyre::Report>,
    },

    #[error("Invalid data: {message}")]
    InvalidData {
        message: String,
        #[source]
        source: Option<eyre::Report>,
    },

    #[error("Content operation failed: {operation}")]
    ContentOperationFailed {
        operation: String,
        #[source]
        source: Option<eyre::Report>,
    },

    #[error("Storage backend error")]
    BackendError {
        #[source]
        source: Option<eyre::Report>,
    },
}

impl StorageError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
            source: None,
        }
    }

    pub fn backend(source: impl Into<eyre::Report>) -> Self {
        Self::BackendError {
            source: Some(source.into()),
        }
    }

    /// True for the variants that mean "the addressed thing does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::StoryNotFound { .. }
                | Self::SlugNotFound { .. }
                | Self::ChapterNotFound { .. }
                | Self::ContentNotFound { .. }
        )
    }

    /// True for uniqueness violations.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateSlug { .. } | Self::DuplicateChapterNumber { .. }
        )
    }
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
