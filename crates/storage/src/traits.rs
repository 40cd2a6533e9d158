//! Trait definitions for the storage layer.
//!
//! Chapter text and chapter metadata live in two independent stores. The
//! [`ContentStore`] holds raw text blobs keyed by `(story, chapter)`; the
//! repository traits hold the structured records. Nothing here coordinates the
//! two, that is the job of the chapter service.

use async_trait::async_trait;

use crate::error::Result;
use qynnovel_types::{
    Chapter, ChapterId, NewChapter, NewReadingHistory, NewStory, Page, PageRequest,
    ReadingHistory, Story, StoryFilter, StoryId, StoryOrder, StoryStats, UserId,
};

/// Blob storage for chapter text.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Write `content` for the chapter, replacing any previous text.
    async fn save(&self, story_id: StoryId, chapter_id: ChapterId, content: &str) -> Result<()>;

    /// Read the chapter's text.
    ///
    /// Returns [`StorageError::ContentNotFound`](crate::StorageError::ContentNotFound)
    /// when no blob exists. An existing empty blob reads as `""`.
    async fn read(&self, story_id: StoryId, chapter_id: ChapterId) -> Result<String>;

    /// Remove the chapter's text. Removing a missing blob succeeds.
    async fn delete(&self, story_id: StoryId, chapter_id: ChapterId) -> Result<()>;

    /// Remove every blob belonging to a story.
    async fn delete_story(&self, story_id: StoryId) -> Result<()>;

    /// Every `(story, chapter)` pair that currently has a blob.
    async fn list_stored(&self) -> Result<Vec<(StoryId, ChapterId)>>;

    /// Canonical address recorded as the chapter's `storage_path`.
    fn path_for(&self, story_id: StoryId, chapter_id: ChapterId) -> String;
}

#[async_trait]
pub trait StoryRepository: Send + Sync {
    /// Insert a story owned by `user_id` under `slug`.
    async fn insert_story(&self, story: &NewStory, slug: &str, user_id: UserId) -> Result<Story>;

    async fn get_story(&self, id: StoryId) -> Result<Option<Story>>;

    async fn find_story_by_slug(&self, slug: &str) -> Result<Option<Story>>;

    /// Persist every mutable field of `story` and bump its `updated_at`.
    async fn update_story(&self, story: &Story) -> Result<Story>;

    /// # Returns
    /// `true` if the story was deleted, `false` if it didn't exist
    async fn delete_story(&self, id: StoryId) -> Result<bool>;

    async fn list_stories(
        &self,
        filter: &StoryFilter,
        order: StoryOrder,
        page: PageRequest,
    ) -> Result<Page<Story>>;

    /// Add one view and return the new total.
    async fn increment_story_views(&self, id: StoryId) -> Result<i64>;

    /// Add one like and return the new total.
    async fn increment_story_likes(&self, id: StoryId) -> Result<i64>;

    /// Remove one like, never going below zero, and return the new total.
    async fn decrement_story_likes(&self, id: StoryId) -> Result<i64>;

    async fn story_stats(&self, id: StoryId) -> Result<StoryStats>;
}

#[async_trait]
pub trait ChapterRepository: Send + Sync {
    /// Insert chapter metadata and assign its id. Content is ignored.
    async fn insert_chapter(&self, chapter: &NewChapter) -> Result<Chapter>;

    async fn get_chapter(&self, id: ChapterId) -> Result<Option<Chapter>>;

    /// Persist every mutable field of `chapter` except `views`, which only
    /// changes through [`increment_chapter_views`](Self::increment_chapter_views).
    async fn update_chapter(&self, chapter: &Chapter) -> Result<Chapter>;

    async fn delete_chapter(&self, id: ChapterId) -> Result<bool>;

    /// Returns the number of deleted rows.
    async fn delete_chapters_for_story(&self, story_id: StoryId) -> Result<u64>;

    /// All chapters of a story in `chapter_number` order.
    async fn list_chapters(&self, story_id: StoryId) -> Result<Vec<Chapter>>;

    async fn list_chapters_page(&self, story_id: StoryId, page: PageRequest)
    -> Result<Page<Chapter>>;

    async fn first_chapter(&self, story_id: StoryId) -> Result<Option<Chapter>>;

    /// The chapter with the smallest number greater than `chapter_number`.
    async fn next_chapter(&self, story_id: StoryId, chapter_number: i32)
    -> Result<Option<Chapter>>;

    /// The chapter with the largest number smaller than `chapter_number`.
    async fn previous_chapter(
        &self,
        story_id: StoryId,
        chapter_number: i32,
    ) -> Result<Option<Chapter>>;

    /// Up to `limit` chapters, highest number first.
    async fn latest_chapters(&self, story_id: StoryId, limit: u32) -> Result<Vec<Chapter>>;

    /// Add one view and return the new total.
    async fn increment_chapter_views(&self, id: ChapterId) -> Result<i64>;
}

#[async_trait]
pub trait ReadingHistoryRepository: Send + Sync {
    async fn append_history(&self, entry: &NewReadingHistory) -> Result<ReadingHistory>;

    /// A user's history, most recent first.
    async fn history_for_user(&self, user_id: UserId, page: PageRequest)
    -> Result<Page<ReadingHistory>>;

    /// The user's most recent read within one story.
    async fn latest_for_story(
        &self,
        user_id: UserId,
        story_id: StoryId,
    ) -> Result<Option<ReadingHistory>>;

    /// Returns the number of deleted entries.
    async fn delete_history_for_story(&self, story_id: StoryId) -> Result<u64>;
}
