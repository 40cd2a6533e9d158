use std::sync::Arc;

use chrono::Utc;
use qynnovel_storage::{
    ChapterRepository, ContentStore, ReadingHistoryRepository, Result, StorageError,
    StoryRepository, count_words,
};
use qynnovel_types::{
    Chapter, ChapterId, NewChapter, NewReadingHistory, Page, PageRequest, ReadingHistory,
    StoryId, UserId,
};

/// Chapter operations spanning metadata, content and counters.
///
/// Metadata and content are written as two separate steps with no transaction
/// around them. Content is always written before the metadata that points at
/// it, so a failed metadata write leaves at worst an orphaned blob (reclaimed
/// by [`sweep_orphan_content`](crate::sweep_orphan_content)) rather than a
/// `storage_path` pointing at nothing.
#[derive(Clone)]
pub struct ChapterService {
    chapters: Arc<dyn ChapterRepository>,
    stories: Arc<dyn StoryRepository>,
    history: Arc<dyn ReadingHistoryRepository>,
    content: Arc<dyn ContentStore>,
}

impl ChapterService {
    pub fn new(
        chapters: Arc<dyn ChapterRepository>,
        stories: Arc<dyn StoryRepository>,
        history: Arc<dyn ReadingHistoryRepository>,
        content: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            chapters,
            stories,
            history,
            content,
        }
    }

    /// Chapter metadata without content.
    pub async fn get(&self, id: ChapterId) -> Result<Chapter> {
        self.chapters
            .get_chapter(id)
            .await?
            .ok_or(StorageError::ChapterNotFound { id, source: None })
    }

    /// Create a chapter, storing its content only when it is not blank.
    ///
    /// The metadata row is inserted first to obtain an id; with content, the
    /// blob is written and the row saved a second time with the word count
    /// and storage path.
    pub async fn create(&self, chapter: NewChapter) -> Result<Chapter> {
        if chapter.title.trim().is_empty() {
            return Err(StorageError::invalid("Chapter title cannot be empty"));
        }
        if self.stories.get_story(chapter.story_id).await?.is_none() {
            return Err(StorageError::StoryNotFound {
                id: chapter.story_id,
                source: None,
            });
        }

        let saved = self.chapters.insert_chapter(&chapter).await?;
        tracing::debug!(
            "Created chapter {} (#{}) in story {}",
            saved.id,
            saved.chapter_number,
            saved.story_id
        );

        match chapter.content {
            Some(content) if !content.trim().is_empty() => {
                self.store_content(saved, content).await
            }
            _ => Ok(saved),
        }
    }

    /// Replace a chapter's content.
    ///
    /// Unlike [`create`](Self::create), blank content is still written, so an
    /// empty update leaves the chapter with a storage path and zero words.
    pub async fn update_content(&self, id: ChapterId, content: String) -> Result<Chapter> {
        let chapter = self.get(id).await?;
        self.store_content(chapter, content).await
    }

    async fn store_content(&self, mut chapter: Chapter, content: String) -> Result<Chapter> {
        self.content
            .save(chapter.story_id, chapter.id, &content)
            .await?;

        chapter.word_count = count_words(&content);
        chapter.storage_path = Some(self.content.path_for(chapter.story_id, chapter.id));

        let mut saved = self.chapters.update_chapter(&chapter).await?;
        tracing::debug!(
            "Stored content for chapter {} ({} words)",
            saved.id,
            saved.word_count
        );

        saved.content = Some(content);
        Ok(saved)
    }

    /// Load a chapter with its content and count one view on the chapter and
    /// one on its story.
    ///
    /// A chapter with a storage path whose blob is missing fails with
    /// [`StorageError::ContentNotFound`] and counts no view.
    pub async fn read_with_content(&self, id: ChapterId) -> Result<Chapter> {
        let mut chapter = self.get(id).await?;

        if chapter.storage_path.is_some() {
            let content = self.content.read(chapter.story_id, chapter.id).await?;
            chapter.content = Some(content);
        }

        chapter.views = self.chapters.increment_chapter_views(chapter.id).await?;
        self.stories.increment_story_views(chapter.story_id).await?;

        Ok(chapter)
    }

    /// Delete a chapter's content and metadata.
    ///
    /// Content removal is best effort: a failure is logged and the metadata
    /// row is deleted regardless.
    pub async fn delete(&self, id: ChapterId) -> Result<()> {
        let chapter = self.get(id).await?;

        if let Err(e) = self.content.delete(chapter.story_id, chapter.id).await {
            tracing::warn!("Failed to delete content of chapter {}: {}", id, e);
        }

        self.chapters.delete_chapter(id).await?;
        tracing::debug!("Deleted chapter {} from story {}", id, chapter.story_id);
        Ok(())
    }

    /// All chapters of a story in reading order.
    pub async fn list(&self, story_id: StoryId) -> Result<Vec<Chapter>> {
        self.chapters.list_chapters(story_id).await
    }

    pub async fn list_page(&self, story_id: StoryId, page: PageRequest) -> Result<Page<Chapter>> {
        self.chapters.list_chapters_page(story_id, page).await
    }

    /// `None` when the story has no chapters.
    pub async fn first(&self, story_id: StoryId) -> Result<Option<Chapter>> {
        self.chapters.first_chapter(story_id).await
    }

    /// Up to `limit` chapters, newest (highest number) first.
    pub async fn latest(&self, story_id: StoryId, limit: u32) -> Result<Vec<Chapter>> {
        self.chapters.latest_chapters(story_id, limit).await
    }

    /// The chapter that follows `id` in its story, if any.
    pub async fn next(&self, id: ChapterId) -> Result<Option<Chapter>> {
        let current = self.get(id).await?;
        self.chapters
            .next_chapter(current.story_id, current.chapter_number)
            .await
    }

    /// The chapter that precedes `id` in its story, if any.
    pub async fn previous(&self, id: ChapterId) -> Result<Option<Chapter>> {
        let current = self.get(id).await?;
        self.chapters
            .previous_chapter(current.story_id, current.chapter_number)
            .await
    }

    /// Record that `user_id` read the chapter. Repeated reads are all kept.
    pub async fn mark_read(&self, user_id: UserId, chapter_id: ChapterId) -> Result<ReadingHistory> {
        let chapter = self.get(chapter_id).await?;

        self.history
            .append_history(&NewReadingHistory {
                user_id,
                story_id: chapter.story_id,
                chapter_id,
                read_at: Utc::now(),
            })
            .await
    }

    /// A user's reading history, most recent first.
    pub async fn reading_history(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<ReadingHistory>> {
        self.history.history_for_user(user_id, page).await
    }

    pub async fn last_read(
        &self,
        user_id: UserId,
        story_id: StoryId,
    ) -> Result<Option<ReadingHistory>> {
        self.history.latest_for_story(user_id, story_id).await
    }
}
