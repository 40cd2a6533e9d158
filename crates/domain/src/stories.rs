use std::sync::Arc;

use qynnovel_storage::{
    ChapterRepository, ContentStore, ReadingHistoryRepository, Result, StorageError,
    StoryRepository,
};
use qynnovel_types::{
    NewStory, Page, PageRequest, Story, StoryFilter, StoryId, StoryOrder, StoryStats,
    StoryUpdate, UserId,
};

/// Story aggregate operations.
#[derive(Clone)]
pub struct StoryService {
    stories: Arc<dyn StoryRepository>,
    chapters: Arc<dyn ChapterRepository>,
    history: Arc<dyn ReadingHistoryRepository>,
    content: Arc<dyn ContentStore>,
}

/// Normalise a requested slug, or derive one from the title.
fn make_slug(requested: Option<&str>, title: &str) -> Result<String> {
    let source = match requested {
        Some(slug) if !slug.trim().is_empty() => slug,
        _ => title,
    };

    let slug = slug::slugify(source);
    if slug.is_empty() {
        return Err(StorageError::invalid(format!(
            "Cannot derive a slug from '{}'",
            source
        )));
    }
    Ok(slug)
}

impl StoryService {
    pub fn new(
        stories: Arc<dyn StoryRepository>,
        chapters: Arc<dyn ChapterRepository>,
        history: Arc<dyn ReadingHistoryRepository>,
        content: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            stories,
            chapters,
            history,
            content,
        }
    }

    pub async fn create(&self, user_id: UserId, story: NewStory) -> Result<Story> {
        if story.title.trim().is_empty() {
            return Err(StorageError::invalid("Story title cannot be empty"));
        }

        let slug = make_slug(story.slug.as_deref(), &story.title)?;
        let created = self.stories.insert_story(&story, &slug, user_id).await?;
        tracing::info!("Created story {} ({})", created.id, created.slug);
        Ok(created)
    }

    pub async fn get(&self, id: StoryId) -> Result<Story> {
        self.stories
            .get_story(id)
            .await?
            .ok_or(StorageError::StoryNotFound { id, source: None })
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Story> {
        self.stories
            .find_story_by_slug(slug)
            .await?
            .ok_or_else(|| StorageError::SlugNotFound {
                slug: slug.to_string(),
                source: None,
            })
    }

    pub async fn update(&self, id: StoryId, mut update: StoryUpdate) -> Result<Story> {
        if let Some(title) = &update.title {
            if title.trim().is_empty() {
                return Err(StorageError::invalid("Story title cannot be empty"));
            }
        }
        if let Some(slug) = update.slug.take() {
            update.slug = Some(make_slug(Some(&slug), &slug)?);
        }

        let mut story = self.get(id).await?;
        update.apply_to(&mut story);
        self.stories.update_story(&story).await
    }

    pub async fn list(
        &self,
        filter: &StoryFilter,
        order: StoryOrder,
        page: PageRequest,
    ) -> Result<Page<Story>> {
        self.stories.list_stories(filter, order, page).await
    }

    /// Other stories by the same author, newest first. Empty when the story
    /// has no author.
    pub async fn other_by_author(&self, id: StoryId, limit: u32) -> Result<Vec<Story>> {
        let story = self.get(id).await?;
        let Some(author) = story.author else {
            return Ok(Vec::new());
        };

        let filter = StoryFilter {
            author: Some(author),
            exclude_id: Some(id),
            ..Default::default()
        };
        let page = self
            .stories
            .list_stories(&filter, StoryOrder::Newest, PageRequest::new(0, limit))
            .await?;
        Ok(page.items)
    }

    /// Add a like and return the story's new total.
    pub async fn like(&self, id: StoryId) -> Result<i64> {
        self.stories.increment_story_likes(id).await
    }

    /// Remove a like and return the story's new total.
    pub async fn unlike(&self, id: StoryId) -> Result<i64> {
        self.stories.decrement_story_likes(id).await
    }

    pub async fn stats(&self, id: StoryId) -> Result<StoryStats> {
        self.stories.story_stats(id).await
    }

    /// Delete a story and everything it owns.
    ///
    /// Dependents go first: reading history, chapter content, chapter rows,
    /// then the story row itself. Content failures are logged and skipped.
    pub async fn delete(&self, id: StoryId) -> Result<()> {
        let story = self.get(id).await?;

        let history_removed = self.history.delete_history_for_story(id).await?;

        for chapter in self.chapters.list_chapters(id).await? {
            if let Err(e) = self.content.delete(id, chapter.id).await {
                tracing::warn!("Failed to delete content of chapter {}: {}", chapter.id, e);
            }
        }
        if let Err(e) = self.content.delete_story(id).await {
            tracing::warn!("Failed to delete content directory of story {}: {}", id, e);
        }

        let chapters_removed = self.chapters.delete_chapters_for_story(id).await?;
        self.stories.delete_story(id).await?;

        tracing::info!(
            "Deleted story {} ({}) with {} chapters and {} history entries",
            id,
            story.slug,
            chapters_removed,
            history_removed
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_derived_from_title() {
        assert_eq!(make_slug(None, "The Long Road").unwrap(), "the-long-road");
        assert_eq!(make_slug(Some("  "), "Hello World").unwrap(), "hello-world");
        assert_eq!(make_slug(Some("My Custom Slug"), "ignored").unwrap(), "my-custom-slug");
    }

    #[test]
    fn unusable_slug_is_rejected() {
        assert!(matches!(
            make_slug(None, "!!!").unwrap_err(),
            StorageError::InvalidData { .. }
        ));
    }
}
