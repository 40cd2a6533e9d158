//! In-memory metadata store.
//!
//! Backs development servers and tests. Every repository trait is implemented
//! on the same [`MemoryStore`] so a single `Arc` can be handed to the services
//! for all three roles.

use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::error::{Result, StorageError};
use crate::traits::{ChapterRepository, ReadingHistoryRepository, StoryRepository};
use qynnovel_types::{
    Chapter, ChapterId, HistoryId, NewChapter, NewReadingHistory, NewStory, Page, PageRequest,
    ReadingHistory, Story, StoryFilter, StoryId, StoryOrder, StoryStats, UserId,
};

#[derive(Debug, Default)]
struct MemoryState {
    last_story_id: i64,
    last_chapter_id: i64,
    last_history_id: i64,
    stories: BTreeMap<StoryId, Story>,
    chapters: BTreeMap<ChapterId, Chapter>,
    history: Vec<ReadingHistory>,
}

impl MemoryState {
    fn story_mut(&mut self, id: StoryId) -> Result<&mut Story> {
        self.stories
            .get_mut(&id)
            .ok_or(StorageError::StoryNotFound { id, source: None })
    }

    fn slug_taken(&self, slug: &str, except: Option<StoryId>) -> bool {
        self.stories
            .values()
            .any(|s| s.slug == slug && Some(s.id) != except)
    }

    fn number_taken(&self, story_id: StoryId, number: i32, except: Option<ChapterId>) -> bool {
        self.chapters.values().any(|c| {
            c.story_id == story_id && c.chapter_number == number && Some(c.id) != except
        })
    }

    /// Chapters of a story sorted by chapter number.
    fn story_chapters(&self, story_id: StoryId) -> Vec<Chapter> {
        let mut chapters: Vec<Chapter> = self
            .chapters
            .values()
            .filter(|c| c.story_id == story_id)
            .cloned()
            .collect();
        chapters.sort_by_key(|c| c.chapter_number);
        chapters
    }
}

/// Metadata store kept entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoryRepository for MemoryStore {
    async fn insert_story(&self, story: &NewStory, slug: &str, user_id: UserId) -> Result<Story> {
        let mut state = self.state.write().await;

        if state.slug_taken(slug, None) {
            return Err(StorageError::DuplicateSlug {
                slug: slug.to_string(),
                source: None,
            });
        }

        state.last_story_id += 1;
        let now = Utc::now();
        let stored = Story {
            id: StoryId(state.last_story_id),
            title: story.title.clone(),
            slug: slug.to_string(),
            author: story.author.clone(),
            description: story.description.clone(),
            cover_image: story.cover_image.clone(),
            status: story.status.unwrap_or_default(),
            total_views: 0,
            total_likes: 0,
            user_id,
            created_at: now,
            updated_at: now,
        };

        state.stories.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_story(&self, id: StoryId) -> Result<Option<Story>> {
        Ok(self.state.read().await.stories.get(&id).cloned())
    }

    async fn find_story_by_slug(&self, slug: &str) -> Result<Option<Story>> {
        let state = self.state.read().await;
        Ok(state.stories.values().find(|s| s.slug == slug).cloned())
    }

    async fn update_story(&self, story: &Story) -> Result<Story> {
        let mut state = self.state.write().await;

        if state.slug_taken(&story.slug, Some(story.id)) {
            return Err(StorageError::DuplicateSlug {
                slug: story.slug.clone(),
                source: None,
            });
        }

        let stored = state.story_mut(story.id)?;
        stored.title = story.title.clone();
        stored.slug = story.slug.clone();
        stored.author = story.author.clone();
        stored.description = story.description.clone();
        stored.cover_image = story.cover_image.clone();
        stored.status = story.status;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_story(&self, id: StoryId) -> Result<bool> {
        Ok(self.state.write().await.stories.remove(&id).is_some())
    }

    async fn list_stories(
        &self,
        filter: &StoryFilter,
        order: StoryOrder,
        page: PageRequest,
    ) -> Result<Page<Story>> {
        let state = self.state.read().await;
        let mut stories: Vec<Story> = state
            .stories
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();

        match order {
            StoryOrder::Newest => stories.sort_by_key(|s| Reverse((s.created_at, s.id))),
            StoryOrder::RecentlyUpdated => stories.sort_by_key(|s| Reverse((s.updated_at, s.id))),
            StoryOrder::MostViewed => stories.sort_by_key(|s| Reverse((s.total_views, s.id))),
            StoryOrder::MostLiked => stories.sort_by_key(|s| Reverse((s.total_likes, s.id))),
            StoryOrder::Recommended => stories.sort_by_key(|s| {
                Reverse((s.total_views, s.total_likes, s.updated_at, s.id))
            }),
        }

        Ok(Page::from_ordered(stories, page))
    }

    async fn increment_story_views(&self, id: StoryId) -> Result<i64> {
        let mut state = self.state.write().await;
        let story = state.story_mut(id)?;
        story.total_views += 1;
        Ok(story.total_views)
    }

    async fn increment_story_likes(&self, id: StoryId) -> Result<i64> {
        let mut state = self.state.write().await;
        let story = state.story_mut(id)?;
        story.total_likes += 1;
        Ok(story.total_likes)
    }

    async fn decrement_story_likes(&self, id: StoryId) -> Result<i64> {
        let mut state = self.state.write().await;
        let story = state.story_mut(id)?;
        story.total_likes = (story.total_likes - 1).max(0);
        Ok(story.total_likes)
    }

    async fn story_stats(&self, id: StoryId) -> Result<StoryStats> {
        let state = self.state.read().await;
        if !state.stories.contains_key(&id) {
            return Err(StorageError::StoryNotFound { id, source: None });
        }

        let mut stats = StoryStats::default();
        for chapter in state.chapters.values().filter(|c| c.story_id == id) {
            stats.chapter_count += 1;
            stats.total_word_count += u64::from(chapter.word_count);
        }
        Ok(stats)
    }
}

#[async_trait]
impl ChapterRepository for MemoryStore {
    async fn insert_chapter(&self, chapter: &NewChapter) -> Result<Chapter> {
        let mut state = self.state.write().await;

        if !state.stories.contains_key(&chapter.story_id) {
            return Err(StorageError::StoryNotFound {
                id: chapter.story_id,
                source: None,
            });
        }
        if state.number_taken(chapter.story_id, chapter.chapter_number, None) {
            return Err(StorageError::DuplicateChapterNumber {
                story_id: chapter.story_id,
                chapter_number: chapter.chapter_number,
                source: None,
            });
        }

        state.last_chapter_id += 1;
        let now = Utc::now();
        let stored = Chapter {
            id: ChapterId(state.last_chapter_id),
            story_id: chapter.story_id,
            chapter_number: chapter.chapter_number,
            title: chapter.title.clone(),
            content: None,
            word_count: 0,
            storage_path: None,
            views: 0,
            created_at: now,
            updated_at: now,
        };

        state.chapters.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_chapter(&self, id: ChapterId) -> Result<Option<Chapter>> {
        Ok(self.state.read().await.chapters.get(&id).cloned())
    }

    async fn update_chapter(&self, chapter: &Chapter) -> Result<Chapter> {
        let mut state = self.state.write().await;

        if state.number_taken(chapter.story_id, chapter.chapter_number, Some(chapter.id)) {
            return Err(StorageError::DuplicateChapterNumber {
                story_id: chapter.story_id,
                chapter_number: chapter.chapter_number,
                source: None,
            });
        }

        let stored = state
            .chapters
            .get_mut(&chapter.id)
            .ok_or(StorageError::ChapterNotFound {
                id: chapter.id,
                source: None,
            })?;
        stored.chapter_number = chapter.chapter_number;
        stored.title = chapter.title.clone();
        stored.word_count = chapter.word_count;
        stored.storage_path = chapter.storage_path.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_chapter(&self, id: ChapterId) -> Result<bool> {
        Ok(self.state.write().await.chapters.remove(&id).is_some())
    }

    async fn delete_chapters_for_story(&self, story_id: StoryId) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.chapters.len();
        state.chapters.retain(|_, c| c.story_id != story_id);
        Ok((before - state.chapters.len()) as u64)
    }

    async fn list_chapters(&self, story_id: StoryId) -> Result<Vec<Chapter>> {
        Ok(self.state.read().await.story_chapters(story_id))
    }

    async fn list_chapters_page(
        &self,
        story_id: StoryId,
        page: PageRequest,
    ) -> Result<Page<Chapter>> {
        let chapters = self.state.read().await.story_chapters(story_id);
        Ok(Page::from_ordered(chapters, page))
    }

    async fn first_chapter(&self, story_id: StoryId) -> Result<Option<Chapter>> {
        let state = self.state.read().await;
        Ok(state.story_chapters(story_id).into_iter().next())
    }

    async fn next_chapter(
        &self,
        story_id: StoryId,
        chapter_number: i32,
    ) -> Result<Option<Chapter>> {
        let state = self.state.read().await;
        Ok(state
            .story_chapters(story_id)
            .into_iter()
            .find(|c| c.chapter_number > chapter_number))
    }

    async fn previous_chapter(
        &self,
        story_id: StoryId,
        chapter_number: i32,
    ) -> Result<Option<Chapter>> {
        let state = self.state.read().await;
        Ok(state
            .story_chapters(story_id)
            .into_iter()
            .rev()
            .find(|c| c.chapter_number < chapter_number))
    }

    async fn latest_chapters(&self, story_id: StoryId, limit: u32) -> Result<Vec<Chapter>> {
        let state = self.state.read().await;
        Ok(state
            .story_chapters(story_id)
            .into_iter()
            .rev()
            .take(limit as usize)
            .collect())
    }

    async fn increment_chapter_views(&self, id: ChapterId) -> Result<i64> {
        let mut state = self.state.write().await;
        let chapter = state
            .chapters
            .get_mut(&id)
            .ok_or(StorageError::ChapterNotFound { id, source: None })?;
        chapter.views += 1;
        Ok(chapter.views)
    }
}

#[async_trait]
impl ReadingHistoryRepository for MemoryStore {
    async fn append_history(&self, entry: &NewReadingHistory) -> Result<ReadingHistory> {
        let mut state = self.state.write().await;

        state.last_history_id += 1;
        let stored = ReadingHistory {
            id: HistoryId(state.last_history_id),
            user_id: entry.user_id,
            story_id: entry.story_id,
            chapter_id: entry.chapter_id,
            read_at: entry.read_at,
        };

        state.history.push(stored.clone());
        Ok(stored)
    }

    async fn history_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<ReadingHistory>> {
        let state = self.state.read().await;
        let mut entries: Vec<ReadingHistory> = state
            .history
            .iter()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|h| Reverse((h.read_at, h.id)));
        Ok(Page::from_ordered(entries, page))
    }

    async fn latest_for_story(
        &self,
        user_id: UserId,
        story_id: StoryId,
    ) -> Result<Option<ReadingHistory>> {
        let state = self.state.read().await;
        Ok(state
            .history
            .iter()
            .filter(|h| h.user_id == user_id && h.story_id == story_id)
            .max_by_key(|h| (h.read_at, h.id))
            .cloned())
    }

    async fn delete_history_for_story(&self, story_id: StoryId) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.history.len();
        state.history.retain(|h| h.story_id != story_id);
        Ok((before - state.history.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_story() -> (MemoryStore, Story) {
        let store = MemoryStore::new();
        let story = store
            .insert_story(
                &NewStory {
                    title: "Test Story".to_string(),
                    ..Default::default()
                },
                "test-story",
                UserId(1),
            )
            .await
            .unwrap();
        (store, story)
    }

    fn new_chapter(story_id: StoryId, number: i32) -> NewChapter {
        NewChapter {
            story_id,
            chapter_number: number,
            title: format!("Chapter {}", number),
            content: None,
        }
    }

    #[tokio::test]
    async fn test_slug_must_be_unique() {
        let (store, _story) = store_with_story().await;

        let result = store
            .insert_story(
                &NewStory {
                    title: "Another".to_string(),
                    ..Default::default()
                },
                "test-story",
                UserId(2),
            )
            .await;
        assert!(matches!(
            result.unwrap_err(),
            StorageError::DuplicateSlug { .. }
        ));
    }

    #[tokio::test]
    async fn test_chapter_navigation_follows_chapter_number() {
        let (store, story) = store_with_story().await;

        // Inserted out of order so ids do not match reading order
        let third = store.insert_chapter(&new_chapter(story.id, 30)).await.unwrap();
        let first = store.insert_chapter(&new_chapter(story.id, 10)).await.unwrap();
        let second = store.insert_chapter(&new_chapter(story.id, 20)).await.unwrap();

        let listed: Vec<i32> = store
            .list_chapters(story.id)
            .await
            .unwrap()
            .iter()
            .map(|c| c.chapter_number)
            .collect();
        assert_eq!(listed, vec![10, 20, 30]);

        let next = store.next_chapter(story.id, 20).await.unwrap().unwrap();
        assert_eq!(next.id, third.id);
        let previous = store.previous_chapter(story.id, 20).await.unwrap().unwrap();
        assert_eq!(previous.id, first.id);
        assert!(store.next_chapter(story.id, 30).await.unwrap().is_none());
        assert!(store.previous_chapter(story.id, 10).await.unwrap().is_none());

        let first_found = store.first_chapter(story.id).await.unwrap().unwrap();
        assert_eq!(first_found.id, first.id);

        let latest = store.latest_chapters(story.id, 2).await.unwrap();
        assert_eq!(
            latest.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![third.id, second.id]
        );
    }

    #[tokio::test]
    async fn test_chapter_number_unique_within_story() {
        let (store, story) = store_with_story().await;
        let other = store
            .insert_story(
                &NewStory {
                    title: "Other".to_string(),
                    ..Default::default()
                },
                "other",
                UserId(1),
            )
            .await
            .unwrap();

        store.insert_chapter(&new_chapter(story.id, 1)).await.unwrap();
        store.insert_chapter(&new_chapter(other.id, 1)).await.unwrap();

        let result = store.insert_chapter(&new_chapter(story.id, 1)).await;
        assert!(result.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_chapter_requires_story() {
        let store = MemoryStore::new();
        let result = store.insert_chapter(&new_chapter(StoryId(5), 1)).await;
        assert!(matches!(
            result.unwrap_err(),
            StorageError::StoryNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_update_chapter_keeps_views() {
        let (store, story) = store_with_story().await;
        let mut chapter = store.insert_chapter(&new_chapter(story.id, 1)).await.unwrap();

        store.increment_chapter_views(chapter.id).await.unwrap();
        chapter.word_count = 12;
        chapter.storage_path = Some("stories/1/chapters/1.txt".to_string());
        let updated = store.update_chapter(&chapter).await.unwrap();

        assert_eq!(updated.views, 1);
        assert_eq!(updated.word_count, 12);
        assert!(updated.content.is_none());
    }

    #[tokio::test]
    async fn test_likes_never_go_negative() {
        let (store, story) = store_with_story().await;

        assert_eq!(store.decrement_story_likes(story.id).await.unwrap(), 0);
        assert_eq!(store.increment_story_likes(story.id).await.unwrap(), 1);
        assert_eq!(store.increment_story_likes(story.id).await.unwrap(), 2);
        assert_eq!(store.decrement_story_likes(story.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_stories_orders_and_pages() {
        let store = MemoryStore::new();
        for (i, title) in ["Alpha", "Beta", "Gamma"].iter().enumerate() {
            let story = store
                .insert_story(
                    &NewStory {
                        title: title.to_string(),
                        ..Default::default()
                    },
                    &title.to_lowercase(),
                    UserId(1),
                )
                .await
                .unwrap();
            for _ in 0..i {
                store.increment_story_views(story.id).await.unwrap();
            }
        }

        let most_viewed = store
            .list_stories(
                &StoryFilter::default(),
                StoryOrder::MostViewed,
                PageRequest::new(0, 2),
            )
            .await
            .unwrap();
        let titles: Vec<&str> = most_viewed.items.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Gamma", "Beta"]);
        assert_eq!(most_viewed.total_items, 3);
        assert_eq!(most_viewed.total_pages, 2);

        let filtered = store
            .list_stories(
                &StoryFilter {
                    title_contains: Some("ALP".to_string()),
                    ..Default::default()
                },
                StoryOrder::Newest,
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(filtered.items.len(), 1);
        assert_eq!(filtered.items[0].title, "Alpha");
    }

    #[tokio::test]
    async fn test_recommended_breaks_view_ties_by_likes() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for title in ["Quiet", "Loved", "Popular"] {
            let story = store
                .insert_story(
                    &NewStory {
                        title: title.to_string(),
                        author: Some("Lan".to_string()),
                        ..Default::default()
                    },
                    &title.to_lowercase(),
                    UserId(1),
                )
                .await
                .unwrap();
            ids.push(story.id);
        }
        let (quiet, loved, popular) = (ids[0], ids[1], ids[2]);

        for id in [quiet, loved, popular, popular] {
            store.increment_story_views(id).await.unwrap();
        }
        store.increment_story_likes(loved).await.unwrap();

        let recommended = store
            .list_stories(
                &StoryFilter::default(),
                StoryOrder::Recommended,
                PageRequest::default(),
            )
            .await
            .unwrap();
        let order: Vec<StoryId> = recommended.items.iter().map(|s| s.id).collect();
        assert_eq!(order, vec![popular, loved, quiet]);

        let others = store
            .list_stories(
                &StoryFilter {
                    author: Some("Lan".to_string()),
                    exclude_id: Some(loved),
                    ..Default::default()
                },
                StoryOrder::Newest,
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(others.total_items, 2);
        assert!(others.items.iter().all(|s| s.id != loved));
    }

    #[tokio::test]
    async fn test_history_is_most_recent_first() {
        let (store, story) = store_with_story().await;
        let chapter = store.insert_chapter(&new_chapter(story.id, 1)).await.unwrap();
        let base = Utc::now();

        for minutes in [5, 1, 9] {
            store
                .append_history(&NewReadingHistory {
                    user_id: UserId(7),
                    story_id: story.id,
                    chapter_id: chapter.id,
                    read_at: base + chrono::Duration::minutes(minutes),
                })
                .await
                .unwrap();
        }

        let page = store
            .history_for_user(UserId(7), PageRequest::default())
            .await
            .unwrap();
        let offsets: Vec<i64> = page
            .items
            .iter()
            .map(|h| (h.read_at - base).num_minutes())
            .collect();
        assert_eq!(offsets, vec![9, 5, 1]);

        let latest = store
            .latest_for_story(UserId(7), story.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!((latest.read_at - base).num_minutes(), 9);

        assert_eq!(store.delete_history_for_story(story.id).await.unwrap(), 3);
        assert!(
            store
                .latest_for_story(UserId(7), story.id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
