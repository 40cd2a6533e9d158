//! Filesystem-based content store.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{Result, StorageError};
use crate::traits::ContentStore;
use qynnovel_types::{ChapterId, StoryId};

const STORIES_DIR: &str = "stories";
const CHAPTERS_DIR: &str = "chapters";
const CONTENT_EXTENSION: &str = "txt";

/// Stores chapter text as plain UTF-8 files.
///
/// Directory structure:
/// ```text
/// storage_root/
/// +-- stories/
///     +-- {story_id}/
///         +-- chapters/
///             +-- {chapter_id}.txt
/// ```
///
/// The recorded storage path is the same layout relative to the root, always
/// `/`-separated: `stories/{story_id}/chapters/{chapter_id}.txt`.
#[derive(Debug, Clone)]
pub struct FilesystemContentStore {
    root_path: PathBuf,
}

impl FilesystemContentStore {
    /// Create a new filesystem content store.
    ///
    /// # Arguments
    /// * `root_path` - Path to the root storage directory
    pub fn new<P: AsRef<Path>>(root_path: P) -> Self {
        Self {
            root_path: root_path.as_ref().to_path_buf(),
        }
    }

    /// Create the storage root and its `stories` directory if they are missing.
    pub async fn initialize(&self) -> Result<()> {
        for dir in [self.root_path.clone(), self.root_path.join(STORIES_DIR)] {
            if fs::try_exists(&dir).await.unwrap_or(false) {
                continue;
            }

            fs::create_dir_all(&dir)
                .await
                .map_err(|e| StorageError::BackendError {
                    source: Some(eyre::eyre!(
                        "Failed to create storage directory {}: {}",
                        dir.display(),
                        e
                    )),
                })?;
            tracing::info!("Created storage directory: {}", dir.display());
        }

        Ok(())
    }

    fn story_dir(&self, story_id: StoryId) -> PathBuf {
        self.root_path.join(STORIES_DIR).join(story_id.to_string())
    }

    fn chapter_file(&self, story_id: StoryId, chapter_id: ChapterId) -> PathBuf {
        self.story_dir(story_id)
            .join(CHAPTERS_DIR)
            .join(format!("{}.{}", chapter_id, CONTENT_EXTENSION))
    }

    fn operation_failed(operation: String, e: std::io::Error) -> StorageError {
        StorageError::ContentOperationFailed {
            operation,
            source: Some(eyre::Report::new(e)),
        }
    }

    /// Parse `{chapter_id}.txt`, ignoring anything else.
    fn parse_chapter_file_name(name: &str) -> Option<ChapterId> {
        let stem = name.strip_suffix(CONTENT_EXTENSION)?.strip_suffix('.')?;
        stem.parse::<i64>().ok().map(ChapterId)
    }

    async fn list_story_dir(&self, story_id: StoryId) -> Result<Vec<ChapterId>> {
        let chapters_dir = self.story_dir(story_id).join(CHAPTERS_DIR);
        let mut entries = match fs::read_dir(&chapters_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Self::operation_failed(
                    format!("list {}", chapters_dir.display()),
                    e,
                ));
            }
        };

        let mut chapters = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            Self::operation_failed(format!("list {}", chapters_dir.display()), e)
        })? {
            let is_file = entry.file_type().await.map_or(false, |ft| ft.is_file());
            if !is_file {
                continue;
            }
            if let Some(chapter_id) = entry
                .file_name()
                .to_str()
                .and_then(Self::parse_chapter_file_name)
            {
                chapters.push(chapter_id);
            }
        }

        Ok(chapters)
    }
}

#[async_trait]
impl ContentStore for FilesystemContentStore {
    async fn save(&self, story_id: StoryId, chapter_id: ChapterId, content: &str) -> Result<()> {
        let path = self.chapter_file(story_id, chapter_id);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                Self::operation_failed(format!("create {}", parent.display()), e)
            })?;
        }

        fs::write(&path, content.as_bytes())
            .await
            .map_err(|e| Self::operation_failed(format!("write {}", path.display()), e))?;

        tracing::debug!(
            "Saved content for story {} chapter {} ({} bytes)",
            story_id,
            chapter_id,
            content.len()
        );
        Ok(())
    }

    async fn read(&self, story_id: StoryId, chapter_id: ChapterId) -> Result<String> {
        let path = self.chapter_file(story_id, chapter_id);

        match fs::read(&path).await {
            Ok(bytes) => String::from_utf8(bytes).map_err(|e| StorageError::InvalidData {
                message: format!("Content of {} is not valid UTF-8", path.display()),
                source: Some(eyre::Report::new(e)),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::ContentNotFound {
                story_id,
                chapter_id,
                source: None,
            }),
            Err(e) => Err(Self::operation_failed(format!("read {}", path.display()), e)),
        }
    }

    async fn delete(&self, story_id: StoryId, chapter_id: ChapterId) -> Result<()> {
        let path = self.chapter_file(story_id, chapter_id);

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("Deleted content for story {} chapter {}", story_id, chapter_id);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::operation_failed(
                format!("delete {}", path.display()),
                e,
            )),
        }
    }

    async fn delete_story(&self, story_id: StoryId) -> Result<()> {
        let dir = self.story_dir(story_id);

        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::debug!("Deleted content directory for story {}", story_id);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::operation_failed(
                format!("delete {}", dir.display()),
                e,
            )),
        }
    }

    async fn list_stored(&self) -> Result<Vec<(StoryId, ChapterId)>> {
        let stories_dir = self.root_path.join(STORIES_DIR);
        let mut entries = match fs::read_dir(&stories_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Self::operation_failed(
                    format!("list {}", stories_dir.display()),
                    e,
                ));
            }
        };

        let mut stored = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            Self::operation_failed(format!("list {}", stories_dir.display()), e)
        })? {
            let is_dir = entry.file_type().await.map_or(false, |ft| ft.is_dir());
            let story_id = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<i64>().ok())
                .map(StoryId);

            if let (true, Some(story_id)) = (is_dir, story_id) {
                for chapter_id in self.list_story_dir(story_id).await? {
                    stored.push((story_id, chapter_id));
                }
            }
        }

        stored.sort();
        Ok(stored)
    }

    fn path_for(&self, story_id: StoryId, chapter_id: ChapterId) -> String {
        format!(
            "{}/{}/{}/{}.{}",
            STORIES_DIR, story_id, CHAPTERS_DIR, chapter_id, CONTENT_EXTENSION
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FilesystemContentStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = FilesystemContentStore::new(temp_dir.path());
        (temp_dir, store)
    }

    #[tokio::test]
    async fn test_initialize_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("storage");
        let store = FilesystemContentStore::new(&root);

        store.initialize().await.unwrap();
        assert!(root.join("stories").is_dir());

        // Running it again is harmless
        store.initialize().await.unwrap();
    }

    #[tokio::test]
    async fn test_save_and_read_round_trip() {
        let (_temp_dir, store) = store();

        let text = "Chương 1\n\nMưa rơi trên phố cổ.";
        store.save(StoryId(1), ChapterId(10), text).await.unwrap();

        let read = store.read(StoryId(1), ChapterId(10)).await.unwrap();
        assert_eq!(read, text);
    }

    #[tokio::test]
    async fn test_empty_content_is_not_missing_content() {
        let (_temp_dir, store) = store();

        store.save(StoryId(1), ChapterId(1), "").await.unwrap();
        assert_eq!(store.read(StoryId(1), ChapterId(1)).await.unwrap(), "");

        let missing = store.read(StoryId(1), ChapterId(2)).await;
        assert!(matches!(
            missing.unwrap_err(),
            StorageError::ContentNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let (_temp_dir, store) = store();

        store.save(StoryId(2), ChapterId(5), "first draft").await.unwrap();
        store.save(StoryId(2), ChapterId(5), "final").await.unwrap();

        assert_eq!(store.read(StoryId(2), ChapterId(5)).await.unwrap(), "final");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_temp_dir, store) = store();

        store.save(StoryId(1), ChapterId(1), "text").await.unwrap();
        store.delete(StoryId(1), ChapterId(1)).await.unwrap();

        let result = store.read(StoryId(1), ChapterId(1)).await;
        assert!(result.unwrap_err().is_not_found());

        store.delete(StoryId(1), ChapterId(1)).await.unwrap();
        store.delete(StoryId(99), ChapterId(99)).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_lives_at_recorded_path() {
        let (temp_dir, store) = store();

        store.save(StoryId(3), ChapterId(7), "hello").await.unwrap();

        let recorded = store.path_for(StoryId(3), ChapterId(7));
        assert_eq!(recorded, "stories/3/chapters/7.txt");
        assert!(temp_dir.path().join(&recorded).is_file());
    }

    #[tokio::test]
    async fn test_list_stored_and_delete_story() {
        let (temp_dir, store) = store();

        store.save(StoryId(1), ChapterId(1), "a").await.unwrap();
        store.save(StoryId(1), ChapterId(2), "b").await.unwrap();
        store.save(StoryId(2), ChapterId(3), "c").await.unwrap();

        // Files outside the naming scheme are ignored
        std::fs::write(temp_dir.path().join("stories/1/chapters/notes.md"), "x").unwrap();
        std::fs::create_dir_all(temp_dir.path().join("stories/drafts")).unwrap();

        let stored = store.list_stored().await.unwrap();
        assert_eq!(
            stored,
            vec![
                (StoryId(1), ChapterId(1)),
                (StoryId(1), ChapterId(2)),
                (StoryId(2), ChapterId(3)),
            ]
        );

        store.delete_story(StoryId(1)).await.unwrap();
        assert!(!temp_dir.path().join("stories/1").exists());
        assert_eq!(
            store.list_stored().await.unwrap(),
            vec![(StoryId(2), ChapterId(3))]
        );

        // Missing tree is a no-op
        store.delete_story(StoryId(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_stored_without_root() {
        let temp_dir = TempDir::new().unwrap();
        let store = FilesystemContentStore::new(temp_dir.path().join("absent"));
        assert!(store.list_stored().await.unwrap().is_empty());
    }
}
