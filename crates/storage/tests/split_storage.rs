//! Metadata and content live in separate stores; these tests drive both the
//! way a service would and check they stay consistent.

use qynnovel_storage::{
    ChapterRepository, ContentStore, FilesystemContentStore, MemoryStore, StoryRepository,
    count_words,
};
use qynnovel_types::{NewChapter, NewStory, StoryId, UserId};
use tempfile::TempDir;

async fn setup() -> (TempDir, FilesystemContentStore, MemoryStore, StoryId) {
    let temp_dir = TempDir::new().unwrap();
    let content = FilesystemContentStore::new(temp_dir.path());
    content.initialize().await.unwrap();

    let metadata = MemoryStore::new();
    let story = metadata
        .insert_story(
            &NewStory {
                title: "Split Storage".to_string(),
                ..Default::default()
            },
            "split-storage",
            UserId(1),
        )
        .await
        .unwrap();

    (temp_dir, content, metadata, story.id)
}

#[tokio::test]
async fn test_metadata_update_keeps_content_reference() {
    let (temp_dir, content, metadata, story_id) = setup().await;

    let mut chapter = metadata
        .insert_chapter(&NewChapter {
            story_id,
            chapter_number: 1,
            title: "Chapter 1".to_string(),
            content: None,
        })
        .await
        .unwrap();
    assert!(!chapter.has_content());

    let text = "This is the content of Chapter 1.";
    content.save(story_id, chapter.id, text).await.unwrap();
    chapter.storage_path = Some(content.path_for(story_id, chapter.id));
    chapter.word_count = count_words(text);
    let chapter = metadata.update_chapter(&chapter).await.unwrap();
    metadata.increment_chapter_views(chapter.id).await.unwrap();

    // Rename without touching the content fields
    let mut renamed = metadata.get_chapter(chapter.id).await.unwrap().unwrap();
    renamed.title = "Chapter 1: Beginnings".to_string();
    let renamed = metadata.update_chapter(&renamed).await.unwrap();

    assert_eq!(renamed.title, "Chapter 1: Beginnings");
    assert_eq!(renamed.storage_path, chapter.storage_path);
    assert_eq!(renamed.word_count, 7);
    assert_eq!(renamed.views, 1);

    let on_disk = temp_dir.path().join(renamed.storage_path.as_deref().unwrap());
    assert!(on_disk.exists(), "storage path should resolve under the root");
    assert_eq!(content.read(story_id, renamed.id).await.unwrap(), text);
}

#[tokio::test]
async fn test_story_content_removed_independently_of_rows() {
    let (_temp_dir, content, metadata, story_id) = setup().await;

    let mut ids = Vec::new();
    for number in 1..=3 {
        let chapter = metadata
            .insert_chapter(&NewChapter {
                story_id,
                chapter_number: number,
                title: format!("Chapter {}", number),
                content: None,
            })
            .await
            .unwrap();
        content
            .save(story_id, chapter.id, &format!("text {}", number))
            .await
            .unwrap();
        ids.push(chapter.id);
    }

    let stored = content.list_stored().await.unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|(s, _)| *s == story_id));

    content.delete_story(story_id).await.unwrap();
    assert!(content.list_stored().await.unwrap().is_empty());

    // Rows are untouched; their content is simply gone
    assert_eq!(metadata.list_chapters(story_id).await.unwrap().len(), 3);
    let err = content.read(story_id, ids[0]).await.unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(metadata.delete_chapters_for_story(story_id).await.unwrap(), 3);
    assert!(metadata.delete_story(story_id).await.unwrap());
    assert!(metadata.get_story(story_id).await.unwrap().is_none());
}
