use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChapterId, HistoryId, StoryId, UserId};

/// Chapter metadata, optionally carrying its text.
///
/// `content` is never persisted with the metadata; it is attached in memory
/// when the text is read from the content store. `storage_path` stays `None`
/// until content has been saved at least once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: ChapterId,
    pub story_id: StoryId,
    pub chapter_number: i32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub word_count: u32,
    pub storage_path: Option<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chapter {
    pub fn has_content(&self) -> bool {
        self.storage_path.is_some()
    }
}

/// Input for creating a chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChapter {
    pub story_id: StoryId,
    pub chapter_number: i32,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// One "chapter was read" event. Entries are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingHistory {
    pub id: HistoryId,
    pub user_id: UserId,
    pub story_id: StoryId,
    pub chapter_id: ChapterId,
    pub read_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReadingHistory {
    pub user_id: UserId,
    pub story_id: StoryId,
    pub chapter_id: ChapterId,
    pub read_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_omitted_from_json_when_absent() {
        let chapter = Chapter {
            id: ChapterId(3),
            story_id: StoryId(1),
            chapter_number: 2,
            title: "Rain".to_string(),
            content: None,
            word_count: 0,
            storage_path: None,
            views: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(&chapter).unwrap();
        assert!(value.get("content").is_none());
        assert_eq!(value["chapterNumber"], 2);
        assert!(value["storagePath"].is_null());
    }

    #[test]
    fn new_chapter_content_defaults_to_none() {
        let chapter: NewChapter =
            serde_json::from_str(r#"{"storyId": 1, "chapterNumber": 1, "title": "Start"}"#)
                .unwrap();
        assert_eq!(chapter.story_id, StoryId(1));
        assert!(chapter.content.is_none());
    }
}
