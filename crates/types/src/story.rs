use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{StoryId, UserId};

/// Publication status of a story.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoryStatus {
    #[default]
    Ongoing,
    Completed,
    Hiatus,
}

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ongoing => "ONGOING",
            Self::Completed => "COMPLETED",
            Self::Hiatus => "HIATUS",
        }
    }
}

impl std::fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ONGOING" => Ok(Self::Ongoing),
            "COMPLETED" => Ok(Self::Completed),
            "HIATUS" => Ok(Self::Hiatus),
            other => Err(format!("unknown story status: {other}")),
        }
    }
}

/// A story and its aggregate counters.
///
/// Chapters are not embedded; they are owned through their `story_id` and
/// fetched from the chapter repository in `chapter_number` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    pub slug: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub status: StoryStatus,
    pub total_views: i64,
    pub total_likes: i64,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a story. The owning user comes from the caller identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStory {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub status: Option<StoryStatus>,
}

/// Partial update of a story's metadata.
///
/// An absent field is left untouched. The optional fields (`author`,
/// `description`, `coverImage`) are cleared by an explicit JSON `null`, which
/// deserializes to `Some(None)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub author: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<StoryStatus>,
}

/// Keep a present `null` apart from an absent field.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl StoryUpdate {
    /// Apply the present fields onto `story`.
    pub fn apply_to(&self, story: &mut Story) {
        if let Some(title) = &self.title {
            story.title = title.clone();
        }
        if let Some(slug) = &self.slug {
            story.slug = slug.clone();
        }
        if let Some(author) = &self.author {
            story.author = author.clone();
        }
        if let Some(description) = &self.description {
            story.description = description.clone();
        }
        if let Some(cover_image) = &self.cover_image {
            story.cover_image = cover_image.clone();
        }
        if let Some(status) = self.status {
            story.status = status;
        }
    }
}

/// Filter criteria for listing stories.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StoryFilter {
    pub status: Option<StoryStatus>,
    pub author: Option<String>,
    pub user_id: Option<UserId>,
    /// Case-insensitive substring of the title.
    pub title_contains: Option<String>,
    /// Case-insensitive substring of the title, author or description.
    pub keyword: Option<String>,
    pub exclude_id: Option<StoryId>,
}

impl StoryFilter {
    pub fn matches(&self, story: &Story) -> bool {
        if let Some(status) = self.status {
            if story.status != status {
                return false;
            }
        }
        if let Some(author) = &self.author {
            if story.author.as_deref() != Some(author.as_str()) {
                return false;
            }
        }
        if let Some(user_id) = self.user_id {
            if story.user_id != user_id {
                return false;
            }
        }
        if let Some(needle) = &self.title_contains {
            if !contains_ignore_case(&story.title, needle) {
                return false;
            }
        }
        if let Some(keyword) = &self.keyword {
            let hit = [
                Some(story.title.as_str()),
                story.author.as_deref(),
                story.description.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| contains_ignore_case(field, keyword));
            if !hit {
                return false;
            }
        }
        if self.exclude_id == Some(story.id) {
            return false;
        }
        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Sort order for story listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryOrder {
    #[default]
    Newest,
    RecentlyUpdated,
    MostViewed,
    MostLiked,
    /// Most viewed, then most liked, then most recently updated.
    Recommended,
}

/// Derived figures about a story's chapters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryStats {
    pub chapter_count: u64,
    pub total_word_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story() -> Story {
        Story {
            id: StoryId(1),
            title: "The Long Road".to_string(),
            slug: "the-long-road".to_string(),
            author: Some("Qyn".to_string()),
            description: None,
            cover_image: None,
            status: StoryStatus::Ongoing,
            total_views: 0,
            total_likes: 0,
            user_id: UserId(9),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("hiatus".parse::<StoryStatus>(), Ok(StoryStatus::Hiatus));
        assert_eq!("COMPLETED".parse::<StoryStatus>(), Ok(StoryStatus::Completed));
        assert!("dropped".parse::<StoryStatus>().is_err());
    }

    #[test]
    fn filter_matches_title_substring_ignoring_case() {
        let filter = StoryFilter {
            title_contains: Some("long".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&story()));

        let filter = StoryFilter {
            status: Some(StoryStatus::Completed),
            ..Default::default()
        };
        assert!(!filter.matches(&story()));

        let filter = StoryFilter {
            user_id: Some(UserId(9)),
            author: Some("Qyn".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&story()));
    }

    #[test]
    fn update_only_touches_present_fields() {
        let mut s = story();
        StoryUpdate {
            description: Some(Some("A journey".to_string())),
            status: Some(StoryStatus::Completed),
            ..Default::default()
        }
        .apply_to(&mut s);

        assert_eq!(s.title, "The Long Road");
        assert_eq!(s.description.as_deref(), Some("A journey"));
        assert_eq!(s.status, StoryStatus::Completed);
    }

    #[test]
    fn filter_keyword_searches_author_and_description() {
        let mut s = story();
        s.description = Some("Crossing the Northern Steppe".to_string());

        let by_author = StoryFilter {
            keyword: Some("qyn".to_string()),
            ..Default::default()
        };
        assert!(by_author.matches(&s));

        let by_description = StoryFilter {
            keyword: Some("STEPPE".to_string()),
            ..Default::default()
        };
        assert!(by_description.matches(&s));

        let miss = StoryFilter {
            keyword: Some("ocean".to_string()),
            ..Default::default()
        };
        assert!(!miss.matches(&s));

        let excluded = StoryFilter {
            author: Some("Qyn".to_string()),
            exclude_id: Some(s.id),
            ..Default::default()
        };
        assert!(!excluded.matches(&s));
    }

    #[test]
    fn update_null_clears_optional_fields() {
        let mut s = story();
        s.cover_image = Some("cover.png".to_string());

        let update: StoryUpdate =
            serde_json::from_str(r#"{"author": null, "description": "Kept"}"#).unwrap();
        assert_eq!(update.author, Some(None));
        assert_eq!(update.cover_image, None);
        update.apply_to(&mut s);

        assert_eq!(s.author, None);
        assert_eq!(s.description.as_deref(), Some("Kept"));
        assert_eq!(s.cover_image.as_deref(), Some("cover.png"));
    }
}
