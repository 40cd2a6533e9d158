//! Shared data model for the Qynnovel publishing backend.
//!
//! These types are plain data: they carry no storage or HTTP behaviour and are
//! shared between the storage backends, the domain services and the API.

mod chapter;
mod page;
mod report;
mod story;

pub use chapter::{Chapter, NewChapter, NewReadingHistory, ReadingHistory};
pub use page::{Page, PageRequest};
pub use report::CleanupReport;
pub use story::{NewStory, Story, StoryFilter, StoryOrder, StoryStats, StoryStatus, StoryUpdate};

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Identifier of a story.
    StoryId
);
id_type!(
    /// Identifier of a chapter, unique across all stories.
    ChapterId
);
id_type!(
    /// Identifier of a user, as carried by the caller-identity header.
    UserId
);
id_type!(
    /// Identifier of a reading history entry.
    HistoryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&ChapterId::new(42)).unwrap();
        assert_eq!(json, "42");

        let id: StoryId = serde_json::from_str("7").unwrap();
        assert_eq!(id, StoryId(7));
        assert_eq!(id.to_string(), "7");
    }
}
