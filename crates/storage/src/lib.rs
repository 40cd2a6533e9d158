//! Storage layer for the Qynnovel publishing backend.
//!
//! This crate provides the two independent stores behind a chapter: a
//! [`ContentStore`] for chapter text and the metadata repositories for stories,
//! chapters and reading history, together with their backends.

pub mod backends;
pub mod error;
pub mod traits;
pub mod words;

// Re-export the main interface and types for easy access
pub use backends::{FilesystemContentStore, MemoryStore};
#[cfg(feature = "postgres")]
pub use backends::PostgresStore;
pub use error::{Result, StorageError};
pub use traits::{ChapterRepository, ContentStore, ReadingHistoryRepository, StoryRepository};
pub use words::count_words;
