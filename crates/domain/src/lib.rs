//! Application services of the Qynnovel publishing backend.
//!
//! The services coordinate the metadata repositories with the chapter content
//! store. They hold the repositories as trait objects so the same code runs
//! against the in-memory and the PostgreSQL backends.

mod chapters;
mod maintenance;
mod stories;

pub use chapters::ChapterService;
pub use maintenance::sweep_orphan_content;
pub use stories::StoryService;

pub use qynnovel_storage::{Result, StorageError};
