use qynnovel_storage::{ChapterRepository, ContentStore, Result};
use qynnovel_types::CleanupReport;

/// Remove chapter content that no chapter row points at.
///
/// A blob is an orphan when its chapter row is gone or belongs to another
/// story. A row without a storage path still owns its blob: that is the state
/// between the content write and the metadata write of a chapter save.
///
/// Per-blob failures are collected in the report; only a failure to enumerate
/// the content store aborts the sweep.
pub async fn sweep_orphan_content(
    content: &dyn ContentStore,
    chapters: &dyn ChapterRepository,
) -> Result<CleanupReport> {
    let mut report = CleanupReport::new();

    for (story_id, chapter_id) in content.list_stored().await? {
        report.scanned += 1;

        let referenced = match chapters.get_chapter(chapter_id).await {
            Ok(Some(chapter)) => chapter.story_id == story_id,
            Ok(None) => false,
            Err(e) => {
                report.add_error(format!("chapter {}: {}", chapter_id, e));
                continue;
            }
        };
        if referenced {
            continue;
        }

        match content.delete(story_id, chapter_id).await {
            Ok(()) => {
                report.orphaned_removed += 1;
                tracing::info!(
                    "Removed orphaned content for story {} chapter {}",
                    story_id,
                    chapter_id
                );
            }
            Err(e) => report.add_error(format!("chapter {}: {}", chapter_id, e)),
        }
    }

    Ok(report)
}
