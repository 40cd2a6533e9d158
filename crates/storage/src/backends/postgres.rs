//! PostgreSQL metadata store.

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use bb8_postgres::PostgresConnectionManager;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

use crate::error::{Result, StorageError};
use crate::traits::{ChapterRepository, ReadingHistoryRepository, StoryRepository};
use qynnovel_types::{
    Chapter, ChapterId, HistoryId, NewChapter, NewReadingHistory, NewStory, Page, PageRequest,
    ReadingHistory, Story, StoryFilter, StoryId, StoryOrder, StoryStats, StoryStatus, UserId,
};

type Manager = PostgresConnectionManager<NoTls>;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS stories (
    id BIGSERIAL PRIMARY KEY,
    title VARCHAR(255) NOT NULL,
    slug VARCHAR(255) NOT NULL UNIQUE,
    author VARCHAR(100),
    description TEXT,
    cover_image VARCHAR(255),
    status VARCHAR(16) NOT NULL DEFAULT 'ONGOING',
    total_views BIGINT NOT NULL DEFAULT 0,
    total_likes BIGINT NOT NULL DEFAULT 0,
    user_id BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS chapters (
    id BIGSERIAL PRIMARY KEY,
    story_id BIGINT NOT NULL REFERENCES stories (id),
    chapter_number INTEGER NOT NULL,
    title VARCHAR(255) NOT NULL,
    word_count INTEGER NOT NULL DEFAULT 0,
    storage_path VARCHAR(255),
    views BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (story_id, chapter_number)
);

CREATE TABLE IF NOT EXISTS reading_history (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT NOT NULL,
    story_id BIGINT NOT NULL REFERENCES stories (id),
    chapter_id BIGINT NOT NULL,
    read_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS reading_history_user_read_at
    ON reading_history (user_id, read_at DESC);
"#;

const STORY_COLUMNS: &str = "id, title, slug, author, description, cover_image, status, \
     total_views, total_likes, user_id, created_at, updated_at";

const CHAPTER_COLUMNS: &str =
    "id, story_id, chapter_number, title, word_count, storage_path, views, created_at, updated_at";

const HISTORY_COLUMNS: &str = "id, user_id, story_id, chapter_id, read_at";

/// Metadata store backed by a pooled PostgreSQL connection.
#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool<Manager>,
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStore")
            .field("state", &self.pool.state())
            .finish()
    }
}

impl PostgresStore {
    /// Connect a pool to `url` (a libpq-style connection string or URL).
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let manager =
            PostgresConnectionManager::new_from_stringlike(url, NoTls).map_err(StorageError::backend)?;
        let pool = Pool::builder()
            .max_size(max_connections)
            .build(manager)
            .await
            .map_err(StorageError::backend)?;

        Ok(Self { pool })
    }

    /// Create the tables if they do not exist yet.
    pub async fn initialize(&self) -> Result<()> {
        let conn = self.conn().await?;
        conn.batch_execute(SCHEMA)
            .await
            .map_err(StorageError::backend)?;
        tracing::info!("Database schema is ready");
        Ok(())
    }

    async fn conn(&self) -> Result<PooledConnection<'_, Manager>> {
        self.pool.get().await.map_err(StorageError::backend)
    }
}

fn unique_violation(e: &tokio_postgres::Error) -> bool {
    e.code() == Some(&SqlState::UNIQUE_VIOLATION)
}

fn foreign_key_violation(e: &tokio_postgres::Error) -> bool {
    e.code() == Some(&SqlState::FOREIGN_KEY_VIOLATION)
}

fn conversion_error(column: &str, e: impl Into<eyre::Report>) -> StorageError {
    StorageError::InvalidData {
        message: format!("Failed to read column {}", column),
        source: Some(e.into()),
    }
}

fn get<'a, T: tokio_postgres::types::FromSql<'a>>(row: &'a Row, column: &str) -> Result<T> {
    row.try_get(column).map_err(|e| conversion_error(column, e))
}

fn parse_status(value: &str) -> Result<StoryStatus> {
    value
        .parse::<StoryStatus>()
        .map_err(|e| conversion_error("status", eyre::eyre!(e)))
}

/// Escape `%`, `_` and `\` so user input is matched literally by `ILIKE`.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn order_clause(order: StoryOrder) -> &'static str {
    match order {
        StoryOrder::Newest => "created_at DESC, id DESC",
        StoryOrder::RecentlyUpdated => "updated_at DESC, id DESC",
        StoryOrder::MostViewed => "total_views DESC, id DESC",
        StoryOrder::MostLiked => "total_likes DESC, id DESC",
        StoryOrder::Recommended => {
            "total_views DESC, total_likes DESC, updated_at DESC, id DESC"
        }
    }
}

fn story_from_row(row: &Row) -> Result<Story> {
    let status: String = get(row, "status")?;
    Ok(Story {
        id: StoryId(get(row, "id")?),
        title: get(row, "title")?,
        slug: get(row, "slug")?,
        author: get(row, "author")?,
        description: get(row, "description")?,
        cover_image: get(row, "cover_image")?,
        status: parse_status(&status)?,
        total_views: get(row, "total_views")?,
        total_likes: get(row, "total_likes")?,
        user_id: UserId(get(row, "user_id")?),
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

fn chapter_from_row(row: &Row) -> Result<Chapter> {
    let word_count: i32 = get(row, "word_count")?;
    Ok(Chapter {
        id: ChapterId(get(row, "id")?),
        story_id: StoryId(get(row, "story_id")?),
        chapter_number: get(row, "chapter_number")?,
        title: get(row, "title")?,
        content: None,
        word_count: u32::try_from(word_count).unwrap_or(0),
        storage_path: get(row, "storage_path")?,
        views: get(row, "views")?,
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

fn history_from_row(row: &Row) -> Result<ReadingHistory> {
    Ok(ReadingHistory {
        id: HistoryId(get(row, "id")?),
        user_id: UserId(get(row, "user_id")?),
        story_id: StoryId(get(row, "story_id")?),
        chapter_id: ChapterId(get(row, "chapter_id")?),
        read_at: get(row, "read_at")?,
    })
}

fn chapters_from_rows(rows: &[Row]) -> Result<Vec<Chapter>> {
    rows.iter().map(chapter_from_row).collect()
}

fn page_params(page: PageRequest) -> (i64, i64) {
    (page.limit() as i64, page.offset() as i64)
}

#[async_trait]
impl StoryRepository for PostgresStore {
    async fn insert_story(&self, story: &NewStory, slug: &str, user_id: UserId) -> Result<Story> {
        let conn = self.conn().await?;
        let sql = format!(
            "INSERT INTO stories (title, slug, author, description, cover_image, status, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            STORY_COLUMNS
        );
        let status = story.status.unwrap_or_default().as_str();

        let row = conn
            .query_one(
                &sql,
                &[
                    &story.title,
                    &slug,
                    &story.author,
                    &story.description,
                    &story.cover_image,
                    &status,
                    &user_id.get(),
                ],
            )
            .await
            .map_err(|e| {
                if unique_violation(&e) {
                    StorageError::DuplicateSlug {
                        slug: slug.to_string(),
                        source: Some(e.into()),
                    }
                } else {
                    StorageError::backend(e)
                }
            })?;

        story_from_row(&row)
    }

    async fn get_story(&self, id: StoryId) -> Result<Option<Story>> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {} FROM stories WHERE id = $1", STORY_COLUMNS);
        let row = conn
            .query_opt(&sql, &[&id.get()])
            .await
            .map_err(StorageError::backend)?;
        row.as_ref().map(story_from_row).transpose()
    }

    async fn find_story_by_slug(&self, slug: &str) -> Result<Option<Story>> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {} FROM stories WHERE slug = $1", STORY_COLUMNS);
        let row = conn
            .query_opt(&sql, &[&slug])
            .await
            .map_err(StorageError::backend)?;
        row.as_ref().map(story_from_row).transpose()
    }

    async fn update_story(&self, story: &Story) -> Result<Story> {
        let conn = self.conn().await?;
        let sql = format!(
            "UPDATE stories SET title = $2, slug = $3, author = $4, description = $5, \
             cover_image = $6, status = $7, updated_at = now() WHERE id = $1 RETURNING {}",
            STORY_COLUMNS
        );

        let row = conn
            .query_opt(
                &sql,
                &[
                    &story.id.get(),
                    &story.title,
                    &story.slug,
                    &story.author,
                    &story.description,
                    &story.cover_image,
                    &story.status.as_str(),
                ],
            )
            .await
            .map_err(|e| {
                if unique_violation(&e) {
                    StorageError::DuplicateSlug {
                        slug: story.slug.clone(),
                        source: Some(e.into()),
                    }
                } else {
                    StorageError::backend(e)
                }
            })?
            .ok_or(StorageError::StoryNotFound {
                id: story.id,
                source: None,
            })?;

        story_from_row(&row)
    }

    async fn delete_story(&self, id: StoryId) -> Result<bool> {
        let conn = self.conn().await?;
        let deleted = conn
            .execute("DELETE FROM stories WHERE id = $1", &[&id.get()])
            .await
            .map_err(StorageError::backend)?;
        Ok(deleted > 0)
    }

    async fn list_stories(
        &self,
        filter: &StoryFilter,
        order: StoryOrder,
        page: PageRequest,
    ) -> Result<Page<Story>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn ToSql + Sync + Send>> = Vec::new();

        if let Some(status) = filter.status {
            params.push(Box::new(status.as_str().to_string()));
            clauses.push(format!("status = ${}", params.len()));
        }
        if let Some(author) = &filter.author {
            params.push(Box::new(author.clone()));
            clauses.push(format!("author = ${}", params.len()));
        }
        if let Some(user_id) = filter.user_id {
            params.push(Box::new(user_id.get()));
            clauses.push(format!("user_id = ${}", params.len()));
        }
        if let Some(needle) = &filter.title_contains {
            params.push(Box::new(format!("%{}%", escape_like(needle))));
            clauses.push(format!("title ILIKE ${}", params.len()));
        }
        if let Some(keyword) = &filter.keyword {
            params.push(Box::new(format!("%{}%", escape_like(keyword))));
            let n = params.len();
            clauses.push(format!(
                "(title ILIKE ${n} OR author ILIKE ${n} OR description ILIKE ${n})"
            ));
        }
        if let Some(exclude_id) = filter.exclude_id {
            params.push(Box::new(exclude_id.get()));
            clauses.push(format!("id <> ${}", params.len()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let (limit, offset) = page_params(page);
        params.push(Box::new(limit));
        params.push(Box::new(offset));
        let list_sql = format!(
            "SELECT {} FROM stories{} ORDER BY {} LIMIT ${} OFFSET ${}",
            STORY_COLUMNS,
            where_sql,
            order_clause(order),
            params.len() - 1,
            params.len()
        );
        let count_sql = format!("SELECT COUNT(*) FROM stories{}", where_sql);

        let refs: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();
        let filter_params = &refs[..refs.len() - 2];

        let conn = self.conn().await?;
        let total: i64 = conn
            .query_one(&count_sql, filter_params)
            .await
            .map_err(StorageError::backend)?
            .get(0);
        let rows = conn
            .query(&list_sql, &refs)
            .await
            .map_err(StorageError::backend)?;

        let stories = rows.iter().map(story_from_row).collect::<Result<Vec<_>>>()?;
        Ok(Page::new(stories, page, total.max(0) as u64))
    }

    async fn increment_story_views(&self, id: StoryId) -> Result<i64> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "UPDATE stories SET total_views = total_views + 1 WHERE id = $1 RETURNING total_views",
                &[&id.get()],
            )
            .await
            .map_err(StorageError::backend)?
            .ok_or(StorageError::StoryNotFound { id, source: None })?;
        get(&row, "total_views")
    }

    async fn increment_story_likes(&self, id: StoryId) -> Result<i64> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "UPDATE stories SET total_likes = total_likes + 1 WHERE id = $1 RETURNING total_likes",
                &[&id.get()],
            )
            .await
            .map_err(StorageError::backend)?
            .ok_or(StorageError::StoryNotFound { id, source: None })?;
        get(&row, "total_likes")
    }

    async fn decrement_story_likes(&self, id: StoryId) -> Result<i64> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "UPDATE stories SET total_likes = GREATEST(total_likes - 1, 0) WHERE id = $1 \
                 RETURNING total_likes",
                &[&id.get()],
            )
            .await
            .map_err(StorageError::backend)?
            .ok_or(StorageError::StoryNotFound { id, source: None })?;
        get(&row, "total_likes")
    }

    async fn story_stats(&self, id: StoryId) -> Result<StoryStats> {
        let conn = self.conn().await?;
        let exists = conn
            .query_opt("SELECT 1 FROM stories WHERE id = $1", &[&id.get()])
            .await
            .map_err(StorageError::backend)?
            .is_some();
        if !exists {
            return Err(StorageError::StoryNotFound { id, source: None });
        }

        let row = conn
            .query_one(
                "SELECT COUNT(*) AS chapter_count, \
                 COALESCE(SUM(word_count), 0)::BIGINT AS total_word_count \
                 FROM chapters WHERE story_id = $1",
                &[&id.get()],
            )
            .await
            .map_err(StorageError::backend)?;

        let chapter_count: i64 = get(&row, "chapter_count")?;
        let total_word_count: i64 = get(&row, "total_word_count")?;
        Ok(StoryStats {
            chapter_count: chapter_count.max(0) as u64,
            total_word_count: total_word_count.max(0) as u64,
        })
    }
}

#[async_trait]
impl ChapterRepository for PostgresStore {
    async fn insert_chapter(&self, chapter: &NewChapter) -> Result<Chapter> {
        let conn = self.conn().await?;
        let sql = format!(
            "INSERT INTO chapters (story_id, chapter_number, title) VALUES ($1, $2, $3) \
             RETURNING {}",
            CHAPTER_COLUMNS
        );

        let row = conn
            .query_one(
                &sql,
                &[&chapter.story_id.get(), &chapter.chapter_number, &chapter.title],
            )
            .await
            .map_err(|e| {
                if unique_violation(&e) {
                    StorageError::DuplicateChapterNumber {
                        story_id: chapter.story_id,
                        chapter_number: chapter.chapter_number,
                        source: Some(e.into()),
                    }
                } else if foreign_key_violation(&e) {
                    StorageError::StoryNotFound {
                        id: chapter.story_id,
                        source: Some(e.into()),
                    }
                } else {
                    StorageError::backend(e)
                }
            })?;

        chapter_from_row(&row)
    }

    async fn get_chapter(&self, id: ChapterId) -> Result<Option<Chapter>> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {} FROM chapters WHERE id = $1", CHAPTER_COLUMNS);
        let row = conn
            .query_opt(&sql, &[&id.get()])
            .await
            .map_err(StorageError::backend)?;
        row.as_ref().map(chapter_from_row).transpose()
    }

    async fn update_chapter(&self, chapter: &Chapter) -> Result<Chapter> {
        let conn = self.conn().await?;
        let sql = format!(
            "UPDATE chapters SET chapter_number = $2, title = $3, word_count = $4, \
             storage_path = $5, updated_at = now() WHERE id = $1 RETURNING {}",
            CHAPTER_COLUMNS
        );
        let word_count = i32::try_from(chapter.word_count).unwrap_or(i32::MAX);

        let row = conn
            .query_opt(
                &sql,
                &[
                    &chapter.id.get(),
                    &chapter.chapter_number,
                    &chapter.title,
                    &word_count,
                    &chapter.storage_path,
                ],
            )
            .await
            .map_err(|e| {
                if unique_violation(&e) {
                    StorageError::DuplicateChapterNumber {
                        story_id: chapter.story_id,
                        chapter_number: chapter.chapter_number,
                        source: Some(e.into()),
                    }
                } else {
                    StorageError::backend(e)
                }
            })?
            .ok_or(StorageError::ChapterNotFound {
                id: chapter.id,
                source: None,
            })?;

        chapter_from_row(&row)
    }

    async fn delete_chapter(&self, id: ChapterId) -> Result<bool> {
        let conn = self.conn().await?;
        let deleted = conn
            .execute("DELETE FROM chapters WHERE id = $1", &[&id.get()])
            .await
            .map_err(StorageError::backend)?;
        Ok(deleted > 0)
    }

    async fn delete_chapters_for_story(&self, story_id: StoryId) -> Result<u64> {
        let conn = self.conn().await?;
        conn.execute("DELETE FROM chapters WHERE story_id = $1", &[&story_id.get()])
            .await
            .map_err(StorageError::backend)
    }

    async fn list_chapters(&self, story_id: StoryId) -> Result<Vec<Chapter>> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {} FROM chapters WHERE story_id = $1 ORDER BY chapter_number ASC",
            CHAPTER_COLUMNS
        );
        let rows = conn
            .query(&sql, &[&story_id.get()])
            .await
            .map_err(StorageError::backend)?;
        chapters_from_rows(&rows)
    }

    async fn list_chapters_page(
        &self,
        story_id: StoryId,
        page: PageRequest,
    ) -> Result<Page<Chapter>> {
        let conn = self.conn().await?;
        let (limit, offset) = page_params(page);

        let total: i64 = conn
            .query_one(
                "SELECT COUNT(*) FROM chapters WHERE story_id = $1",
                &[&story_id.get()],
            )
            .await
            .map_err(StorageError::backend)?
            .get(0);

        let sql = format!(
            "SELECT {} FROM chapters WHERE story_id = $1 ORDER BY chapter_number ASC \
             LIMIT $2 OFFSET $3",
            CHAPTER_COLUMNS
        );
        let rows = conn
            .query(&sql, &[&story_id.get(), &limit, &offset])
            .await
            .map_err(StorageError::backend)?;

        Ok(Page::new(chapters_from_rows(&rows)?, page, total.max(0) as u64))
    }

    async fn first_chapter(&self, story_id: StoryId) -> Result<Option<Chapter>> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {} FROM chapters WHERE story_id = $1 ORDER BY chapter_number ASC LIMIT 1",
            CHAPTER_COLUMNS
        );
        let row = conn
            .query_opt(&sql, &[&story_id.get()])
            .await
            .map_err(StorageError::backend)?;
        row.as_ref().map(chapter_from_row).transpose()
    }

    async fn next_chapter(
        &self,
        story_id: StoryId,
        chapter_number: i32,
    ) -> Result<Option<Chapter>> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {} FROM chapters WHERE story_id = $1 AND chapter_number > $2 \
             ORDER BY chapter_number ASC LIMIT 1",
            CHAPTER_COLUMNS
        );
        let row = conn
            .query_opt(&sql, &[&story_id.get(), &chapter_number])
            .await
            .map_err(StorageError::backend)?;
        row.as_ref().map(chapter_from_row).transpose()
    }

    async fn previous_chapter(
        &self,
        story_id: StoryId,
        chapter_number: i32,
    ) -> Result<Option<Chapter>> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {} FROM chapters WHERE story_id = $1 AND chapter_number < $2 \
             ORDER BY chapter_number DESC LIMIT 1",
            CHAPTER_COLUMNS
        );
        let row = conn
            .query_opt(&sql, &[&story_id.get(), &chapter_number])
            .await
            .map_err(StorageError::backend)?;
        row.as_ref().map(chapter_from_row).transpose()
    }

    async fn latest_chapters(&self, story_id: StoryId, limit: u32) -> Result<Vec<Chapter>> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {} FROM chapters WHERE story_id = $1 ORDER BY chapter_number DESC LIMIT $2",
            CHAPTER_COLUMNS
        );
        let rows = conn
            .query(&sql, &[&story_id.get(), &i64::from(limit)])
            .await
            .map_err(StorageError::backend)?;
        chapters_from_rows(&rows)
    }

    async fn increment_chapter_views(&self, id: ChapterId) -> Result<i64> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "UPDATE chapters SET views = views + 1 WHERE id = $1 RETURNING views",
                &[&id.get()],
            )
            .await
            .map_err(StorageError::backend)?
            .ok_or(StorageError::ChapterNotFound { id, source: None })?;
        get(&row, "views")
    }
}

#[async_trait]
impl ReadingHistoryRepository for PostgresStore {
    async fn append_history(&self, entry: &NewReadingHistory) -> Result<ReadingHistory> {
        let conn = self.conn().await?;
        let sql = format!(
            "INSERT INTO reading_history (user_id, story_id, chapter_id, read_at) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            HISTORY_COLUMNS
        );
        let row = conn
            .query_one(
                &sql,
                &[
                    &entry.user_id.get(),
                    &entry.story_id.get(),
                    &entry.chapter_id.get(),
                    &entry.read_at,
                ],
            )
            .await
            .map_err(StorageError::backend)?;
        history_from_row(&row)
    }

    async fn history_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<ReadingHistory>> {
        let conn = self.conn().await?;
        let (limit, offset) = page_params(page);

        let total: i64 = conn
            .query_one(
                "SELECT COUNT(*) FROM reading_history WHERE user_id = $1",
                &[&user_id.get()],
            )
            .await
            .map_err(StorageError::backend)?
            .get(0);

        let sql = format!(
            "SELECT {} FROM reading_history WHERE user_id = $1 \
             ORDER BY read_at DESC, id DESC LIMIT $2 OFFSET $3",
            HISTORY_COLUMNS
        );
        let rows = conn
            .query(&sql, &[&user_id.get(), &limit, &offset])
            .await
            .map_err(StorageError::backend)?;

        let entries = rows.iter().map(history_from_row).collect::<Result<Vec<_>>>()?;
        Ok(Page::new(entries, page, total.max(0) as u64))
    }

    async fn latest_for_story(
        &self,
        user_id: UserId,
        story_id: StoryId,
    ) -> Result<Option<ReadingHistory>> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {} FROM reading_history WHERE user_id = $1 AND story_id = $2 \
             ORDER BY read_at DESC, id DESC LIMIT 1",
            HISTORY_COLUMNS
        );
        let row = conn
            .query_opt(&sql, &[&user_id.get(), &story_id.get()])
            .await
            .map_err(StorageError::backend)?;
        row.as_ref().map(history_from_row).transpose()
    }

    async fn delete_history_for_story(&self, story_id: StoryId) -> Result<u64> {
        let conn = self.conn().await?;
        conn.execute(
            "DELETE FROM reading_history WHERE story_id = $1",
            &[&story_id.get()],
        )
        .await
        .map_err(StorageError::backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_escapes_wildcards() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
    }

    #[test]
    fn test_parse_status_from_column() {
        assert_eq!(parse_status("ONGOING").unwrap(), StoryStatus::Ongoing);
        assert_eq!(parse_status("HIATUS").unwrap(), StoryStatus::Hiatus);
        assert!(matches!(
            parse_status("ARCHIVED").unwrap_err(),
            StorageError::InvalidData { .. }
        ));
    }

    #[test]
    fn test_order_clause_is_deterministic() {
        for order in [
            StoryOrder::Newest,
            StoryOrder::RecentlyUpdated,
            StoryOrder::MostViewed,
            StoryOrder::MostLiked,
            StoryOrder::Recommended,
        ] {
            assert!(order_clause(order).ends_with("id DESC"));
        }
    }
}
