//! Highlight persistence
//!
//! The reader only holds records for the duration of a render pass; the
//! store owns them. `SqliteHighlightStore` is the bundled implementation.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};

use super::types::{HighlightRecord, HighlightStyle};
use crate::error::{ReaderError, Result};

/// Persistence contract for highlights
#[async_trait]
pub trait HighlightStore: Send + Sync {
    /// Highlights of a book, optionally limited to one page, in creation order
    async fn all_by_book(&self, book_id: &str, page: Option<i64>) -> Result<Vec<HighlightRecord>>;

    async fn get_by_id(&self, id: &str) -> Result<Option<HighlightRecord>>;

    /// Insert a new record (replacing one with the same id)
    async fn insert(&self, record: &HighlightRecord) -> Result<()>;

    /// Overwrite the mutable fields of an existing record
    async fn update(&self, record: &HighlightRecord) -> Result<bool>;

    async fn update_style(&self, id: &str, style: HighlightStyle) -> Result<bool>;

    async fn update_note(&self, id: &str, note: Option<&str>) -> Result<bool>;

    async fn remove(&self, id: &str) -> Result<bool>;
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS highlights (
    id TEXT PRIMARY KEY,
    book_id TEXT NOT NULL,
    page INTEGER NOT NULL,
    content TEXT NOT NULL,
    content_pre TEXT NOT NULL DEFAULT '',
    content_post TEXT NOT NULL DEFAULT '',
    style INTEGER NOT NULL DEFAULT 0,
    note TEXT,
    start_offset INTEGER,
    end_offset INTEGER,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_highlights_book_page ON highlights(book_id, page);
"#;

const SELECT_COLUMNS: &str = r#"
    SELECT id, book_id, page, content, content_pre, content_post, style, note,
           start_offset, end_offset, created_at, updated_at
    FROM highlights
"#;

/// SQLite-backed highlight store
#[derive(Clone)]
pub struct SqliteHighlightStore {
    pool: SqlitePool,
}

impl SqliteHighlightStore {
    /// Open (or create) the database at `database_url` and initialize the schema
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self::from_pool(pool);
        store.init().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the highlights table
    pub async fn init(&self) -> Result<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl HighlightStore for SqliteHighlightStore {
    async fn all_by_book(&self, book_id: &str, page: Option<i64>) -> Result<Vec<HighlightRecord>> {
        let sql = format!(
            "{} WHERE book_id = ? AND (? IS NULL OR page = ?) ORDER BY created_at ASC, rowid ASC",
            SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<_, HighlightRow>(&sql)
            .bind(book_id)
            .bind(page)
            .bind(page)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id.clone();
                match row.into_record() {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::warn!(highlight_id = %id, error = %e, "Skipping malformed stored highlight");
                        None
                    }
                }
            })
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<HighlightRecord>> {
        let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);

        let row = sqlx::query_as::<_, HighlightRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|row| match row.into_record() {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(highlight_id = %id, error = %e, "Stored highlight is malformed");
                None
            }
        }))
    }

    async fn insert(&self, record: &HighlightRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO highlights (
                id, book_id, page, content, content_pre, content_post, style, note,
                start_offset, end_offset, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.book_id)
        .bind(record.page)
        .bind(&record.content)
        .bind(&record.content_pre)
        .bind(&record.content_post)
        .bind(record.style.code())
        .bind(&record.note)
        .bind(record.start_offset)
        .bind(record.end_offset)
        .bind(timestamp(&record.created_at))
        .bind(timestamp(&record.updated_at))
        .execute(&self.pool)
        .await?;

        tracing::info!(highlight_id = %record.id, book_id = %record.book_id, page = record.page, "Highlight saved");
        Ok(())
    }

    async fn update(&self, record: &HighlightRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE highlights
            SET content = ?, content_pre = ?, content_post = ?, style = ?, note = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&record.content)
        .bind(&record.content_pre)
        .bind(&record.content_post)
        .bind(record.style.code())
        .bind(&record.note)
        .bind(timestamp(&Utc::now()))
        .bind(&record.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_style(&self, id: &str, style: HighlightStyle) -> Result<bool> {
        let result = sqlx::query("UPDATE highlights SET style = ?, updated_at = ? WHERE id = ?")
            .bind(style.code())
            .bind(timestamp(&Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::info!(highlight_id = %id, style = ?style, "Highlight style updated");
        Ok(result.rows_affected() > 0)
    }

    async fn update_note(&self, id: &str, note: Option<&str>) -> Result<bool> {
        let result = sqlx::query("UPDATE highlights SET note = ?, updated_at = ? WHERE id = ?")
            .bind(note)
            .bind(timestamp(&Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM highlights WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::info!(highlight_id = %id, "Highlight removed");
        Ok(result.rows_affected() > 0)
    }
}

/// Internal row type for SQLite queries
#[derive(sqlx::FromRow)]
struct HighlightRow {
    id: String,
    book_id: String,
    page: i64,
    content: String,
    content_pre: String,
    content_post: String,
    style: i64,
    note: Option<String>,
    start_offset: Option<i64>,
    end_offset: Option<i64>,
    created_at: String,
    updated_at: String,
}

impl HighlightRow {
    fn into_record(self) -> Result<HighlightRecord> {
        let style = HighlightStyle::from_code(self.style)
            .ok_or_else(|| ReaderError::MalformedRecord(format!("unknown style code {}", self.style)))?;
        let created_at = parse_timestamp(&self.created_at)?;
        let updated_at = parse_timestamp(&self.updated_at)?;

        let record = HighlightRecord {
            id: self.id,
            book_id: self.book_id,
            page: self.page,
            content: self.content,
            content_pre: self.content_pre,
            content_post: self.content_post,
            style,
            note: self.note,
            start_offset: self.start_offset,
            end_offset: self.end_offset,
            created_at,
            updated_at,
        };

        if !record.is_well_formed() {
            return Err(ReaderError::MalformedRecord(format!("highlight {} has no content", record.id)));
        }

        Ok(record)
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| ReaderError::MalformedRecord(format!("bad timestamp {:?}: {}", value, e)))
}
