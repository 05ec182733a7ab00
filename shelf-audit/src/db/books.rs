//! SQLite-backed book store

use async_trait::async_trait;
use shelf_common::db::non_blank;
use shelf_common::{BookRecord, BookStatus, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::audit::BookStore;

/// Reads `books` rows for one owner, ordered by insertion (rowid)
#[derive(Clone)]
pub struct SqliteBookStore {
    pool: SqlitePool,
}

impl SqliteBookStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for SqliteBookStore {
    async fn fetch_books_for_user(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<BookRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, isbn_10, isbn_13, oclc_number, lccn, cover_image_url,
                   condition_id, publisher_name, publisher_id, publication_year,
                   language_id, storage_location, status
            FROM books
            WHERE user_id = ?
            ORDER BY rowid ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(book_from_row).collect()
    }
}

/// Convert a row, normalising blank text to `None`
fn book_from_row(row: &SqliteRow) -> Result<BookRecord> {
    let text = |column: &str| -> Result<Option<String>> {
        Ok(non_blank(row.try_get::<Option<String>, _>(column)?))
    };

    let status: String = row.try_get("status")?;

    Ok(BookRecord {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        isbn10: text("isbn_10")?,
        isbn13: text("isbn_13")?,
        oclc_number: text("oclc_number")?,
        lccn: text("lccn")?,
        cover_image_url: text("cover_image_url")?,
        condition_id: text("condition_id")?,
        publisher_name: text("publisher_name")?,
        publisher_id: text("publisher_id")?,
        publication_year: text("publication_year")?,
        language_id: text("language_id")?,
        storage_location: text("storage_location")?,
        status: status.parse().unwrap_or(BookStatus::Unknown),
    })
}
