//! Book descriptor cache
//!
//! Descriptors come from the remote `/books` listing; a copy is kept here
//! so local chapter assembly does not depend on network reachability.

use lectio_common::models::{BookAbbrev, BookDescriptor};
use lectio_common::{Error, Result};
use sqlx::{Row, SqlitePool};

/// Load cached descriptors in canonical order
pub async fn load_books(pool: &SqlitePool) -> Result<Vec<BookDescriptor>> {
    let rows = sqlx::query(
        r#"
        SELECT abbrev_pt, abbrev_en, name, author, chapters, testament_group, testament
        FROM books
        ORDER BY position ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let testament: String = row.get("testament");
            let chapters: i64 = row.get("chapters");
            Ok(BookDescriptor {
                abbrev: BookAbbrev {
                    pt: row.get("abbrev_pt"),
                    en: row.get("abbrev_en"),
                },
                name: row.get("name"),
                author: row.get("author"),
                chapters: u32::try_from(chapters)
                    .map_err(|_| Error::Internal(format!("Invalid chapter count: {}", chapters)))?,
                group: row.get("testament_group"),
                testament: testament.parse()?,
            })
        })
        .collect()
}

/// Replace the whole cache in one transaction
pub async fn replace_books(pool: &SqlitePool, books: &[BookDescriptor]) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM books").execute(&mut *tx).await?;

    for (position, book) in books.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO books (
                abbrev_pt, abbrev_en, name, author, chapters, testament_group, testament,
                position, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(abbrev_pt) DO UPDATE SET
                abbrev_en = excluded.abbrev_en,
                name = excluded.name,
                author = excluded.author,
                chapters = excluded.chapters,
                testament_group = excluded.testament_group,
                testament = excluded.testament,
                position = excluded.position,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&book.abbrev.pt)
        .bind(&book.abbrev.en)
        .bind(&book.name)
        .bind(&book.author)
        .bind(book.chapters as i64)
        .bind(&book.group)
        .bind(book.testament.as_str())
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::debug!(books = books.len(), "Book descriptor cache replaced");

    Ok(())
}
