//! Verse database operations
//!
//! SQLite implementation of the local verse store.

use async_trait::async_trait;
use futures::TryStreamExt;
use lectio_common::models::{BookDescriptor, VerseRecord};
use lectio_common::{BibleVersion, Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::types::VerseStore;

/// Rows per multi-row INSERT (5 bound parameters each)
const INSERT_BATCH_SIZE: usize = 500;

/// Local verse store backed by the shared SQLite pool
#[derive(Clone)]
pub struct SqliteVerseStore {
    pool: SqlitePool,
}

impl SqliteVerseStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &SqliteRow) -> Result<VerseRecord> {
    let version: String = row.get("version");
    let chapter: i64 = row.get("chapter");
    let verse: i64 = row.get("verse");

    Ok(VerseRecord {
        id: Some(row.get("id")),
        version: version.parse()?,
        book_abbrev: row.get("book_abbrev"),
        chapter: u32::try_from(chapter)
            .map_err(|_| Error::Internal(format!("Invalid chapter number in store: {}", chapter)))?,
        verse: u32::try_from(verse)
            .map_err(|_| Error::Internal(format!("Invalid verse number in store: {}", verse)))?,
        text: row.get("text"),
    })
}

#[async_trait]
impl VerseStore for SqliteVerseStore {
    async fn count_by_version(&self, version: BibleVersion) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM verses WHERE version = ?")
            .bind(version.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn query_chapter(
        &self,
        version: BibleVersion,
        book_abbrev: &str,
        chapter: u32,
    ) -> Result<Vec<VerseRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, version, book_abbrev, chapter, verse, text
            FROM verses
            WHERE version = ? AND book_abbrev = ? AND chapter = ?
            ORDER BY verse ASC
            "#,
        )
        .bind(version.as_str())
        .bind(book_abbrev)
        .bind(chapter as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    async fn query_by_substring(
        &self,
        version: BibleVersion,
        needle: &str,
    ) -> Result<Vec<VerseRecord>> {
        // SQLite's LIKE/lower() only fold ASCII, so matching happens here
        // to handle accented capitals the same as the rest of the text.
        let needle = needle.to_lowercase();

        let mut rows = sqlx::query(
            r#"
            SELECT id, version, book_abbrev, chapter, verse, text
            FROM verses
            WHERE version = ?
            ORDER BY id ASC
            "#,
        )
        .bind(version.as_str())
        .fetch(&self.pool);

        let mut matches = Vec::new();
        while let Some(row) = rows.try_next().await? {
            let text: &str = row.get("text");
            if text.to_lowercase().contains(&needle) {
                matches.push(row_to_record(&row)?);
            }
        }

        tracing::debug!(
            version = %version,
            needle = %needle,
            matches = matches.len(),
            "Local substring scan finished"
        );

        Ok(matches)
    }

    async fn replace_version(&self, version: BibleVersion, records: &[VerseRecord]) -> Result<()> {
        if let Some(stray) = records.iter().find(|r| r.version != version) {
            return Err(Error::InvalidInput(format!(
                "Record for {} {}:{} belongs to version {}, not {}",
                stray.book_abbrev, stray.chapter, stray.verse, stray.version, version
            )));
        }

        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM verses WHERE version = ?")
            .bind(version.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for chunk in records.chunks(INSERT_BATCH_SIZE) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO verses (version, book_abbrev, chapter, verse, text) ",
            );
            builder.push_values(chunk, |mut b, record| {
                b.push_bind(version.as_str())
                    .push_bind(record.book_abbrev.as_str())
                    .push_bind(record.chapter as i64)
                    .push_bind(record.verse as i64)
                    .push_bind(record.text.as_str());
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        tracing::info!(
            version = %version,
            deleted,
            inserted = records.len(),
            "Replaced local verse snapshot"
        );

        Ok(())
    }

    async fn cached_books(&self) -> Result<Vec<BookDescriptor>> {
        crate::db::books::load_books(&self.pool).await
    }

    async fn replace_books(&self, books: &[BookDescriptor]) -> Result<()> {
        crate::db::books::replace_books(&self.pool, books).await
    }
}
