//! Database access for lectio-offline

pub mod books;
pub mod verses;

pub use verses::SqliteVerseStore;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Opens `lectio.db` in the root folder and applies the shared schema.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::debug!("Connecting to database: {}", db_path.display());

    let pool = lectio_common::db::init_database(db_path).await?;

    tracing::info!("Database tables initialized (verses, books)");

    Ok(pool)
}
