//! Schema setup for the video table.
//!
//! Idempotent: every statement uses `IF NOT EXISTS`, so `tubefeed init` and
//! `tubefeed serve` can both run it on every start.

use anyhow::Result;
use sqlx::SqlitePool;

/// Create the video table and its feed-order index.
///
/// `table` must already be validated as a plain SQL identifier
/// (see [`Config::validate`](crate::config::Config::validate)).
pub async fn run_migrations(pool: &SqlitePool, table: &str) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            published_at INTEGER NOT NULL,
            thumbnail_default TEXT NOT NULL DEFAULT '',
            thumbnail_medium TEXT NOT NULL DEFAULT '',
            thumbnail_high TEXT NOT NULL DEFAULT '',
            updated_at INTEGER NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{table}_published_at ON {table}(published_at DESC, id)"
    ))
    .execute(pool)
    .await?;

    Ok(())
}
