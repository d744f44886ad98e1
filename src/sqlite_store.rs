//! SQLite-backed [`VideoStore`] implementation.
//!
//! One row per video, keyed by the external video ID. `published_at` is
//! stored as unix seconds so ordering is numeric; it is rendered back to
//! canonical RFC 3339 on the way out.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use tubefeed_core::models::{Thumbnails, Video};
use tubefeed_core::store::VideoStore;

/// SQLite implementation of the [`VideoStore`] trait.
///
/// Wraps a [`SqlitePool`] and a table name. The table must already exist
/// (see [`run_migrations`](crate::migrate::run_migrations)).
pub struct SqliteVideoStore {
    pool: SqlitePool,
    upsert_sql: String,
    page_sql: String,
    count_sql: String,
}

impl SqliteVideoStore {
    /// `table` must be a validated SQL identifier.
    pub fn new(pool: SqlitePool, table: impl Into<String>) -> Self {
        let table = table.into();
        let upsert_sql = format!(
            r#"
            INSERT INTO {table} (id, title, description, published_at,
                                 thumbnail_default, thumbnail_medium, thumbnail_high,
                                 updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                published_at = excluded.published_at,
                thumbnail_default = excluded.thumbnail_default,
                thumbnail_medium = excluded.thumbnail_medium,
                thumbnail_high = excluded.thumbnail_high,
                updated_at = excluded.updated_at
            "#
        );
        let page_sql = format!(
            r#"
            SELECT id, title, description, published_at,
                   thumbnail_default, thumbnail_medium, thumbnail_high
            FROM {table}
            ORDER BY published_at DESC, id ASC
            LIMIT ? OFFSET ?
            "#
        );
        let count_sql = format!("SELECT COUNT(*) FROM {table}");

        Self {
            pool,
            upsert_sql,
            page_sql,
            count_sql,
        }
    }
}

// SQLite integers are signed; anything beyond i64::MAX is "everything".
fn clamp_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

#[async_trait]
impl VideoStore for SqliteVideoStore {
    async fn upsert(&self, videos: &[Video]) -> Result<usize> {
        let now = Utc::now().timestamp();
        for video in videos {
            sqlx::query(&self.upsert_sql)
                .bind(&video.id)
                .bind(&video.title)
                .bind(&video.description)
                .bind(video.published_at.timestamp())
                .bind(&video.thumbnails.default)
                .bind(&video.thumbnails.medium)
                .bind(&video.thumbnails.high)
                .bind(now)
                .execute(&self.pool)
                .await?;
        }
        Ok(videos.len())
    }

    async fn fetch_page(&self, skip: u64, limit: u64) -> Result<Vec<Video>> {
        let rows = sqlx::query(&self.page_sql)
            .bind(clamp_i64(limit))
            .bind(clamp_i64(skip))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let ts: i64 = row.get("published_at");
                let published_at = DateTime::<Utc>::from_timestamp(ts, 0)
                    .ok_or_else(|| anyhow!("video {}: published_at {} out of range", id, ts))?;
                Ok(Video {
                    title: row.get("title"),
                    description: row.get("description"),
                    published_at,
                    thumbnails: Thumbnails {
                        default: row.get("thumbnail_default"),
                        medium: row.get("thumbnail_medium"),
                        high: row.get("thumbnail_high"),
                    },
                    id,
                })
            })
            .collect()
    }

    async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar(&self.count_sql)
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }
}
