//! Storage abstraction for tubefeed.
//!
//! The [`VideoStore`] trait covers the two operations the service needs:
//! idempotent upsert keyed by video ID on the write path, and
//! reverse-chronological pagination on the read path. Backends are
//! pluggable (SQLite in the app crate, [`memory::InMemoryStore`] here).
//!
//! Implementations must be `Send + Sync` to be shared between the
//! ingestion task and concurrent HTTP handlers.

pub mod memory;

use std::cmp::Ordering;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Video;

/// Abstract storage backend for video records.
///
/// # Ordering
///
/// [`fetch_page`](VideoStore::fetch_page) returns records newest first by
/// `published_at`. Records with the same timestamp are ordered by `id`
/// ascending so repeated reads page consistently.
///
/// # Atomicity
///
/// Each record in an [`upsert`](VideoStore::upsert) batch is written as one
/// atomic unit: readers see either the old or the new version of a record,
/// never a mix of fields. The batch as a whole is not transactional.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Insert new records and overwrite every non-ID field of existing ones.
    ///
    /// Returns the number of records written.
    async fn upsert(&self, videos: &[Video]) -> Result<usize>;

    /// Return at most `limit` records after skipping the `skip` newest.
    ///
    /// A `skip` past the end of the collection yields an empty vector.
    async fn fetch_page(&self, skip: u64, limit: u64) -> Result<Vec<Video>>;

    /// Total number of stored records.
    async fn count(&self) -> Result<u64>;
}

/// The feed order: `published_at` descending, then `id` ascending.
pub fn feed_order(a: &Video, b: &Video) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| a.id.cmp(&b.id))
}
