//! In-memory [`VideoStore`] implementation for testing and embedding.
//!
//! Records live in a `BTreeMap` keyed by video ID behind a
//! `std::sync::RwLock`. Replacing a map entry under the write lock makes
//! each upsert atomic with respect to readers.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Video;

use super::{feed_order, VideoStore};

/// In-memory store for tests and single-process embedding.
pub struct InMemoryStore {
    videos: RwLock<BTreeMap<String, Video>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            videos: RwLock::new(BTreeMap::new()),
        }
    }

    /// Look up a single record by ID.
    pub fn get(&self, id: &str) -> Option<Video> {
        self.read().get(id).cloned()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Video>> {
        self.videos.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Video>> {
        self.videos.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoStore for InMemoryStore {
    async fn upsert(&self, videos: &[Video]) -> Result<usize> {
        for video in videos {
            self.write().insert(video.id.clone(), video.clone());
        }
        Ok(videos.len())
    }

    async fn fetch_page(&self, skip: u64, limit: u64) -> Result<Vec<Video>> {
        let mut all: Vec<Video> = self.read().values().cloned().collect();
        all.sort_by(feed_order);

        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(all.into_iter().skip(skip).take(limit).collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.read().len() as u64)
    }
}
