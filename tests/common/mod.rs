//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use tempfile::TempDir;

use tubefeed::config::DbConfig;
use tubefeed::models::{Thumbnails, Video};
use tubefeed::normalize::RawSearchItem;
use tubefeed::sqlite_store::SqliteVideoStore;
use tubefeed::youtube::{SearchError, VideoSearch};
use tubefeed::{db, migrate};

/// What the scripted search returns on its next call.
pub enum Step {
    Items(Vec<RawSearchItem>),
    RateLimited,
    ServerError,
}

/// Call log and remaining script shared by every key-bound instance.
#[derive(Default)]
pub struct Script {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<String>>,
}

impl Script {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Keys used by each search call, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

/// A [`VideoSearch`] that replays a [`Script`]. Once the script runs out
/// every call returns an empty result.
pub struct ScriptedSearch {
    pub key: String,
    pub script: Arc<Script>,
}

#[async_trait]
impl VideoSearch for ScriptedSearch {
    async fn search(
        &self,
        _query: &str,
        _max_results: u32,
    ) -> Result<Vec<RawSearchItem>, SearchError> {
        self.script.calls.lock().unwrap().push(self.key.clone());
        let step = self.script.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Items(items)) => Ok(items),
            Some(Step::RateLimited) => Err(SearchError::RateLimited {
                status: 403,
                message: "quotaExceeded".to_string(),
            }),
            Some(Step::ServerError) => Err(SearchError::Api {
                status: 500,
                message: "backend error".to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

pub fn keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("key-{}", i)).collect()
}

/// A raw search item as the API would return it.
pub fn raw_item(id: &str, title: &str, published_at: &str) -> RawSearchItem {
    serde_json::from_value(json!({
        "kind": "youtube#searchResult",
        "id": {"kind": "youtube#video", "videoId": id},
        "snippet": {
            "publishedAt": published_at,
            "title": title,
            "description": format!("{} description", title),
            "thumbnails": {
                "default": {"url": format!("https://i.ytimg.com/vi/{}/default.jpg", id)},
                "medium": {"url": format!("https://i.ytimg.com/vi/{}/mqdefault.jpg", id)},
                "high": {"url": format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id)}
            }
        }
    }))
    .unwrap()
}

/// `n` raw items published one hour apart, `v00` oldest.
pub fn raw_batch(n: usize, title_prefix: &str) -> Vec<RawSearchItem> {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let ts = base + Duration::hours(i as i64);
            raw_item(
                &format!("v{:02}", i),
                &format!("{} {}", title_prefix, i),
                &ts.to_rfc3339(),
            )
        })
        .collect()
}

/// `n` videos published one day apart, `v01` oldest, `v{n}` newest.
pub fn seeded_videos(n: usize) -> Vec<Video> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    (1..=n)
        .map(|i| Video {
            id: format!("v{:02}", i),
            title: format!("Video {}", i),
            description: String::new(),
            published_at: base + Duration::days(i as i64),
            thumbnails: Thumbnails::default(),
        })
        .collect()
}

/// A migrated SQLite store in a temporary directory.
pub async fn sqlite_store(tmp: &TempDir) -> SqliteVideoStore {
    let cfg = DbConfig {
        path: tmp.path().join("data").join("tubefeed.sqlite"),
        table: "videos".to_string(),
    };
    let pool = db::connect(&cfg).await.unwrap();
    migrate::run_migrations(&pool, &cfg.table).await.unwrap();
    SqliteVideoStore::new(pool, cfg.table)
}

pub fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
