//! Ingestion loop: search → normalize → upsert, on a fixed interval.
//!
//! The loop alternates between two states:
//!
//! ```text
//!            rate limited: rotate key, retry now
//!                 ┌──────┐
//!                 ▼      │
//!   start ──▶ Fetching ──┘ ──(done or failed)──▶ Waiting
//!                 ▲                                 │
//!                 └────────── interval elapsed ─────┘
//! ```
//!
//! A rate-limit response never reaches Waiting: the active key is rotated
//! and the same query is retried immediately. Without
//! `ingest.max_rotations_per_cycle` this retries forever, so a cycle where
//! every key is exhausted spins through the keys until one recovers.
//!
//! Every other failure (network, API, malformed timestamp, store write)
//! ends the cycle; it is logged and the loop sleeps as usual. Nothing
//! here terminates the process.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use tubefeed_core::normalize::{normalize_batch, NormalizeError};
use tubefeed_core::rotator::CredentialRotator;
use tubefeed_core::store::VideoStore;

use crate::config::IngestConfig;
use crate::youtube::{SearchError, VideoSearch};

/// Why a cycle ended without storing its batch.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Search(SearchError),
    #[error("normalization failed, batch discarded: {0}")]
    Normalize(#[from] NormalizeError),
    #[error("store write failed: {0:#}")]
    Store(anyhow::Error),
    #[error("still rate limited after {0} key rotations")]
    RotationsExhausted(u32),
}

/// Outcome of a successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Items returned by the search API.
    pub fetched: usize,
    /// Records written to the store.
    pub upserted: usize,
    /// Key rotations needed before the search succeeded.
    pub rotations: u32,
}

/// Drives the ingestion cycle against a rotating search client and a store.
pub struct Ingestor<S> {
    rotator: Arc<CredentialRotator<S>>,
    store: Arc<dyn VideoStore>,
    settings: IngestConfig,
}

impl<S> Clone for Ingestor<S> {
    fn clone(&self) -> Self {
        Self {
            rotator: self.rotator.clone(),
            store: self.store.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<S: VideoSearch> Ingestor<S> {
    pub fn new(
        rotator: Arc<CredentialRotator<S>>,
        store: Arc<dyn VideoStore>,
        settings: IngestConfig,
    ) -> Self {
        Self {
            rotator,
            store,
            settings,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.settings.interval_secs)
    }

    /// Run one Fetching pass: search (rotating keys on rate limits),
    /// normalize the whole batch, and upsert it.
    pub async fn run_cycle(&self) -> Result<CycleReport, IngestError> {
        let query = self.settings.query.as_str();
        let mut rotations = 0u32;

        let items = loop {
            let active = self.rotator.current();
            match active.client.search(query, self.settings.max_results).await {
                Ok(items) => break items,
                Err(e) if e.is_rate_limit() => {
                    if let Some(cap) = self.settings.max_rotations_per_cycle {
                        if rotations >= cap {
                            return Err(IngestError::RotationsExhausted(rotations));
                        }
                    }
                    warn!(key_index = active.index, error = %e, "search rate limited, rotating API key");
                    self.rotator.rotate_from(active.index);
                    rotations += 1;
                }
                Err(e) => return Err(IngestError::Search(e)),
            }
        };

        let videos = normalize_batch(&items)?;
        let upserted = self
            .store
            .upsert(&videos)
            .await
            .map_err(IngestError::Store)?;

        Ok(CycleReport {
            fetched: items.len(),
            upserted,
            rotations,
        })
    }

    /// Cycle forever: Fetching, then Waiting for the configured interval,
    /// whatever the outcome of the fetch.
    pub async fn run_forever(&self) {
        let interval = self.interval();
        info!(
            query = %self.settings.query,
            max_results = self.settings.max_results,
            interval_secs = interval.as_secs(),
            keys = self.rotator.len(),
            "ingestion loop started"
        );

        loop {
            match self.run_cycle().await {
                Ok(report) => info!(
                    fetched = report.fetched,
                    upserted = report.upserted,
                    rotations = report.rotations,
                    "fetched and stored videos"
                ),
                Err(e) => error!(error = %e, "ingestion cycle failed"),
            }
            tokio::time::sleep(interval).await;
        }
    }
}
