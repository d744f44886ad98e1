//! YouTube Data API search client.
//!
//! [`VideoSearch`] is the capability the ingestion loop depends on:
//! `search(query, max_results)` returns raw items or a typed
//! [`SearchError`]. [`YouTubeClient`] implements it against
//! `GET {base_url}/search` with one API key.
//!
//! A `YouTubeClient` is bound to a single key and is cheap to build: the
//! underlying `reqwest::Client` (connection pool, TLS config) is shared and
//! only the key changes, which is what
//! [`CredentialRotator`](tubefeed_core::rotator::CredentialRotator) needs
//! from its binder.
//!
//! # Error classification
//!
//! | Response | Error |
//! |----------|-------|
//! | HTTP 403 / 429 | [`SearchError::RateLimited`] (quota or rate limit; rotate keys) |
//! | other non-2xx | [`SearchError::Api`] |
//! | network failure / timeout | [`SearchError::Transport`] |
//! | 2xx with an undecodable body | [`SearchError::Decode`] |

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use tubefeed_core::normalize::{RawSearchItem, SearchListResponse};

use crate::config::YouTubeConfig;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("rate limited (HTTP {status}): {message}")]
    RateLimited { status: u16, message: String },
    #[error("search API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("undecodable search response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SearchError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, SearchError::RateLimited { .. })
    }
}

/// A content-search capability bound to one credential.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: u32)
        -> Result<Vec<RawSearchItem>, SearchError>;
}

/// `search.list` client holding one API key.
#[derive(Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Build the shared HTTP client used by every key-bound instance.
    pub fn http_client(config: &YouTubeConfig) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
    }
}

impl std::fmt::Debug for YouTubeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTubeClient")
            .field("base_url", &self.base_url)
            .field("api_key", &tubefeed_core::rotator::mask(&self.api_key))
            .finish()
    }
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<GoogleErrorItem>,
}

#[derive(Deserialize)]
struct GoogleErrorItem {
    #[serde(default)]
    reason: String,
}

/// Pull a readable message out of a Google API error body, falling back
/// to the raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<GoogleErrorBody>(body) {
        Ok(parsed) => {
            let reasons: Vec<&str> = parsed
                .error
                .errors
                .iter()
                .map(|e| e.reason.as_str())
                .filter(|r| !r.is_empty())
                .collect();
            if reasons.is_empty() {
                parsed.error.message
            } else {
                format!("{} [{}]", parsed.error.message, reasons.join(", "))
            }
        }
        Err(_) => body.chars().take(500).collect(),
    }
}

/// Map a non-success status and body to the matching [`SearchError`].
pub fn classify_status(status: StatusCode, body: &str) -> SearchError {
    let message = error_message(body);
    match status {
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => SearchError::RateLimited {
            status: status.as_u16(),
            message,
        },
        _ => SearchError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<RawSearchItem>, SearchError> {
        let max_results = max_results.to_string();
        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("q", query),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        let parsed: SearchListResponse = serde_json::from_str(&body)?;
        Ok(parsed.items)
    }
}
