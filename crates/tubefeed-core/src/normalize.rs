//! Normalization of raw search results into [`Video`] records.
//!
//! The raw types mirror the subset of the YouTube Data API `search.list`
//! response the service consumes. Normalization is strict: a publish
//! timestamp that is not valid RFC 3339 fails the item, and
//! [`normalize_batch`] fails the whole batch on the first bad item so a
//! cycle never persists a partial result.

use chrono::{DateTime, SubsecRound, Timelike, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{Thumbnails, Video};

/// A `search.list` response page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<RawSearchItem>,
}

/// One result item as returned by the search API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchItem {
    #[serde(default)]
    pub id: RawItemId,
    #[serde(default)]
    pub snippet: RawSnippet,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItemId {
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnippet {
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnails: RawThumbnails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawThumbnails {
    pub default: Option<RawThumbnail>,
    pub medium: Option<RawThumbnail>,
    pub high: Option<RawThumbnail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawThumbnail {
    #[serde(default)]
    pub url: String,
}

/// Why a raw item could not be turned into a [`Video`].
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("video {video_id}: invalid publishedAt '{value}': {source}")]
    InvalidTimestamp {
        video_id: String,
        value: String,
        #[source]
        source: TimestampError,
    },
    #[error("item {position} has no video id")]
    MissingVideoId { position: usize },
}

/// Why a publish timestamp was rejected.
#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("expected YYYY-MM-DDTHH:MM:SS[.frac](Z|+hh:mm|-hh:mm)")]
    Layout,
    #[error("leap second (:60) is not a valid second")]
    LeapSecond,
    #[error(transparent)]
    Parse(#[from] chrono::ParseError),
}

// chrono also accepts a space or lowercase `t` as the separator and a
// lowercase `z`; only the uppercase layout is RFC 3339 here.
fn has_rfc3339_layout(raw: &str) -> bool {
    let b = raw.as_bytes();
    if b.len() < 20 || b[10] != b'T' {
        return false;
    }
    if b[b.len() - 1] == b'Z' {
        return true;
    }
    let zone = &b[b.len() - 6..];
    matches!(zone[0], b'+' | b'-')
        && zone[1].is_ascii_digit()
        && zone[2].is_ascii_digit()
        && zone[3] == b':'
        && zone[4].is_ascii_digit()
        && zone[5].is_ascii_digit()
}

/// Parse a publish timestamp strictly as RFC 3339.
///
/// The offset is folded into UTC and fractional seconds are dropped so the
/// stored value matches its canonical serialization. Leap seconds are
/// rejected.
pub fn parse_published_at(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    if !has_rfc3339_layout(raw) {
        return Err(TimestampError::Layout);
    }
    let parsed = DateTime::parse_from_rfc3339(raw)?;
    // chrono encodes second 60 as nanosecond >= 1e9.
    if parsed.nanosecond() >= 1_000_000_000 {
        return Err(TimestampError::LeapSecond);
    }
    Ok(parsed.with_timezone(&Utc).trunc_subsecs(0))
}

/// Normalize a single item. `position` is only used in error reports.
pub fn normalize_item(position: usize, item: &RawSearchItem) -> Result<Video, NormalizeError> {
    let id = match item.id.video_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(NormalizeError::MissingVideoId { position }),
    };

    let published_at = parse_published_at(&item.snippet.published_at).map_err(|source| {
        NormalizeError::InvalidTimestamp {
            video_id: id.clone(),
            value: item.snippet.published_at.clone(),
            source,
        }
    })?;

    let thumbs = &item.snippet.thumbnails;
    let url = |t: &Option<RawThumbnail>| t.as_ref().map(|t| t.url.clone()).unwrap_or_default();

    Ok(Video {
        id,
        title: item.snippet.title.clone(),
        description: item.snippet.description.clone(),
        published_at,
        thumbnails: Thumbnails {
            default: url(&thumbs.default),
            medium: url(&thumbs.medium),
            high: url(&thumbs.high),
        },
    })
}

/// Normalize every item or none: the first failure is returned and no
/// records are produced.
pub fn normalize_batch(items: &[RawSearchItem]) -> Result<Vec<Video>, NormalizeError> {
    items
        .iter()
        .enumerate()
        .map(|(pos, item)| normalize_item(pos, item))
        .collect()
}
