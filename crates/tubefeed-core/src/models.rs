//! Core data models shared by the ingestion and query paths.
//!
//! [`Video`] is the canonical record persisted by every store backend and
//! returned verbatim by the HTTP API. [`PageRequest`] carries the
//! already-sanitized pagination parameters of a read.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Default page number when the caller omits or garbles `page`.
pub const DEFAULT_PAGE: u64 = 1;

/// Default page size when the caller omits or garbles `pageSize`.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// A normalized video record.
///
/// `id` is the external video ID and the sole upsert key. Every other field
/// is overwritten wholesale whenever the same ID is ingested again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(
        serialize_with = "serialize_published_at",
        deserialize_with = "deserialize_published_at"
    )]
    pub published_at: DateTime<Utc>,
    pub thumbnails: Thumbnails,
}

/// Thumbnail URLs at the three resolutions the search API reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnails {
    pub default: String,
    pub medium: String,
    pub high: String,
}

/// Canonical wire form of a publish timestamp: UTC, whole seconds, `Z` suffix.
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use tubefeed_core::models::format_published_at;
///
/// let ts = Utc.with_ymd_and_hms(2024, 3, 9, 17, 4, 5).unwrap();
/// assert_eq!(format_published_at(&ts), "2024-03-09T17:04:05Z");
/// ```
pub fn format_published_at(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn serialize_published_at<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_published_at(ts))
}

fn deserialize_published_at<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(d)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}

/// Sanitized pagination parameters.
///
/// Both fields are always `>= 1`; construction goes through
/// [`PageRequest::new`] or [`PageRequest::from_query`], which substitute the
/// defaults for anything out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl PageRequest {
    /// Build a request from signed values, replacing `page < 1` with
    /// [`DEFAULT_PAGE`] and `page_size <= 0` with [`DEFAULT_PAGE_SIZE`].
    pub fn new(page: i64, page_size: i64) -> Self {
        let page = if page < 1 { DEFAULT_PAGE } else { page as u64 };
        let page_size = if page_size <= 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size as u64
        };
        Self { page, page_size }
    }

    /// Build a request from raw query-string values.
    ///
    /// Missing or non-integer inputs fall back to the defaults, exactly as
    /// out-of-range integers do. There is no upper bound on the page size.
    ///
    /// ```rust
    /// use tubefeed_core::models::PageRequest;
    ///
    /// let req = PageRequest::from_query(Some("abc"), Some("-3"));
    /// assert_eq!(req, PageRequest::default());
    /// assert_eq!(PageRequest::from_query(Some("3"), Some("5")).skip(), 10);
    /// ```
    pub fn from_query(page: Option<&str>, page_size: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|s| s.trim().parse::<i64>().ok());
        Self::new(parse(page).unwrap_or(0), parse(page_size).unwrap_or(0))
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Number of records preceding this page: `(page - 1) * page_size`.
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
