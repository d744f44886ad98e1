//! # tubefeed
//!
//! Continuously polls the YouTube Data API for videos matching a fixed
//! query, stores them in SQLite keyed by video ID, and serves them over
//! HTTP as a paginated, newest-first feed.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌───────────┐   ┌──────────┐
//! │ YouTube API  │──▶│  Ingestor   │──▶│ Normalize │──▶│  SQLite  │
//! │ (key-rotated)│   │ every 10 s  │   │ RFC 3339  │   │ upsert   │
//! └──────────────┘   └─────────────┘   └───────────┘   └────┬─────┘
//!                                                           │
//!                                                           ▼
//!                                              ┌──────────────────────┐
//!                                              │ GET /api/paginated-  │
//!                                              │ videos (axum)        │
//!                                              └──────────────────────┘
//! ```
//!
//! The ingestion task and the HTTP server share nothing in memory except
//! the store handle; the database is the only point of contact.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration, env overrides, validation |
//! | [`app`] | Startup phase and shared service context |
//! | [`db`] | SQLite connection pool |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite [`VideoStore`](tubefeed_core::store::VideoStore) |
//! | [`youtube`] | Search API client and error classification |
//! | [`ingest`] | The fetch/normalize/store loop |
//! | [`server`] | HTTP read path |

pub mod app;
pub mod config;
pub mod db;
pub mod ingest;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
pub mod youtube;

pub use tubefeed_core::{models, normalize, rotator, store};
