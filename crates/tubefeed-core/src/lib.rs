//! # tubefeed core
//!
//! Runtime-agnostic logic for tubefeed: the video model and pagination
//! rules, credential rotation, normalization of raw search results, and
//! the storage trait with an in-memory backend.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem dependencies.
//! The `tubefeed` app crate supplies the SQLite store, the search client,
//! the ingestion loop, and the HTTP server on top of it.

pub mod models;
pub mod normalize;
pub mod rotator;
pub mod store;
