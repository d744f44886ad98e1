//! Configuration parsing and validation.
//!
//! tubefeed is configured by a TOML file (default `./config/tubefeed.toml`)
//! plus a few environment overrides for values that usually differ per
//! deployment or must stay out of files:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `TUBEFEED_API_KEYS` | `youtube.api_keys` (comma-separated) |
//! | `TUBEFEED_DB_PATH` | `db.path` |
//! | `TUBEFEED_BIND` | `server.bind` |
//!
//! # Example
//!
//! ```toml
//! [db]
//! path = "./data/tubefeed.sqlite"
//! table = "videos"
//!
//! [youtube]
//! api_keys = "key-one,key-two"
//!
//! [ingest]
//! query = "official"
//! interval_secs = 10
//!
//! [server]
//! bind = "0.0.0.0:8080"
//! cors_origin = "http://localhost:3000"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Minimum number of API keys; a single key has nothing to rotate to.
pub const MIN_API_KEYS: usize = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("youtube.api_keys is not set (config file or TUBEFEED_API_KEYS)")]
    MissingApiKeys,
    #[error("provide at least 2 API keys to survive quota errors, got {0}")]
    TooFewApiKeys(usize),
    #[error("{field} must be {requirement}")]
    Invalid {
        field: &'static str,
        requirement: &'static str,
    },
}

fn invalid(field: &'static str, requirement: &'static str) -> ConfigError {
    ConfigError::Invalid { field, requirement }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    "videos".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct YouTubeConfig {
    /// Comma-separated list of API keys.
    #[serde(default)]
    pub api_keys: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_keys: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl YouTubeConfig {
    /// The configured keys, split on commas with blanks dropped.
    pub fn keys(&self) -> Vec<String> {
        split_keys(&self.api_keys)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Cap on key rotations within one cycle. Unset retries forever.
    #[serde(default)]
    pub max_rotations_per_cycle: Option<u32>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            query: default_query(),
            max_results: default_max_results(),
            interval_secs: default_interval_secs(),
            max_rotations_per_cycle: None,
        }
    }
}

fn default_query() -> String {
    "official".to_string()
}
fn default_max_results() -> u32 {
    20
}
fn default_interval_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read, override from the environment, and validate a config file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut config: Config = toml::from_str(&content)?;
    config.apply_env(|name| std::env::var(name).ok());
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Apply environment overrides. `lookup` is injected so tests do not
    /// have to mutate the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(keys) = lookup("TUBEFEED_API_KEYS") {
            self.youtube.api_keys = keys;
        }
        if let Some(path) = lookup("TUBEFEED_DB_PATH") {
            self.db.path = PathBuf::from(path);
        }
        if let Some(bind) = lookup("TUBEFEED_BIND") {
            self.server.bind = bind;
        }
    }

    /// Check every startup invariant. A failure here is fatal to `serve`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let keys = self.youtube.keys();
        if keys.is_empty() {
            return Err(ConfigError::MissingApiKeys);
        }
        if keys.len() < MIN_API_KEYS {
            return Err(ConfigError::TooFewApiKeys(keys.len()));
        }

        // The table name is interpolated into SQL, so it must be a plain identifier.
        let table = &self.db.table;
        let ident_ok = table
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !ident_ok {
            return Err(invalid("db.table", "a SQL identifier ([A-Za-z_][A-Za-z0-9_]*)"));
        }

        if self.ingest.query.trim().is_empty() {
            return Err(invalid("ingest.query", "non-empty"));
        }
        if !(1..=50).contains(&self.ingest.max_results) {
            return Err(invalid("ingest.max_results", "in [1, 50]"));
        }
        if self.ingest.interval_secs == 0 {
            return Err(invalid("ingest.interval_secs", "> 0"));
        }
        if self.youtube.timeout_secs == 0 {
            return Err(invalid("youtube.timeout_secs", "> 0"));
        }
        if self.server.cors_origin.parse::<axum::http::HeaderValue>().is_err() {
            return Err(invalid("server.cors_origin", "a valid origin header value"));
        }

        Ok(())
    }
}
