//! Long-lived service context.
//!
//! [`AppContext::init`] is the explicit startup phase: it validates the
//! configuration, opens the database, applies migrations, and binds the
//! first API key. Everything the ingestion loop and the HTTP server share
//! lives here and is handed to them explicitly.

use anyhow::{Context, Result};
use std::sync::Arc;

use tubefeed_core::rotator::CredentialRotator;
use tubefeed_core::store::VideoStore;

use crate::config::Config;
use crate::db;
use crate::ingest::Ingestor;
use crate::migrate;
use crate::sqlite_store::SqliteVideoStore;
use crate::youtube::YouTubeClient;

pub struct AppContext {
    pub config: Arc<Config>,
    pub store: Arc<dyn VideoStore>,
    pub rotator: Arc<CredentialRotator<YouTubeClient>>,
}

impl AppContext {
    /// Build the context. Any error here means the process should not start.
    pub async fn init(config: Config) -> Result<Self> {
        config.validate()?;

        let pool = db::connect(&config.db)
            .await
            .with_context(|| format!("opening database {}", config.db.path.display()))?;
        migrate::run_migrations(&pool, &config.db.table).await?;
        let store: Arc<dyn VideoStore> =
            Arc::new(SqliteVideoStore::new(pool, config.db.table.clone()));

        let http = YouTubeClient::http_client(&config.youtube)?;
        let base_url = config.youtube.base_url.clone();
        let rotator = CredentialRotator::new(config.youtube.keys(), move |key: &str| {
            YouTubeClient::new(http.clone(), base_url.clone(), key)
        })?;

        Ok(Self {
            config: Arc::new(config),
            store,
            rotator: Arc::new(rotator),
        })
    }

    pub fn ingestor(&self) -> Ingestor<YouTubeClient> {
        Ingestor::new(
            self.rotator.clone(),
            self.store.clone(),
            self.config.ingest.clone(),
        )
    }
}
