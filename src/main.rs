//! # tubefeed CLI
//!
//! ## Usage
//!
//! ```bash
//! tubefeed --config ./config/tubefeed.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tubefeed init` | Create the SQLite database and video table |
//! | `tubefeed sync` | Run a single ingestion cycle and exit |
//! | `tubefeed list` | Print one page of stored videos as JSON |
//! | `tubefeed serve` | Run the ingestion loop and the HTTP API together |
//!
//! Logging goes to stderr and is filtered by `RUST_LOG` (default `info`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tubefeed::app::AppContext;
use tubefeed::config;
use tubefeed::models::PageRequest;
use tubefeed::server;

/// tubefeed: keeps a local, paginated feed of YouTube search results.
#[derive(Parser)]
#[command(name = "tubefeed", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tubefeed.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Run one search → normalize → store cycle and exit.
    Sync,

    /// Print a page of stored videos, newest first.
    List {
        /// Page number (values below 1 mean 1).
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        page: i64,

        /// Page size (values below 1 mean 10).
        #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
        page_size: i64,
    },

    /// Start the background ingestion loop and the HTTP server.
    Serve,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;
    let ctx = AppContext::init(cfg).await?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at {}", ctx.config.db.path.display());
        }
        Commands::Sync => {
            let report = ctx.ingestor().run_cycle().await?;
            println!("sync {}", ctx.config.ingest.query);
            println!("  fetched: {} items", report.fetched);
            println!("  upserted videos: {}", report.upserted);
            println!("  key rotations: {}", report.rotations);
            println!("ok");
        }
        Commands::List { page, page_size } => {
            let req = PageRequest::new(page, page_size);
            let videos = ctx.store.fetch_page(req.skip(), req.page_size()).await?;
            let total = ctx.store.count().await?;
            println!("{}", serde_json::to_string_pretty(&videos)?);
            eprintln!(
                "page {} ({} per page): {} of {} videos",
                req.page(),
                req.page_size(),
                videos.len(),
                total
            );
        }
        Commands::Serve => {
            let ingestor = ctx.ingestor();
            let ingest_task = tokio::spawn(async move { ingestor.run_forever().await });

            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!(error = %e, "failed to listen for shutdown signal");
                    std::future::pending::<()>().await;
                }
                info!("shutdown signal received");
            };
            let result =
                server::run_server_with_shutdown(&ctx.config.server, ctx.store.clone(), shutdown)
                    .await;
            ingest_task.abort();
            result?;
        }
    }

    Ok(())
}
