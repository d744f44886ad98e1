//! HTTP read path.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/paginated-videos?page=&pageSize=` | Stored videos, newest first |
//!
//! `page` defaults to 1 and `pageSize` to 10; missing, non-integer, and
//! out-of-range values all fall back to the default. `pageSize` has no
//! upper bound.
//!
//! # Error Contract
//!
//! A store failure answers `500` with a fixed body and no detail:
//!
//! ```json
//! { "error": "Internal Server Error" }
//! ```
//!
//! # CORS
//!
//! Only the configured `server.cors_origin` is allowed.

use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use tubefeed_core::models::{PageRequest, Video};
use tubefeed_core::store::VideoStore;

use crate::config::ServerConfig;

/// Shared state for route handlers.
#[derive(Clone)]
struct AppState {
    store: Arc<dyn VideoStore>,
}

/// Build the router with CORS restricted to `cors_origin`.
pub fn router(store: Arc<dyn VideoStore>, cors_origin: &str) -> anyhow::Result<Router> {
    let origin: HeaderValue = cors_origin
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid CORS origin: {}", cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/api/paginated-videos", get(handle_paginated_videos))
        .layer(cors)
        .with_state(AppState { store }))
}

/// Serve until the process is terminated.
pub async fn run_server(config: &ServerConfig, store: Arc<dyn VideoStore>) -> anyhow::Result<()> {
    run_server_with_shutdown(config, store, std::future::pending()).await
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn run_server_with_shutdown<F>(
    config: &ServerConfig,
    store: Arc<dyn VideoStore>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(store, &config.cors_origin)?;
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!(bind = %config.bind, cors_origin = %config.cors_origin, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Store failure mapped to an opaque 500.
struct InternalError(anyhow::Error);

impl IntoResponse for InternalError {
    fn into_response(self) -> Response {
        error!(error = %format!("{:#}", self.0), "paginated read failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal Server Error" })),
        )
            .into_response()
    }
}

/// Handler for `GET /api/paginated-videos`.
async fn handle_paginated_videos(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Video>>, InternalError> {
    let page = PageRequest::from_query(
        params.get("page").map(String::as_str),
        params.get("pageSize").map(String::as_str),
    );

    let videos = state
        .store
        .fetch_page(page.skip(), page.page_size())
        .await
        .map_err(InternalError)?;

    Ok(Json(videos))
}
