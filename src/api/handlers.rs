//! API Handlers
//!
//! HTTP request handlers translating requests into cache engine operations.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::cache::{CacheEngine, PageEntry};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ExpireResponse, HealthResponse, PageQuery, RemoveResponse, StatsResponse, TopQuery,
    TopResponse, UpsertQuery, UpsertResponse,
};
use crate::store::PageStore;

/// Application state shared across all handlers.
///
/// The engine needs no outer lock: it serializes per page internally.
pub struct AppState<S> {
    /// Shared cache engine
    pub engine: Arc<CacheEngine<S>>,
    /// Default size of the top query
    pub top_records: usize,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            top_records: self.top_records,
        }
    }
}

impl<S: PageStore> AppState<S> {
    /// Creates a new AppState around an engine.
    pub fn new(engine: CacheEngine<S>, top_records: usize) -> Self {
        Self {
            engine: Arc::new(engine),
            top_records,
        }
    }

    /// Builds the engine over `store` with the capacity, TTL and retry
    /// settings from the Config.
    pub fn from_config(store: S, config: &Config) -> Self {
        let engine = CacheEngine::new(store, config.capacity_bytes, config.default_ttl)
            .with_retry_policy(config.retry_policy());
        Self::new(engine, config.top_records)
    }
}

/// Handler for GET /pages?url=
///
/// Returns the raw page content.
pub async fn get_page<S: PageStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let content = state.engine.get(&query.url).await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], content).into_response())
}

/// Handler for PUT /pages?url=&ttl=
///
/// Stores the request body as the page content.
pub async fn upsert_page<S: PageStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<UpsertQuery>,
    body: Bytes,
) -> Result<Json<UpsertResponse>> {
    if let Some(error_msg) = query.validate(body.len()) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let entry = PageEntry::new(query.url.clone(), body, query.ttl);
    let changed = state.engine.upsert(entry).await?;

    Ok(Json(UpsertResponse::new(query.url, changed)))
}

/// Handler for DELETE /pages?url=
pub async fn remove_page<S: PageStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<RemoveResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let bytes_freed = state.engine.remove(&query.url).await?;
    Ok(Json(RemoveResponse::new(query.url, bytes_freed)))
}

/// Handler for GET /pages/top?n=
pub async fn top_pages<S: PageStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<TopQuery>,
) -> Result<Json<TopResponse>> {
    let n = query.n.unwrap_or(state.top_records);
    let pages = state.engine.top(n).await?;
    Ok(Json(TopResponse { pages }))
}

/// Handler for POST /pages/expire
///
/// Runs the expiry sweep on demand.
pub async fn expire_pages<S: PageStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<ExpireResponse>> {
    let bytes_freed = state.engine.expire_sweep().await?;
    Ok(Json(ExpireResponse { bytes_freed }))
}

/// Handler for GET /stats
pub async fn stats_handler<S: PageStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<StatsResponse>> {
    let used = state.engine.store().used_bytes().await?;
    Ok(Json(StatsResponse::new(
        state.engine.stats().snapshot(),
        used,
        state.engine.capacity(),
    )))
}

/// Handler for GET /health
///
/// Healthy only while the backing store answers a ping.
pub async fn health_handler<S: PageStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<HealthResponse>> {
    state.engine.store().ping().await?;
    Ok(Json(HealthResponse::healthy()))
}
