//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use tokio::task::JoinHandle;

use crate::cache::{
    Cache, CacheResult, CacheResultCode, Clock, EmbeddedCache, EmbeddedCacheConfig,
    LocalAreaCache, SystemClock,
};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, ReclaimRequest, ReclaimResponse, SetRequest,
    SetResponse,
};
use crate::tasks::spawn_sweep_task;

/// Application state shared across all handlers.
///
/// The engine is safe to call concurrently, so no outer lock is needed.
/// The store handle is kept for the expiry sweep.
#[derive(Clone)]
pub struct AppState {
    /// Cache engine
    pub cache: Arc<EmbeddedCache<String, String>>,
    /// Backing store the engine writes to
    pub store: Arc<LocalAreaCache<String, String>>,
}

impl AppState {
    /// Creates a new AppState with a fresh local store.
    pub fn new(config: EmbeddedCacheConfig<String>) -> Self {
        let store = Arc::new(LocalAreaCache::<String, String>::new());
        let cache = Arc::new(EmbeddedCache::new(config, store.clone()));
        Self { cache, store }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a new AppState from configuration with an explicit clock.
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let mut engine_config = EmbeddedCacheConfig::new()
            .with_value_tier(config.value_tier)
            .with_expire_after_access(config.expire_after_access)
            .with_default_expire(config.default_expire())
            .with_clock(clock);
        if config.case_insensitive_keys {
            engine_config =
                engine_config.with_key_convertor(|key: &String| Ok(key.to_ascii_lowercase()));
        }
        Self::new(engine_config)
    }

    /// Starts the expiry sweep over this state's store, reading time from
    /// the engine's own clock.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        spawn_sweep_task(self.store.clone(), self.cache.config().clock().clone(), interval)
    }
}

fn ensure_success(result: CacheResult) -> Result<(), ApiError> {
    if result.is_success() {
        Ok(())
    } else {
        Err(ApiError::Internal(
            result.message().unwrap_or("operation failed").to_string(),
        ))
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair in the cache with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>, ApiError> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let result = match req.ttl {
        Some(ttl) => state
            .cache
            .put_with_ttl(&req.key, req.value, Duration::from_secs(ttl)),
        None => state.cache.put(&req.key, req.value),
    };
    ensure_success(result)?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the cache by key. Missing, released and expired
/// keys are all 404 but carry distinct codes.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>, ApiError> {
    let result = state.cache.get(&key);

    match result.code() {
        CacheResultCode::Success => {
            let value = result.into_value().unwrap_or_default();
            Ok(Json(GetResponse::new(key, value)))
        }
        CacheResultCode::NotExists => match result.message() {
            Some(reason) => Err(ApiError::NotFound(format!("{} ({})", key, reason))),
            None => Err(ApiError::NotFound(key)),
        },
        CacheResultCode::Expired => Err(ApiError::Expired(key)),
        CacheResultCode::Fail => Err(ApiError::Internal(
            result.message().unwrap_or("lookup failed").to_string(),
        )),
    }
}

/// Handler for DELETE /del/:key
///
/// Invalidates a key. Invalidating a missing key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    ensure_success(state.cache.invalidate(&key))?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /reclaim
///
/// Runs a reclaim pass over the cache's weak/soft values.
pub async fn reclaim_handler(
    State(state): State<AppState>,
    Json(req): Json<ReclaimRequest>,
) -> Json<ReclaimResponse> {
    let released = state.cache.reclaimer().reclaim(req.pressure);

    Json(ReclaimResponse {
        pressure: req.pressure,
        released,
    })
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
