//! Embedded Cache - an in-process key-value cache engine
//!
//! Normalizes keys, wraps values with TTL metadata, optionally holds them
//! through weak/soft reclaimable references, and expires entries lazily on
//! read with optional sliding expiration. Ships a local backing store, a
//! background sweep and a small HTTP server around the engine.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, CacheGetResult, CacheResult, CacheResultCode, EmbeddedCache, EmbeddedCacheConfig};
pub use config::Config;
pub use tasks::spawn_sweep_task;
