//! Cache Module
//!
//! Embedded cache engine with lazy TTL expiration, sliding expiry and
//! weak/soft reclaimable values over a pluggable backing store.

mod area;
mod clock;
mod config;
mod engine;
mod holder;
mod reference;
mod result;


// Re-export public types
pub use area::{AreaCache, LocalAreaCache};
pub use clock::{current_timestamp_ms, duration_to_millis, Clock, ManualClock, SystemClock};
pub use config::{EmbeddedCacheConfig, KeyConvertor, DEFAULT_EXPIRE};
pub use engine::{Cache, EmbeddedCache};
pub use holder::CacheValueHolder;
pub use reference::{MemoryPressure, ReclaimSlot, ReclaimableRef, Reclaimer, RefTier, Resolved};
pub use result::{CacheGetResult, CacheResult, CacheResultCode};
