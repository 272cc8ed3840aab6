//! Background Tasks Module
//!
//! Optional background work that runs next to the cache.
//!
//! # Tasks
//! - Expiry sweep: removes expired and released entries at a fixed interval.
//!   Reads evict stale entries on their own; the sweep only reclaims space
//!   held by entries nobody reads again.

mod sweeper;

pub use sweeper::spawn_sweep_task;
