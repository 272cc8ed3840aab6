//! Value Holder Module
//!
//! Defines the record stored for every cached value: the payload plus its
//! creation time, TTL and expiration deadline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::cache::clock::duration_to_millis;

// == Cache Value Holder ==
/// A cached value with TTL metadata.
///
/// Everything except the deadline is fixed at construction. The deadline is
/// a single atomic so sliding-expiration renewals from concurrent readers
/// never tear.
#[derive(Debug)]
pub struct CacheValueHolder<V> {
    /// The stored value
    value: V,
    /// Creation timestamp (Unix milliseconds)
    created_at: u64,
    /// Configured TTL in milliseconds, reapplied on renewal
    ttl_ms: u64,
    /// Expiration deadline (Unix milliseconds)
    expire_at: AtomicU64,
}

impl<V> CacheValueHolder<V> {
    // == Constructor ==
    /// Creates a holder created at `now` that expires `ttl` later.
    pub fn new(value: V, now: u64, ttl: Duration) -> Self {
        let ttl_ms = duration_to_millis(ttl);
        Self {
            value,
            created_at: now,
            ttl_ms,
            expire_at: AtomicU64::new(now.saturating_add(ttl_ms)),
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Current expiration deadline in Unix milliseconds.
    pub fn expire_at(&self) -> u64 {
        self.expire_at.load(Ordering::Acquire)
    }

    // == Is Expired ==
    /// Checks whether the holder is expired at `now`.
    ///
    /// Boundary condition: reaching the deadline counts as expired.
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expire_at()
    }

    // == Renew ==
    /// Pushes the deadline to `now + ttl`.
    pub fn renew(&self, now: u64) {
        self.expire_at
            .store(now.saturating_add(self.ttl_ms), Ordering::Release);
    }

    // == Remaining ==
    /// Time left before expiry, zero once expired.
    pub fn remaining(&self, now: u64) -> Duration {
        Duration::from_millis(self.expire_at().saturating_sub(now))
    }
}
