//! Embedded Cache Engine Module
//!
//! GET/PUT/INVALIDATE over an [`AreaCache`], with key normalization,
//! reclaimable values and lazy expiration on the read path.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{
    AreaCache, CacheGetResult, CacheResult, CacheValueHolder, EmbeddedCacheConfig, ReclaimableRef,
    Reclaimer, Resolved,
};
use crate::error::{CacheError, Result};

// == Cache ==
/// The operations a cache exposes to composition layers.
///
/// Implementations never panic or return raw errors; every outcome is a
/// result code.
pub trait Cache<K, V>: Send + Sync {
    /// Looks up `key`, evicting it if it is found expired.
    fn get(&self, key: &K) -> CacheGetResult<V>;

    /// Stores `value` under `key` for `ttl`, replacing any previous entry.
    fn put_with_ttl(&self, key: &K, value: V, ttl: Duration) -> CacheResult;

    /// Stores `value` under `key` with the default expiration.
    fn put(&self, key: &K, value: V) -> CacheResult;

    /// Removes `key`. Removing an absent key succeeds.
    fn invalidate(&self, key: &K) -> CacheResult;

    /// The value on a hit, `None` otherwise.
    fn get_value(&self, key: &K) -> Option<V> {
        self.get(key).into_value()
    }
}

// == Embedded Cache ==
/// In-process cache engine.
///
/// Holds no entries itself: everything lives in the area cache. Expired
/// entries stay stored until a GET observes them (or an optional sweeper
/// runs), but are never returned.
pub struct EmbeddedCache<K, V, N = K> {
    config: EmbeddedCacheConfig<K, N>,
    area: Arc<dyn AreaCache<N, V>>,
    reclaimer: Arc<Reclaimer>,
}

impl<K, V, N> EmbeddedCache<K, V, N>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates an engine with its own reclaimer.
    pub fn new(config: EmbeddedCacheConfig<K, N>, area: Arc<dyn AreaCache<N, V>>) -> Self {
        Self::with_reclaimer(config, area, Arc::new(Reclaimer::new()))
    }

    /// Creates an engine whose weak/soft values are released by `reclaimer`.
    pub fn with_reclaimer(
        config: EmbeddedCacheConfig<K, N>,
        area: Arc<dyn AreaCache<N, V>>,
        reclaimer: Arc<Reclaimer>,
    ) -> Self {
        Self {
            config,
            area,
            reclaimer,
        }
    }

    pub fn config(&self) -> &EmbeddedCacheConfig<K, N> {
        &self.config
    }

    pub fn reclaimer(&self) -> &Arc<Reclaimer> {
        &self.reclaimer
    }

    // == Peek Holder ==
    /// Returns the live holder for `key` without any expiration handling.
    ///
    /// Does not evict or renew. Failures and released values read as `None`.
    pub fn peek_holder(&self, key: &K) -> Option<Arc<CacheValueHolder<V>>> {
        let found = contained(|| {
            let new_key = self.config.convert_key(key)?;
            Ok(self.area.get_value(&new_key)?)
        });
        match found {
            Ok(Some(entry)) => match entry.resolve() {
                Resolved::Live(holder) => Some(holder),
                Resolved::Reclaimed(_) => None,
            },
            Ok(None) => None,
            Err(err) => {
                debug!(error = %err, "Peek failed");
                None
            }
        }
    }

    fn get_impl(&self, key: &K) -> Result<CacheGetResult<V>> {
        let new_key = self.config.convert_key(key)?;

        let Some(entry) = self.area.get_value(&new_key)? else {
            return Ok(CacheGetResult::not_exists());
        };

        let holder = match entry.resolve() {
            Resolved::Live(holder) => holder,
            Resolved::Reclaimed(tier) => {
                debug!(%tier, "Cache miss on released value");
                return Ok(CacheGetResult::released(tier.released_message()));
            }
        };

        let now = self.config.now_millis();
        if holder.is_expired(now) {
            self.area.remove_value(&new_key)?;
            debug!(expire_at = holder.expire_at(), now, "Evicted expired entry");
            return Ok(CacheGetResult::expired());
        }

        if self.config.expire_after_access() {
            holder.renew(now);
        }
        Ok(CacheGetResult::success(holder.value().clone()))
    }

    fn put_impl(&self, key: &K, value: V, ttl: Duration) -> Result<()> {
        let holder = CacheValueHolder::new(value, self.config.now_millis(), ttl);
        let entry = ReclaimableRef::new(self.config.value_tier(), holder);
        let new_key = self.config.convert_key(key)?;

        self.reclaimer.track(&entry);
        self.area.put_value(new_key, entry)?;
        Ok(())
    }

    fn invalidate_impl(&self, key: &K) -> Result<()> {
        let new_key = self.config.convert_key(key)?;
        self.area.remove_value(&new_key)?;
        Ok(())
    }
}

impl<K, V, N> Cache<K, V> for EmbeddedCache<K, V, N>
where
    K: Send + Sync,
    V: Clone + Send + Sync + 'static,
    N: Send + Sync,
{
    fn get(&self, key: &K) -> CacheGetResult<V> {
        contained(|| self.get_impl(key)).unwrap_or_else(|err| {
            warn!(error = %err, "GET failed");
            CacheGetResult::fail(&err)
        })
    }

    fn put_with_ttl(&self, key: &K, value: V, ttl: Duration) -> CacheResult {
        match contained(|| self.put_impl(key, value, ttl)) {
            Ok(()) => CacheResult::SUCCESS,
            Err(err) => {
                warn!(error = %err, "PUT failed");
                CacheResult::fail(&err)
            }
        }
    }

    fn put(&self, key: &K, value: V) -> CacheResult {
        self.put_with_ttl(key, value, self.config.default_expire())
    }

    fn invalidate(&self, key: &K) -> CacheResult {
        match contained(|| self.invalidate_impl(key)) {
            Ok(()) => CacheResult::SUCCESS,
            Err(err) => {
                warn!(error = %err, "INVALIDATE failed");
                CacheResult::fail(&err)
            }
        }
    }
}

impl<K, V, N> fmt::Debug for EmbeddedCache<K, V, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedCache")
            .field("config", &self.config)
            .field("reclaimer", &self.reclaimer)
            .finish_non_exhaustive()
    }
}

// == Containment ==
/// Runs `op`, turning a panic inside it into `CacheError::Panicked`.
fn contained<T>(op: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(op))
        .unwrap_or_else(|payload| Err(CacheError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
