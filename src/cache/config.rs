//! Engine Configuration Module
//!
//! Builder for the read-only settings an [`EmbeddedCache`](crate::cache::EmbeddedCache)
//! is constructed with.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Clock, RefTier, SystemClock};
use crate::error::{CacheError, Result};

/// Converts an application key into the key used against the store.
pub type KeyConvertor<K, N> = Arc<dyn Fn(&K) -> anyhow::Result<N> + Send + Sync>;

/// Default expiration when none is given: `i32::MAX` seconds.
pub const DEFAULT_EXPIRE: Duration = Duration::from_secs(i32::MAX as u64);

// == Embedded Cache Config ==
/// Settings shared by every call on an engine.
///
/// `K` is the application key, `N` the normalized key. Without a key
/// convertor the two are the same type and keys are used as given.
pub struct EmbeddedCacheConfig<K, N = K> {
    key_convertor: KeyConvertor<K, N>,
    custom_convertor: bool,
    value_tier: RefTier,
    expire_after_access: bool,
    default_expire: Duration,
    clock: Arc<dyn Clock>,
}

impl<K> EmbeddedCacheConfig<K, K>
where
    K: Clone + 'static,
{
    // == Constructor ==
    /// Identity keys, strong values, fixed TTL, default expire, system clock.
    pub fn new() -> Self {
        Self {
            key_convertor: Arc::new(|key: &K| -> anyhow::Result<K> { Ok(key.clone()) }),
            custom_convertor: false,
            value_tier: RefTier::Strong,
            expire_after_access: false,
            default_expire: DEFAULT_EXPIRE,
            clock: Arc::new(SystemClock),
        }
    }
}

impl<K> Default for EmbeddedCacheConfig<K, K>
where
    K: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, N> EmbeddedCacheConfig<K, N> {
    // == Builders ==
    /// Installs a key convertor. Keys that convert equal share one entry.
    pub fn with_key_convertor<M, F>(self, convertor: F) -> EmbeddedCacheConfig<K, M>
    where
        F: Fn(&K) -> anyhow::Result<M> + Send + Sync + 'static,
    {
        EmbeddedCacheConfig {
            key_convertor: Arc::new(convertor),
            custom_convertor: true,
            value_tier: self.value_tier,
            expire_after_access: self.expire_after_access,
            default_expire: self.default_expire,
            clock: self.clock,
        }
    }

    pub fn with_value_tier(mut self, tier: RefTier) -> Self {
        self.value_tier = tier;
        self
    }

    pub fn weak_values(self) -> Self {
        self.with_value_tier(RefTier::Weak)
    }

    pub fn soft_values(self) -> Self {
        self.with_value_tier(RefTier::Soft)
    }

    /// Enables sliding expiration: every hit restarts the TTL.
    pub fn with_expire_after_access(mut self, enabled: bool) -> Self {
        self.expire_after_access = enabled;
        self
    }

    /// TTL used by `put` without an explicit TTL.
    pub fn with_default_expire(mut self, expire: Duration) -> Self {
        self.default_expire = expire;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // == Accessors ==
    pub fn value_tier(&self) -> RefTier {
        self.value_tier
    }

    pub fn expire_after_access(&self) -> bool {
        self.expire_after_access
    }

    pub fn default_expire(&self) -> Duration {
        self.default_expire
    }

    pub fn has_key_convertor(&self) -> bool {
        self.custom_convertor
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    pub(crate) fn convert_key(&self, key: &K) -> Result<N> {
        (self.key_convertor)(key).map_err(CacheError::KeyConversion)
    }
}

impl<K, N> Clone for EmbeddedCacheConfig<K, N> {
    fn clone(&self) -> Self {
        Self {
            key_convertor: Arc::clone(&self.key_convertor),
            custom_convertor: self.custom_convertor,
            value_tier: self.value_tier,
            expire_after_access: self.expire_after_access,
            default_expire: self.default_expire,
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<K, N> fmt::Debug for EmbeddedCacheConfig<K, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedCacheConfig")
            .field("key_convertor", &self.custom_convertor)
            .field("value_tier", &self.value_tier)
            .field("expire_after_access", &self.expire_after_access)
            .field("default_expire", &self.default_expire)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    #[test]
    fn test_config_default() {
        let config = EmbeddedCacheConfig::<String>::new();
        assert_eq!(config.value_tier(), RefTier::Strong);
        assert!(!config.expire_after_access());
        assert!(!config.has_key_convertor());
        assert_eq!(config.default_expire(), DEFAULT_EXPIRE);
        assert_eq!(config.convert_key(&"k".to_string()).unwrap(), "k");
    }

    #[test]
    fn test_config_builders() {
        let clock = Arc::new(ManualClock::new(42));
        let config = EmbeddedCacheConfig::<u32>::new()
            .soft_values()
            .with_expire_after_access(true)
            .with_default_expire(Duration::from_secs(5))
            .with_clock(clock);

        assert_eq!(config.value_tier(), RefTier::Soft);
        assert!(config.expire_after_access());
        assert_eq!(config.default_expire(), Duration::from_secs(5));
        assert_eq!(config.now_millis(), 42);
    }

    #[test]
    fn test_key_convertor_changes_key_type() {
        let config = EmbeddedCacheConfig::<u32>::new()
            .weak_values()
            .with_key_convertor(|k: &u32| Ok(format!("user:{}", k)));

        assert!(config.has_key_convertor());
        assert_eq!(config.value_tier(), RefTier::Weak);
        assert_eq!(config.convert_key(&7).unwrap(), "user:7");
    }

    #[test]
    fn test_key_convertor_error_is_wrapped() {
        let config = EmbeddedCacheConfig::<String>::new().with_key_convertor(|k: &String| {
            if k.is_empty() {
                anyhow::bail!("empty key");
            }
            Ok(k.clone())
        });

        let err = config.convert_key(&String::new()).unwrap_err();
        assert_eq!(err.kind(), "KeyConversionError");
    }
}
