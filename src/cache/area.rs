//! Area Cache Module
//!
//! The backing-store contract the engine writes through, and the default
//! in-process implementation.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use parking_lot::RwLock;

use crate::cache::{ReclaimableRef, Resolved};
use crate::error::StoreError;

// == Area Cache ==
/// Minimal normalized-key → entry storage.
///
/// Each call must be atomic for a single key, and `remove_value` must
/// tolerate absent keys.
pub trait AreaCache<N, V>: Send + Sync {
    fn get_value(&self, key: &N) -> Result<Option<ReclaimableRef<V>>, StoreError>;

    fn put_value(&self, key: N, value: ReclaimableRef<V>) -> Result<(), StoreError>;

    fn remove_value(&self, key: &N) -> Result<(), StoreError>;
}

// == Local Area Cache ==
/// HashMap-backed store guarded by a single read-write lock.
pub struct LocalAreaCache<N, V> {
    entries: RwLock<HashMap<N, ReclaimableRef<V>>>,
}

impl<N, V> LocalAreaCache<N, V>
where
    N: Eq + Hash,
{
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    // == Length ==
    /// Number of stored entries, stale and released ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    // == Sweep Expired ==
    /// Removes entries that are expired at `now` or whose value was released.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&self, now: u64) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();

        entries.retain(|_, entry| match entry.resolve() {
            Resolved::Live(holder) => !holder.is_expired(now),
            Resolved::Reclaimed(_) => false,
        });

        before - entries.len()
    }
}

impl<N, V> Default for LocalAreaCache<N, V>
where
    N: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, V> AreaCache<N, V> for LocalAreaCache<N, V>
where
    N: Eq + Hash + Send + Sync,
    V: Send + Sync,
{
    fn get_value(&self, key: &N) -> Result<Option<ReclaimableRef<V>>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put_value(&self, key: N, value: ReclaimableRef<V>) -> Result<(), StoreError> {
        self.entries.write().insert(key, value);
        Ok(())
    }

    fn remove_value(&self, key: &N) -> Result<(), StoreError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

impl<N, V> fmt::Debug for LocalAreaCache<N, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalAreaCache")
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheValueHolder, RefTier};
    use std::time::Duration;

    fn entry(tier: RefTier, value: &'static str, ttl_ms: u64) -> ReclaimableRef<&'static str> {
        ReclaimableRef::new(
            tier,
            CacheValueHolder::new(value, 0, Duration::from_millis(ttl_ms)),
        )
    }

    #[test]
    fn test_store_new() {
        let store: LocalAreaCache<String, &str> = LocalAreaCache::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_put_get_remove() {
        let store = LocalAreaCache::new();

        store
            .put_value("key1".to_string(), entry(RefTier::Strong, "value1", 1_000))
            .unwrap();
        let found = store.get_value(&"key1".to_string()).unwrap();
        assert!(matches!(found.map(|e| e.resolve()), Some(Resolved::Live(h)) if *h.value() == "value1"));

        store.remove_value(&"key1".to_string()).unwrap();
        assert!(store.get_value(&"key1".to_string()).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_remove_absent_is_ok() {
        let store: LocalAreaCache<&str, &str> = LocalAreaCache::new();
        assert!(store.remove_value(&"nonexistent").is_ok());
    }

    #[test]
    fn test_store_overwrite() {
        let store = LocalAreaCache::new();

        store.put_value("k", entry(RefTier::Strong, "v1", 1_000)).unwrap();
        store.put_value("k", entry(RefTier::Strong, "v2", 1_000)).unwrap();

        assert_eq!(store.len(), 1);
        let found = store.get_value(&"k").unwrap().unwrap();
        assert!(matches!(found.resolve(), Resolved::Live(h) if *h.value() == "v2"));
    }

    #[test]
    fn test_store_sweep_expired() {
        let store = LocalAreaCache::new();

        store.put_value("short", entry(RefTier::Strong, "a", 1_000)).unwrap();
        store.put_value("long", entry(RefTier::Strong, "b", 10_000)).unwrap();
        let released = entry(RefTier::Weak, "c", 10_000);
        released.release();
        store.put_value("released", released).unwrap();

        let removed = store.sweep_expired(1_000);
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        assert!(store.get_value(&"long").unwrap().is_some());
    }
}
