//! Reclaimable Reference Module
//!
//! Weak and soft value references with an explicit memory manager.
//!
//! A `Weak` or `Soft` entry keeps its holder in a slot that the
//! [`Reclaimer`] may empty at any time. Readers that find an empty slot see
//! the entry as released. `Weak` slots go on any reclaim pass, `Soft` slots
//! only under [`MemoryPressure::Critical`].

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::CacheValueHolder;

// == Ref Tier ==
/// How strongly the cache holds its values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefTier {
    #[default]
    Strong,
    Weak,
    Soft,
}

impl RefTier {
    /// Diagnostic attached to a miss caused by a released reference.
    pub fn released_message(self) -> &'static str {
        match self {
            RefTier::Strong => "strong ref released",
            RefTier::Weak => "weak ref released",
            RefTier::Soft => "soft ref released",
        }
    }

    fn released_under(self, pressure: MemoryPressure) -> bool {
        match (self, pressure) {
            (RefTier::Strong, _) => false,
            (RefTier::Weak, _) => true,
            (RefTier::Soft, MemoryPressure::Critical) => true,
            (RefTier::Soft, MemoryPressure::Moderate) => false,
        }
    }
}

impl FromStr for RefTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strong" => Ok(RefTier::Strong),
            "weak" => Ok(RefTier::Weak),
            "soft" => Ok(RefTier::Soft),
            other => Err(format!("unknown value tier '{}'", other)),
        }
    }
}

impl fmt::Display for RefTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefTier::Strong => "strong",
            RefTier::Weak => "weak",
            RefTier::Soft => "soft",
        };
        f.write_str(name)
    }
}

// == Memory Pressure ==
/// Severity of a reclaim pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryPressure {
    /// Releases weak references only.
    Moderate,
    /// Releases weak and soft references.
    Critical,
}

// == Reclaim Slot ==
/// Holder cell of a weak or soft reference.
pub struct ReclaimSlot<V> {
    holder: Mutex<Option<Arc<CacheValueHolder<V>>>>,
}

impl<V> ReclaimSlot<V> {
    fn new(holder: Arc<CacheValueHolder<V>>) -> Self {
        Self {
            holder: Mutex::new(Some(holder)),
        }
    }

    fn get(&self) -> Option<Arc<CacheValueHolder<V>>> {
        self.holder.lock().clone()
    }

    fn take(&self) -> bool {
        self.holder.lock().take().is_some()
    }
}

impl<V> fmt::Debug for ReclaimSlot<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReclaimSlot")
            .field("live", &self.holder.lock().is_some())
            .finish()
    }
}

/// Type-erased view of a slot, as seen by the reclaimer.
trait Reclaim: Send + Sync {
    fn release(&self) -> bool;
}

impl<V: Send + Sync> Reclaim for ReclaimSlot<V> {
    fn release(&self) -> bool {
        self.take()
    }
}

// == Reclaimable Ref ==
/// The raw entry kept by a backing store.
pub enum ReclaimableRef<V> {
    Strong(Arc<CacheValueHolder<V>>),
    Weak(Arc<ReclaimSlot<V>>),
    Soft(Arc<ReclaimSlot<V>>),
}

/// Outcome of resolving a [`ReclaimableRef`].
#[derive(Debug)]
pub enum Resolved<V> {
    Live(Arc<CacheValueHolder<V>>),
    Reclaimed(RefTier),
}

impl<V> ReclaimableRef<V> {
    /// Wraps a holder in the given tier.
    pub fn new(tier: RefTier, holder: CacheValueHolder<V>) -> Self {
        let holder = Arc::new(holder);
        match tier {
            RefTier::Strong => ReclaimableRef::Strong(holder),
            RefTier::Weak => ReclaimableRef::Weak(Arc::new(ReclaimSlot::new(holder))),
            RefTier::Soft => ReclaimableRef::Soft(Arc::new(ReclaimSlot::new(holder))),
        }
    }

    pub fn tier(&self) -> RefTier {
        match self {
            ReclaimableRef::Strong(_) => RefTier::Strong,
            ReclaimableRef::Weak(_) => RefTier::Weak,
            ReclaimableRef::Soft(_) => RefTier::Soft,
        }
    }

    // == Resolve ==
    /// Returns the live holder, or the tier that released it.
    pub fn resolve(&self) -> Resolved<V> {
        let slot = match self {
            ReclaimableRef::Strong(holder) => return Resolved::Live(Arc::clone(holder)),
            ReclaimableRef::Weak(slot) | ReclaimableRef::Soft(slot) => slot,
        };
        match slot.get() {
            Some(holder) => Resolved::Live(holder),
            None => Resolved::Reclaimed(self.tier()),
        }
    }

    /// Drops the holder of a weak or soft reference.
    ///
    /// Returns `true` if a live holder was released. Strong references are
    /// never released.
    pub fn release(&self) -> bool {
        match self {
            ReclaimableRef::Strong(_) => false,
            ReclaimableRef::Weak(slot) | ReclaimableRef::Soft(slot) => slot.take(),
        }
    }
}

impl<V> Clone for ReclaimableRef<V> {
    fn clone(&self) -> Self {
        match self {
            ReclaimableRef::Strong(holder) => ReclaimableRef::Strong(Arc::clone(holder)),
            ReclaimableRef::Weak(slot) => ReclaimableRef::Weak(Arc::clone(slot)),
            ReclaimableRef::Soft(slot) => ReclaimableRef::Soft(Arc::clone(slot)),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for ReclaimableRef<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReclaimableRef::Strong(holder) => f.debug_tuple("Strong").field(holder).finish(),
            ReclaimableRef::Weak(slot) => f.debug_tuple("Weak").field(slot).finish(),
            ReclaimableRef::Soft(slot) => f.debug_tuple("Soft").field(slot).finish(),
        }
    }
}

// == Reclaimer ==
const MIN_COMPACT_AT: usize = 64;

struct Tracked {
    tier: RefTier,
    slot: Weak<dyn Reclaim>,
}

struct Registry {
    tracked: Vec<Tracked>,
    compact_at: usize,
}

/// Emulated memory manager for weak and soft references.
///
/// Holds non-owning handles only; overwritten or removed entries drop out on
/// the next compaction.
pub struct Reclaimer {
    registry: Mutex<Registry>,
}

impl Reclaimer {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                tracked: Vec::new(),
                compact_at: MIN_COMPACT_AT,
            }),
        }
    }

    // == Track ==
    /// Registers a weak or soft reference. Strong references are ignored.
    pub fn track<V>(&self, reference: &ReclaimableRef<V>)
    where
        V: Send + Sync + 'static,
    {
        let (tier, slot) = match reference {
            ReclaimableRef::Strong(_) => return,
            ReclaimableRef::Weak(slot) => (RefTier::Weak, slot),
            ReclaimableRef::Soft(slot) => (RefTier::Soft, slot),
        };
        let slot: Arc<dyn Reclaim> = Arc::clone(slot) as Arc<dyn Reclaim>;

        let mut registry = self.registry.lock();
        if registry.tracked.len() >= registry.compact_at {
            registry.tracked.retain(|t| t.slot.strong_count() > 0);
            registry.compact_at = (registry.tracked.len() * 2).max(MIN_COMPACT_AT);
        }
        registry.tracked.push(Tracked {
            tier,
            slot: Arc::downgrade(&slot),
        });
    }

    // == Reclaim ==
    /// Releases every tracked reference whose tier yields to `pressure`.
    ///
    /// Returns the number of live holders dropped.
    pub fn reclaim(&self, pressure: MemoryPressure) -> usize {
        let mut registry = self.registry.lock();
        let mut released = 0;

        registry.tracked.retain(|t| {
            let Some(slot) = t.slot.upgrade() else {
                return false;
            };
            if t.tier.released_under(pressure) {
                if slot.release() {
                    released += 1;
                }
                false
            } else {
                true
            }
        });
        registry.compact_at = (registry.tracked.len() * 2).max(MIN_COMPACT_AT);

        debug!(?pressure, released, "Reclaim pass finished");
        released
    }

    /// Number of handles currently tracked, dead ones included.
    pub fn tracked(&self) -> usize {
        self.registry.lock().tracked.len()
    }
}

impl Default for Reclaimer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Reclaimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reclaimer")
            .field("tracked", &self.tracked())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn holder(value: &'static str) -> CacheValueHolder<&'static str> {
        CacheValueHolder::new(value, 0, Duration::from_secs(60))
    }

    #[test]
    fn test_strong_ref_always_resolves() {
        let reference = ReclaimableRef::new(RefTier::Strong, holder("a"));

        assert!(!reference.release());
        match reference.resolve() {
            Resolved::Live(h) => assert_eq!(*h.value(), "a"),
            Resolved::Reclaimed(_) => panic!("strong ref must stay live"),
        }
    }

    #[test]
    fn test_released_ref_reports_tier() {
        let weak = ReclaimableRef::new(RefTier::Weak, holder("w"));
        let soft = ReclaimableRef::new(RefTier::Soft, holder("s"));

        assert!(weak.release());
        assert!(soft.release());
        assert!(!weak.release(), "second release finds nothing");

        assert!(matches!(weak.resolve(), Resolved::Reclaimed(RefTier::Weak)));
        assert!(matches!(soft.resolve(), Resolved::Reclaimed(RefTier::Soft)));
    }

    #[test]
    fn test_clones_share_the_slot() {
        let reference = ReclaimableRef::new(RefTier::Weak, holder("w"));
        let clone = reference.clone();

        reference.release();
        assert!(matches!(clone.resolve(), Resolved::Reclaimed(RefTier::Weak)));
    }

    #[test]
    fn test_moderate_pressure_releases_weak_only() {
        let reclaimer = Reclaimer::new();
        let weak = ReclaimableRef::new(RefTier::Weak, holder("w"));
        let soft = ReclaimableRef::new(RefTier::Soft, holder("s"));
        let strong = ReclaimableRef::new(RefTier::Strong, holder("x"));
        reclaimer.track(&weak);
        reclaimer.track(&soft);
        reclaimer.track(&strong);
        assert_eq!(reclaimer.tracked(), 2);

        assert_eq!(reclaimer.reclaim(MemoryPressure::Moderate), 1);
        assert!(matches!(weak.resolve(), Resolved::Reclaimed(RefTier::Weak)));
        assert!(matches!(soft.resolve(), Resolved::Live(_)));
        assert!(matches!(strong.resolve(), Resolved::Live(_)));
        assert_eq!(reclaimer.tracked(), 1);
    }

    #[test]
    fn test_critical_pressure_releases_weak_and_soft() {
        let reclaimer = Reclaimer::new();
        let weak = ReclaimableRef::new(RefTier::Weak, holder("w"));
        let soft = ReclaimableRef::new(RefTier::Soft, holder("s"));
        reclaimer.track(&weak);
        reclaimer.track(&soft);

        assert_eq!(reclaimer.reclaim(MemoryPressure::Critical), 2);
        assert!(matches!(soft.resolve(), Resolved::Reclaimed(RefTier::Soft)));
        assert_eq!(reclaimer.tracked(), 0);
    }

    #[test]
    fn test_dropped_refs_are_compacted() {
        let reclaimer = Reclaimer::new();
        for _ in 0..(MIN_COMPACT_AT * 3) {
            let reference = ReclaimableRef::new(RefTier::Soft, holder("tmp"));
            reclaimer.track(&reference);
        }
        assert!(reclaimer.tracked() <= MIN_COMPACT_AT + 1);
        assert_eq!(reclaimer.reclaim(MemoryPressure::Critical), 0);
    }

    #[test]
    fn test_tier_parse_and_messages() {
        assert_eq!("Weak".parse::<RefTier>().unwrap(), RefTier::Weak);
        assert_eq!(" soft ".parse::<RefTier>().unwrap(), RefTier::Soft);
        assert!("phantom".parse::<RefTier>().is_err());
        assert_eq!(RefTier::Weak.released_message(), "weak ref released");
        assert_eq!(RefTier::Soft.released_message(), "soft ref released");
    }
}
