//! Bounded concurrent cache of learned execution-path decisions.
//!
//! Entries amortize both the analyzer's work and the engine's own prepare
//! rejections: once a fingerprint is known to need direct execution, later
//! submissions of the same shape skip the wasted prepare attempt entirely.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use lru::LruCache;

use crate::fingerprint::Fingerprint;

/// Learned execution path for one statement shape.
///
/// Absence from the cache is the unknown state; it resolves to a decision
/// after the first execution attempt and is retained for the entry lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanDecision {
    /// The prepared path handled this shape.
    Prepared,
    /// This shape requires direct execution.
    Direct,
}

/// Bounded, LRU-evicting map from fingerprint to [`PlanDecision`].
///
/// The interior mutex guards microsecond-scale operations only; engine calls
/// never happen under it.
#[derive(Debug)]
pub struct ClassificationCache {
    entries: Mutex<LruCache<Fingerprint, PlanDecision>>,
    invalidations: AtomicU64,
}

impl ClassificationCache {
    /// Creates a cache bounded to `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("clamped to at least 1");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            invalidations: AtomicU64::new(0),
        }
    }

    /// Returns the learned decision for `fingerprint`, refreshing its recency.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<PlanDecision> {
        self.entries
            .lock()
            .expect("classification cache lock")
            .get(fingerprint)
            .copied()
    }

    /// Records a learned decision. First writer wins: a concurrent racer
    /// cannot overwrite an already-learned decision for the same shape.
    pub fn insert(&self, fingerprint: Fingerprint, decision: PlanDecision) {
        let mut entries = self.entries.lock().expect("classification cache lock");
        if !entries.contains(&fingerprint) {
            entries.put(fingerprint, decision);
        }
    }

    /// Replaces whatever is recorded for `fingerprint`.
    ///
    /// Used when the engine's live behavior contradicts a cached decision;
    /// engine ground truth overrides the anti-race insert policy.
    pub fn replace(&self, fingerprint: Fingerprint, decision: PlanDecision) {
        self.entries
            .lock()
            .expect("classification cache lock")
            .put(fingerprint, decision);
    }

    /// Drops every entry. Runs synchronously: once this returns, any later
    /// lookup sees the empty cache.
    pub fn invalidate_all(&self) {
        self.entries
            .lock()
            .expect("classification cache lock")
            .clear();
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of cached decisions.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("classification cache lock").len()
    }

    /// Whether the cache currently holds no decisions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of full invalidations since startup.
    pub fn invalidation_count(&self) -> u64 {
        self.invalidations.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;

    #[test]
    fn decisions_are_learned_and_retained() {
        let cache = ClassificationCache::new(4);
        let fp = fingerprint("SELECT 1");
        assert_eq!(cache.get(&fp), None);
        cache.insert(fp, PlanDecision::Direct);
        assert_eq!(cache.get(&fp), Some(PlanDecision::Direct));
    }

    #[test]
    fn first_writer_wins_for_one_shape() {
        let cache = ClassificationCache::new(4);
        let fp = fingerprint("SELECT 1");
        cache.insert(fp, PlanDecision::Prepared);
        cache.insert(fp, PlanDecision::Direct);
        assert_eq!(cache.get(&fp), Some(PlanDecision::Prepared));
    }

    #[test]
    fn replace_overrides_a_learned_decision() {
        let cache = ClassificationCache::new(4);
        let fp = fingerprint("SELECT 1");
        cache.insert(fp, PlanDecision::Prepared);
        cache.replace(fp, PlanDecision::Direct);
        assert_eq!(cache.get(&fp), Some(PlanDecision::Direct));
    }

    #[test]
    fn capacity_bounds_are_enforced_with_lru_eviction() {
        let cache = ClassificationCache::new(2);
        let first = fingerprint("SELECT 1");
        let second = fingerprint("SELECT 2");
        let third = fingerprint("SELECT 3");
        cache.insert(first, PlanDecision::Prepared);
        cache.insert(second, PlanDecision::Prepared);
        // Refresh `first`, then overflow: `second` is the eviction victim.
        assert_eq!(cache.get(&first), Some(PlanDecision::Prepared));
        cache.insert(third, PlanDecision::Direct);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&second), None);
        assert_eq!(cache.get(&first), Some(PlanDecision::Prepared));
        assert_eq!(cache.get(&third), Some(PlanDecision::Direct));
    }

    #[test]
    fn invalidate_all_clears_synchronously() {
        let cache = ClassificationCache::new(4);
        cache.insert(fingerprint("SELECT 1"), PlanDecision::Prepared);
        cache.insert(fingerprint("SELECT 2"), PlanDecision::Direct);
        cache.invalidate_all();
        assert!(cache.is_empty());
        assert_eq!(cache.invalidation_count(), 1);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cache = ClassificationCache::new(0);
        let fp = fingerprint("SELECT 1");
        cache.insert(fp, PlanDecision::Prepared);
        assert_eq!(cache.get(&fp), Some(PlanDecision::Prepared));
    }
}
