//! No-priority eviction: the victim is whatever the backing map yields first.

use std::collections::HashMap;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::time::Instant;

use crate::engine::GetOutcome;
use crate::entry::Entry;

/// Tracks no ordering at all; capacity pressure evicts an arbitrary resident
/// key. Cheapest of the four policies, useful when callers have no
/// meaningful notion of recency or frequency, or just want a bounded map
/// with TTL support.
pub(crate) struct SimpleEngine<K: Hash + Eq + Clone, V: Clone, S = RandomState> {
    items: HashMap<K, Entry<K, V>, S>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V: Clone, S: BuildHasher + Default> SimpleEngine<K, V, S> {
    pub(crate) fn new(capacity: usize) -> Self {
        SimpleEngine {
            items: HashMap::with_capacity_and_hasher(capacity, S::default()),
            capacity,
        }
    }

    /// Evicts one entry whose deadline has passed, or one that never expires
    /// at all. Returns `None` without evicting anything if every resident
    /// entry still has a live TTL, letting the caller accept temporary
    /// over-capacity rather than cut a live entry short.
    fn evict_one(&mut self, now: Instant) -> Option<(K, V)> {
        let victim = self
            .items
            .iter()
            .find(|(_, e)| e.expires_at.is_none() || e.is_expired(now))
            .map(|(k, _)| k.clone())?;
        self.items.remove(&victim).map(|e| (victim, e.value))
    }

    pub(crate) fn set(&mut self, key: K, value: V, expires_at: Option<Instant>, now: Instant) -> Option<(K, V)> {
        if let Some(entry) = self.items.get_mut(&key) {
            entry.value = value;
            entry.expires_at = expires_at;
            return None;
        }
        let evicted = if self.capacity != 0 && self.items.len() >= self.capacity {
            self.evict_one(now)
        } else {
            None
        };
        let mut entry = Entry::new(key.clone(), value);
        entry.expires_at = expires_at;
        self.items.insert(key, entry);
        evicted
    }

    pub(crate) fn get(&mut self, key: &K, now: Instant) -> GetOutcome<V> {
        let Some(entry) = self.items.get(key) else {
            return GetOutcome::Miss;
        };
        if !entry.is_expired(now) {
            return GetOutcome::Hit(entry.value.clone());
        }
        let removed = self.items.remove(key).expect("entry just observed present");
        GetOutcome::ExpiredRemoved(removed.value)
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        self.items.remove(key).map(|e| e.value)
    }

    pub(crate) fn has(&self, key: &K, now: Instant) -> bool {
        self.items.get(key).is_some_and(|e| !e.is_expired(now))
    }

    pub(crate) fn keys(&self, check_expired: bool, now: Instant) -> Vec<K> {
        self.items
            .iter()
            .filter(|(_, e)| !check_expired || !e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub(crate) fn len(&self, check_expired: bool, now: Instant) -> usize {
        if !check_expired {
            return self.items.len();
        }
        self.items.values().filter(|e| !e.is_expired(now)).count()
    }

    pub(crate) fn purge(&mut self) {
        self.items.clear();
    }
}
