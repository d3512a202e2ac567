//! Least-recently-used eviction, backed by an [`OrderedKeyList`].

use std::collections::HashMap;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::time::Instant;

use crate::engine::GetOutcome;
use crate::entry::Entry;
use crate::list::OrderedKeyList;

/// Discards the least recently used entry first.
///
/// Every successful `get` and every `set` of an already-resident key moves
/// that key to the front of the recency list; `set` of a new key at
/// capacity evicts whatever sits at the back.
pub(crate) struct LruEngine<K: Hash + Eq + Clone, V: Clone, S = RandomState> {
    items: HashMap<K, Entry<K, V>, S>,
    order: OrderedKeyList<K>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V: Clone, S: BuildHasher + Default> LruEngine<K, V, S> {
    pub(crate) fn new(capacity: usize) -> Self {
        LruEngine {
            items: HashMap::with_capacity_and_hasher(capacity, S::default()),
            order: OrderedKeyList::new(),
            capacity,
        }
    }

    fn evict_one(&mut self) -> Option<(K, V)> {
        let victim = self.order.remove_tail()?;
        self.items.remove(&victim).map(|e| (victim, e.value))
    }

    pub(crate) fn set(&mut self, key: K, value: V, expires_at: Option<Instant>) -> Option<(K, V)> {
        if let Some(entry) = self.items.get_mut(&key) {
            entry.value = value;
            entry.expires_at = expires_at;
            self.order.move_to_front(&key);
            return None;
        }
        let evicted = if self.order.len() >= self.capacity {
            self.evict_one()
        } else {
            None
        };
        let mut entry = Entry::new(key.clone(), value);
        entry.expires_at = expires_at;
        self.items.insert(key.clone(), entry);
        self.order.push_front(key);
        evicted
    }

    pub(crate) fn get(&mut self, key: &K, now: Instant) -> GetOutcome<V> {
        let Some(entry) = self.items.get(key) else {
            return GetOutcome::Miss;
        };
        if !entry.is_expired(now) {
            let value = entry.value.clone();
            self.order.move_to_front(key);
            return GetOutcome::Hit(value);
        }
        let removed = self.items.remove(key).expect("entry just observed present");
        self.order.remove(key);
        GetOutcome::ExpiredRemoved(removed.value)
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        self.order.remove(key);
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
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let mut engine: LruEngine<_, _> = LruEngine::new(2);
        engine.set("a", 1, None);
        engine.set("b", 2, None);
        // touch "a" so "b" becomes the LRU victim
        assert!(matches!(engine.get(&"a", Instant::now()), GetOutcome::Hit(1)));
        let evicted = engine.set("c", 3, None);
        match evicted {
            Some((k, v)) => {
                assert_eq!(k, "b");
                assert_eq!(v, 2);
            }
            None => panic!("expected an eviction"),
        }
        let now = Instant::now();
        assert!(engine.has(&"a", now));
        assert!(engine.has(&"c", now));
        assert!(!engine.has(&"b", now));
    }

    #[test]
    fn re_setting_existing_key_refreshes_recency() {
        let mut engine: LruEngine<_, _> = LruEngine::new(2);
        engine.set("a", 1, None);
        engine.set("b", 2, None);
        engine.set("a", 10, None);
        let evicted = engine.set("c", 3, None);
        assert_eq!(evicted, Some(("b", 2)));
    }
}
