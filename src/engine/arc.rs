//! Adaptive Replacement Cache: balances recency (T1/B1) against frequency
//! (T2/B2) by adjusting a target partition size `part` as ghost hits come in.
//!
//! Grounded directly on the classical four-list formulation: `T1`/`T2` hold
//! resident keys, `B1`/`B2` hold ghost keys (evicted, but remembered so a
//! second touch can correct `part` in the right direction). Only `T1`/`T2`
//! keys have a value in `items`; a ghost hit always re-admits the key with
//! whatever value the caller's `set` supplies.
//!
//! `Set` checks residency in `T1`/`T2` first: a key already resident in
//! either list just gets its value updated and is promoted to the front of
//! `T2`, the same as a `Get` hit would. Only a key resident in neither list
//! falls through to the ghost-hit/cold-miss admission math below, which is
//! what keeps a key from ever ending up duplicated across `T1` and `T2`.

use std::collections::HashMap;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::time::Instant;

use crate::engine::GetOutcome;
use crate::entry::Entry;
use crate::list::OrderedKeyList;

pub(crate) struct ArcEngine<K: Hash + Eq + Clone, V: Clone, S = RandomState> {
    items: HashMap<K, Entry<K, V>, S>,
    part: usize,
    t1: OrderedKeyList<K>,
    t2: OrderedKeyList<K>,
    b1: OrderedKeyList<K>,
    b2: OrderedKeyList<K>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V: Clone, S: BuildHasher + Default> ArcEngine<K, V, S> {
    pub(crate) fn new(capacity: usize) -> Self {
        ArcEngine {
            items: HashMap::with_capacity_and_hasher(capacity, S::default()),
            part: 0,
            t1: OrderedKeyList::new(),
            t2: OrderedKeyList::new(),
            b1: OrderedKeyList::new(),
            b2: OrderedKeyList::new(),
            capacity,
        }
    }

    /// Evicts one entry from `T1` or `T2`, ghosting the evicted key into the
    /// matching `B1`/`B2`. Which side is chosen depends on whether `key` (the
    /// key currently being admitted) is itself a `B2` ghost.
    fn replace(&mut self, key: &K) -> Option<(K, V)> {
        let take_from_t1 = (!self.t1.is_empty() && self.b2.has(key) && self.t1.len() == self.part)
            || self.t1.len() > self.part;

        let evicted_key = if take_from_t1 {
            let old = self.t1.remove_tail()?;
            self.b1.push_front(old.clone());
            old
        } else if !self.t2.is_empty() {
            let old = self.t2.remove_tail()?;
            self.b2.push_front(old.clone());
            old
        } else {
            return None;
        };

        self.items.remove(&evicted_key).map(|e| (evicted_key, e.value))
    }

    pub(crate) fn set(&mut self, key: K, value: V, expires_at: Option<Instant>) -> Option<(K, V)> {
        if self.t1.has(&key) || self.t2.has(&key) {
            if let Some(entry) = self.items.get_mut(&key) {
                entry.value = value;
                entry.expires_at = expires_at;
            }
            self.t1.remove(&key);
            self.t2.remove(&key);
            self.t2.push_front(key);
            return None;
        }

        let mut entry = Entry::new(key.clone(), value);
        entry.expires_at = expires_at;
        self.items.insert(key.clone(), entry);

        if self.b1.has(&key) {
            let delta = (self.b2.len() / self.b1.len().max(1)).max(1);
            self.part = (self.part + delta).min(self.capacity);
            let evicted = self.replace(&key);
            self.b1.remove(&key);
            self.t2.push_front(key);
            return evicted;
        }

        if self.b2.has(&key) {
            let delta = (self.b1.len() / self.b2.len().max(1)).max(1);
            self.part = self.part.saturating_sub(delta);
            let evicted = self.replace(&key);
            self.b2.remove(&key);
            self.t2.push_front(key);
            return evicted;
        }

        let mut evicted = None;
        if self.t1.len() + self.b1.len() == self.capacity {
            if self.t1.len() < self.capacity {
                self.b1.remove_tail();
                evicted = self.replace(&key);
            } else if let Some(old) = self.t1.remove_tail() {
                evicted = self.items.remove(&old).map(|e| (old, e.value));
            }
        } else {
            let total = self.t1.len() + self.b1.len() + self.t2.len() + self.b2.len();
            if total >= self.capacity {
                if total == 2 * self.capacity {
                    self.b2.remove_tail();
                }
                evicted = self.replace(&key);
            }
        }

        self.t1.push_front(key);

        evicted
    }

    pub(crate) fn get(&mut self, key: &K, now: Instant) -> GetOutcome<V> {
        if self.t1.has(key) {
            self.t1.remove(key);
            let expired = self.items.get(key).map(|e| e.is_expired(now));
            match expired {
                Some(false) => {
                    let value = self.items.get(key).expect("checked above").value.clone();
                    self.t2.push_front(key.clone());
                    return GetOutcome::Hit(value);
                }
                Some(true) => {
                    let removed = self.items.remove(key).expect("checked above");
                    self.b2.push_front(key.clone());
                    return GetOutcome::ExpiredRemoved(removed.value);
                }
                None => unreachable!("key resident in t1 must have an items entry"),
            }
        }

        if self.t2.has(key) {
            let expired = self.items.get(key).map(|e| e.is_expired(now));
            match expired {
                Some(false) => {
                    let value = self.items.get(key).expect("checked above").value.clone();
                    self.t2.move_to_front(key);
                    return GetOutcome::Hit(value);
                }
                Some(true) => {
                    self.t2.remove(key);
                    let removed = self.items.remove(key).expect("checked above");
                    self.b2.push_front(key.clone());
                    return GetOutcome::ExpiredRemoved(removed.value);
                }
                None => unreachable!("key resident in t2 must have an items entry"),
            }
        }

        GetOutcome::Miss
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        if self.t1.has(key) {
            self.t1.remove(key);
            return self.items.remove(key).map(|e| e.value);
        }
        if self.t2.has(key) {
            self.t2.remove(key);
            return self.items.remove(key).map(|e| e.value);
        }
        None
    }

    pub(crate) fn has(&self, key: &K, now: Instant) -> bool {
        (self.t1.has(key) || self.t2.has(key))
            && self.items.get(key).is_some_and(|e| !e.is_expired(now))
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
        self.t1.clear();
        self.t2.clear();
        self.b1.clear();
        self.b2.clear();
        self.part = 0;
    }
}
