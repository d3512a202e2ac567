//! Least-frequently-used eviction.
//!
//! Resident keys are grouped into frequency buckets kept sorted by
//! ascending frequency. A hit splices its key from its current bucket into
//! the bucket for `frequency + 1`, creating that bucket if it does not yet
//! exist; a non-head bucket that becomes empty is dropped immediately
//! rather than left around as dead weight. The frequency-0 bucket is the
//! sentinel head and is never dropped, even when empty, so there is always
//! somewhere for a fresh key to land. Eviction takes from the
//! lowest-frequency *non-empty* bucket, matching the intent of an outer
//! frequency list whose head is the least-used tier, just expressed as a
//! sorted `Vec` instead of a second hand-rolled intrusive list (one unsafe
//! list in this crate, reused by LRU and ARC, is enough).

use std::collections::{HashMap, HashSet};
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::time::Instant;

use crate::engine::GetOutcome;
use crate::entry::Entry;

struct Bucket<K> {
    freq: u64,
    keys: HashSet<K>,
}

/// Discards the least frequently used entry first. Ties within a frequency
/// are broken arbitrarily, same as the map-order tie-breaking a frequency
/// list with an unordered per-bucket member set would give you.
pub(crate) struct LfuEngine<K: Hash + Eq + Clone, V: Clone, S = RandomState> {
    items: HashMap<K, Entry<K, V>, S>,
    freq_of: HashMap<K, u64, S>,
    buckets: Vec<Bucket<K>>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V: Clone, S: BuildHasher + Default> LfuEngine<K, V, S> {
    pub(crate) fn new(capacity: usize) -> Self {
        LfuEngine {
            items: HashMap::with_capacity_and_hasher(capacity, S::default()),
            freq_of: HashMap::with_capacity_and_hasher(capacity, S::default()),
            buckets: vec![Bucket {
                freq: 0,
                keys: HashSet::new(),
            }],
            capacity,
        }
    }

    fn insert_into_bucket(&mut self, freq: u64, key: K) {
        match self.buckets.binary_search_by_key(&freq, |b| b.freq) {
            Ok(idx) => {
                self.buckets[idx].keys.insert(key);
            }
            Err(idx) => {
                let mut keys = HashSet::new();
                keys.insert(key);
                self.buckets.insert(idx, Bucket { freq, keys });
            }
        }
    }

    fn remove_from_bucket(&mut self, freq: u64, key: &K) {
        if let Ok(idx) = self.buckets.binary_search_by_key(&freq, |b| b.freq) {
            self.buckets[idx].keys.remove(key);
            if self.buckets[idx].keys.is_empty() && freq != 0 {
                self.buckets.remove(idx);
            }
        }
    }

    fn increment(&mut self, key: &K) {
        let old_freq = *self.freq_of.get(key).unwrap_or(&0);
        let new_freq = old_freq + 1;
        self.remove_from_bucket(old_freq, key);
        self.insert_into_bucket(new_freq, key.clone());
        self.freq_of.insert(key.clone(), new_freq);
    }

    /// Evicts from the lowest-frequency bucket that actually holds a key;
    /// the sentinel head (frequency 0) is skipped, not treated as exhausted,
    /// when it happens to be empty.
    fn evict_one(&mut self) -> Option<(K, V)> {
        let idx = self.buckets.iter().position(|b| !b.keys.is_empty())?;
        let bucket = &mut self.buckets[idx];
        let freq = bucket.freq;
        let victim = bucket.keys.iter().next().cloned()?;
        bucket.keys.remove(&victim);
        if bucket.keys.is_empty() && freq != 0 {
            self.buckets.remove(idx);
        }
        self.freq_of.remove(&victim);
        self.items.remove(&victim).map(|e| (victim, e.value))
    }

    pub(crate) fn set(&mut self, key: K, value: V, expires_at: Option<Instant>) -> Option<(K, V)> {
        if let Some(entry) = self.items.get_mut(&key) {
            entry.value = value;
            entry.expires_at = expires_at;
            return None;
        }
        let evicted = if self.items.len() >= self.capacity {
            self.evict_one()
        } else {
            None
        };
        let mut entry = Entry::new(key.clone(), value);
        entry.expires_at = expires_at;
        self.items.insert(key.clone(), entry);
        self.freq_of.insert(key.clone(), 0);
        self.insert_into_bucket(0, key);
        evicted
    }

    pub(crate) fn get(&mut self, key: &K, now: Instant) -> GetOutcome<V> {
        let Some(entry) = self.items.get(key) else {
            return GetOutcome::Miss;
        };
        if !entry.is_expired(now) {
            let value = entry.value.clone();
            self.increment(key);
            return GetOutcome::Hit(value);
        }
        let removed = self.items.remove(key).expect("entry just observed present");
        let freq = self.freq_of.remove(key).unwrap_or(0);
        self.remove_from_bucket(freq, key);
        GetOutcome::ExpiredRemoved(removed.value)
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        let freq = self.freq_of.remove(key)?;
        self.remove_from_bucket(freq, key);
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
        self.freq_of.clear();
        self.buckets.clear();
        self.buckets.push(Bucket {
            freq: 0,
            keys: HashSet::new(),
        });
    }
}
