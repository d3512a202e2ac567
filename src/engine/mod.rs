//! Eviction engines.
//!
//! Each policy lives in its own submodule and owns its resident entries
//! directly; [`Engine`] is a thin tagged union over the four of them so a
//! [`Cache`](crate::Cache) can hold one concrete, monomorphic engine per
//! instance chosen at build time, with no virtual dispatch in the hot path.

mod arc;
mod lfu;
mod lru;
mod simple;

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::time::Instant;

pub(crate) use arc::ArcEngine;
pub(crate) use lfu::LfuEngine;
pub(crate) use lru::LruEngine;
pub(crate) use simple::SimpleEngine;

/// The eviction discipline a [`Cache`](crate::Cache) enforces once it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// No ordering is maintained; the victim is whichever resident entry the
    /// underlying map happens to yield first.
    Simple,
    /// Evicts the least recently used entry.
    Lru,
    /// Evicts the least frequently used entry.
    Lfu,
    /// Adaptively balances recency and frequency (IBM's ARC algorithm).
    Arc,
}

/// Outcome of a lookup against an engine.
pub(crate) enum GetOutcome<V> {
    /// The key was resident and unexpired; its value is returned and the
    /// engine's internal ordering has already been updated.
    Hit(V),
    /// The key was resident but past its expiration deadline. It has been
    /// evicted as a side effect of this call; the stale value is returned so
    /// the caller can still invoke an eviction hook with it.
    ExpiredRemoved(V),
    /// The key was not resident.
    Miss,
}

/// A tagged union over the four eviction engines.
///
/// `K` must be `Hash + Eq + Clone` because every engine keeps keys in more
/// than one place (a side map plus one or more ordering lists); `V` must be
/// `Clone` because lookups hand back an owned copy rather than a reference,
/// which keeps the engine's internal lock scope short.
pub(crate) enum Engine<K: Hash + Eq + Clone, V: Clone, S = RandomState> {
    Simple(SimpleEngine<K, V, S>),
    Lru(LruEngine<K, V, S>),
    Lfu(LfuEngine<K, V, S>),
    Arc(ArcEngine<K, V, S>),
}

impl<K: Hash + Eq + Clone, V: Clone, S: BuildHasher + Default> Engine<K, V, S> {
    pub(crate) fn new(policy: EvictionPolicy, capacity: usize) -> Self {
        match policy {
            EvictionPolicy::Simple => Engine::Simple(SimpleEngine::new(capacity)),
            EvictionPolicy::Lru => Engine::Lru(LruEngine::new(capacity)),
            EvictionPolicy::Lfu => Engine::Lfu(LfuEngine::new(capacity)),
            EvictionPolicy::Arc => Engine::Arc(ArcEngine::new(capacity)),
        }
    }

    /// Inserts or overwrites `key`. Returns the evicted `(key, value)` pair,
    /// if capacity pressure forced one out to make room.
    pub(crate) fn set(&mut self, key: K, value: V, expires_at: Option<Instant>, now: Instant) -> Option<(K, V)> {
        match self {
            Engine::Simple(e) => e.set(key, value, expires_at, now),
            Engine::Lru(e) => e.set(key, value, expires_at),
            Engine::Lfu(e) => e.set(key, value, expires_at),
            Engine::Arc(e) => e.set(key, value, expires_at),
        }
    }

    /// Looks up `key`, promoting it in whatever ordering this policy keeps.
    pub(crate) fn get(&mut self, key: &K, now: Instant) -> GetOutcome<V> {
        match self {
            Engine::Simple(e) => e.get(key, now),
            Engine::Lru(e) => e.get(key, now),
            Engine::Lfu(e) => e.get(key, now),
            Engine::Arc(e) => e.get(key, now),
        }
    }

    /// Removes `key` unconditionally, returning its value if it was resident.
    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        match self {
            Engine::Simple(e) => e.remove(key),
            Engine::Lru(e) => e.remove(key),
            Engine::Lfu(e) => e.remove(key),
            Engine::Arc(e) => e.remove(key),
        }
    }

    /// Returns `true` if `key` is resident and not yet expired.
    pub(crate) fn has(&self, key: &K, now: Instant) -> bool {
        match self {
            Engine::Simple(e) => e.has(key, now),
            Engine::Lru(e) => e.has(key, now),
            Engine::Lfu(e) => e.has(key, now),
            Engine::Arc(e) => e.has(key, now),
        }
    }

    /// Returns every resident key, optionally filtering out expired ones.
    pub(crate) fn keys(&self, check_expired: bool, now: Instant) -> Vec<K> {
        match self {
            Engine::Simple(e) => e.keys(check_expired, now),
            Engine::Lru(e) => e.keys(check_expired, now),
            Engine::Lfu(e) => e.keys(check_expired, now),
            Engine::Arc(e) => e.keys(check_expired, now),
        }
    }

    /// Returns the number of resident entries, optionally excluding expired ones.
    pub(crate) fn len(&self, check_expired: bool, now: Instant) -> usize {
        match self {
            Engine::Simple(e) => e.len(check_expired, now),
            Engine::Lru(e) => e.len(check_expired, now),
            Engine::Lfu(e) => e.len(check_expired, now),
            Engine::Arc(e) => e.len(check_expired, now),
        }
    }

    /// Drops every resident entry and resets any internal bookkeeping.
    pub(crate) fn purge(&mut self) {
        match self {
            Engine::Simple(e) => e.purge(),
            Engine::Lru(e) => e.purge(),
            Engine::Lfu(e) => e.purge(),
            Engine::Arc(e) => e.purge(),
        }
    }
}
