#![doc = include_str!("../README.md")]

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Duration;

pub mod builder;
pub mod clock;
pub mod engine;
pub mod error;
pub(crate) mod entry;
pub(crate) mod list;
pub(crate) mod singleflight;
pub mod stats;

pub use builder::CacheBuilder;
pub use clock::{Clock, SystemClock};
pub use engine::EvictionPolicy;
pub use error::CacheError;
pub use stats::Stats;

use crate::engine::{Engine, GetOutcome};
use crate::singleflight::SingleFlight;

pub(crate) type Hook<K, V> = Arc<dyn Fn(&K, &V) + Send + Sync>;
pub(crate) type ValidateHook<K, V> = Arc<dyn Fn(&K, &V) -> Result<(), String> + Send + Sync>;
pub(crate) type LoaderFn<K, V, E> = Arc<dyn Fn(&K) -> Result<V, E> + Send + Sync>;

struct Inner<K: Hash + Eq + Clone, V: Clone, E, S> {
    engine: parking_lot::RwLock<Engine<K, V, S>>,
    single_flight: SingleFlight<K, V, E>,
    stats: Stats,
    clock: Arc<dyn Clock>,
    expire_after: Option<Duration>,
    loader: Option<LoaderFn<K, V, E>>,
    on_added: Option<Hook<K, V>>,
    on_evicted: Option<Hook<K, V>>,
    on_purge_visit: Option<Hook<K, V>>,
    serialize: Option<ValidateHook<K, V>>,
    deserialize: Option<ValidateHook<K, V>>,
}

/// A thread-safe, bounded key-value cache with a choice of eviction policy.
///
/// Cheaply cloneable: `clone()` shares the same underlying engine, statistics,
/// and loader configuration (the clone is a handle, not a copy of the data),
/// which is what lets [`Cache::get_if_present`] spawn a detached background
/// refresh that still writes into the same cache the caller is holding.
///
/// Build one with [`CacheBuilder`] rather than constructing it directly.
pub struct Cache<K: Hash + Eq + Clone, V: Clone, E = std::convert::Infallible, S = RandomState> {
    inner: Arc<Inner<K, V, E, S>>,
}

impl<K: Hash + Eq + Clone, V: Clone, E, S> Clone for Cache<K, V, E, S> {
    fn clone(&self) -> Self {
        Cache {
            inner: self.inner.clone(),
        }
    }
}

impl<K: Hash + Eq + Clone, V: Clone, E, S: BuildHasher + Default> std::fmt::Debug for Cache<K, V, E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("len", &self.inner.engine.read().len(false, self.inner.clock.now()))
            .field("hit_count", &self.inner.stats.hit_count())
            .field("miss_count", &self.inner.stats.miss_count())
            .finish()
    }
}

impl<K, V, E, S> Cache<K, V, E, S>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + Clone + 'static,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    /// Starts a [`CacheBuilder`] for a cache holding at most `capacity` entries.
    pub fn builder(capacity: usize) -> CacheBuilder<K, V, E, S> {
        CacheBuilder::new(capacity)
    }

    fn now(&self) -> std::time::Instant {
        self.inner.clock.now()
    }

    /// Inserts or overwrites `key`, applying the builder's default TTL (if
    /// any). Never fails on capacity; an existing entry is simply evicted to
    /// make room.
    pub fn set(&self, key: K, value: V) -> Result<(), CacheError<E>> {
        let expires_at = self.inner.expire_after.map(|d| self.now() + d);
        self.set_with_deadline(key, value, expires_at)
    }

    /// Inserts or overwrites `key` with an explicit TTL, overriding the
    /// builder's default expiration for this entry only.
    pub fn set_with_expire(&self, key: K, value: V, ttl: Duration) -> Result<(), CacheError<E>> {
        self.set_with_deadline(key, value, Some(self.now() + ttl))
    }

    fn set_with_deadline(
        &self,
        key: K,
        value: V,
        expires_at: Option<std::time::Instant>,
    ) -> Result<(), CacheError<E>> {
        if let Some(serialize) = &self.inner.serialize {
            serialize(&key, &value).map_err(CacheError::SerializerFailed)?;
        }
        let evicted = self
            .inner
            .engine
            .write()
            .set(key.clone(), value.clone(), expires_at, self.now());
        if let Some(hook) = &self.inner.on_added {
            hook(&key, &value);
        }
        if let Some((evicted_key, evicted_value)) = evicted {
            self.inner.stats.record_eviction();
            if let Some(hook) = &self.inner.on_evicted {
                hook(&evicted_key, &evicted_value);
            }
        }
        Ok(())
    }

    /// Returns the value for `key`, engaging the configured loader (and
    /// blocking on it, de-duplicated through single-flight) on a miss.
    /// Without a loader this behaves like [`Cache::get_if_present`].
    pub fn get(&self, key: &K) -> Result<V, CacheError<E>> {
        self.get_impl(key, true)
    }

    /// Returns the value for `key` without blocking on a loader: a miss
    /// kicks off a detached background refresh (if a loader is configured
    /// and none is already in flight for this key) and returns
    /// [`CacheError::NotFound`] immediately. A later call may observe the
    /// refreshed value.
    pub fn get_if_present(&self, key: &K) -> Result<V, CacheError<E>> {
        self.get_impl(key, false)
    }

    fn get_impl(&self, key: &K, wait: bool) -> Result<V, CacheError<E>> {
        let now = self.now();
        let outcome = self.inner.engine.write().get(key, now);
        match outcome {
            GetOutcome::Hit(value) => {
                self.inner.stats.record_hit();
                self.deserialize_value(key, value)
            }
            GetOutcome::ExpiredRemoved(value) => {
                self.inner.stats.record_eviction();
                if let Some(hook) = &self.inner.on_evicted {
                    hook(key, &value);
                }
                self.inner.stats.record_miss();
                self.load_on_miss(key, wait)
            }
            GetOutcome::Miss => {
                self.inner.stats.record_miss();
                self.load_on_miss(key, wait)
            }
        }
    }

    fn deserialize_value(&self, key: &K, value: V) -> Result<V, CacheError<E>> {
        if let Some(deserialize) = &self.inner.deserialize {
            deserialize(key, &value).map_err(CacheError::DeserializerFailed)?;
        }
        Ok(value)
    }

    fn load_on_miss(&self, key: &K, wait: bool) -> Result<V, CacheError<E>> {
        let Some(loader) = self.inner.loader.clone() else {
            return Err(CacheError::NotFound);
        };

        if !wait {
            if !self.inner.single_flight.has_in_flight(key) {
                let cache = self.clone();
                let key = key.clone();
                std::thread::spawn(move || {
                    let _ = cache.run_loader_and_insert(key, loader);
                });
            }
            return Err(CacheError::NotFound);
        }

        self.run_loader_and_insert(key.clone(), loader)
    }

    fn run_loader_and_insert(&self, key: K, loader: LoaderFn<K, V, E>) -> Result<V, CacheError<E>> {
        let value = self
            .inner
            .single_flight
            .do_call(key.clone(), || loader(&key))?;
        self.set_with_deadline(key, value.clone(), self.inner.expire_after.map(|d| self.now() + d))?;
        Ok(value)
    }

    /// Returns `true` if `key` is resident and not yet past its expiration
    /// deadline.
    pub fn has(&self, key: &K) -> bool {
        self.inner.engine.read().has(key, self.now())
    }

    /// Removes `key` unconditionally, firing the eviction hook if it was
    /// resident.
    pub fn remove(&self, key: &K) -> bool {
        let removed = self.inner.engine.write().remove(key);
        match removed {
            Some(value) => {
                if let Some(hook) = &self.inner.on_evicted {
                    hook(key, &value);
                }
                true
            }
            None => false,
        }
    }

    /// Returns every resident key. When `check_expired` is `true`, keys past
    /// their deadline are excluded (but not removed as a side effect).
    pub fn keys(&self, check_expired: bool) -> Vec<K> {
        self.inner.engine.read().keys(check_expired, self.now())
    }

    /// Returns every resident key-value pair, subject to the same
    /// `check_expired` filtering as [`Cache::keys`]. Like the original Go
    /// source's `GetALL`, this promotes every entry it returns (an LRU scan
    /// over the whole cache moves everything to the front); unlike it, this
    /// does not perturb the hit/miss counters, since a bulk scan is not a
    /// "lookup" in the sense `hit_rate()` is meant to measure.
    pub fn get_all(&self, check_expired: bool) -> Vec<(K, V)> {
        let now = self.now();
        let mut engine = self.inner.engine.write();
        let keys = engine.keys(check_expired, now);
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            if let GetOutcome::Hit(value) = engine.get(&key, now) {
                results.push((key, value));
            }
        }
        results
    }

    /// Returns the number of resident entries, subject to the same
    /// `check_expired` filtering as [`Cache::keys`].
    pub fn len(&self, check_expired: bool) -> usize {
        self.inner.engine.read().len(check_expired, self.now())
    }

    /// Returns `true` if the cache holds no resident entries.
    pub fn is_empty(&self, check_expired: bool) -> bool {
        self.len(check_expired) == 0
    }

    /// Fires the purge-visitor hook once per resident entry, then clears the
    /// cache and resets any policy-specific bookkeeping (e.g. ARC's target
    /// partition).
    pub fn purge(&self) {
        let now = self.now();
        let mut engine = self.inner.engine.write();
        if self.inner.on_purge_visit.is_some() || self.inner.deserialize.is_some() {
            for key in engine.keys(false, now) {
                if let GetOutcome::Hit(value) = engine.get(&key, now) {
                    if let Some(hook) = &self.inner.on_purge_visit {
                        hook(&key, &value);
                    }
                }
            }
        }
        engine.purge();
    }

    /// Total number of cache hits observed so far.
    pub fn hit_count(&self) -> u64 {
        self.inner.stats.hit_count()
    }

    /// Total number of cache misses observed so far.
    pub fn miss_count(&self) -> u64 {
        self.inner.stats.miss_count()
    }

    /// Total number of user-visible lookups (`hit_count + miss_count`).
    pub fn lookup_count(&self) -> u64 {
        self.inner.stats.lookup_count()
    }

    /// Fraction of lookups that were hits, in `[0.0, 1.0]`.
    pub fn hit_rate(&self) -> f64 {
        self.inner.stats.hit_rate()
    }
}
