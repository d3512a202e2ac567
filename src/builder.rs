//! Fluent construction entry point for [`Cache`].
//!
//! Mirrors the original Go source's `CacheBuilder`: one chained call per
//! construction option, ending in `.build()`, which validates configuration
//! and returns a `Result` rather than panicking the way `gcache.New` does on
//! an invalid size.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::engine::{Engine, EvictionPolicy};
use crate::error::CacheError;
use crate::stats::Stats;
use crate::{Cache, Hook, Inner, LoaderFn, ValidateHook};

/// Builds a [`Cache`] one option at a time.
///
/// `K`/`V` are the cache's key and value types; `E` is the loader's error
/// type (defaults to [`std::convert::Infallible`] for loader-less caches);
/// `S` is the hasher used by the engine's internal maps (defaults to
/// [`RandomState`], same default `std::collections::HashMap` uses).
pub struct CacheBuilder<K, V, E = std::convert::Infallible, S = RandomState> {
    capacity: usize,
    policy: EvictionPolicy,
    expire_after: Option<Duration>,
    clock: Arc<dyn Clock>,
    loader: Option<LoaderFn<K, V, E>>,
    on_added: Option<Hook<K, V>>,
    on_evicted: Option<Hook<K, V>>,
    on_purge_visit: Option<Hook<K, V>>,
    serialize: Option<ValidateHook<K, V>>,
    deserialize: Option<ValidateHook<K, V>>,
    _hasher: std::marker::PhantomData<S>,
}

impl<K, V, E, S> std::fmt::Debug for CacheBuilder<K, V, E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .field("expire_after", &self.expire_after)
            .finish()
    }
}

impl<K, V, E, S> CacheBuilder<K, V, E, S>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + Clone + 'static,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    /// Starts a builder for a cache holding at most `capacity` entries.
    ///
    /// Mirrors `gcache.New(size)`.
    pub fn new(capacity: usize) -> Self {
        CacheBuilder {
            capacity,
            policy: EvictionPolicy::Lru,
            expire_after: None,
            clock: Arc::new(SystemClock),
            loader: None,
            on_added: None,
            on_evicted: None,
            on_purge_visit: None,
            serialize: None,
            deserialize: None,
            _hasher: std::marker::PhantomData,
        }
    }

    /// Sets the eviction policy. Mirrors `.EvictType(tp)`.
    pub fn policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Convenience for `.policy(EvictionPolicy::Simple)`.
    pub fn simple(self) -> Self {
        self.policy(EvictionPolicy::Simple)
    }

    /// Convenience for `.policy(EvictionPolicy::Lru)`.
    pub fn lru(self) -> Self {
        self.policy(EvictionPolicy::Lru)
    }

    /// Convenience for `.policy(EvictionPolicy::Lfu)`.
    pub fn lfu(self) -> Self {
        self.policy(EvictionPolicy::Lfu)
    }

    /// Convenience for `.policy(EvictionPolicy::Arc)`.
    pub fn arc(self) -> Self {
        self.policy(EvictionPolicy::Arc)
    }

    /// Sets a default per-entry TTL applied by `Set` (but not `SetWithExpire`,
    /// which carries its own explicit deadline). Mirrors `.Expiration(d)`.
    pub fn expire_after(mut self, duration: Duration) -> Self {
        self.expire_after = Some(duration);
        self
    }

    /// Overrides the time source, mainly for deterministic TTL tests.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Registers a loader invoked on a cache miss, coordinated through
    /// single-flight so concurrent misses for the same key run it once.
    pub fn loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
    {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Registers a hook fired after every successful `Set` (including loader
    /// insertions).
    pub fn on_added<F>(mut self, hook: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.on_added = Some(Arc::new(hook));
        self
    }

    /// Registers a hook fired when a value is discarded by capacity
    /// pressure, TTL expiry, or an explicit `Remove`.
    pub fn on_evicted<F>(mut self, hook: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.on_evicted = Some(Arc::new(hook));
        self
    }

    /// Registers a hook fired once per resident entry during `Purge`,
    /// before the engine is reinitialized.
    pub fn on_purge_visit<F>(mut self, hook: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.on_purge_visit = Some(Arc::new(hook));
        self
    }

    /// Registers a hook run on `Set` before the value is admitted; an `Err`
    /// aborts the insertion and surfaces [`CacheError::SerializerFailed`].
    pub fn serialize<F>(mut self, hook: F) -> Self
    where
        F: Fn(&K, &V) -> Result<(), String> + Send + Sync + 'static,
    {
        self.serialize = Some(Arc::new(hook));
        self
    }

    /// Registers a hook run on every successful `Get` before the value is
    /// returned; an `Err` surfaces [`CacheError::DeserializerFailed`] while
    /// leaving the entry resident.
    pub fn deserialize<F>(mut self, hook: F) -> Self
    where
        F: Fn(&K, &V) -> Result<(), String> + Send + Sync + 'static,
    {
        self.deserialize = Some(Arc::new(hook));
        self
    }

    /// Validates configuration and constructs the `Cache`.
    ///
    /// Mirrors `cb.build()`'s type switch over `cb.tp`; returns
    /// [`CacheError::InvalidConfiguration`] instead of panicking on a
    /// capacity of zero, since panicking on caller-supplied configuration is
    /// not idiomatic Rust library behavior. A capacity of zero is accepted
    /// for [`EvictionPolicy::Simple`] only, where it means unbounded; every
    /// other policy needs a real bound to have anything to evict by.
    pub fn build(self) -> Result<Cache<K, V, E, S>, CacheError<E>> {
        if self.capacity == 0 && self.policy != EvictionPolicy::Simple {
            return Err(CacheError::InvalidConfiguration(
                "capacity must be greater than zero".to_string(),
            ));
        }
        Ok(Cache {
            inner: Arc::new(Inner {
                engine: parking_lot::RwLock::new(Engine::new(self.policy, self.capacity)),
                single_flight: crate::singleflight::SingleFlight::new(),
                stats: Stats::new(),
                clock: self.clock,
                expire_after: self.expire_after,
                loader: self.loader,
                on_added: self.on_added,
                on_evicted: self.on_evicted,
                on_purge_visit: self.on_purge_visit,
                serialize: self.serialize,
                deserialize: self.deserialize,
            }),
        })
    }
}
