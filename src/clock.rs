//! Injectable time source.
//!
//! All TTL bookkeeping in this crate goes through a [`Clock`] rather than
//! calling `Instant::now()` directly, so tests can control the passage of
//! time without sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A source of the current instant.
///
/// The default [`Cache`](crate::Cache) uses [`SystemClock`], which simply
/// wraps `Instant::now()`. Tests that need deterministic TTL behavior can
/// supply a [`ManualClock`] via `CacheBuilder::clock`.
pub trait Clock: Send + Sync {
    /// Returns the current instant according to this clock.
    fn now(&self) -> Instant;
}

/// The default [`Clock`], backed by the operating system's monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A [`Clock`] that only advances when told to, for deterministic TTL tests.
///
/// # Examples
///
/// ```
/// use polycache::clock::ManualClock;
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let t0 = clock.now();
/// clock.advance(Duration::from_secs(5));
/// assert!(clock.now() >= t0 + Duration::from_secs(5));
/// ```
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset_millis: AtomicU64,
}

impl ManualClock {
    /// Creates a new manual clock starting at the current real instant.
    pub fn new() -> Self {
        ManualClock {
            base: Instant::now(),
            offset_millis: AtomicU64::new(0),
        }
    }

    /// Moves this clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.offset_millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_millis(self.offset_millis.load(Ordering::SeqCst))
    }
}
