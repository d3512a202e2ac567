//! Concurrent Cache Correctness Tests
//!
//! These tests validate that a shared, `Arc`-cloned cache maintains correct
//! eviction semantics and counters while being accessed from multiple
//! threads, and that single-flight loader coordination actually coalesces
//! concurrent loads.
//!
//! ## Segments
//!
//! 1. **Thread Safety Invariants**: capacity and key presence stay correct
//!    under concurrent `set`/`get`/`remove`.
//! 2. **Single-Flight Coordination**: concurrent misses for one key trigger
//!    exactly one loader invocation.

use polycache::{Cache, EvictionPolicy};
use scoped_threadpool::Pool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

// ============================================================================
// SEGMENT 1: THREAD SAFETY INVARIANTS
// ============================================================================

#[test]
fn concurrent_sets_never_exceed_capacity() {
    let cache: Cache<i32, i32> = Cache::builder(50).policy(EvictionPolicy::Lru).build().unwrap();
    let mut pool = Pool::new(8);

    pool.scoped(|scope| {
        for t in 0..8 {
            let cache = cache.clone();
            scope.execute(move || {
                for i in 0..200 {
                    let key = t * 1000 + i;
                    cache.set(key, key * 10).unwrap();
                }
            });
        }
    });

    assert!(cache.len(false) <= 50, "cache must never exceed its configured capacity");
}

#[test]
fn concurrent_gets_and_sets_on_shared_keys_stay_consistent() {
    let cache: Cache<i32, i32> = Cache::builder(16).policy(EvictionPolicy::Arc).build().unwrap();
    for i in 0..16 {
        cache.set(i, i).unwrap();
    }

    let mut pool = Pool::new(4);
    pool.scoped(|scope| {
        for _ in 0..4 {
            let cache = cache.clone();
            scope.execute(move || {
                for _ in 0..500 {
                    for i in 0..16 {
                        // Values only ever move forward, so if a key is
                        // present its value must be >= its original seed.
                        if let Ok(v) = cache.get(&i) {
                            assert!(v >= i);
                        }
                        cache.set(i, i + 1).unwrap();
                    }
                }
            });
        }
    });

    assert_eq!(cache.len(false), 16);
}

#[test]
fn concurrent_remove_and_set_do_not_leave_stale_state() {
    let cache: Cache<i32, i32> = Cache::builder(32).policy(EvictionPolicy::Lfu).build().unwrap();
    let mut pool = Pool::new(4);

    pool.scoped(|scope| {
        for t in 0..4 {
            let cache = cache.clone();
            scope.execute(move || {
                for i in 0..200 {
                    let key = t;
                    cache.set(key, i).unwrap();
                    cache.remove(&key);
                }
            });
        }
    });

    assert!(cache.len(false) <= 32);
}

#[test]
fn concurrent_stats_counters_sum_to_total_lookups() {
    let cache: Cache<i32, i32> = Cache::builder(4).build().unwrap();
    cache.set(1, 10).unwrap();

    let mut pool = Pool::new(8);
    pool.scoped(|scope| {
        for t in 0..8 {
            let cache = cache.clone();
            scope.execute(move || {
                for _ in 0..100 {
                    // key 1 always hits, key 2 always misses.
                    let _ = cache.get(&1);
                    let _ = cache.get(&(100 + t));
                }
            });
        }
    });

    assert_eq!(cache.lookup_count(), 1600);
    assert_eq!(cache.hit_count() + cache.miss_count(), 1600);
}

// ============================================================================
// SEGMENT 2: SINGLE-FLIGHT COORDINATION
// ============================================================================

#[test]
fn concurrent_misses_for_the_same_key_share_one_loader_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    let cache: Cache<&str, i32, String> = Cache::builder(4)
        .loader(move |_key| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            Ok(42)
        })
        .build()
        .unwrap();

    let barrier = Arc::new(Barrier::new(8));
    let mut pool = Pool::new(8);

    pool.scoped(|scope| {
        for _ in 0..8 {
            let cache = cache.clone();
            let barrier = barrier.clone();
            scope.execute(move || {
                barrier.wait();
                assert_eq!(cache.get(&"shared").unwrap(), 42);
            });
        }
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1, "exactly one thread should invoke the loader");
}

#[test]
fn single_flight_does_not_serialize_unrelated_keys() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));
    let in_flight_clone = in_flight.clone();
    let max_in_flight_clone = max_in_flight.clone();

    let cache: Cache<i32, i32, String> = Cache::builder(16)
        .loader(move |key| {
            let now = in_flight_clone.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_flight_clone.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            in_flight_clone.fetch_sub(1, Ordering::SeqCst);
            Ok(*key)
        })
        .build()
        .unwrap();

    let barrier = Arc::new(Barrier::new(4));
    let mut pool = Pool::new(4);

    pool.scoped(|scope| {
        for i in 0..4 {
            let cache = cache.clone();
            let barrier = barrier.clone();
            scope.execute(move || {
                barrier.wait();
                assert_eq!(cache.get(&i).unwrap(), i);
            });
        }
    });

    assert!(max_in_flight.load(Ordering::SeqCst) > 1, "distinct keys must load concurrently");
}
