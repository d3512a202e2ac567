//! Single-flight loader coordination.
//!
//! When many callers request the same missing key at once, only one of
//! them should actually run the loader; the rest block until it finishes
//! and then share its result. This mirrors the duplicate-suppression
//! behavior callers expect from call-coalescing libraries, adapted here to
//! a blocking, panic-safe form built on `parking_lot::{Mutex, Condvar}`.

use std::collections::HashMap;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::error::CacheError;

struct CallState<V, E> {
    result: Option<Result<V, CacheError<E>>>,
}

struct Call<V, E> {
    state: Mutex<CallState<V, E>>,
    done: Condvar,
}

/// De-duplicates concurrent loader invocations for the same key.
///
/// One [`SingleFlight`] is shared by all engines inside a single `Cache`
/// instance; it holds no knowledge of the cache's own data, only of
/// in-flight loader calls.
pub(crate) struct SingleFlight<K, V, E> {
    calls: Mutex<HashMap<K, Arc<Call<V, E>>>>,
}

impl<K, V, E> SingleFlight<K, V, E>
where
    K: Hash + Eq + Clone,
    V: Clone,
    E: Clone,
{
    pub(crate) fn new() -> Self {
        SingleFlight {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` if a call for `key` is currently in flight.
    pub(crate) fn has_in_flight(&self, key: &K) -> bool {
        self.calls.lock().contains_key(key)
    }

    /// Runs `loader` for `key`, or waits for another in-flight call for the
    /// same key and returns its result.
    ///
    /// Exactly one caller per key actually invokes `loader`; all others
    /// block until it completes. A loader panic is converted into
    /// [`CacheError::LoaderPanicked`] and delivered to every waiter.
    pub(crate) fn do_call<F>(&self, key: K, loader: F) -> Result<V, CacheError<E>>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let mut calls = self.calls.lock();
        if let Some(existing) = calls.get(&key).cloned() {
            drop(calls);
            let mut state = existing.state.lock();
            while state.result.is_none() {
                existing.done.wait(&mut state);
            }
            return state.result.clone().expect("result set before notify");
        }

        let call = Arc::new(Call {
            state: Mutex::new(CallState { result: None }),
            done: Condvar::new(),
        });
        calls.insert(key.clone(), call.clone());
        drop(calls);

        let outcome = panic::catch_unwind(AssertUnwindSafe(loader));
        let result = match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(CacheError::LoaderFailed(err)),
            Err(payload) => Err(CacheError::LoaderPanicked(panic_message(&payload))),
        };

        // Remove the record before waking waiters, so a subsequent call for
        // the same key starts a fresh load instead of observing a stale one.
        self.calls.lock().remove(&key);

        let mut state = call.state.lock();
        state.result = Some(result.clone());
        call.done.notify_all();
        drop(state);

        result
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "loader panicked with a non-string payload".to_string()
    }
}
