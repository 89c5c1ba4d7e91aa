//! In-flight request de-duplication.
//!
//! The first caller for a key starts the work; callers arriving while it is
//! pending await the same shared future instead of issuing their own
//! request. The entry is dropped once the work completes, so later callers
//! start fresh (callers are expected to consult their cache first).

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Mutex;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};

use crate::lock;

type Pending<V> = Shared<BoxFuture<'static, V>>;

pub(crate) struct SingleFlight<K, V: Clone> {
    calls: Mutex<HashMap<K, Pending<V>>>,
}

impl<K, V: Clone> std::fmt::Debug for SingleFlight<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlight")
            .field("pending", &lock(&self.calls).len())
            .finish()
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    V: Clone,
{
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone + Send + Sync + 'static,
{
    /// Run `start()` for `key` unless a call for `key` is already pending.
    ///
    /// `start` is only invoked by the caller that creates the entry. The
    /// shared future keeps running as long as any caller still polls it, so
    /// a caller that goes away does not cancel the work for the others.
    pub(crate) async fn run<F, Fut>(&self, key: K, start: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let pending = {
            let mut calls = lock(&self.calls);
            if let Some(existing) = calls.get(&key) {
                log::debug!("joining in-flight request");
                existing.clone()
            } else {
                let fresh = start().boxed().shared();
                calls.insert(key.clone(), fresh.clone());
                fresh
            }
        };

        let value = pending.clone().await;

        let mut calls = lock(&self.calls);
        if calls
            .get(&key)
            .is_some_and(|current| current.ptr_eq(&pending))
        {
            calls.remove(&key);
        }
        value
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        lock(&self.calls).len()
    }
}
