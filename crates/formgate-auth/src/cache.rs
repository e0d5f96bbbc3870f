//! Keyed memoization with request coalescing.
//!
//! [`CoalescingCache`] maps a key to either a pending fetch or a resolved
//! value. The first caller for a key starts the fetch; callers arriving while
//! it is in flight await the same shared future, so N concurrent first-callers
//! cause exactly one upstream request and all observe the same outcome.
//!
//! Successful values are kept until explicitly invalidated. Failures are handed
//! to every waiter of that fetch and then evicted, so the next caller starts a
//! fresh fetch.
//!
//! Each key lives in its own map slot: a slow fetch for one key never blocks
//! callers of another key.
//!
//! # Example
//!
//! ```ignore
//! use formgate_auth::CoalescingCache;
//!
//! let cache: CoalescingCache<String, String, String> = CoalescingCache::new();
//! let value = cache
//!     .get_or_fetch("key".to_string(), || async { Ok("value".to_string()) })
//!     .await?;
//! ```

use std::future::Future;
use std::hash::Hash;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::future::{BoxFuture, FutureExt, Shared};

type SharedFetch<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

enum Slot<V, E> {
    Pending(SharedFetch<V, E>),
    Ready(V),
}

/// A keyed cache whose entries are either in flight or resolved.
pub struct CoalescingCache<K, V, E> {
    entries: DashMap<K, Slot<V, E>>,
}

impl<K, V, E> Default for CoalescingCache<K, V, E>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<K, V, E> CoalescingCache<K, V, E>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, fetching it with `fetch` if absent.
    ///
    /// `fetch` is only invoked when no resolved value and no in-flight fetch
    /// exists for `key`. The returned future is driven by whichever caller
    /// polls it, so dropping one waiter does not cancel the fetch for others.
    ///
    /// # Errors
    ///
    /// Returns the error produced by the fetch this call joined.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let in_flight = match self.entries.entry(key.clone()) {
            Entry::Occupied(entry) => match entry.get() {
                Slot::Ready(value) => return Ok(value.clone()),
                Slot::Pending(shared) => shared.clone(),
            },
            Entry::Vacant(entry) => {
                let shared = fetch().boxed().shared();
                entry.insert(Slot::Pending(shared.clone()));
                shared
            }
        };

        let result = in_flight.clone().await;

        match &result {
            Ok(value) => {
                if let Some(mut slot) = self.entries.get_mut(&key) {
                    let same_fetch =
                        matches!(&*slot, Slot::Pending(pending) if pending.ptr_eq(&in_flight));
                    if same_fetch {
                        *slot = Slot::Ready(value.clone());
                    }
                }
            }
            Err(_) => {
                self.entries.remove_if(&key, |_, slot| {
                    matches!(slot, Slot::Pending(pending) if pending.ptr_eq(&in_flight))
                });
            }
        }

        result
    }

    /// Returns the resolved value for `key`, ignoring in-flight fetches.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).and_then(|slot| match &*slot {
            Slot::Ready(value) => Some(value.clone()),
            Slot::Pending(_) => None,
        })
    }

    /// Removes the entry for `key`, resolved or pending.
    ///
    /// Callers already awaiting a pending fetch still receive its result.
    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Returns the number of entries, resolved or pending.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
