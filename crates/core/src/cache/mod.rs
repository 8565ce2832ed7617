//! In-memory query cache with staleness windows and request deduplication.
//!
//! Each distinct key owns one entry holding the last good value, the time it
//! was fetched, and the request currently in flight (if any).
//!
//! - A fresh entry is served without calling the fetcher.
//! - A stale entry is served as-is while a background refetch runs.
//! - A missing entry triggers exactly one fetch, shared by every concurrent caller.
//! - A failed fetch never evicts a previously successful value.
//!
//! Every request carries a per-key generation number. A result is written back
//! only when its generation is still the latest issued for the key, so a slow
//! response can never overwrite a newer one (last-request-wins).
//!
//! Fetches are spawned on the tokio runtime and run to completion even if the
//! caller that started them is dropped. The entry map sits behind a plain mutex
//! that is never held across an await; values are swapped whole as `Arc`s.

mod slot;
pub mod state;

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::Error;
use slot::{InFlight, SharedFetch, Slot};

pub use state::{EntrySummary, QueryState, QueryStatus};

/// Capacity of the settle notification channel.
const EVENT_CAPACITY: usize = 64;

struct Inner<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
    events: broadcast::Sender<K>,
}

impl<K, V> Inner<K, V>
where
    K: Clone + Eq + Hash + Debug,
{
    fn slots(&self) -> MutexGuard<'_, HashMap<K, Slot<V>>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn settle(&self, key: &K, generation: u64, result: &Result<Arc<V>, Error>) {
        let applied = {
            let mut slots = self.slots();
            let Some(slot) = slots.get_mut(key) else {
                tracing::debug!(?key, generation, "entry removed before fetch settled; dropping result");
                return;
            };

            let had_value = slot.value.is_some();
            let latest = slot.issued;
            let applied = slot.settle(generation, result);
            if !applied {
                tracing::debug!(?key, generation, latest, "dropping superseded result");
            } else if let Err(err) = result {
                if had_value {
                    tracing::warn!(?key, generation, error = %err, "refetch failed; keeping last good value");
                } else {
                    tracing::warn!(?key, generation, error = %err, "fetch failed");
                }
            }
            applied
        };

        if applied {
            // No subscribers is fine.
            let _ = self.events.send(key.clone());
        }
    }
}

/// Query cache keyed by `K`, holding values of type `V`.
///
/// Cloning is cheap and yields a handle to the same cache.
pub struct QueryCache<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<K, V> Default for QueryCache<K, V>
where
    K: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self::with_notifier(events)
    }

    /// Create a cache that announces settled keys on an existing channel.
    ///
    /// Lets several caches over one key space share a single subscription.
    pub fn with_notifier(events: broadcast::Sender<K>) -> Self {
        Self { inner: Arc::new(Inner { slots: Mutex::new(HashMap::new()), events }) }
    }

    /// Receive the key of every entry whose state changed: a fetch settled
    /// (success or failure), or the entry was invalidated or dropped.
    pub fn subscribe(&self) -> broadcast::Receiver<K> {
        self.inner.events.subscribe()
    }

    /// Look up `key`, fetching when needed.
    ///
    /// Fresh entries are returned without calling `fetcher`. Stale entries with
    /// a value are returned immediately while a background refetch runs. When
    /// there is no value yet, this waits for the (possibly shared) request.
    pub async fn get<F, Fut>(&self, key: K, stale_after: Duration, fetcher: F) -> QueryState<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, Error>> + Send + 'static,
    {
        let mut fetcher = Some(fetcher);
        let mut delivered = None;

        loop {
            let waiting = {
                let mut slots = self.inner.slots();
                let now = Instant::now();
                let slot = match delivered.take() {
                    None => {
                        let slot = slots.entry(key.clone()).or_insert_with(|| Slot::new(stale_after));
                        slot.stale_after = stale_after;
                        slot
                    }
                    Some(result) => match slots.get_mut(&key) {
                        Some(slot) => {
                            delivered = Some(result);
                            slot
                        }
                        None => {
                            tracing::debug!(?key, "entry dropped while waiting; returning delivered result");
                            return match result {
                                Ok(value) => QueryState::detached(value),
                                Err(err) => QueryState::failed(err),
                            };
                        }
                    },
                };

                if slot.is_fresh(now) {
                    tracing::debug!(?key, "cache hit");
                    return slot.state(now);
                }

                if let Some(in_flight) = &slot.in_flight {
                    if slot.value.is_some() {
                        return slot.state(now);
                    }
                    tracing::debug!(?key, generation = in_flight.generation, "joining in-flight request");
                    in_flight.fetch.clone()
                } else if let Some(fetcher) = fetcher.take() {
                    let fetch = self.issue(slot, &key, fetcher);
                    if slot.value.is_some() {
                        tracing::debug!(?key, "serving stale value while refetching");
                        return slot.state(now);
                    }
                    fetch
                } else {
                    return Self::resolve(slot.state(now), delivered);
                }
            };

            delivered = Some(waiting.await);
        }
    }

    /// Non-blocking lookup for rendering.
    ///
    /// Starts a fetch when the entry is missing or stale and returns the current
    /// state at once. An entry whose last fetch failed is fetched again only
    /// after a short backoff; [`QueryCache::refetch`] retries at once.
    ///
    /// Must be called from within a tokio runtime.
    pub fn ensure<F, Fut>(&self, key: K, stale_after: Duration, fetcher: F) -> QueryState<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, Error>> + Send + 'static,
    {
        let mut slots = self.inner.slots();
        let now = Instant::now();
        let slot = slots.entry(key.clone()).or_insert_with(|| Slot::new(stale_after));
        slot.stale_after = stale_after;

        if slot.wants_fetch(now) {
            self.issue(slot, &key, fetcher);
        }

        slot.state(now)
    }

    /// Issue a new request for `key` regardless of freshness and wait for it.
    ///
    /// Any request already in flight for the key is superseded: it still runs,
    /// but its result is discarded.
    pub async fn refetch<F, Fut>(&self, key: K, stale_after: Duration, fetcher: F) -> QueryState<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, Error>> + Send + 'static,
    {
        let fetch = {
            let mut slots = self.inner.slots();
            let slot = slots.entry(key.clone()).or_insert_with(|| Slot::new(stale_after));
            slot.stale_after = stale_after;
            self.issue(slot, &key, fetcher)
        };

        let delivered = fetch.await;
        let now = Instant::now();
        let state = self
            .inner
            .slots()
            .get(&key)
            .map(|slot| slot.state(now))
            .unwrap_or_else(QueryState::pending);
        Self::resolve(state, Some(delivered))
    }

    /// Current state of `key` without triggering any fetch.
    pub fn state(&self, key: &K) -> Option<QueryState<V>> {
        let now = Instant::now();
        self.inner.slots().get(key).map(|slot| slot.state(now))
    }

    /// Wait until no request is in flight for `key`, then return its state.
    ///
    /// Returns `None` if the entry does not exist (or was dropped meanwhile).
    pub async fn settled(&self, key: &K) -> Option<QueryState<V>> {
        let mut events = self.subscribe();
        loop {
            let state = self.state(key)?;
            if !state.is_fetching {
                return Some(state);
            }
            match events.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return Some(state),
            }
        }
    }

    /// Mark `key` stale and supersede any request in flight for it.
    ///
    /// The last good value stays visible until the next fetch settles.
    /// Returns `false` if there was no entry.
    pub fn invalidate(&self, key: &K) -> bool {
        {
            let mut slots = self.inner.slots();
            let Some(slot) = slots.get_mut(key) else {
                return false;
            };

            if slot.value.is_none() {
                slots.remove(key);
            } else {
                slot.invalidated = true;
                slot.issued += 1;
                slot.in_flight = None;
                slot.forget_failure();
            }
        }
        tracing::debug!(?key, "invalidated");
        let _ = self.inner.events.send(key.clone());
        true
    }

    /// Drop the entry for `key`. Requests still in flight for it are discarded on arrival.
    pub fn remove(&self, key: &K) -> bool {
        let removed = self.inner.slots().remove(key).is_some();
        if removed {
            let _ = self.inner.events.send(key.clone());
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let removed: Vec<K> = {
            let mut slots = self.inner.slots();
            tracing::debug!(entries = slots.len(), "clearing query cache");
            slots.drain().map(|(key, _)| key).collect()
        };
        for key in removed {
            let _ = self.inner.events.send(key);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<EntrySummary<K>> {
        let now = Instant::now();
        self.inner
            .slots()
            .iter()
            .map(|(key, slot)| slot.summary(key.clone(), now))
            .collect()
    }

    /// Start a new request generation for `slot` and spawn it.
    fn issue<F, Fut>(&self, slot: &mut Slot<V>, key: &K, fetcher: F) -> SharedFetch<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, Error>> + Send + 'static,
    {
        slot.issued += 1;
        let generation = slot.issued;
        if slot.value.is_none() {
            slot.status = QueryStatus::Pending;
            slot.error = None;
        }

        let weak: Weak<Inner<K, V>> = Arc::downgrade(&self.inner);
        let owned_key = key.clone();
        let request = fetcher();
        let fetch = async move {
            let result = request.await.map(Arc::new);
            if let Some(inner) = weak.upgrade() {
                inner.settle(&owned_key, generation, &result);
            }
            result
        }
        .boxed()
        .shared();

        tracing::debug!(?key, generation, "issuing request");
        tokio::spawn(fetch.clone());
        slot.in_flight = Some(InFlight { generation, fetch: fetch.clone() });
        fetch
    }

    /// Prefer what the cache holds; fall back to the result this caller waited for.
    fn resolve(state: QueryState<V>, delivered: Option<Result<Arc<V>, Error>>) -> QueryState<V> {
        if state.value.is_some() || state.is_fetching {
            return state;
        }
        match delivered {
            Some(Ok(value)) => QueryState::detached(value),
            Some(Err(err)) if state.error.is_none() => QueryState::failed(err),
            _ => state,
        }
    }
}
