//! Cache and invalidation coordinator
//!
//! [`QueryClient`] owns every cached query result of one application
//! context. It provides:
//!
//! - keyed caching of type-erased values in a `moka` cache, downcast on read
//! - de-duplication: concurrent fetches of one key share a single in-flight
//!   future, so the fetcher runs once
//! - prefix invalidation with per-key generations; results of a fetch that
//!   was invalidated mid-flight reach their waiters but are never cached
//! - per-key status channels for observers, dropped once a key has no
//!   subscriber, no fetch in flight and no cached value
//!
//! A client is cheap to clone; clones share state.

use crate::error::QueryError;
use crate::key::QueryKey;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use moka::future::Cache;
use moka::notification::RemovalCause;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

type Erased = Arc<dyn Any + Send + Sync>;
type Flight = Shared<BoxFuture<'static, Result<Erased, QueryError>>>;

/// Lifecycle of one key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// Never fetched, or invalidated with no fetch running yet
    #[default]
    Idle,
    /// A fetch is running
    Loading,
    /// The last fetch succeeded
    Success,
    /// The last fetch failed
    Error,
}

/// Published state of one key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyState {
    /// Bumped by every invalidation
    pub generation: u64,
    /// Current status
    pub status: QueryStatus,
}

/// Cache sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached keys
    pub max_capacity: u64,
    /// Drop cached values after this many seconds; `None` keeps them until
    /// invalidated
    pub stale_after_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 1_000,
            stale_after_secs: None,
        }
    }
}

/// Counters for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads answered from the cache
    pub hits: u64,
    /// Reads that started a fetch
    pub misses: u64,
    /// Reads that joined a fetch already in flight
    pub deduplicated: u64,
    /// Keys invalidated
    pub invalidations: u64,
    /// Approximate number of cached values
    pub entry_count: u64,
    /// Keys with a live status channel
    pub tracked_keys: u64,
}

#[derive(Clone)]
struct Cached {
    generation: u64,
    value: Erased,
}

struct InFlight {
    generation: u64,
    flight: Flight,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    deduplicated: AtomicU64,
    invalidations: AtomicU64,
}

type Slots = DashMap<QueryKey, Arc<watch::Sender<KeyState>>>;

struct Inner {
    cache: Cache<QueryKey, Cached>,
    slots: Arc<Slots>,
    in_flight: Arc<DashMap<QueryKey, InFlight>>,
    // Generations come from one counter so a recreated slot never reuses
    // the generation of a fetch started under its predecessor.
    generations: AtomicU64,
    counters: Counters,
}

impl Inner {
    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Forget `key` unless something still depends on its slot
    fn prune(&self, key: &QueryKey) {
        if self.in_flight.contains_key(key) || self.cache.contains_key(key) {
            return;
        }
        if self
            .slots
            .remove_if(key, |_, slot| slot.receiver_count() == 0)
            .is_some()
        {
            tracing::trace!(%key, "dropped idle key");
        }
    }
}

/// Shared query cache of one application context
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("keys", &self.inner.slots.len())
            .field("in_flight", &self.inner.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl QueryClient {
    /// Create a client
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let slots: Arc<Slots> = Arc::new(DashMap::new());
        let in_flight: Arc<DashMap<QueryKey, InFlight>> = Arc::new(DashMap::new());

        let evicted_slots = slots.clone();
        let evicted_flights = in_flight.clone();
        let mut builder = Cache::builder()
            .max_capacity(config.max_capacity)
            .eviction_listener(move |key: Arc<QueryKey>, value: Cached, cause: RemovalCause| {
                if !cause.was_evicted() || evicted_flights.contains_key(&*key) {
                    return;
                }
                evicted_slots.remove_if(&*key, |_, slot| {
                    slot.receiver_count() == 0 && slot.borrow().generation == value.generation
                });
            });
        if let Some(secs) = config.stale_after_secs {
            builder = builder.time_to_live(Duration::from_secs(secs));
        }
        Self {
            inner: Arc::new(Inner {
                cache: builder.build(),
                slots,
                in_flight,
                generations: AtomicU64::new(0),
                counters: Counters::default(),
            }),
        }
    }

    fn slot(&self, key: &QueryKey) -> Arc<watch::Sender<KeyState>> {
        self.inner
            .slots
            .entry(key.clone())
            .or_insert_with(|| self.new_slot())
            .clone()
    }

    fn new_slot(&self) -> Arc<watch::Sender<KeyState>> {
        let state = KeyState {
            generation: self.inner.next_generation(),
            status: QueryStatus::Idle,
        };
        Arc::new(watch::channel(state).0)
    }

    /// Subscribe to the state of `key`
    #[must_use]
    pub fn subscribe(&self, key: &QueryKey) -> watch::Receiver<KeyState> {
        // Subscribe under the map guard so a concurrent prune cannot drop
        // the slot between lookup and subscription.
        self.inner
            .slots
            .entry(key.clone())
            .or_insert_with(|| self.new_slot())
            .subscribe()
    }

    /// Current status of `key`
    #[must_use]
    pub fn status(&self, key: &QueryKey) -> QueryStatus {
        self.inner
            .slots
            .get(key)
            .map_or(QueryStatus::Idle, |slot| slot.borrow().status)
    }

    /// Read `key`, running `fetcher` on a miss
    ///
    /// Concurrent calls for the same key while a fetch is in flight join
    /// that fetch instead of calling their own fetcher.
    ///
    /// # Errors
    /// The fetcher's error wrapped in [`QueryError::Failed`], or
    /// [`QueryError::TypeMismatch`] if the key caches another type
    pub async fn fetch<T, E, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<T, QueryError>
    where
        T: Clone + Send + Sync + 'static,
        E: StdError + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let slot = self.slot(key);
        let generation = slot.borrow().generation;

        if let Some(hit) = self.inner.cache.get(key).await {
            if hit.generation == generation {
                self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(%key, "cache hit");
                return downcast(key, &hit.value);
            }
        }

        let flight = self.join_or_start(key, generation, &slot, fetcher);
        let value = flight.await?;
        downcast(key, &value)
    }

    fn join_or_start<T, E, F, Fut>(
        &self,
        key: &QueryKey,
        generation: u64,
        slot: &Arc<watch::Sender<KeyState>>,
        fetcher: F,
    ) -> Flight
    where
        T: Send + Sync + 'static,
        E: StdError + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let entry = self.inner.in_flight.entry(key.clone());
        if let Entry::Occupied(running) = &entry {
            if running.get().generation == generation {
                self.inner.counters.deduplicated.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(%key, "joined in-flight fetch");
                return running.get().flight.clone();
            }
        }

        self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%key, generation, "fetch started");

        let fetch = fetcher();
        let flight = settle(
            self.inner.clone(),
            key.clone(),
            generation,
            slot.clone(),
            async move {
                fetch
                    .await
                    .map(|value| Arc::new(value) as Erased)
                    .map_err(QueryError::failed)
            },
        )
        .boxed()
        .shared();

        entry.insert(InFlight {
            generation,
            flight: flight.clone(),
        });
        slot.send_if_modified(|state| {
            let current = state.generation == generation;
            if current {
                state.status = QueryStatus::Loading;
            }
            current
        });
        flight
    }

    /// Invalidate every key starting with `prefix`
    ///
    /// Returns the number of keys invalidated. Observers of those keys
    /// refetch.
    pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
        let matched: Vec<_> = self
            .inner
            .slots
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        for (key, slot) in &matched {
            let generation = self.inner.next_generation();
            slot.send_modify(|state| {
                state.generation = generation;
                state.status = QueryStatus::Idle;
            });
            self.inner.in_flight.remove(key);
            self.inner.cache.invalidate(key).await;
            self.inner.prune(key);
        }

        let count = matched.len();
        self.inner
            .counters
            .invalidations
            .fetch_add(count as u64, Ordering::Relaxed);
        tracing::debug!(%prefix, count, "invalidated");
        count
    }

    /// Invalidate exactly `key`, leaving keys it prefixes alone
    pub async fn invalidate_exact(&self, key: &QueryKey) -> bool {
        let Some(slot) = self.inner.slots.get(key).map(|s| s.value().clone()) else {
            return false;
        };
        let generation = self.inner.next_generation();
        slot.send_modify(|state| {
            state.generation = generation;
            state.status = QueryStatus::Idle;
        });
        self.inner.in_flight.remove(key);
        self.inner.cache.invalidate(key).await;
        self.inner.prune(key);
        self.inner
            .counters
            .invalidations
            .fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%key, "invalidated");
        true
    }

    /// Drop every entry and subscription
    ///
    /// Observers stop once their key's channel closes. Fetches still in
    /// flight complete for their waiters but are not cached.
    pub fn clear(&self) {
        for slot in self.inner.slots.iter() {
            let generation = self.inner.next_generation();
            slot.value().send_modify(|state| {
                state.generation = generation;
                state.status = QueryStatus::Idle;
            });
        }
        self.inner.slots.clear();
        self.inner.in_flight.clear();
        self.inner.cache.invalidate_all();
        tracing::debug!("query client cleared");
    }

    /// Snapshot of the counters
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let counters = &self.inner.counters;
        CacheStats {
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            deduplicated: counters.deduplicated.load(Ordering::Relaxed),
            invalidations: counters.invalidations.load(Ordering::Relaxed),
            entry_count: self.inner.cache.entry_count(),
            tracked_keys: self.inner.slots.len() as u64,
        }
    }
}

/// Run one fetch and publish its outcome if the key was not invalidated
async fn settle(
    inner: Arc<Inner>,
    key: QueryKey,
    generation: u64,
    slot: Arc<watch::Sender<KeyState>>,
    fetch: impl Future<Output = Result<Erased, QueryError>>,
) -> Result<Erased, QueryError> {
    let result = fetch.await;

    let current = slot.borrow().generation == generation;
    let cached = current && result.is_ok();
    if current {
        if let Ok(value) = &result {
            inner
                .cache
                .insert(
                    key.clone(),
                    Cached {
                        generation,
                        value: value.clone(),
                    },
                )
                .await;
        }
        let status = if result.is_ok() {
            QueryStatus::Success
        } else {
            QueryStatus::Error
        };
        slot.send_if_modified(|state| {
            let unchanged = state.generation == generation;
            if unchanged {
                state.status = status;
            }
            unchanged
        });
        tracing::debug!(%key, ?status, "fetch settled");
    } else {
        tracing::debug!(%key, "discarding result of invalidated fetch");
    }

    inner
        .in_flight
        .remove_if(&key, |_, running| running.generation == generation);
    if !cached {
        inner.prune(&key);
    }
    result
}

fn downcast<T: Clone + 'static>(key: &QueryKey, value: &Erased) -> Result<T, QueryError> {
    value
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| QueryError::TypeMismatch { key: key.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    #[derive(Debug, thiserror::Error)]
    #[error("backend down")]
    struct Down;

    fn counted(
        calls: &Arc<AtomicUsize>,
        value: Vec<u32>,
    ) -> impl FnOnce() -> futures::future::Ready<Result<Vec<u32>, Down>> {
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(Ok(value))
        }
    }

    #[tokio::test]
    async fn second_read_is_a_hit() {
        let client = QueryClient::default();
        let key = QueryKey::new("staff").with("s1");
        let calls = Arc::new(AtomicUsize::new(0));

        let first: Vec<u32> = client.fetch(&key, counted(&calls, vec![1])).await.unwrap();
        let second: Vec<u32> = client.fetch(&key, counted(&calls, vec![2])).await.unwrap();

        assert_eq!(first, vec![1]);
        assert_eq!(second, vec![1]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.status(&key), QueryStatus::Success);
        let stats = client.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn concurrent_reads_share_one_fetch() {
        let client = QueryClient::default();
        let key = QueryKey::new("offDays").with("s1");
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel::<()>();

        let slow = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    let _ = rx.await;
                    Ok::<_, Down>(vec![7_u32])
                }
            }
        };

        let first = client.fetch(&key, slow);
        let second = client.fetch(&key, counted(&calls, vec![0]));
        let release = async {
            tokio::task::yield_now().await;
            tx.send(()).unwrap();
        };
        let (a, b, ()) = tokio::join!(first, second, release);

        assert_eq!(a.unwrap(), vec![7]);
        assert_eq!(b.unwrap(), vec![7]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.stats().deduplicated, 1);
    }

    #[tokio::test]
    async fn invalidation_forces_a_new_fetch() {
        let client = QueryClient::default();
        let key = QueryKey::new("offDays").with("s1");
        let other = QueryKey::new("staff").with("s1");
        let calls = Arc::new(AtomicUsize::new(0));

        let _: Vec<u32> = client.fetch(&key, counted(&calls, vec![1])).await.unwrap();
        let _: Vec<u32> = client.fetch(&other, counted(&calls, vec![1])).await.unwrap();

        assert_eq!(client.invalidate(&QueryKey::new("offDays")).await, 1);
        assert_eq!(client.status(&key), QueryStatus::Idle);
        assert_eq!(client.status(&other), QueryStatus::Success);

        let fresh: Vec<u32> = client.fetch(&key, counted(&calls, vec![2])).await.unwrap();
        assert_eq!(fresh, vec![2]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn result_invalidated_mid_flight_is_not_cached() {
        let client = QueryClient::default();
        let key = QueryKey::new("announcements");
        let (tx, rx) = oneshot::channel::<()>();

        let pending = {
            let client = client.clone();
            let key = key.clone();
            tokio::spawn(async move {
                client
                    .fetch(&key, move || async move {
                        let _ = rx.await;
                        Ok::<_, Down>(vec![1_u32])
                    })
                    .await
            })
        };
        while client.status(&key) != QueryStatus::Loading {
            tokio::task::yield_now().await;
        }

        client.invalidate(&key).await;
        tx.send(()).unwrap();
        assert_eq!(pending.await.unwrap().unwrap(), vec![1]);

        let calls = Arc::new(AtomicUsize::new(0));
        let fresh: Vec<u32> = client.fetch(&key, counted(&calls, vec![2])).await.unwrap();
        assert_eq!(fresh, vec![2]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let client = QueryClient::default();
        let key = QueryKey::new("payroll");

        let err = client
            .fetch(&key, || futures::future::ready(Err::<Vec<u32>, _>(Down)))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "backend down");
        assert!(err.downcast_ref::<Down>().is_some());
        assert_eq!(client.status(&key), QueryStatus::Error);

        let calls = Arc::new(AtomicUsize::new(0));
        let _: Vec<u32> = client.fetch(&key, counted(&calls, vec![1])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn type_mismatch_is_reported() {
        let client = QueryClient::default();
        let key = QueryKey::new("inventory");
        let calls = Arc::new(AtomicUsize::new(0));
        let _: Vec<u32> = client.fetch(&key, counted(&calls, vec![1])).await.unwrap();

        let err = client
            .fetch(&key, || futures::future::ready(Ok::<_, Down>(String::new())))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::TypeMismatch { .. }));
    }

    #[tokio::test]
    async fn invalidated_keys_without_subscribers_are_forgotten() {
        let client = QueryClient::new(CacheConfig {
            max_capacity: 10,
            stale_after_secs: None,
        });
        let calls = Arc::new(AtomicUsize::new(0));
        for year in 0..500 {
            let key = QueryKey::new("payroll").with("u1").with(year);
            let _: Vec<u32> = client.fetch(&key, counted(&calls, vec![1])).await.unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 500);

        client.invalidate(&QueryKey::new("payroll")).await;
        assert_eq!(client.stats().tracked_keys, 0);
        assert_eq!(format!("{client:?}"), "QueryClient { keys: 0, in_flight: 0, .. }");
    }

    #[tokio::test]
    async fn failed_fetch_without_subscribers_leaves_no_key() {
        let client = QueryClient::default();
        let key = QueryKey::new("closures").with("s1");

        let _ = client
            .fetch(&key, || futures::future::ready(Err::<Vec<u32>, _>(Down)))
            .await;
        assert_eq!(client.stats().tracked_keys, 0);
    }

    #[tokio::test]
    async fn subscribed_keys_survive_invalidation_until_released() {
        let client = QueryClient::default();
        let key = QueryKey::new("staff").with("s1");
        let calls = Arc::new(AtomicUsize::new(0));
        let mut state = client.subscribe(&key);
        let _: Vec<u32> = client.fetch(&key, counted(&calls, vec![1])).await.unwrap();
        let before = state.borrow_and_update().generation;

        client.invalidate(&key).await;
        assert_eq!(client.stats().tracked_keys, 1);
        assert!(state.has_changed().unwrap());
        assert_ne!(state.borrow_and_update().generation, before);

        drop(state);
        client.invalidate(&key).await;
        assert_eq!(client.stats().tracked_keys, 0);
    }

    #[tokio::test]
    async fn recreated_key_does_not_reuse_a_generation() {
        let client = QueryClient::default();
        let key = QueryKey::new("inventory").with("s1");

        let first = client.subscribe(&key).borrow().generation;
        client.invalidate(&key).await;
        let second = client.subscribe(&key).borrow().generation;
        assert!(second > first);
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let client = QueryClient::default();
        let key = QueryKey::new("notifications").with("u1");
        let calls = Arc::new(AtomicUsize::new(0));
        let _: Vec<u32> = client.fetch(&key, counted(&calls, vec![1])).await.unwrap();
        let mut state = client.subscribe(&key);

        client.clear();
        assert_eq!(client.status(&key), QueryStatus::Idle);
        // The slot is gone, so the channel reports closure once drained
        state.borrow_and_update();
        assert!(state.changed().await.is_err());

        let _: Vec<u32> = client.fetch(&key, counted(&calls, vec![1])).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
