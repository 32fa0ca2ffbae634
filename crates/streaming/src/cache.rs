use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use runtime::metrics::{Metrics, MetricsSnapshot};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::request::{FetchId, FetchMode};
use crate::residency::Residency;

pub type FetchResult<V> = Result<V, FetchError>;

type SharedFetch<V> = Shared<BoxFuture<'static, FetchResult<V>>>;

pub const CACHE_HITS: &str = "hits";
pub const CACHE_MISSES: &str = "misses";
pub const CACHE_REFETCHES: &str = "refetches";
pub const CACHE_ATTACHED: &str = "attached";
pub const CACHE_FAILURES: &str = "failures";
pub const CACHE_EVICTIONS: &str = "evictions";
pub const FETCH_LATENCY_MS: &str = "fetch_latency_ms";

/// Staleness and retention windows for one logical operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// A value is fresh while `now - fetched_at < stale_after`.
    pub stale_after: Duration,
    /// An idle entry is dropped once `now - last_access >= retain_for`.
    pub retain_for: Duration,
}

impl CachePolicy {
    pub const PROFILES: CachePolicy =
        CachePolicy::new(Duration::from_secs(5 * 60), Duration::from_secs(10 * 60));
    pub const MEASUREMENTS: CachePolicy =
        CachePolicy::new(Duration::from_secs(60), Duration::from_secs(5 * 60));
    pub const STATS: CachePolicy =
        CachePolicy::new(Duration::from_secs(60), Duration::from_secs(5 * 60));

    pub const fn new(stale_after: Duration, retain_for: Duration) -> Self {
        Self {
            stale_after,
            retain_for,
        }
    }
}

/// A cached value together with its freshness at read time.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<V> {
    pub value: V,
    pub fresh: bool,
}

struct Entry<V> {
    value: Option<V>,
    fetched_at: Option<Instant>,
    last_access: Instant,
    last_error: Option<FetchError>,
    in_flight: Option<(FetchId, SharedFetch<V>)>,
}

impl<V> Entry<V> {
    fn new(now: Instant) -> Self {
        Self {
            value: None,
            fetched_at: None,
            last_access: now,
            last_error: None,
            in_flight: None,
        }
    }

    fn is_fresh(&self, now: Instant, policy: CachePolicy) -> bool {
        self.fetched_at
            .is_some_and(|t| now.saturating_duration_since(t) < policy.stale_after)
    }

    fn residency(&self, now: Instant, policy: CachePolicy) -> Residency {
        match (&self.value, &self.in_flight) {
            (None, None) => Residency::Missing,
            (None, Some(_)) => Residency::Loading,
            (Some(_), Some(_)) => Residency::Refreshing,
            (Some(_), None) if self.is_fresh(now, policy) => Residency::Fresh,
            (Some(_), None) => Residency::Stale,
        }
    }
}

struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    next_fetch: u64,
    metrics: Metrics,
}

impl<K, V> Inner<K, V>
where
    K: Eq + Hash + Debug,
    V: Clone,
{
    fn sweep(&mut self, now: Instant, policy: CachePolicy) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| {
            e.in_flight.is_some()
                || now.saturating_duration_since(e.last_access) < policy.retain_for
        });
        let evicted = before - self.entries.len();
        for _ in 0..evicted {
            self.metrics.inc(CACHE_EVICTIONS);
        }
        evicted
    }

    fn complete(
        &mut self,
        name: &str,
        key: &K,
        id: FetchId,
        started: Instant,
        result: &FetchResult<V>,
    ) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(started);
        self.metrics
            .record(FETCH_LATENCY_MS, u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));

        let Some(entry) = self.entries.get_mut(key) else {
            return;
        };
        if entry.in_flight.as_ref().map(|(current, _)| *current) != Some(id) {
            return;
        }
        entry.in_flight = None;

        match result {
            Ok(value) => {
                entry.value = Some(value.clone());
                entry.fetched_at = Some(now);
                entry.last_error = None;
                debug!("{name}: fetch {} for {key:?} completed in {elapsed:?}", id.0);
            }
            Err(err) => {
                // The last good value stays in place as fallback display data.
                entry.last_error = Some(err.clone());
                self.metrics.inc(CACHE_FAILURES);
                warn!("{name}: fetch {} for {key:?} failed: {err}", id.0);
            }
        }
    }
}

/// Keyed cache of remote results with staleness, retention and request
/// de-duplication.
///
/// Invariants:
/// - At most one fetch is in flight per key. Requests arriving while one is in
///   flight attach to it and observe the same result.
/// - A failed fetch never replaces the last successful value.
/// - Idle entries past their retention window are swept on the next access;
///   entries with a fetch in flight are never swept.
///
/// Cloning is cheap and yields a handle to the same cache.
pub struct QueryCache<K, V> {
    name: &'static str,
    policy: CachePolicy,
    inner: Arc<Mutex<Inner<K, V>>>,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            policy: self.policy,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, policy: CachePolicy) -> Self {
        Self {
            name,
            policy,
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                next_fetch: 1,
                metrics: Metrics::new(),
            })),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn residency(&self, key: &K) -> Residency {
        let now = Instant::now();
        self.inner
            .lock()
            .entries
            .get(key)
            .map_or(Residency::Missing, |e| e.residency(now, self.policy))
    }

    /// Reads the retained value for `key` without fetching. Counts as an
    /// access for retention purposes.
    pub fn peek(&self, key: &K) -> Option<Cached<V>> {
        let now = Instant::now();
        let mut guard = self.inner.lock();
        let entry = guard.entries.get_mut(key)?;
        entry.last_access = now;
        let fresh = entry.is_fresh(now, self.policy);
        entry.value.clone().map(|value| Cached { value, fresh })
    }

    pub fn last_error(&self, key: &K) -> Option<FetchError> {
        self.inner.lock().entries.get(key)?.last_error.clone()
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|e| e.in_flight.is_some())
    }

    /// Marks the value for `key` stale so the next `IfStale` request fetches.
    pub fn invalidate(&self, key: &K) -> bool {
        let mut guard = self.inner.lock();
        match guard.entries.get_mut(key) {
            Some(entry) => entry.fetched_at.take().is_some(),
            None => false,
        }
    }

    /// Drops idle entries past their retention window. Returns how many.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        self.inner.lock().sweep(now, self.policy)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.lock().metrics.snapshot()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.inner.lock().metrics.counter(name)
    }

    /// Resolves `key`, calling `fetcher` only when no usable value or in-flight
    /// request exists.
    ///
    /// The returned future is independent of the caller: dropping it does not
    /// cancel the underlying fetch for other attached callers, and a later
    /// request for the same key re-attaches to it.
    ///
    /// `fetcher` runs while the cache is locked and must only construct the
    /// future, not touch this cache.
    pub fn fetch<F, Fut>(
        &self,
        key: K,
        mode: FetchMode,
        fetcher: F,
    ) -> BoxFuture<'static, FetchResult<V>>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = FetchResult<V>> + Send + 'static,
    {
        let now = Instant::now();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.sweep(now, self.policy);

        let entry = inner
            .entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(now));
        entry.last_access = now;

        if mode == FetchMode::IfStale && entry.is_fresh(now, self.policy) {
            if let Some(value) = entry.value.clone() {
                inner.metrics.inc(CACHE_HITS);
                debug!("{}: fresh hit for {key:?}", self.name);
                return future::ready(Ok(value)).boxed();
            }
        }

        if let Some((id, shared)) = &entry.in_flight {
            inner.metrics.inc(CACHE_ATTACHED);
            debug!("{}: attaching {key:?} to in-flight fetch {}", self.name, id.0);
            return shared.clone().boxed();
        }

        let id = FetchId(inner.next_fetch);
        inner.next_fetch += 1;
        inner.metrics.inc(match mode {
            FetchMode::IfStale => CACHE_MISSES,
            FetchMode::Refetch => CACHE_REFETCHES,
        });
        debug!("{}: starting fetch {} for {key:?} ({mode:?})", self.name, id.0);

        let weak = Arc::downgrade(&self.inner);
        let name = self.name;
        let request = fetcher(key.clone());
        let shared = async move {
            let result = request.await;
            if let Some(inner) = weak.upgrade() {
                inner.lock().complete(name, &key, id, now, &result);
            }
            result
        }
        .boxed()
        .shared();

        entry.in_flight = Some((id, shared.clone()));
        shared.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::{CACHE_ATTACHED, CACHE_EVICTIONS, CACHE_HITS, CachePolicy, FetchResult, QueryCache};
    use crate::error::{FetchError, FetchErrorKind};
    use crate::request::FetchMode;
    use crate::residency::Residency;
    use futures_util::future::{BoxFuture, FutureExt};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    type Loader = Box<dyn FnOnce(&'static str) -> BoxFuture<'static, FetchResult<String>>>;

    fn loader(calls: &Arc<AtomicUsize>) -> Loader {
        let calls = Arc::clone(calls);
        Box::new(move |key| {
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(format!("{key}#{n}"))
            }
            .boxed()
        })
    }

    fn failing(calls: &Arc<AtomicUsize>) -> Loader {
        let calls = Arc::clone(calls);
        Box::new(move |_| {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::new(FetchErrorKind::Status(500), "backend down"))
            }
            .boxed()
        })
    }

    fn cache() -> QueryCache<&'static str, String> {
        QueryCache::new("test", CachePolicy::PROFILES)
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_values_are_served_from_cache() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let a = cache.fetch("a", FetchMode::IfStale, loader(&calls)).await.unwrap();
        let b = cache.fetch("a", FetchMode::IfStale, loader(&calls)).await.unwrap();

        assert_eq!(a, "a#1");
        assert_eq!(b, "a#1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.counter(CACHE_HITS), 1);
        assert_eq!(cache.residency(&"a"), Residency::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_values_are_refetched() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));

        cache.fetch("a", FetchMode::IfStale, loader(&calls)).await.unwrap();
        tokio::time::advance(Duration::from_secs(5 * 60 - 1)).await;
        assert_eq!(cache.residency(&"a"), Residency::Fresh);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.residency(&"a"), Residency::Stale);
        assert_eq!(cache.peek(&"a").map(|c| c.fresh), Some(false));

        let v = cache.fetch("a", FetchMode::IfStale, loader(&calls)).await.unwrap();
        assert_eq!(v, "a#2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_requests_share_one_fetch() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache.fetch("5", FetchMode::IfStale, loader(&calls));
        assert_eq!(cache.residency(&"5"), Residency::Loading);
        let second = cache.fetch("5", FetchMode::IfStale, loader(&calls));

        let (a, b) = tokio::join!(first, second);
        assert_eq!(a, b);
        assert_eq!(a.unwrap(), "5#1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.counter(CACHE_ATTACHED), 1);
        assert!(!cache.is_in_flight(&"5"));
    }

    #[tokio::test(start_paused = true)]
    async fn different_keys_fetch_independently() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));

        let a = cache.fetch("a", FetchMode::IfStale, loader(&calls));
        let b = cache.fetch("b", FetchMode::IfStale, loader(&calls));
        // Resolve in reverse order of issue.
        assert_eq!(b.await.unwrap(), "b#1");
        assert_eq!(a.await.unwrap(), "a#2");
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refetch_bypasses_staleness_but_still_dedups() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        cache.fetch("a", FetchMode::IfStale, loader(&calls)).await.unwrap();

        let r1 = cache.fetch("a", FetchMode::Refetch, loader(&calls));
        assert_eq!(cache.residency(&"a"), Residency::Refreshing);
        let r2 = cache.fetch("a", FetchMode::Refetch, loader(&calls));
        let (r1, r2) = tokio::join!(r1, r2);

        assert_eq!(r1.unwrap(), "a#2");
        assert_eq!(r2.unwrap(), "a#2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_keep_the_last_good_value() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        cache.fetch("a", FetchMode::IfStale, loader(&calls)).await.unwrap();

        let err = cache
            .fetch("a", FetchMode::Refetch, failing(&calls))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Status(500));

        let cached = cache.peek(&"a").unwrap();
        assert_eq!(cached.value, "a#1");
        assert_eq!(cache.last_error(&"a"), Some(err));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_entries_expire_after_retention() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        cache.fetch("a", FetchMode::IfStale, loader(&calls)).await.unwrap();
        cache.fetch("b", FetchMode::IfStale, loader(&calls)).await.unwrap();

        tokio::time::advance(Duration::from_secs(9 * 60)).await;
        assert!(cache.peek(&"a").is_some());
        tokio::time::advance(Duration::from_secs(60)).await;

        assert_eq!(cache.sweep(), 1);
        assert!(cache.peek(&"a").is_some());
        assert!(cache.peek(&"b").is_none());
        assert_eq!(cache.counter(CACHE_EVICTIONS), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_entries_are_never_swept() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        let pending = cache.fetch("a", FetchMode::IfStale, loader(&calls));

        tokio::time::advance(Duration::from_secs(60 * 60)).await;
        assert_eq!(cache.sweep(), 0);
        assert_eq!(pending.await.unwrap(), "a#1");
        assert_eq!(cache.residency(&"a"), Residency::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_callers_do_not_orphan_the_fetch() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));

        drop(cache.fetch("a", FetchMode::IfStale, loader(&calls)));
        let v = cache.fetch("a", FetchMode::IfStale, loader(&calls)).await.unwrap();

        assert_eq!(v, "a#1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_next_fetch() {
        let cache = cache();
        let calls = Arc::new(AtomicUsize::new(0));
        cache.fetch("a", FetchMode::IfStale, loader(&calls)).await.unwrap();

        assert!(cache.invalidate(&"a"));
        assert_eq!(cache.residency(&"a"), Residency::Stale);
        let v = cache.fetch("a", FetchMode::IfStale, loader(&calls)).await.unwrap();
        assert_eq!(v, "a#2");
    }
}
