//! Refreshable single-entry cache with TTL and single-flight refresh
//!
//! A provider owns exactly one [`RefreshableCache`]. Lookups return the held
//! value while it is fresh. Once it is stale the first caller starts a fetch
//! on a background task and every other caller joins that same fetch, so at
//! most one fetch is in flight and all waiters see the same outcome.

use crate::action::ActionRegistry;
use crate::error::{ActionError, BoxError, Result};
use crate::provider::types::{CacheStats, CacheStatus, DapValue};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

type FetchFn =
    Arc<dyn Fn() -> BoxFuture<'static, std::result::Result<DapValue, BoxError>> + Send + Sync>;

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<DapValue>>>>;

/// Cache holding the actions of one dynamic action provider
#[derive(Clone)]
pub struct RefreshableCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    /// Provider name, used in logs and errors
    provider: String,

    /// Negative means always stale
    ttl_millis: i64,

    fetch: FetchFn,

    /// Registry the fetched actions are published into
    registry: Weak<ActionRegistry>,

    /// Never held across an await point
    state: Mutex<CacheState>,
}

#[derive(Default)]
struct CacheState {
    value: Option<Arc<DapValue>>,
    expires_at: Option<Instant>,
    fetched_at: Option<DateTime<Utc>>,
    in_flight: Option<SharedFetch>,
    stats: CacheStats,
}

impl CacheState {
    fn is_stale(&self, ttl_millis: i64, now: Instant) -> bool {
        match (&self.value, self.expires_at) {
            (Some(_), Some(expires_at)) => ttl_millis < 0 || now > expires_at,
            _ => true,
        }
    }

    fn fresh_value(&self, ttl_millis: i64, now: Instant) -> Option<Arc<DapValue>> {
        if self.is_stale(ttl_millis, now) {
            None
        } else {
            self.value.clone()
        }
    }
}

impl RefreshableCache {
    /// Create an empty cache
    ///
    /// `ttl_millis` is used as given; callers resolve the default beforehand.
    pub fn new<F, Fut, E>(
        provider: impl Into<String>,
        registry: Weak<ActionRegistry>,
        ttl_millis: i64,
        fetch: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<DapValue, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let fetch: FetchFn = Arc::new(move || {
            let fut = fetch();
            async move { fut.await.map_err(Into::into) }.boxed()
        });

        Self {
            inner: Arc::new(CacheInner {
                provider: provider.into(),
                ttl_millis,
                fetch,
                registry,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    /// Return the current value, fetching a fresh one when stale
    ///
    /// Does not suspend on a cache hit.
    pub async fn get_or_fetch(&self) -> Result<Arc<DapValue>> {
        let fetch = {
            let mut state = self.inner.lock_state();

            if let Some(value) = state.fresh_value(self.inner.ttl_millis, Instant::now()) {
                state.stats.hits += 1;
                return Ok(value);
            }

            state.stats.misses += 1;
            match &state.in_flight {
                Some(fetch) => {
                    debug!("Joining in-flight fetch for provider '{}'", self.inner.provider);
                    let fetch = fetch.clone();
                    state.stats.joined += 1;
                    fetch
                }
                None => {
                    let fetch = CacheInner::spawn_refresh(self.inner.clone());
                    state.in_flight = Some(fetch.clone());
                    state.stats.fetches += 1;
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Drop the held value so the next lookup refetches
    ///
    /// The expiry is left alone and an in-flight fetch is not cancelled.
    pub fn invalidate(&self) {
        let mut state = self.inner.lock_state();
        state.value = None;
        state.stats.invalidations += 1;
        debug!("Invalidated cache of provider '{}'", self.inner.provider);
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.inner.lock_state().stats.clone()
    }

    /// Snapshot of the cache state
    pub fn status(&self) -> CacheStatus {
        let ttl_millis = self.inner.ttl_millis;
        let state = self.inner.lock_state();
        let expires_at = match (&state.value, state.fetched_at) {
            (Some(_), Some(fetched_at)) => {
                Some(fetched_at + chrono::Duration::milliseconds(ttl_millis.max(0)))
            }
            _ => None,
        };

        CacheStatus {
            has_value: state.value.is_some(),
            is_stale: state.is_stale(ttl_millis, Instant::now()),
            fetch_in_flight: state.in_flight.is_some(),
            action_count: state.value.as_ref().map(|v| v.len()).unwrap_or(0),
            ttl_millis,
            last_fetched_at: state.fetched_at,
            expires_at,
        }
    }

    pub fn ttl_millis(&self) -> i64 {
        self.inner.ttl_millis
    }
}

impl CacheInner {
    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a refresh on a background task and wrap it for sharing
    fn spawn_refresh(inner: Arc<CacheInner>) -> SharedFetch {
        let attempt = Uuid::new_v4();
        let provider = inner.provider.clone();
        let span = info_span!("dap_refresh", provider = %provider, %attempt);

        let handle = tokio::spawn(async move { inner.refresh().await }.instrument(span));

        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => Err(ActionError::RefreshAborted {
                    provider,
                    reason: e.to_string(),
                }),
            }
        }
        .boxed()
        .shared()
    }

    async fn refresh(&self) -> Result<Arc<DapValue>> {
        let _reset = InFlightReset(self);
        debug!("Fetching dynamic actions");

        match (self.fetch)().await {
            Ok(value) => {
                let value = Arc::new(value);
                {
                    let mut state = self.lock_state();
                    state.value = Some(value.clone());
                    state.expires_at = Some(Instant::now() + ttl_duration(self.ttl_millis));
                    state.fetched_at = Some(Utc::now());
                }

                self.publish(&value).await;
                info!("Fetched {} dynamic actions", value.len());
                Ok(value)
            }
            Err(e) => {
                let error = ActionError::fetch(&self.provider, e);
                error!("Error fetching dynamic action provider value: {}", error);

                let mut state = self.lock_state();
                state.value = None;
                state.stats.fetch_failures += 1;
                Err(error)
            }
        }
    }

    /// Register every fetched action with the owning registry
    async fn publish(&self, value: &DapValue) {
        match self.registry.upgrade() {
            Some(registry) => {
                let count = registry.register_actions(value.iter()).await;
                debug!("Published {} dynamic actions to the registry", count);
            }
            None => {
                warn!(
                    "Registry of provider '{}' was dropped, fetched actions not published",
                    self.provider
                );
            }
        }
    }
}

/// Clears the in-flight slot when a refresh ends, including by panic
struct InFlightReset<'a>(&'a CacheInner);

impl Drop for InFlightReset<'_> {
    fn drop(&mut self) {
        self.0.lock_state().in_flight = None;
    }
}

fn ttl_duration(ttl_millis: i64) -> Duration {
    Duration::from_millis(ttl_millis.max(0) as u64)
}

impl fmt::Debug for RefreshableCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshableCache")
            .field("provider", &self.inner.provider)
            .field("ttl_millis", &self.inner.ttl_millis)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, ActionDescriptor, ActionType};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tool(name: &str) -> Arc<Action> {
        Arc::new(Action::new(ActionDescriptor::new(ActionType::Tool, name), |_| async {
            Ok(Value::Null)
        }))
    }

    fn counting_cache(ttl_millis: i64) -> (RefreshableCache, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let cache = RefreshableCache::new("test", Weak::new(), ttl_millis, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, BoxError>(DapValue::new().with_actions(ActionType::Tool, vec![tool("x"), tool("y")])) }
        });
        (cache, calls)
    }

    #[tokio::test]
    async fn test_returns_cached_value_within_ttl() {
        let (cache, calls) = counting_cache(60_000);

        let first = cache.get_or_fetch().await.unwrap();
        let second = cache.get_or_fetch().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.fetches, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiration() {
        let (cache, calls) = counting_cache(100);

        cache.get_or_fetch().await.unwrap();
        tokio::time::advance(Duration::from_millis(50)).await;
        assert_eq!(cache.get_or_fetch().await.unwrap().len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_millis(100)).await;
        cache.get_or_fetch().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_negative_ttl_always_refetches() {
        let (cache, calls) = counting_cache(-1);

        for _ in 0..3 {
            cache.get_or_fetch().await.unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(cache.status().is_stale);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let (cache, calls) = counting_cache(60_000);

        cache.get_or_fetch().await.unwrap();
        cache.invalidate();
        assert!(!cache.status().has_value);

        cache.get_or_fetch().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let cache = RefreshableCache::new("slow", Weak::new(), 60_000, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, BoxError>(DapValue::new().with_actions(ActionType::Tool, vec![tool("x")]))
            }
        });

        let results =
            futures::future::join_all((0..8).map(|_| cache.get_or_fetch())).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let first = results[0].as_ref().unwrap();
        for result in &results {
            assert!(Arc::ptr_eq(first, result.as_ref().unwrap()));
        }

        let stats = cache.stats();
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.joined, 7);
        assert!(!cache.status().fetch_in_flight);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_shared_and_next_call_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let cache = RefreshableCache::new("flaky", Weak::new(), 60_000, move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                if attempt == 0 {
                    Err::<DapValue, BoxError>("upstream unavailable".into())
                } else {
                    Ok(DapValue::new().with_actions(ActionType::Tool, vec![tool("x")]))
                }
            }
        });

        let results =
            futures::future::join_all((0..4).map(|_| cache.get_or_fetch())).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let sources: Vec<_> = results
            .into_iter()
            .map(|r| match r.unwrap_err() {
                ActionError::FetchError { source, .. } => source,
                other => panic!("unexpected error: {other}"),
            })
            .collect();
        for source in &sources {
            assert!(Arc::ptr_eq(&sources[0], source));
        }

        assert!(!cache.status().has_value);
        assert_eq!(cache.stats().fetch_failures, 1);

        let value = cache.get_or_fetch().await.unwrap();
        assert_eq!(value.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    fn slow_cache(delay: Duration) -> (RefreshableCache, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let cache = RefreshableCache::new("slow", Weak::new(), 60_000, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(delay).await;
                Ok::<_, BoxError>(DapValue::new().with_actions(ActionType::Tool, vec![tool("x")]))
            }
        });
        (cache, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_completes_after_caller_gives_up() {
        let (cache, calls) = slow_cache(Duration::from_millis(100));

        let timed_out = tokio::time::timeout(Duration::from_millis(10), cache.get_or_fetch()).await;
        assert!(timed_out.is_err());
        assert!(cache.status().fetch_in_flight);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let status = cache.status();
        assert!(status.has_value);
        assert!(!status.fetch_in_flight);

        assert_eq!(cache.get_or_fetch().await.unwrap().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_leaves_in_flight_fetch_running() {
        let (cache, calls) = slow_cache(Duration::from_millis(100));

        let waiter = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get_or_fetch().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(cache.status().fetch_in_flight);

        cache.invalidate();
        assert!(cache.status().fetch_in_flight);

        let value = waiter.await.unwrap().unwrap();
        assert_eq!(value.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[tokio::test]
    async fn test_panicking_fetch_clears_in_flight() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let cache = RefreshableCache::new("panicky", Weak::new(), 60_000, move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    panic!("fetch blew up");
                }
                Ok::<_, BoxError>(DapValue::new())
            }
        });

        let err = cache.get_or_fetch().await.unwrap_err();
        assert!(matches!(err, ActionError::RefreshAborted { .. }));
        assert!(!cache.status().fetch_in_flight);

        assert!(cache.get_or_fetch().await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_publishes_into_registry() {
        let registry = ActionRegistry::new();
        let cache = RefreshableCache::new("pub", Arc::downgrade(&registry), 60_000, || async {
            Ok::<_, BoxError>(DapValue::new().with_actions(ActionType::Tool, vec![tool("published")]))
        });

        assert!(registry.lookup_action(ActionType::Tool, "published").await.is_none());
        cache.get_or_fetch().await.unwrap();
        assert!(registry.lookup_action(ActionType::Tool, "published").await.is_some());
    }

    #[tokio::test]
    async fn test_status_after_fetch() {
        let (cache, _) = counting_cache(1_000);
        let before = cache.status();
        assert!(before.is_stale);
        assert!(before.expires_at.is_none());

        cache.get_or_fetch().await.unwrap();
        let after = cache.status();
        assert!(after.has_value);
        assert!(!after.is_stale);
        assert_eq!(after.action_count, 2);
        assert_eq!(
            after.expires_at.unwrap() - after.last_fetched_at.unwrap(),
            chrono::Duration::milliseconds(1_000)
        );
    }
}
