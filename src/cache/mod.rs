//! Query cache
//!
//! In-memory, key-addressed cache of fetched resource collections and
//! records, shared by every view. It deduplicates concurrent fetches for the
//! same key (at most one request in flight per key), serves cached data
//! within a per-resource TTL, and supports invalidation by resource type.
//!
//! # Architecture
//!
//! - [`key`] - Query keys (resource type + sorted filter parameters)
//! - [`entry`] - Per-key state machine and cache sources
//!
//! All state lives behind a mutex that is only held between await points;
//! asynchronous continuations interleave but never observe partial writes.
//! The cache handle is cheap to clone and passed explicitly (no global
//! singleton).

pub mod entry;
pub mod key;

pub use entry::{CacheEntry, CacheSource, CachedValue, QueryOutcome, QueryState};
pub use key::QueryKey;

use crate::api::error::{format_api_error, ApiError};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Shared handle on one in-flight fetch; late subscribers join it instead of
/// issuing a second request.
type FetchFuture = Shared<BoxFuture<'static, Result<CachedValue, Arc<ApiError>>>>;

/// Snapshot of every entry for one resource type, captured before an
/// optimistic mutation so a failure can restore the exact prior state.
#[derive(Debug)]
pub struct ResourceSnapshot {
    resource: String,
    entries: Vec<(QueryKey, CacheEntry)>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<QueryKey, CacheEntry>,
    inflight: HashMap<QueryKey, FetchFuture>,
}

/// Cheap-to-clone cache handle.
#[derive(Clone, Default)]
pub struct QueryCache {
    inner: Arc<Mutex<Inner>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Poisoning only matters if a holder panicked; the state is still
        // coherent because the lock is never held across await points.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current entry snapshot for a key (Idle if never fetched).
    pub fn get(&self, key: &QueryKey) -> CacheEntry {
        self.lock().entries.get(key).cloned().unwrap_or_default()
    }

    /// Serve `key` from cache when fresh, otherwise fetch via `loader`.
    ///
    /// Concurrent callers with the same key share one in-flight request. On
    /// failure the previous successful payload, if any, is served with
    /// [`CacheSource::Offline`] and the error is recorded on the entry.
    pub async fn ensure_fetched<F, Fut>(
        &self,
        key: &QueryKey,
        ttl: Duration,
        loader: F,
    ) -> Result<QueryOutcome, Arc<ApiError>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedValue, ApiError>> + Send + 'static,
    {
        let fut = {
            let mut guard = self.lock();
            let inner = &mut *guard;

            if let Some(entry) = inner.entries.get(key) {
                if entry.is_fresh(ttl) {
                    if let QueryState::Success { data, fetched_at } = &entry.state {
                        tracing::trace!("cache hit: {}", key);
                        return Ok(QueryOutcome {
                            data: data.clone(),
                            source: CacheSource::CacheFresh,
                            fetched_at: *fetched_at,
                        });
                    }
                }
            }

            if let Some(existing) = inner.inflight.get(key) {
                tracing::trace!("joining in-flight fetch: {}", key);
                existing.clone()
            } else {
                tracing::debug!("fetching: {}", key);
                let entry = inner.entries.entry(key.clone()).or_default();
                entry.state = QueryState::Loading {
                    prior: entry.state.carry_prior(),
                };
                let fut: FetchFuture = loader().map(|r| r.map_err(Arc::new)).boxed().shared();
                inner.inflight.insert(key.clone(), fut.clone());
                fut
            }
        };

        let result = fut.await;
        self.commit(key, result)
    }

    /// Record a completed fetch. Called by every subscriber of the shared
    /// future; writes are idempotent.
    fn commit(
        &self,
        key: &QueryKey,
        result: Result<CachedValue, Arc<ApiError>>,
    ) -> Result<QueryOutcome, Arc<ApiError>> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.inflight.remove(key);
        let entry = inner.entries.entry(key.clone()).or_default();

        match result {
            Ok(data) => {
                let fetched_at = Instant::now();
                entry.state = QueryState::Success {
                    data: data.clone(),
                    fetched_at,
                };
                entry.stale = false;
                Ok(QueryOutcome {
                    data,
                    source: CacheSource::Network,
                    fetched_at,
                })
            }
            Err(err) => {
                let prior = entry.state.carry_prior();
                entry.state = QueryState::Error {
                    message: format_api_error(&err),
                    prior: prior.clone(),
                };
                match prior {
                    Some(snapshot) => {
                        tracing::warn!("fetch failed for {}, serving stale data", key);
                        Ok(QueryOutcome {
                            data: snapshot.data,
                            source: CacheSource::Offline,
                            fetched_at: snapshot.fetched_at,
                        })
                    }
                    None => Err(err),
                }
            }
        }
    }

    /// Mark every entry of a resource type stale. Idempotent; stale entries
    /// are refetched on their next read.
    pub fn invalidate(&self, resource: &str) -> usize {
        let mut guard = self.lock();
        let mut marked = 0;
        for (key, entry) in guard.entries.iter_mut() {
            if key.resource() == resource {
                entry.stale = true;
                marked += 1;
            }
        }
        tracing::debug!("invalidated {} entries for '{}'", marked, resource);
        marked
    }

    /// Capture the exact current entries for one resource type.
    pub fn snapshot_resource(&self, resource: &str) -> ResourceSnapshot {
        let guard = self.lock();
        let entries = guard
            .entries
            .iter()
            .filter(|(key, _)| key.resource() == resource)
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();
        ResourceSnapshot {
            resource: resource.to_string(),
            entries,
        }
    }

    /// Restore a snapshot, discarding any entries for the resource written
    /// since it was taken.
    pub fn restore(&self, snapshot: ResourceSnapshot) {
        let mut guard = self.lock();
        guard
            .entries
            .retain(|key, _| key.resource() != snapshot.resource);
        for (key, entry) in snapshot.entries {
            guard.entries.insert(key, entry);
        }
    }

    /// Apply a speculative edit to every successful payload of a resource
    /// type. Used by the optimistic mutation path; pair with
    /// [`snapshot_resource`]/[`restore`] for rollback.
    pub fn edit_resource<F>(&self, resource: &str, mut edit: F)
    where
        F: FnMut(&QueryKey, &mut CachedValue),
    {
        let mut guard = self.lock();
        for (key, entry) in guard.entries.iter_mut() {
            if key.resource() != resource {
                continue;
            }
            if let QueryState::Success { data, .. } = &mut entry.state {
                edit(key, data);
            }
        }
    }

    /// Number of cached entries (for diagnostics).
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seed(cache: &QueryCache, key: &QueryKey, n: usize) {
        let data = CachedValue::Collection {
            items: (0..n).map(|i| json!({ "id": format!("r-{i}") })).collect(),
            total: n as u64,
        };
        cache.commit(key, Ok(data)).unwrap();
    }

    #[test]
    fn test_invalidate_marks_only_matching_resource() {
        let cache = QueryCache::new();
        let vendors = QueryKey::new("vendors");
        let offers = QueryKey::new("offers");
        seed(&cache, &vendors, 2);
        seed(&cache, &offers, 2);

        assert_eq!(cache.invalidate("vendors"), 1);
        assert!(cache.get(&vendors).stale);
        assert!(!cache.get(&offers).stale);
    }

    #[test]
    fn test_invalidate_is_idempotent() {
        let cache = QueryCache::new();
        let key = QueryKey::new("vendors").with_param("status", "active");
        seed(&cache, &key, 1);

        cache.invalidate("vendors");
        let first = cache.get(&key);
        cache.invalidate("vendors");
        let second = cache.get(&key);

        assert!(first.stale && second.stale);
        assert_eq!(
            first.state.available_data(),
            second.state.available_data()
        );
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let cache = QueryCache::new();
        let key = QueryKey::new("offers");
        seed(&cache, &key, 3);

        let snapshot = cache.snapshot_resource("offers");

        // Speculative edit: drop one item.
        cache.edit_resource("offers", |_, data| {
            if let CachedValue::Collection { items, total } = data {
                items.pop();
                *total -= 1;
            }
        });
        assert_eq!(
            cache.get(&key).state.available_data().unwrap().items().len(),
            2
        );

        cache.restore(snapshot);
        let restored = cache.get(&key);
        assert_eq!(restored.state.available_data().unwrap().items().len(), 3);
        assert_eq!(restored.state.available_data().unwrap().total(), 3);
    }

    #[test]
    fn test_restore_discards_entries_added_after_snapshot() {
        let cache = QueryCache::new();
        let before = QueryKey::new("vendors");
        seed(&cache, &before, 1);

        let snapshot = cache.snapshot_resource("vendors");

        let after = QueryKey::new("vendors").with_param("page", "2");
        seed(&cache, &after, 1);
        assert_eq!(cache.len(), 2);

        cache.restore(snapshot);
        assert_eq!(cache.len(), 1);
        assert!(matches!(cache.get(&after).state, QueryState::Idle));
    }

    #[test]
    fn test_get_unknown_key_is_idle() {
        let cache = QueryCache::new();
        let entry = cache.get(&QueryKey::new("products"));
        assert!(matches!(entry.state, QueryState::Idle));
        assert!(!entry.stale);
    }

    mod fetching {
        use super::*;
        use std::sync::atomic::{AtomicUsize, Ordering};

        fn payload(n: usize) -> CachedValue {
            CachedValue::Collection {
                items: (0..n).map(|i| json!({ "id": format!("r-{i}") })).collect(),
                total: n as u64,
            }
        }

        #[tokio::test]
        async fn test_concurrent_fetches_share_one_request() {
            let cache = QueryCache::new();
            let key = QueryKey::new("products").with_param("status", "active");
            let calls = Arc::new(AtomicUsize::new(0));

            let loader = |calls: Arc<AtomicUsize>| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(payload(2))
            };

            let (a, b) = tokio::join!(
                cache.ensure_fetched(&key, Duration::from_secs(30), {
                    let calls = calls.clone();
                    move || loader(calls)
                }),
                cache.ensure_fetched(&key, Duration::from_secs(30), {
                    let calls = calls.clone();
                    move || loader(calls)
                }),
            );

            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert_eq!(a.unwrap().data.items().len(), 2);
            assert_eq!(b.unwrap().data.items().len(), 2);
        }

        #[tokio::test]
        async fn test_fresh_entry_skips_loader() {
            let cache = QueryCache::new();
            let key = QueryKey::new("vendors");
            seed(&cache, &key, 1);
            let calls = Arc::new(AtomicUsize::new(0));

            let outcome = cache
                .ensure_fetched(&key, Duration::from_secs(30), {
                    let calls = calls.clone();
                    move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(payload(5))
                    }
                })
                .await
                .unwrap();

            assert_eq!(calls.load(Ordering::SeqCst), 0);
            assert_eq!(outcome.source, CacheSource::CacheFresh);
            assert_eq!(outcome.data.items().len(), 1);
        }

        #[tokio::test]
        async fn test_failed_refetch_serves_stale_data() {
            let cache = QueryCache::new();
            let key = QueryKey::new("orders");
            seed(&cache, &key, 3);
            cache.invalidate("orders");

            let outcome = cache
                .ensure_fetched(&key, Duration::from_secs(30), || async {
                    Err(ApiError::Api {
                        status: 503,
                        message: "backend down".to_string(),
                    })
                })
                .await
                .unwrap();

            assert_eq!(outcome.source, CacheSource::Offline);
            assert_eq!(outcome.data.items().len(), 3);
            assert!(cache.get(&key).state.error_message().is_some());
        }

        #[tokio::test]
        async fn test_failed_first_fetch_propagates_error() {
            let cache = QueryCache::new();
            let key = QueryKey::new("offers");

            let result = cache
                .ensure_fetched(&key, Duration::from_secs(30), || async {
                    Err(ApiError::Api {
                        status: 500,
                        message: "boom".to_string(),
                    })
                })
                .await;

            assert!(result.is_err());
            assert!(matches!(cache.get(&key).state, QueryState::Error { .. }));
        }

        #[tokio::test]
        async fn test_invalidated_entry_refetches_on_next_read() {
            let cache = QueryCache::new();
            let key = QueryKey::new("products");
            seed(&cache, &key, 1);
            cache.invalidate("products");
            let calls = Arc::new(AtomicUsize::new(0));

            let outcome = cache
                .ensure_fetched(&key, Duration::from_secs(30), {
                    let calls = calls.clone();
                    move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(payload(4))
                    }
                })
                .await
                .unwrap();

            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert_eq!(outcome.source, CacheSource::Network);
            assert_eq!(outcome.data.items().len(), 4);
            assert!(!cache.get(&key).stale);
        }
    }
}
