//! In-memory memoization of reverse geocoding results.
//!
//! Keyed by the formatted centroid string. Unbounded, no eviction, no
//! TTL: entries live for the lifetime of the process and a key is never
//! overwritten once written, so stale place names are accepted in
//! exchange for never repeating an external call. Acceptable for the
//! small batches this service handles; the cache is reset only by a
//! process restart.
//!
//! The cache is plain shared state handed around in an `Arc` rather than
//! a module-level singleton, so tests get isolated instances.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::RwLock;

/// Process-wide reverse geocoding cache.
///
/// Safe under concurrent access from multiple simultaneous requests.
/// Lookups take a read lock; inserts take a short write lock after the
/// compute future has already resolved, so the external call never runs
/// under the lock. If two requests race on the same missing key both may
/// compute, but the first insert wins and both observe a consistent
/// value afterwards.
#[derive(Debug, Default)]
pub struct GeocodeCache {
    entries: RwLock<BTreeMap<String, String>>,
}

impl GeocodeCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the cache lock is poisoned.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .expect("geocode cache lock poisoned")
            .get(key)
            .cloned()
    }

    /// Number of cached entries.
    ///
    /// # Panics
    ///
    /// Panics if the cache lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("geocode cache lock poisoned")
            .len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached value for `key`, computing and caching it on a
    /// miss.
    ///
    /// Only successful computes are cached; an `Err` propagates without
    /// poisoning the key, so a later request retries the lookup. If a
    /// concurrent request inserted the key while the compute was running,
    /// the earlier value is kept and returned.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `compute` on a cache miss.
    ///
    /// # Panics
    ///
    /// Panics if the cache lock is poisoned.
    pub async fn get_or_compute<F, Fut, E>(&self, key: &str, compute: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let value = compute().await?;

        let mut entries = self.entries.write().expect("geocode cache lock poisoned");
        Ok(entries.entry(key.to_string()).or_insert(value).clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn computes_on_miss_and_caches() {
        let cache = GeocodeCache::new();
        let calls = AtomicUsize::new(0);

        let compute = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ()>("Duluth, Georgia".to_string())
        };

        let first = cache.get_or_compute("34.0, -84.1", compute).await.unwrap();
        assert_eq!(first, "Duluth, Georgia");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let second = cache
            .get_or_compute("34.0, -84.1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>("something else".to_string())
            })
            .await
            .unwrap();

        // Second call hits the cache: no extra compute, value unchanged.
        assert_eq!(second, "Duluth, Georgia");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn failed_compute_is_not_cached() {
        let cache = GeocodeCache::new();

        let result: Result<String, &str> = cache
            .get_or_compute("40.0, -75.0", || async { Err("service down") })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty());

        // A later successful lookup for the same key still works.
        let value = cache
            .get_or_compute("40.0, -75.0", || async {
                Ok::<_, &str>("Philadelphia, Pennsylvania".to_string())
            })
            .await
            .unwrap();
        assert_eq!(value, "Philadelphia, Pennsylvania");
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn distinct_keys_are_cached_independently() {
        let cache = GeocodeCache::new();

        cache
            .get_or_compute("a", || async { Ok::<_, ()>("one".to_string()) })
            .await
            .unwrap();
        cache
            .get_or_compute("b", || async { Ok::<_, ()>("two".to_string()) })
            .await
            .unwrap();

        assert_eq!(cache.get("a").as_deref(), Some("one"));
        assert_eq!(cache.get("b").as_deref(), Some("two"));
        assert_eq!(cache.len(), 2);
    }
}
