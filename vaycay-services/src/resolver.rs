//! Free-text location to coordinate resolution.
//!
//! [`CoordinateResolver`] wraps a [`Geocoder`] with a bounded LRU cache keyed
//! by the trimmed, case-folded location text. Successful lookups are kept for
//! the life of the resolver; empty results and upstream failures are not
//! cached, so a later call retries. Concurrent callers for the same key
//! share one geocoding request.

use std::sync::{Arc, Mutex};

use vaycay_core::{Coordinate, Geocoder, NotFound};

use crate::cache::LruCache;
use crate::single_flight::SingleFlight;
use crate::{lock, normalise_key};

/// Default number of cached locations.
pub const DEFAULT_CAPACITY: usize = 128;

/// Configuration for [`CoordinateResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Maximum number of cached locations.
    pub capacity: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl ResolverConfig {
    /// Set the cache capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Cached, de-duplicating front for a [`Geocoder`].
///
/// Cloning is cheap and clones share the cache.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vaycay_services::CoordinateResolver;
/// use vaycay_services::test_support::StubGeocoder;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let geocoder = Arc::new(StubGeocoder::new().with_location("Seattle", 47.6, -122.3));
/// let resolver = CoordinateResolver::new(geocoder.clone());
///
/// let first = resolver.resolve("Seattle").await.unwrap();
/// let second = resolver.resolve("  seattle ").await.unwrap();
/// assert_eq!(first, second);
/// assert_eq!(geocoder.calls(), 1);
/// # });
/// ```
#[derive(Clone)]
pub struct CoordinateResolver {
    inner: Arc<Inner>,
}

struct Inner {
    geocoder: Arc<dyn Geocoder>,
    cache: Mutex<LruCache<String, Coordinate>>,
    in_flight: SingleFlight<String, Option<Coordinate>>,
}

impl std::fmt::Debug for CoordinateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateResolver")
            .field("cached", &lock(&self.inner.cache).len())
            .field("in_flight", &self.inner.in_flight)
            .finish_non_exhaustive()
    }
}

impl CoordinateResolver {
    /// Create a resolver with the default configuration.
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self::with_config(geocoder, ResolverConfig::default())
    }

    /// Create a resolver with explicit configuration.
    pub fn with_config(geocoder: Arc<dyn Geocoder>, config: ResolverConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                geocoder,
                cache: Mutex::new(LruCache::new(config.capacity)),
                in_flight: SingleFlight::default(),
            }),
        }
    }

    /// Resolve `location_text` to the provider's first matching coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] when the text is blank, the provider has no
    /// match, or the provider call fails. None of these are cached.
    pub async fn resolve(&self, location_text: &str) -> Result<Coordinate, NotFound> {
        let key = normalise_key(location_text);
        let not_found = || NotFound {
            query: location_text.to_owned(),
        };
        if key.is_empty() {
            return Err(not_found());
        }
        if let Some(hit) = lock(&self.inner.cache).get(&key) {
            log::debug!("geocode cache hit for {key:?}");
            return Ok(hit);
        }

        let inner = Arc::clone(&self.inner);
        let query = location_text.trim().to_owned();
        let lookup_key = key.clone();
        self.inner
            .in_flight
            .run(key, move || async move { inner.lookup(lookup_key, query).await })
            .await
            .ok_or_else(not_found)
    }

    /// Whether `location_text` currently has a cached coordinate.
    #[must_use]
    pub fn is_cached(&self, location_text: &str) -> bool {
        lock(&self.inner.cache)
            .get(&normalise_key(location_text))
            .is_some()
    }
}

impl Inner {
    async fn lookup(&self, key: String, query: String) -> Option<Coordinate> {
        // A racing caller may have filled the cache after our miss.
        if let Some(hit) = lock(&self.cache).get(&key) {
            return Some(hit);
        }
        match self.geocoder.geocode(&query).await {
            Ok(candidates) => {
                let Some(first) = candidates.first().copied() else {
                    log::info!("no geocoding match for {query:?}");
                    return None;
                };
                lock(&self.cache).insert(key, first);
                Some(first)
            }
            Err(err) => {
                log::warn!("geocoding {query:?} failed: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubGeocoder;
    use rstest::{fixture, rstest};
    use vaycay_core::ProviderError;

    #[fixture]
    fn geocoder() -> Arc<StubGeocoder> {
        Arc::new(
            StubGeocoder::new()
                .with_location("Seattle", 47.6, -122.3)
                .with_location("Portland", 45.5, -122.7),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn second_lookup_hits_cache(geocoder: Arc<StubGeocoder>) {
        let resolver = CoordinateResolver::new(geocoder.clone());
        let first = resolver.resolve("Seattle").await.expect("resolves");
        let second = resolver.resolve("SEATTLE ").await.expect("resolves");

        assert_eq!(first, second);
        assert_eq!(first.latitude, 47.6);
        assert_eq!(geocoder.calls(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn blank_text_is_not_found_without_a_call(geocoder: Arc<StubGeocoder>) {
        let resolver = CoordinateResolver::new(geocoder.clone());
        let err = resolver.resolve("   ").await.expect_err("blank input");
        assert_eq!(err.query, "   ");
        assert_eq!(geocoder.calls(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn misses_are_not_cached(geocoder: Arc<StubGeocoder>) {
        let resolver = CoordinateResolver::new(geocoder.clone());
        assert!(resolver.resolve("Zzqqxx123").await.is_err());
        assert!(resolver.resolve("Zzqqxx123").await.is_err());
        assert_eq!(geocoder.calls(), 2);
        assert!(!resolver.is_cached("Zzqqxx123"));
    }

    #[rstest]
    #[tokio::test]
    async fn upstream_failure_is_not_found() {
        let geocoder = Arc::new(StubGeocoder::failing(ProviderError::Network {
            url: "https://geo".into(),
            message: "offline".into(),
        }));
        let resolver = CoordinateResolver::new(geocoder);
        let err = resolver.resolve("Seattle").await.expect_err("offline");
        assert_eq!(err.query, "Seattle");
    }

    #[rstest]
    #[tokio::test]
    async fn concurrent_lookups_share_one_request(geocoder: Arc<StubGeocoder>) {
        let resolver = CoordinateResolver::new(geocoder.clone());
        let (a, b, c) = tokio::join!(
            resolver.resolve("Seattle"),
            resolver.resolve("seattle"),
            resolver.resolve(" Seattle"),
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(geocoder.calls(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn capacity_bounds_the_cache(geocoder: Arc<StubGeocoder>) {
        let resolver =
            CoordinateResolver::with_config(geocoder.clone(), ResolverConfig::default().with_capacity(1));
        resolver.resolve("Seattle").await.expect("resolves");
        resolver.resolve("Portland").await.expect("resolves");

        assert!(!resolver.is_cached("Seattle"), "evicted by Portland");
        resolver.resolve("Seattle").await.expect("resolves");
        assert_eq!(geocoder.calls(), 3);
    }
}
