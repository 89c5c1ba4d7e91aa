//! Tiered image resolution: provider photo, keyword search, placeholder.
//!
//! The primary tier builds a photo URL from a provider reference without a
//! network call. A reference the renderer reported as broken is skipped
//! from then on. The secondary tier searches by keyword and caches the
//! first hit per normalised keyword for the life of the resolver. The
//! placeholder tier never fails.
//!
//! Secondary results are never replaced by a placeholder. An empty search
//! is remembered as a placeholder for
//! [`ImageConfig::placeholder_retry_after`] before the keyword is searched
//! again; a provider error is not remembered at all.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use vaycay_core::{ImageSearchProvider, PhotoUrlBuilder};

use crate::single_flight::SingleFlight;
use crate::{lock, normalise_key};

/// Placeholder used when no image can be found.
pub const DEFAULT_PLACEHOLDER_URL: &str = "https://source.unsplash.com/400x300/?travel";

/// Default number of photos in a gallery.
pub const DEFAULT_GALLERY_LIMIT: usize = 5;

/// Default time before a keyword that found nothing is searched again.
pub const DEFAULT_PLACEHOLDER_RETRY_AFTER: Duration = Duration::from_secs(300);

/// Configuration for [`ImageResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageConfig {
    /// URL returned by the placeholder tier.
    pub placeholder_url: String,
    /// How long an empty keyword search is remembered.
    pub placeholder_retry_after: Duration,
    /// Maximum number of primary photos in a gallery.
    pub gallery_limit: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            placeholder_url: DEFAULT_PLACEHOLDER_URL.to_owned(),
            placeholder_retry_after: DEFAULT_PLACEHOLDER_RETRY_AFTER,
            gallery_limit: DEFAULT_GALLERY_LIMIT,
        }
    }
}

impl ImageConfig {
    /// Set the placeholder URL.
    #[must_use]
    pub fn with_placeholder_url(mut self, url: impl Into<String>) -> Self {
        self.placeholder_url = url.into();
        self
    }

    /// Set how long an empty keyword search is remembered.
    #[must_use]
    pub const fn with_placeholder_retry_after(mut self, retry_after: Duration) -> Self {
        self.placeholder_retry_after = retry_after;
        self
    }

    /// Set the gallery size.
    #[must_use]
    pub const fn with_gallery_limit(mut self, limit: usize) -> Self {
        self.gallery_limit = limit;
        self
    }
}

/// Which tier produced an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageTier {
    /// Provider photo built from a reference.
    Primary,
    /// First keyword search hit.
    Secondary,
    /// Fixed placeholder.
    Placeholder,
}

impl ImageTier {
    /// Lowercase label for display and serialised output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Placeholder => "placeholder",
        }
    }
}

/// A displayable image URL and the tier it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// URL to render.
    pub url: String,
    /// Tier that produced `url`.
    pub tier: ImageTier,
}

#[derive(Debug, Clone)]
enum KeywordEntry {
    Found(String),
    Empty { at: Instant },
}

/// Resolves display images through the tier chain.
///
/// Cloning is cheap; clones share caches.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vaycay_services::test_support::{StubImageSearch, StubPlaces};
/// use vaycay_services::{ImageResolver, ImageTier};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let search = Arc::new(
///     StubImageSearch::new().respond("Alki Beach", Ok(vec!["https://img.test/alki".into()])),
/// );
/// let images = ImageResolver::new(Arc::new(StubPlaces::new()), search);
///
/// let photo = images.resolve_image(Some("ref-1"), "Alki Beach").await;
/// assert_eq!(photo.tier, ImageTier::Primary);
///
/// let fallback = images.resolve_image(None, "Alki Beach").await;
/// assert_eq!(fallback.url, "https://img.test/alki");
/// # });
/// ```
#[derive(Clone)]
pub struct ImageResolver {
    inner: Arc<Inner>,
}

struct Inner {
    photos: Arc<dyn PhotoUrlBuilder>,
    search: Arc<dyn ImageSearchProvider>,
    config: ImageConfig,
    keywords: Mutex<HashMap<String, KeywordEntry>>,
    broken_refs: Mutex<HashSet<String>>,
    in_flight: SingleFlight<String, ResolvedImage>,
}

impl std::fmt::Debug for ImageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageResolver")
            .field("config", &self.inner.config)
            .field("keywords", &lock(&self.inner.keywords).len())
            .field("broken_refs", &lock(&self.inner.broken_refs).len())
            .finish_non_exhaustive()
    }
}

impl ImageResolver {
    /// Create a resolver with the default configuration.
    pub fn new(photos: Arc<dyn PhotoUrlBuilder>, search: Arc<dyn ImageSearchProvider>) -> Self {
        Self::with_config(photos, search, ImageConfig::default())
    }

    /// Create a resolver with explicit configuration.
    pub fn with_config(
        photos: Arc<dyn PhotoUrlBuilder>,
        search: Arc<dyn ImageSearchProvider>,
        config: ImageConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                photos,
                search,
                config,
                keywords: Mutex::new(HashMap::new()),
                broken_refs: Mutex::new(HashSet::new()),
                in_flight: SingleFlight::default(),
            }),
        }
    }

    /// Resolve an image for a place.
    ///
    /// Uses `primary_ref` unless it is absent, blank or reported broken,
    /// then searches `fallback_keyword`, then gives the placeholder.
    pub async fn resolve_image(
        &self,
        primary_ref: Option<&str>,
        fallback_keyword: &str,
    ) -> ResolvedImage {
        if let Some(photo_ref) = primary_ref.and_then(|r| self.usable_ref(r)) {
            return ResolvedImage {
                url: self.inner.photos.photo_url(photo_ref),
                tier: ImageTier::Primary,
            };
        }
        self.resolve_keyword(fallback_keyword).await
    }

    /// Resolve up to [`ImageConfig::gallery_limit`] photos, or a single
    /// fallback image when none of `photo_refs` is usable.
    pub async fn resolve_gallery<S: AsRef<str>>(
        &self,
        photo_refs: &[S],
        fallback_keyword: &str,
    ) -> Vec<ResolvedImage> {
        let photos: Vec<_> = photo_refs
            .iter()
            .filter_map(|r| self.usable_ref(r.as_ref()))
            .take(self.inner.config.gallery_limit)
            .map(|r| ResolvedImage {
                url: self.inner.photos.photo_url(r),
                tier: ImageTier::Primary,
            })
            .collect();
        if !photos.is_empty() {
            return photos;
        }
        vec![self.resolve_keyword(fallback_keyword).await]
    }

    /// Record that the renderer failed to load `photo_ref`.
    ///
    /// Later resolutions of this reference skip to the keyword search.
    pub fn report_primary_failure(&self, photo_ref: &str) {
        let photo_ref = photo_ref.trim();
        if photo_ref.is_empty() {
            return;
        }
        if lock(&self.inner.broken_refs).insert(photo_ref.to_owned()) {
            log::warn!("photo reference {photo_ref} failed to load; using keyword search");
        }
    }

    /// Forget what is known about `key`, a keyword or photo reference.
    ///
    /// Returns `true` when an entry was removed.
    pub fn invalidate(&self, key: &str) -> bool {
        let keyword = lock(&self.inner.keywords)
            .remove(&normalise_key(key))
            .is_some();
        let photo = lock(&self.inner.broken_refs).remove(key.trim());
        keyword || photo
    }

    /// The placeholder URL.
    #[must_use]
    pub fn placeholder(&self) -> ResolvedImage {
        self.inner.placeholder()
    }

    fn usable_ref<'a>(&self, photo_ref: &'a str) -> Option<&'a str> {
        let photo_ref = photo_ref.trim();
        if photo_ref.is_empty() || lock(&self.inner.broken_refs).contains(photo_ref) {
            return None;
        }
        Some(photo_ref)
    }

    async fn resolve_keyword(&self, keyword: &str) -> ResolvedImage {
        let key = normalise_key(keyword);
        if key.is_empty() {
            return self.placeholder();
        }
        if let Some(hit) = self.inner.cached(&key) {
            log::debug!("image cache hit for {key:?}");
            return hit;
        }
        let inner = Arc::clone(&self.inner);
        let query = keyword.trim().to_owned();
        let search_key = key.clone();
        self.inner
            .in_flight
            .run(key, move || async move { inner.search(search_key, query).await })
            .await
    }
}

impl Inner {
    fn placeholder(&self) -> ResolvedImage {
        ResolvedImage {
            url: self.config.placeholder_url.clone(),
            tier: ImageTier::Placeholder,
        }
    }

    fn cached(&self, key: &str) -> Option<ResolvedImage> {
        match lock(&self.keywords).get(key)? {
            KeywordEntry::Found(url) => Some(ResolvedImage {
                url: url.clone(),
                tier: ImageTier::Secondary,
            }),
            KeywordEntry::Empty { at } if at.elapsed() < self.config.placeholder_retry_after => {
                Some(self.placeholder())
            }
            KeywordEntry::Empty { .. } => None,
        }
    }

    async fn search(&self, key: String, query: String) -> ResolvedImage {
        if let Some(hit) = self.cached(&key) {
            return hit;
        }
        match self.search.search_images(&query).await {
            Ok(urls) => {
                if let Some(url) = urls.into_iter().find(|url| !url.trim().is_empty()) {
                    lock(&self.keywords).insert(key, KeywordEntry::Found(url.clone()));
                    return ResolvedImage {
                        url,
                        tier: ImageTier::Secondary,
                    };
                }
                log::info!("no images for {query:?}; using placeholder");
                let mut keywords = lock(&self.keywords);
                if let Some(KeywordEntry::Found(url)) = keywords.get(&key) {
                    return ResolvedImage {
                        url: url.clone(),
                        tier: ImageTier::Secondary,
                    };
                }
                keywords.insert(key, KeywordEntry::Empty { at: Instant::now() });
                self.placeholder()
            }
            Err(err) => {
                log::warn!("image search for {query:?} failed: {err}; using placeholder");
                self.placeholder()
            }
        }
    }
}
