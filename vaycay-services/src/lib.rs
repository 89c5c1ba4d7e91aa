//! Discovery and resolution services for the Vaycay engine.
//!
//! Responsibilities:
//! - Resolve location text to coordinates with a bounded, de-duplicated cache.
//! - Run categorised nearby searches and enrich selected places on demand.
//! - Resolve display images through a tiered fallback chain.
//! - Keep an optimistic favorites set in step with the remote store.
//!
//! Boundaries:
//! - Providers are injected as trait objects from `vaycay-core`; this crate
//!   never constructs HTTP clients.
//! - Every network-facing operation returns a typed outcome; nothing here
//!   panics on upstream failure.
//!
//! Invariants:
//! - No global mutable state. Shared caches are serialised per key and
//!   concurrent callers for the same key share one upstream request.
//! - Locks are never held across an `.await`.

#![forbid(unsafe_code)]

mod cache;
pub mod detail;
pub mod discovery;
pub mod favorites;
pub mod feed;
pub mod image;
pub mod preferences;
pub mod resolver;
mod single_flight;

#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;

pub use detail::{DetailEnricher, EnrichedPlace};
pub use discovery::{DiscoveryConfig, DiscoveryService};
pub use favorites::{FavoritesSynchronizer, FavoritesView, MutationOutcome, SyncPhase};
pub use feed::{DiscoveryFeed, FeedOutcome, FeedState};
pub use image::{ImageConfig, ImageResolver, ImageTier, ResolvedImage};
pub use preferences::TravelPreferences;
pub use resolver::{CoordinateResolver, ResolverConfig};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock `mutex`, recovering the data if a previous holder panicked.
///
/// Guarded state is only ever replaced wholesale, so a poisoned value is
/// still consistent.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Normalise free text used as a cache key: trimmed and case-folded.
pub(crate) fn normalise_key(text: &str) -> String {
    text.trim().to_lowercase()
}
