//! Facade crate for the Vaycay discovery engine.
//!
//! This crate re-exports the core domain types and the discovery services,
//! and exposes the HTTP provider clients behind the `http` feature.

#![forbid(unsafe_code)]

pub use vaycay_core::{
    AutocompleteProvider, Category, Coordinate, DetailError, DetailField, DiscoveryError,
    FavoriteRecord, FavoritesError, FavoritesStore, Geocoder, ImageSearchProvider, NotFound,
    PhotoUrlBuilder, PlaceDetail, PlaceSummary, PlacesProvider, PreferencesError,
    PreferencesStore, ProviderError, Review, UserId, map_category,
};

pub use vaycay_services::{
    CoordinateResolver, DetailEnricher, DiscoveryConfig, DiscoveryFeed, DiscoveryService,
    EnrichedPlace, FavoritesSynchronizer, FavoritesView, FeedOutcome, FeedState, ImageConfig,
    ImageResolver, ImageTier, MutationOutcome, ResolvedImage, ResolverConfig, SyncPhase,
    TravelPreferences,
};

#[cfg(feature = "http")]
pub use vaycay_data::{GoogleMapsClient, GoogleMapsConfig, UnsplashClient, UnsplashConfig};
