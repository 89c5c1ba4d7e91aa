//! Core domain types for the Vaycay discovery engine.
//!
//! This crate holds the data model shared by every other crate: coordinates,
//! place summaries and details, favorite records, the category table and the
//! error taxonomy. It also defines the narrow collaborator traits through
//! which the services talk to geocoding, places, image-search and document
//! store providers. Nothing here performs I/O.

#![forbid(unsafe_code)]

pub mod category;
mod coordinate;
mod error;
mod favorite;
mod place;
pub mod provider;

pub use category::{Category, ProviderTypeFilter, map_category};
pub use coordinate::{Coordinate, CoordinateError};
pub use error::{
    DetailError, DiscoveryError, FavoritesError, NotFound, PreferencesError, ProviderError,
};
pub use favorite::{FavoriteRecord, UserId};
pub use place::{PlaceDetail, PlaceSummary, Review, ReviewId, normalise_rating};
pub use provider::{
    AutocompleteProvider, DetailField, FavoritesStore, Geocoder, ImageSearchProvider,
    NearbyRequest, PhotoUrlBuilder, PlacesProvider, PreferencesStore, Snapshot,
    SnapshotReceiver, SnapshotSender,
};
