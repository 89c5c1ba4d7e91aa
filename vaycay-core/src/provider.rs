//! Collaborator contracts consumed by the services.
//!
//! Each trait is the narrow interface to one external system: geocoding,
//! places search and autocomplete, image search, or the per-user document
//! store. Adapters normalise provider-shaped records into this crate's types
//! before returning, so services never see raw responses.
//!
//! Traits are object safe (`Arc<dyn Geocoder>` etc.) so clients can be built
//! once at start-up and injected.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    Coordinate, FavoriteRecord, PlaceDetail, PlaceSummary, ProviderError, ProviderTypeFilter,
    UserId,
};

/// Resolve free-text locations to coordinates.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use vaycay_core::{Coordinate, Geocoder, ProviderError};
///
/// struct Fixed;
///
/// #[async_trait]
/// impl Geocoder for Fixed {
///     async fn geocode(&self, _text: &str) -> Result<Vec<Coordinate>, ProviderError> {
///         Ok(vec![Coordinate { latitude: 47.6, longitude: -122.3 }])
///     }
/// }
/// ```
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Return candidate coordinates in provider order; may be empty.
    async fn geocode(&self, text: &str) -> Result<Vec<Coordinate>, ProviderError>;
}

/// Parameters of a bounded-radius nearby search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyRequest {
    /// Search centre.
    pub center: Coordinate,
    /// Search radius in metres.
    pub radius_meters: u32,
    /// Provider place type to restrict to.
    pub type_filter: ProviderTypeFilter,
}

/// Fields that can be requested from the place-details endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailField {
    /// Display name.
    Name,
    /// Average rating.
    Rating,
    /// Short address.
    Vicinity,
    /// Photo references.
    Photos,
    /// User reviews.
    Reviews,
    /// Number of ratings.
    RatingCount,
}

impl DetailField {
    /// Every field, in the order sent to the provider.
    pub const ALL: [Self; 6] = [
        Self::Name,
        Self::Rating,
        Self::Vicinity,
        Self::Photos,
        Self::Reviews,
        Self::RatingCount,
    ];

    /// Provider field name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Rating => "rating",
            Self::Vicinity => "vicinity",
            Self::Photos => "photos",
            Self::Reviews => "reviews",
            Self::RatingCount => "user_ratings_total",
        }
    }
}

/// Search and describe places.
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    /// Return places near `request.center`, in the provider's ranking.
    async fn nearby_search(
        &self,
        request: &NearbyRequest,
    ) -> Result<Vec<PlaceSummary>, ProviderError>;

    /// Fetch `fields` for a single place.
    async fn place_details(
        &self,
        place_id: &str,
        fields: &[DetailField],
    ) -> Result<PlaceDetail, ProviderError>;
}

/// Build a displayable photo URL from a provider photo reference.
///
/// Construction is deterministic and offline; load failures surface only
/// when a renderer dereferences the URL.
pub trait PhotoUrlBuilder: Send + Sync {
    /// Return the URL for `photo_ref`.
    fn photo_url(&self, photo_ref: &str) -> String;
}

/// Keyword image search.
#[async_trait]
pub trait ImageSearchProvider: Send + Sync {
    /// Return image URLs in relevance order; may be empty.
    async fn search_images(&self, keyword: &str) -> Result<Vec<String>, ProviderError>;
}

/// Destination suggestions for partially typed place names.
#[async_trait]
pub trait AutocompleteProvider: Send + Sync {
    /// Return region names completing `input`, best match first; may be
    /// empty.
    async fn suggest_destinations(&self, input: &str) -> Result<Vec<String>, ProviderError>;
}

/// One push from a live favorites subscription: the full current set.
pub type Snapshot = Result<Vec<FavoriteRecord>, ProviderError>;

/// Sending half of a favorites subscription, held by store implementations.
pub type SnapshotSender = mpsc::UnboundedSender<Snapshot>;

/// Receiving half of a favorites subscription.
///
/// Dropping the receiver unsubscribes.
pub type SnapshotReceiver = mpsc::UnboundedReceiver<Snapshot>;

/// Per-user favorites collection in the remote document store.
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// Read the whole collection.
    async fn fetch_all(&self, user: &UserId) -> Result<Vec<FavoriteRecord>, ProviderError>;

    /// Write `record`, replacing any record with the same place id.
    async fn add(&self, user: &UserId, record: &FavoriteRecord) -> Result<(), ProviderError>;

    /// Delete the record for `place_id`; deleting a missing record succeeds.
    async fn remove(&self, user: &UserId, place_id: &str) -> Result<(), ProviderError>;

    /// Follow the collection; every change pushes the full current set.
    async fn subscribe(&self, user: &UserId) -> Result<SnapshotReceiver, ProviderError>;
}

/// Per-user travel preferences in the remote document store.
#[async_trait]
pub trait PreferencesStore: Send + Sync {
    /// Read the stored preference list.
    async fn load(&self, user: &UserId) -> Result<Vec<String>, ProviderError>;

    /// Replace the stored preference list.
    async fn save(&self, user: &UserId, preferences: &[String]) -> Result<(), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn detail_fields_serialise_in_request_order() {
        let joined = DetailField::ALL
            .iter()
            .map(DetailField::as_str)
            .collect::<Vec<_>>()
            .join(",");
        assert_eq!(joined, "name,rating,vicinity,photos,reviews,user_ratings_total");
    }
}
