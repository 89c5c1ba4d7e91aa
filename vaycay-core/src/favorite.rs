//! Favorite records and user identity.

use crate::PlaceSummary;

/// Identity of the signed-in user, supplied by the authentication context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserId(String);

impl UserId {
    /// Wrap a provider user identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A place the user has saved.
///
/// Records are keyed by [`FavoriteRecord::place_id`] and never edited in
/// place; replacing one means removing it and adding the new version.
///
/// # Examples
/// ```
/// use vaycay_core::{FavoriteRecord, PlaceSummary};
///
/// let summary = PlaceSummary::new("p1", "Alki Beach")
///     .with_vicinity(Some("Seattle".into()))
///     .with_primary_photo_ref(Some("ref-1".into()));
/// let record = FavoriteRecord::from_summary(&summary);
/// assert_eq!(record.place_id, "p1");
/// assert_eq!(record.image_ref.as_deref(), Some("ref-1"));
/// assert_eq!(record.location.as_deref(), Some("Seattle"));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FavoriteRecord {
    /// Unique key: the provider place id.
    pub place_id: String,
    /// Display name.
    pub name: String,
    /// Photo reference or image URL used for the card.
    pub image_ref: Option<String>,
    /// Short address.
    pub location: Option<String>,
    /// Average rating.
    pub rating: Option<f64>,
    /// Number of ratings.
    pub rating_count: Option<u32>,
}

impl FavoriteRecord {
    /// Construct a record with only the required fields.
    pub fn new(place_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            place_id: place_id.into(),
            name: name.into(),
            image_ref: None,
            location: None,
            rating: None,
            rating_count: None,
        }
    }

    /// Build a record from a discovered place.
    #[must_use]
    pub fn from_summary(summary: &PlaceSummary) -> Self {
        Self {
            place_id: summary.id.clone(),
            name: summary.name.clone(),
            image_ref: summary.primary_photo_ref.clone(),
            location: summary.vicinity.clone(),
            rating: summary.rating,
            rating_count: summary.rating_count,
        }
    }
}

impl From<&PlaceSummary> for FavoriteRecord {
    fn from(summary: &PlaceSummary) -> Self {
        Self::from_summary(summary)
    }
}
