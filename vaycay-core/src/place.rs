//! Place summaries, details and reviews.
//!
//! Provider records are normalised into these types at the adapter
//! boundary. Optional provider fields stay `Option`s; ratings outside
//! `0.0..=5.0` are dropped rather than clamped.

use crate::Coordinate;

/// Keep a provider rating only when it is finite and within `0.0..=5.0`.
///
/// # Examples
/// ```
/// use vaycay_core::normalise_rating;
///
/// assert_eq!(normalise_rating(Some(4.5)), Some(4.5));
/// assert_eq!(normalise_rating(Some(7.0)), None);
/// assert_eq!(normalise_rating(None), None);
/// ```
#[must_use]
pub fn normalise_rating(raw: Option<f64>) -> Option<f64> {
    raw.filter(|value| value.is_finite() && (0.0..=5.0).contains(value))
}

/// Lightweight place record returned by a nearby search.
///
/// Identity is [`PlaceSummary::id`]; two summaries sharing an id describe the
/// same place even when their other fields differ.
///
/// # Examples
/// ```
/// use vaycay_core::PlaceSummary;
///
/// let place = PlaceSummary::new("p1", "Alki Beach")
///     .with_rating(Some(4.6))
///     .with_primary_photo_ref(Some("ref-1".into()));
/// assert!(place.same_place(&PlaceSummary::new("p1", "Alki")));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaceSummary {
    /// Stable provider-issued identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Average rating in `0.0..=5.0`.
    pub rating: Option<f64>,
    /// Number of ratings behind [`PlaceSummary::rating`].
    pub rating_count: Option<u32>,
    /// Short address or neighbourhood.
    pub vicinity: Option<String>,
    /// First photo reference, if the provider returned any.
    pub primary_photo_ref: Option<String>,
    /// Position reported by the provider.
    pub location: Option<Coordinate>,
}

impl PlaceSummary {
    /// Construct a summary with only the required fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rating: None,
            rating_count: None,
            vicinity: None,
            primary_photo_ref: None,
            location: None,
        }
    }

    /// Set the rating, dropping out-of-range values.
    #[must_use]
    pub fn with_rating(mut self, rating: Option<f64>) -> Self {
        self.rating = normalise_rating(rating);
        self
    }

    /// Set the rating count.
    #[must_use]
    pub fn with_rating_count(mut self, rating_count: Option<u32>) -> Self {
        self.rating_count = rating_count;
        self
    }

    /// Set the vicinity.
    #[must_use]
    pub fn with_vicinity(mut self, vicinity: Option<String>) -> Self {
        self.vicinity = vicinity;
        self
    }

    /// Set the primary photo reference.
    #[must_use]
    pub fn with_primary_photo_ref(mut self, photo_ref: Option<String>) -> Self {
        self.primary_photo_ref = photo_ref;
        self
    }

    /// Set the reported location.
    #[must_use]
    pub fn with_location(mut self, location: Option<Coordinate>) -> Self {
        self.location = location;
        self
    }

    /// Whether `other` refers to the same place.
    #[must_use]
    pub fn same_place(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Synthetic review identity, unique only within one detail fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReviewId(pub usize);

/// A single user review.
///
/// Providers do not identify reviews, so [`Review::id`] is the review's
/// position in the fetched list. Reviews are never merged across fetches.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Review {
    /// Position-derived identifier for list rendering.
    pub id: ReviewId,
    /// Reviewer display name.
    pub author_name: Option<String>,
    /// Reviewer's rating in `0.0..=5.0`.
    pub rating: Option<f64>,
    /// Review body.
    pub text: Option<String>,
}

impl Review {
    /// Construct a review at position `ordinal`.
    #[must_use]
    pub fn new(
        ordinal: usize,
        author_name: Option<String>,
        rating: Option<f64>,
        text: Option<String>,
    ) -> Self {
        Self {
            id: ReviewId(ordinal),
            author_name,
            rating: normalise_rating(rating),
            text,
        }
    }
}

/// Full place record, fetched per selection and never cached.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaceDetail {
    /// Display name.
    pub name: Option<String>,
    /// Average rating in `0.0..=5.0`.
    pub rating: Option<f64>,
    /// Short address or neighbourhood.
    pub vicinity: Option<String>,
    /// Number of ratings.
    pub rating_count: Option<u32>,
    /// Photo references in provider order.
    pub photo_refs: Vec<String>,
    /// Reviews in provider order.
    pub reviews: Vec<Review>,
}
