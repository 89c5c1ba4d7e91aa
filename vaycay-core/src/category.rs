//! Discovery categories and their provider type filters.
//!
//! Every label maps to a filter: unrecognised labels fall through to
//! [`Category::Other`], so [`map_category`] is total.
//!
//! # Examples
//! ```
//! use vaycay_core::{Category, map_category};
//!
//! assert_eq!(map_category("Beaches").as_str(), "beach");
//! assert_eq!(map_category("volcanoes").as_str(), "point_of_interest");
//! assert_eq!(Category::from_label("HOTELS"), Category::Hotels);
//! ```

use std::convert::Infallible;

/// A browsable category of places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    /// Beaches and coastline.
    Beaches,
    /// City sights and tourist attractions.
    Cities,
    /// Mountains and other natural features.
    Mountains,
    /// Restaurants.
    Cuisine,
    /// Lodging.
    Hotels,
    /// Anything else; searches generic points of interest.
    Other,
}

/// Place-type string understood by the places provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderTypeFilter(&'static str);

impl ProviderTypeFilter {
    /// Filter used when a label is not recognised.
    pub const FALLBACK: Self = Self("point_of_interest");

    /// Return the raw provider type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for ProviderTypeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

const CATEGORY_TABLE: [(&str, Category); 5] = [
    ("beaches", Category::Beaches),
    ("cities", Category::Cities),
    ("mountains", Category::Mountains),
    ("cuisine", Category::Cuisine),
    ("hotels", Category::Hotels),
];

impl Category {
    /// All categories in display order.
    pub const ALL: [Self; 6] = [
        Self::Beaches,
        Self::Cities,
        Self::Mountains,
        Self::Cuisine,
        Self::Hotels,
        Self::Other,
    ];

    /// Parse a free-text label, ignoring case and surrounding whitespace.
    ///
    /// Unknown labels yield [`Category::Other`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let folded = label.trim().to_lowercase();
        CATEGORY_TABLE
            .iter()
            .find(|(name, _)| *name == folded)
            .map_or(Self::Other, |(_, category)| *category)
    }

    /// Return the category as a lowercase `&str`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beaches => "beaches",
            Self::Cities => "cities",
            Self::Mountains => "mountains",
            Self::Cuisine => "cuisine",
            Self::Hotels => "hotels",
            Self::Other => "other",
        }
    }

    /// Provider type filter for this category.
    #[must_use]
    pub const fn type_filter(&self) -> ProviderTypeFilter {
        match self {
            Self::Beaches => ProviderTypeFilter("beach"),
            Self::Cities => ProviderTypeFilter("tourist_attraction"),
            Self::Mountains => ProviderTypeFilter("natural_feature"),
            Self::Cuisine => ProviderTypeFilter("restaurant"),
            Self::Hotels => ProviderTypeFilter("lodging"),
            Self::Other => ProviderTypeFilter::FALLBACK,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

/// Map a category label to the provider's type filter.
///
/// Case-insensitive and total: unrecognised labels return
/// [`ProviderTypeFilter::FALLBACK`].
#[must_use]
pub fn map_category(label: &str) -> ProviderTypeFilter {
    Category::from_label(label).type_filter()
}
