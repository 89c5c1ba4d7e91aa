//! Categorised nearby search around a free-text location.
//!
//! A request resolves the location text, maps the category label to a
//! provider type filter and runs one bounded-radius nearby search. Results
//! keep the provider's ranking with repeated place ids dropped.

use std::collections::HashSet;
use std::sync::Arc;

use vaycay_core::{DiscoveryError, NearbyRequest, PlaceSummary, PlacesProvider, map_category};

use crate::CoordinateResolver;

/// Default nearby search radius in metres.
pub const DEFAULT_RADIUS_METERS: u32 = 4_000;

/// Configuration for [`DiscoveryService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Nearby search radius in metres.
    pub radius_meters: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            radius_meters: DEFAULT_RADIUS_METERS,
        }
    }
}

impl DiscoveryConfig {
    /// Set the search radius.
    #[must_use]
    pub const fn with_radius_meters(mut self, radius_meters: u32) -> Self {
        self.radius_meters = radius_meters;
        self
    }
}

/// Finds places of a category near a location.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vaycay_core::PlaceSummary;
/// use vaycay_services::test_support::{StubGeocoder, StubPlaces};
/// use vaycay_services::{CoordinateResolver, DiscoveryService};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let geocoder = Arc::new(StubGeocoder::new().with_location("Seattle", 47.6, -122.3));
/// let places = Arc::new(
///     StubPlaces::new().with_nearby("beach", vec![PlaceSummary::new("p1", "Alki Beach")]),
/// );
/// let service = DiscoveryService::new(CoordinateResolver::new(geocoder), places);
///
/// let found = service.discover("Beaches", "Seattle").await.unwrap();
/// assert_eq!(found[0].name, "Alki Beach");
/// # });
/// ```
#[derive(Clone)]
pub struct DiscoveryService {
    resolver: CoordinateResolver,
    places: Arc<dyn PlacesProvider>,
    config: DiscoveryConfig,
}

impl std::fmt::Debug for DiscoveryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryService")
            .field("resolver", &self.resolver)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DiscoveryService {
    /// Create a service with the default radius.
    pub fn new(resolver: CoordinateResolver, places: Arc<dyn PlacesProvider>) -> Self {
        Self::with_config(resolver, places, DiscoveryConfig::default())
    }

    /// Create a service with explicit configuration.
    pub fn with_config(
        resolver: CoordinateResolver,
        places: Arc<dyn PlacesProvider>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            resolver,
            places,
            config,
        }
    }

    /// The resolver used for location text.
    #[must_use]
    pub fn resolver(&self) -> &CoordinateResolver {
        &self.resolver
    }

    /// Search for `category_label` places near `location_text`.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::LocationNotFound`] when the text does not resolve;
    ///   no search is made.
    /// - [`DiscoveryError::NoResults`] when the search returns nothing.
    /// - [`DiscoveryError::Upstream`] when the places provider fails.
    pub async fn discover(
        &self,
        category_label: &str,
        location_text: &str,
    ) -> Result<Vec<PlaceSummary>, DiscoveryError> {
        let center = self.resolver.resolve(location_text).await.map_err(|_| {
            DiscoveryError::LocationNotFound {
                location: location_text.to_owned(),
            }
        })?;
        let request = NearbyRequest {
            center,
            radius_meters: self.config.radius_meters,
            type_filter: map_category(category_label),
        };
        log::debug!(
            "nearby search for {} within {}m of {}",
            request.type_filter,
            request.radius_meters,
            center.to_query_pair()
        );

        let results = self.places.nearby_search(&request).await.inspect_err(|err| {
            log::warn!("nearby search near {location_text:?} failed: {err}");
        })?;
        let places = dedupe_by_id(results);
        if places.is_empty() {
            return Err(DiscoveryError::NoResults {
                category: category_label.to_owned(),
                location: location_text.to_owned(),
            });
        }
        log::info!(
            "found {} {} places near {location_text:?}",
            places.len(),
            request.type_filter
        );
        Ok(places)
    }
}

fn dedupe_by_id(places: Vec<PlaceSummary>) -> Vec<PlaceSummary> {
    let mut seen = HashSet::with_capacity(places.len());
    places
        .into_iter()
        .filter(|place| seen.insert(place.id.clone()))
        .collect()
}
