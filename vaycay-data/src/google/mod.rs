//! Google Maps geocoding and places client.
//!
//! [`GoogleMapsClient`] implements [`Geocoder`], [`PlacesProvider`],
//! [`PhotoUrlBuilder`] and [`AutocompleteProvider`] against the Geocoding,
//! Nearby Search, Place Details, Place Photo and Place Autocomplete
//! endpoints.
//!
//! # Example
//!
//! ```no_run
//! use vaycay_core::Geocoder;
//! use vaycay_data::GoogleMapsClient;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let maps = GoogleMapsClient::new("api-key")?;
//! let candidates = maps.geocode("Seattle").await?;
//! # Ok(())
//! # }
//! ```

mod wire;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;
use vaycay_core::{
    AutocompleteProvider, Coordinate, DetailField, Geocoder, NearbyRequest, PhotoUrlBuilder,
    PlaceDetail, PlaceSummary, PlacesProvider, ProviderError,
};

use crate::http::{
    self, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, ProviderBuildError, build_client, endpoint,
    parse_base_url, require_credential,
};
use wire::{DetailsResponse, GeocodeResponse, NearbyResponse, PredictionsResponse};

/// Default Google Maps web service root.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Default `maxwidth` for place photo URLs.
pub const DEFAULT_PHOTO_MAX_WIDTH: u32 = 400;

/// Autocomplete restricted to cities, regions and countries.
const AUTOCOMPLETE_TYPES: &str = "(regions)";

/// Configuration for [`GoogleMapsClient`].
#[derive(Clone)]
pub struct GoogleMapsConfig {
    /// API key sent as the `key` query parameter.
    pub api_key: String,
    /// Web service root, e.g. [`DEFAULT_BASE_URL`].
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// `maxwidth` requested for photo URLs.
    pub photo_max_width: u32,
}

impl std::fmt::Debug for GoogleMapsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleMapsConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("photo_max_width", &self.photo_max_width)
            .finish()
    }
}

impl Default for GoogleMapsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            photo_max_width: DEFAULT_PHOTO_MAX_WIDTH,
        }
    }
}

impl GoogleMapsConfig {
    /// Create a configuration for `api_key` with default endpoints.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Point the client at a different web service root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the photo `maxwidth`.
    #[must_use]
    pub const fn with_photo_max_width(mut self, width: u32) -> Self {
        self.photo_max_width = width;
        self
    }
}

/// HTTP client for the Google Maps web services.
///
/// Holds one connection pool; clone the surrounding `Arc` rather than the
/// client to share it between services.
pub struct GoogleMapsClient {
    client: Client,
    base: Url,
    config: GoogleMapsConfig,
}

impl std::fmt::Debug for GoogleMapsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleMapsClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GoogleMapsClient {
    /// Create a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(GoogleMapsConfig::new(api_key))
    }

    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank, the base URL is unusable, or
    /// the HTTP client fails to build.
    pub fn with_config(config: GoogleMapsConfig) -> Result<Self, ProviderBuildError> {
        require_credential(&config.api_key, "Google Maps API key")?;
        let base = parse_base_url(&config.base_url)?;
        let client = build_client(&config.user_agent, config.timeout)?;
        Ok(Self {
            client,
            base,
            config,
        })
    }

    /// Build an endpoint URL with `params` followed by the API key.
    fn url(&self, path: &str, params: &[(&str, &str)]) -> Url {
        let mut url = endpoint(&self.base, path);
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("key", &self.config.api_key);
        url
    }

    fn geocode_url(&self, text: &str) -> Url {
        self.url("geocode/json", &[("address", text)])
    }

    fn nearby_url(&self, request: &NearbyRequest) -> Url {
        let location = request.center.to_query_pair();
        let radius = request.radius_meters.to_string();
        self.url(
            "place/nearbysearch/json",
            &[
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("type", request.type_filter.as_str()),
            ],
        )
    }

    fn details_url(&self, place_id: &str, fields: &[DetailField]) -> Url {
        let fields = fields
            .iter()
            .map(DetailField::as_str)
            .collect::<Vec<_>>()
            .join(",");
        self.url(
            "place/details/json",
            &[("place_id", place_id), ("fields", fields.as_str())],
        )
    }

    fn autocomplete_url(&self, input: &str) -> Url {
        self.url(
            "place/autocomplete/json",
            &[("input", input), ("types", AUTOCOMPLETE_TYPES)],
        )
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, ProviderError> {
        let response = http::send(&self.client, url, self.config.timeout).await?;
        http::decode(response).await
    }
}

#[async_trait]
impl Geocoder for GoogleMapsClient {
    async fn geocode(&self, text: &str) -> Result<Vec<Coordinate>, ProviderError> {
        let response: GeocodeResponse = self.get(self.geocode_url(text)).await?;
        response.into_coordinates()
    }
}

#[async_trait]
impl PlacesProvider for GoogleMapsClient {
    async fn nearby_search(
        &self,
        request: &NearbyRequest,
    ) -> Result<Vec<PlaceSummary>, ProviderError> {
        let response: NearbyResponse = self.get(self.nearby_url(request)).await?;
        let places = response.into_summaries()?;
        log::debug!(
            "nearby search for {} returned {} places",
            request.type_filter,
            places.len()
        );
        Ok(places)
    }

    async fn place_details(
        &self,
        place_id: &str,
        fields: &[DetailField],
    ) -> Result<PlaceDetail, ProviderError> {
        let response: DetailsResponse = self.get(self.details_url(place_id, fields)).await?;
        response.into_detail()
    }
}

impl PhotoUrlBuilder for GoogleMapsClient {
    fn photo_url(&self, photo_ref: &str) -> String {
        let width = self.config.photo_max_width.to_string();
        self.url(
            "place/photo",
            &[("maxwidth", width.as_str()), ("photoreference", photo_ref)],
        )
        .into()
    }
}

#[async_trait]
impl AutocompleteProvider for GoogleMapsClient {
    async fn suggest_destinations(&self, input: &str) -> Result<Vec<String>, ProviderError> {
        let response: PredictionsResponse = self.get(self.autocomplete_url(input)).await?;
        response.into_suggestions()
    }
}
