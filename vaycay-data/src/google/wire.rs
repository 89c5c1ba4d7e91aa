//! Google Maps web service response types.
//!
//! Only the fields the engine reads are declared. Every response carries a
//! `status` string; `OK` and `ZERO_RESULTS` are successes, anything else is
//! reported as [`ProviderError::Service`] with the accompanying
//! `error_message`.

use serde::Deserialize;
use vaycay_core::{Coordinate, PlaceDetail, PlaceSummary, ProviderError, Review};

const STATUS_OK: &str = "OK";
const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// Successful outcomes of a status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    Ok,
    ZeroResults,
}

pub(crate) fn check_status(status: &str, error_message: Option<String>) -> Result<Status, ProviderError> {
    match status {
        STATUS_OK => Ok(Status::Ok),
        STATUS_ZERO_RESULTS => Ok(Status::ZeroResults),
        other => Err(ProviderError::Service {
            status: other.to_owned(),
            message: error_message.unwrap_or_default(),
        }),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    fn to_coordinate(&self) -> Option<Coordinate> {
        Coordinate::new(self.lat, self.lng)
            .inspect_err(|err| log::debug!("dropping provider coordinate: {err}"))
            .ok()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Photo {
    pub photo_reference: Option<String>,
}

fn photo_refs(photos: Vec<Photo>) -> impl Iterator<Item = String> {
    photos.into_iter().filter_map(|photo| photo.photo_reference)
}

/// Geocoding API response.
#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    pub status: String,
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResult {
    pub geometry: Geometry,
}

impl GeocodeResponse {
    /// Candidate coordinates in provider order.
    pub fn into_coordinates(self) -> Result<Vec<Coordinate>, ProviderError> {
        if check_status(&self.status, self.error_message)? == Status::ZeroResults {
            return Ok(Vec::new());
        }
        Ok(self
            .results
            .iter()
            .filter_map(|result| result.geometry.location.to_coordinate())
            .collect())
    }
}

/// Nearby Search API response.
#[derive(Debug, Deserialize)]
pub(crate) struct NearbyResponse {
    pub status: String,
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<NearbyPlace>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NearbyPlace {
    pub place_id: Option<String>,
    pub name: Option<String>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub vicinity: Option<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    pub geometry: Option<Geometry>,
}

impl NearbyPlace {
    fn into_summary(self) -> Option<PlaceSummary> {
        let (Some(id), Some(name)) = (self.place_id, self.name) else {
            log::debug!("skipping nearby result without id or name");
            return None;
        };
        let location = self
            .geometry
            .and_then(|geometry| geometry.location.to_coordinate());
        Some(
            PlaceSummary::new(id, name)
                .with_rating(self.rating)
                .with_rating_count(self.user_ratings_total)
                .with_vicinity(self.vicinity)
                .with_primary_photo_ref(photo_refs(self.photos).next())
                .with_location(location),
        )
    }
}

impl NearbyResponse {
    /// Summaries in provider ranking order.
    pub fn into_summaries(self) -> Result<Vec<PlaceSummary>, ProviderError> {
        if check_status(&self.status, self.error_message)? == Status::ZeroResults {
            return Ok(Vec::new());
        }
        Ok(self
            .results
            .into_iter()
            .filter_map(NearbyPlace::into_summary)
            .collect())
    }
}

/// Place Details API response.
#[derive(Debug, Deserialize)]
pub(crate) struct DetailsResponse {
    pub status: String,
    pub error_message: Option<String>,
    pub result: Option<DetailsResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailsResult {
    pub name: Option<String>,
    pub rating: Option<f64>,
    pub vicinity: Option<String>,
    pub user_ratings_total: Option<u32>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub reviews: Vec<WireReview>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireReview {
    pub author_name: Option<String>,
    pub rating: Option<f64>,
    pub text: Option<String>,
}

impl DetailsResponse {
    /// The consolidated detail record.
    ///
    /// A details lookup names exactly one place, so `ZERO_RESULTS` and a
    /// missing `result` are failures here rather than empty answers.
    pub fn into_detail(self) -> Result<PlaceDetail, ProviderError> {
        if check_status(&self.status, self.error_message)? == Status::ZeroResults {
            return Err(ProviderError::Service {
                status: STATUS_ZERO_RESULTS.to_owned(),
                message: "no details for this place".to_owned(),
            });
        }
        let result = self.result.ok_or_else(|| ProviderError::Decode {
            message: "details response missing result".to_owned(),
        })?;
        let reviews = result
            .reviews
            .into_iter()
            .enumerate()
            .map(|(ordinal, review)| {
                Review::new(ordinal, review.author_name, review.rating, review.text)
            })
            .collect();
        Ok(PlaceDetail {
            name: result.name,
            rating: vaycay_core::normalise_rating(result.rating),
            vicinity: result.vicinity,
            rating_count: result.user_ratings_total,
            photo_refs: photo_refs(result.photos).collect(),
            reviews,
        })
    }
}

/// Place Autocomplete API response.
#[derive(Debug, Deserialize)]
pub(crate) struct PredictionsResponse {
    pub status: String,
    pub error_message: Option<String>,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Prediction {
    pub description: Option<String>,
}

impl PredictionsResponse {
    /// Prediction descriptions in provider order.
    pub fn into_suggestions(self) -> Result<Vec<String>, ProviderError> {
        if check_status(&self.status, self.error_message)? == Status::ZeroResults {
            return Ok(Vec::new());
        }
        Ok(self
            .predictions
            .into_iter()
            .filter_map(|prediction| prediction.description)
            .filter(|description| !description.trim().is_empty())
            .collect())
    }
}
