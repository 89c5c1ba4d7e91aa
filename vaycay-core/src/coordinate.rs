//! Geographic coordinates produced by geocoding.

use thiserror::Error;

/// A WGS84 position in decimal degrees.
///
/// Values are plain `Copy` data; once built they are never mutated.
///
/// # Examples
///
/// ```
/// use vaycay_core::Coordinate;
///
/// # fn main() -> Result<(), vaycay_core::CoordinateError> {
/// let seattle = Coordinate::new(47.6, -122.3)?;
/// assert_eq!(seattle.latitude, 47.6);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    /// Latitude in degrees, `-90.0..=90.0`.
    pub latitude: f64,
    /// Longitude in degrees, `-180.0..=180.0`.
    pub longitude: f64,
}

/// Errors returned by [`Coordinate::new`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    /// Latitude was not finite or fell outside `-90.0..=90.0`.
    #[error("latitude {0} is outside -90..=90")]
    Latitude(f64),
    /// Longitude was not finite or fell outside `-180.0..=180.0`.
    #[error("longitude {0} is outside -180..=180")]
    Longitude(f64),
}

impl Coordinate {
    /// Validates and constructs a [`Coordinate`].
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] when either component is non-finite or
    /// out of range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Format as the `lat,lng` pair used by provider query strings.
    #[must_use]
    pub fn to_query_pair(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}
