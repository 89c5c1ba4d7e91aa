//! HTTP adapters for the vaycay collaborators.
//!
//! [`GoogleMapsClient`] implements geocoding, nearby search, place details
//! and photo URL construction against the Google Maps web services.
//! [`UnsplashClient`] implements keyword image search. Both decode provider
//! JSON into `vaycay-core` types at this boundary, so nothing above this
//! crate sees a wire format.
//!
//! Credentials travel as query parameters. Every URL that reaches a log line
//! or a [`vaycay_core::ProviderError`] has them replaced with `REDACTED`.

pub mod google;
mod http;
pub mod unsplash;

pub use google::{GoogleMapsClient, GoogleMapsConfig};
pub use http::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, ProviderBuildError};
pub use unsplash::{UnsplashClient, UnsplashConfig};
