//! Provider construction for CLI commands.

use std::sync::Arc;

use vaycay_core::{Geocoder, ImageSearchProvider, PhotoUrlBuilder, PlacesProvider};
use vaycay_data::{GoogleMapsClient, UnsplashClient};

use crate::CliError;

/// API credentials resolved from configuration.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct Credentials {
    pub(crate) google_api_key: String,
    pub(crate) unsplash_access_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

/// The collaborators a command needs.
pub(crate) struct Providers {
    pub(crate) geocoder: Arc<dyn Geocoder>,
    pub(crate) places: Arc<dyn PlacesProvider>,
    pub(crate) photos: Arc<dyn PhotoUrlBuilder>,
    pub(crate) images: Arc<dyn ImageSearchProvider>,
}

/// Builds providers for the current invocation.
pub(crate) trait ProviderFactory {
    fn build(&self, credentials: &Credentials) -> Result<Providers, CliError>;
}

/// Production factory backed by the HTTP clients.
pub(crate) struct HttpProviderFactory;

impl ProviderFactory for HttpProviderFactory {
    fn build(&self, credentials: &Credentials) -> Result<Providers, CliError> {
        let maps = Arc::new(
            GoogleMapsClient::new(credentials.google_api_key.clone()).map_err(|source| {
                CliError::BuildProvider {
                    provider: "Google Maps",
                    source,
                }
            })?,
        );
        let unsplash = UnsplashClient::new(credentials.unsplash_access_key.clone()).map_err(
            |source| CliError::BuildProvider {
                provider: "Unsplash",
                source,
            },
        )?;
        Ok(Providers {
            geocoder: maps.clone(),
            places: maps.clone(),
            photos: maps,
            images: Arc::new(unsplash),
        })
    }
}
