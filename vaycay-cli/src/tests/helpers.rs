//! Stub providers and runtime helpers shared by the CLI tests.

use std::sync::Arc;

use tokio::runtime::Runtime;
use vaycay_core::PlaceSummary;
use vaycay_services::test_support::{StubGeocoder, StubImageSearch, StubPlaces};

use crate::providers::{Credentials, ProviderFactory, Providers};
use crate::CliError;

/// Factory handing out the same stub doubles for every build.
pub(super) struct StubProviderFactory {
    pub(super) geocoder: Arc<StubGeocoder>,
    pub(super) places: Arc<StubPlaces>,
    pub(super) images: Arc<StubImageSearch>,
}

impl StubProviderFactory {
    pub(super) fn new(geocoder: StubGeocoder, places: StubPlaces, images: StubImageSearch) -> Self {
        Self {
            geocoder: Arc::new(geocoder),
            places: Arc::new(places),
            images: Arc::new(images),
        }
    }

    /// Seattle geocodes and has two beaches, one with a photo.
    pub(super) fn seattle_beaches() -> Self {
        Self::new(
            StubGeocoder::new().with_location("Seattle", 47.6, -122.3),
            StubPlaces::new().with_nearby(
                "beach",
                vec![
                    PlaceSummary::new("A", "Alki Beach")
                        .with_primary_photo_ref(Some("alki-ref".into())),
                    PlaceSummary::new("B", "Golden Gardens"),
                ],
            ),
            StubImageSearch::new()
                .respond("Golden Gardens", Ok(vec!["https://img.test/golden".into()])),
        )
    }
}

impl ProviderFactory for StubProviderFactory {
    fn build(&self, _credentials: &Credentials) -> Result<Providers, CliError> {
        Ok(Providers {
            geocoder: self.geocoder.clone(),
            places: self.places.clone(),
            photos: self.places.clone(),
            images: self.images.clone(),
        })
    }
}

pub(super) fn credentials() -> Credentials {
    Credentials {
        google_api_key: "maps-key".into(),
        unsplash_access_key: "unsplash-key".into(),
    }
}

pub(super) fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime should build")
}
