//! `discover` command: categorised nearby search with resolved images.

use std::io::Write;

use clap::Parser;
use futures_util::future::join_all;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;
use vaycay_core::PlaceSummary;
use vaycay_services::discovery::DEFAULT_RADIUS_METERS;
use vaycay_services::{
    CoordinateResolver, DiscoveryConfig, DiscoveryService, ImageResolver, ResolvedImage,
};

use crate::providers::{Credentials, ProviderFactory};
use crate::{
    ARG_CATEGORY, ARG_GOOGLE_API_KEY, ARG_LOCATION, ARG_RADIUS_METERS, ARG_UNSPLASH_ACCESS_KEY,
    CliError, ENV_DISCOVER_CATEGORY, ENV_DISCOVER_GOOGLE_API_KEY, ENV_DISCOVER_LOCATION,
    ENV_DISCOVER_UNSPLASH_ACCESS_KEY, write_json,
};

/// CLI arguments for the `discover` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Search for places of a category near a free-text location \
                 and resolve a display image for each one. Credentials can \
                 come from CLI flags, configuration files, or environment \
                 variables.",
    about = "Find places of a category near a location"
)]
#[ortho_config(prefix = "VAYCAY")]
pub(crate) struct DiscoverArgs {
    /// Category label, e.g. "beaches" or "cuisine".
    #[arg(long = ARG_CATEGORY, value_name = "label")]
    #[serde(default)]
    pub(crate) category: Option<String>,
    /// Free-text location, e.g. "Seattle".
    #[arg(long = ARG_LOCATION, value_name = "text")]
    #[serde(default)]
    pub(crate) location: Option<String>,
    /// Search radius in metres.
    #[arg(long = ARG_RADIUS_METERS, value_name = "metres")]
    #[serde(default)]
    pub(crate) radius_meters: Option<u32>,
    /// Google Maps API key.
    #[arg(long = ARG_GOOGLE_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) google_api_key: Option<String>,
    /// Unsplash access key for keyword image search.
    #[arg(long = ARG_UNSPLASH_ACCESS_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) unsplash_access_key: Option<String>,
}

impl DiscoverArgs {
    pub(crate) fn into_config(self) -> Result<DiscoverConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        DiscoverConfig::try_from(merged)
    }
}

/// Resolved `discover` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DiscoverConfig {
    pub(crate) category: String,
    pub(crate) location: String,
    pub(crate) radius_meters: u32,
    pub(crate) credentials: Credentials,
}

pub(crate) fn required(
    value: Option<String>,
    field: &'static str,
    env: &'static str,
) -> Result<String, CliError> {
    value
        .filter(|text| !text.trim().is_empty())
        .ok_or(CliError::MissingArgument { field, env })
}

impl TryFrom<DiscoverArgs> for DiscoverConfig {
    type Error = CliError;

    fn try_from(args: DiscoverArgs) -> Result<Self, Self::Error> {
        let category = required(args.category, ARG_CATEGORY, ENV_DISCOVER_CATEGORY)?;
        let location = required(args.location, ARG_LOCATION, ENV_DISCOVER_LOCATION)?;
        let google_api_key = required(
            args.google_api_key,
            ARG_GOOGLE_API_KEY,
            ENV_DISCOVER_GOOGLE_API_KEY,
        )?;
        let unsplash_access_key = required(
            args.unsplash_access_key,
            ARG_UNSPLASH_ACCESS_KEY,
            ENV_DISCOVER_UNSPLASH_ACCESS_KEY,
        )?;
        Ok(Self {
            category,
            location,
            radius_meters: args.radius_meters.unwrap_or(DEFAULT_RADIUS_METERS),
            credentials: Credentials {
                google_api_key,
                unsplash_access_key,
            },
        })
    }
}

/// One discovered place with the image chosen for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RenderedPlace {
    #[serde(flatten)]
    pub(crate) place: PlaceSummary,
    pub(crate) image_url: String,
    pub(crate) image_tier: String,
}

impl RenderedPlace {
    fn new(place: PlaceSummary, image: ResolvedImage) -> Self {
        Self {
            place,
            image_url: image.url,
            image_tier: image.tier.as_str().to_owned(),
        }
    }
}

pub(crate) fn run_discover(
    args: DiscoverArgs,
    factory: &dyn ProviderFactory,
    runtime: &Runtime,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let places = execute_discover(&config, factory, runtime)?;
    write_json(writer, &places)
}

pub(crate) fn execute_discover(
    config: &DiscoverConfig,
    factory: &dyn ProviderFactory,
    runtime: &Runtime,
) -> Result<Vec<RenderedPlace>, CliError> {
    let providers = factory.build(&config.credentials)?;
    let service = DiscoveryService::with_config(
        CoordinateResolver::new(providers.geocoder),
        providers.places,
        DiscoveryConfig::default().with_radius_meters(config.radius_meters),
    );
    let images = ImageResolver::new(providers.photos, providers.images);

    runtime.block_on(async {
        let places = service
            .discover(&config.category, &config.location)
            .await?;
        log::info!(
            "found {} {} near {}",
            places.len(),
            config.category,
            config.location
        );
        let resolved = join_all(places.iter().map(|place| {
            images.resolve_image(place.primary_photo_ref.as_deref(), &place.name)
        }))
        .await;
        Ok(places
            .into_iter()
            .zip(resolved)
            .map(|(place, image)| RenderedPlace::new(place, image))
            .collect())
    })
}
