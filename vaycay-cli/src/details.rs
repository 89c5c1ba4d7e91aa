//! `details` command: the consolidated record for one place.

use std::io::Write;

use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;
use vaycay_core::PlaceDetail;
use vaycay_services::{DetailEnricher, ImageResolver};

use crate::discover::required;
use crate::providers::{Credentials, ProviderFactory};
use crate::{
    ARG_GOOGLE_API_KEY, ARG_PLACE_ID, ARG_UNSPLASH_ACCESS_KEY, CliError,
    ENV_DETAILS_GOOGLE_API_KEY, ENV_DETAILS_PLACE_ID, ENV_DETAILS_UNSPLASH_ACCESS_KEY, write_json,
};

/// CLI arguments for the `details` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Fetch name, rating, vicinity, photos and reviews for a \
                 single place id and resolve its photo gallery.",
    about = "Fetch the full record for one place"
)]
#[ortho_config(prefix = "VAYCAY")]
pub(crate) struct DetailsArgs {
    /// Provider place id, as printed by `discover`.
    #[arg(long = ARG_PLACE_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) place_id: Option<String>,
    /// Google Maps API key.
    #[arg(long = ARG_GOOGLE_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) google_api_key: Option<String>,
    /// Unsplash access key, used when the place has no photos.
    #[arg(long = ARG_UNSPLASH_ACCESS_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) unsplash_access_key: Option<String>,
}

impl DetailsArgs {
    pub(crate) fn into_config(self) -> Result<DetailsConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        DetailsConfig::try_from(merged)
    }
}

/// Resolved `details` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DetailsConfig {
    pub(crate) place_id: String,
    pub(crate) credentials: Credentials,
}

impl TryFrom<DetailsArgs> for DetailsConfig {
    type Error = CliError;

    fn try_from(args: DetailsArgs) -> Result<Self, Self::Error> {
        let place_id = required(args.place_id, ARG_PLACE_ID, ENV_DETAILS_PLACE_ID)?;
        let google_api_key = required(
            args.google_api_key,
            ARG_GOOGLE_API_KEY,
            ENV_DETAILS_GOOGLE_API_KEY,
        )?;
        let unsplash_access_key = required(
            args.unsplash_access_key,
            ARG_UNSPLASH_ACCESS_KEY,
            ENV_DETAILS_UNSPLASH_ACCESS_KEY,
        )?;
        Ok(Self {
            place_id,
            credentials: Credentials {
                google_api_key,
                unsplash_access_key,
            },
        })
    }
}

/// Detail record plus display URLs for its gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DetailReport {
    pub(crate) place_id: String,
    #[serde(flatten)]
    pub(crate) detail: PlaceDetail,
    pub(crate) gallery: Vec<String>,
}

pub(crate) fn run_details(
    args: DetailsArgs,
    factory: &dyn ProviderFactory,
    runtime: &Runtime,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let report = execute_details(&config, factory, runtime)?;
    write_json(writer, &report)
}

pub(crate) fn execute_details(
    config: &DetailsConfig,
    factory: &dyn ProviderFactory,
    runtime: &Runtime,
) -> Result<DetailReport, CliError> {
    let providers = factory.build(&config.credentials)?;
    let enricher = DetailEnricher::new(providers.places);
    let images = ImageResolver::new(providers.photos, providers.images);

    runtime.block_on(async {
        let detail = enricher.fetch_detail(&config.place_id).await?;
        let keyword = detail.name.as_deref().unwrap_or(&config.place_id);
        let gallery = images
            .resolve_gallery(&detail.photo_refs, keyword)
            .await
            .into_iter()
            .map(|image| image.url)
            .collect();
        Ok(DetailReport {
            place_id: config.place_id.trim().to_owned(),
            detail,
            gallery,
        })
    })
}
