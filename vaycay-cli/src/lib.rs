//! Command-line harness for the Vaycay discovery pipeline.
//!
//! `vaycay discover` runs a categorised nearby search and resolves a display
//! image for every place; `vaycay details` fetches the consolidated record
//! for one place. Both print JSON to stdout.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use serde::Serialize;

mod details;
mod discover;
mod error;
mod providers;

pub use error::CliError;

use details::DetailsArgs;
use discover::DiscoverArgs;
use providers::HttpProviderFactory;

const ARG_CATEGORY: &str = "category";
const ARG_LOCATION: &str = "location";
const ARG_RADIUS_METERS: &str = "radius-meters";
const ARG_PLACE_ID: &str = "place-id";
const ARG_GOOGLE_API_KEY: &str = "google-api-key";
const ARG_UNSPLASH_ACCESS_KEY: &str = "unsplash-access-key";
const ENV_DISCOVER_CATEGORY: &str = "VAYCAY_CMDS_DISCOVER_CATEGORY";
const ENV_DISCOVER_LOCATION: &str = "VAYCAY_CMDS_DISCOVER_LOCATION";
const ENV_DISCOVER_GOOGLE_API_KEY: &str = "VAYCAY_CMDS_DISCOVER_GOOGLE_API_KEY";
const ENV_DISCOVER_UNSPLASH_ACCESS_KEY: &str = "VAYCAY_CMDS_DISCOVER_UNSPLASH_ACCESS_KEY";
const ENV_DETAILS_PLACE_ID: &str = "VAYCAY_CMDS_DETAILS_PLACE_ID";
const ENV_DETAILS_GOOGLE_API_KEY: &str = "VAYCAY_CMDS_DETAILS_GOOGLE_API_KEY";
const ENV_DETAILS_UNSPLASH_ACCESS_KEY: &str = "VAYCAY_CMDS_DETAILS_UNSPLASH_ACCESS_KEY";

/// Run the Vaycay CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, a
/// provider cannot be built, the command fails, or output cannot be written.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Discover(args) => {
            discover::run_discover(args, &HttpProviderFactory, &runtime, &mut stdout)
        }
        Command::Details(args) => {
            details::run_details(args, &HttpProviderFactory, &runtime, &mut stdout)
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "vaycay",
    about = "Discover places and resolve their images from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Find places of a category near a location.
    Discover(DiscoverArgs),
    /// Fetch the full record for one place.
    Details(DetailsArgs),
}

fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
