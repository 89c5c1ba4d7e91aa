//! Focused unit tests covering discover configuration and execution.

use super::helpers::{StubProviderFactory, credentials, runtime};
use super::*;
use crate::discover::{DiscoverArgs, DiscoverConfig, RenderedPlace, execute_discover, run_discover};
use crate::providers::{Credentials, HttpProviderFactory, ProviderFactory};
use rstest::{fixture, rstest};
use vaycay_core::DiscoveryError;
use vaycay_services::test_support::{StubGeocoder, StubImageSearch, StubPlaces};

#[fixture]
fn complete_args() -> DiscoverArgs {
    DiscoverArgs {
        category: Some("Beaches".into()),
        location: Some("Seattle".into()),
        radius_meters: None,
        google_api_key: Some("maps-key".into()),
        unsplash_access_key: Some("unsplash-key".into()),
    }
}

fn config(category: &str, location: &str) -> DiscoverConfig {
    DiscoverConfig {
        category: category.into(),
        location: location.into(),
        radius_meters: 4_000,
        credentials: credentials(),
    }
}

#[rstest]
#[case::category(ARG_CATEGORY, ENV_DISCOVER_CATEGORY)]
#[case::location(ARG_LOCATION, ENV_DISCOVER_LOCATION)]
#[case::google_key(ARG_GOOGLE_API_KEY, ENV_DISCOVER_GOOGLE_API_KEY)]
#[case::unsplash_key(ARG_UNSPLASH_ACCESS_KEY, ENV_DISCOVER_UNSPLASH_ACCESS_KEY)]
fn converting_without_required_fields_errors(
    complete_args: DiscoverArgs,
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let mut args = complete_args;
    match field {
        ARG_CATEGORY => args.category = None,
        ARG_LOCATION => args.location = None,
        ARG_GOOGLE_API_KEY => args.google_api_key = None,
        _ => args.unsplash_access_key = Some("   ".into()),
    }
    let err = DiscoverConfig::try_from(args).expect_err("missing field should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn radius_defaults_when_unset(complete_args: DiscoverArgs) {
    let config = DiscoverConfig::try_from(complete_args).expect("config should build");
    assert_eq!(config.radius_meters, 4_000);
    assert_eq!(config.category, "Beaches");
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "google_api_key": "from-file",
            "unsplash_access_key": "from-file",
            "radius_meters": 1500,
        }),
        None,
    );
    composer.push_environment(json!({
        "google_api_key": "from-env",
        "location": "Lisbon",
    }));
    composer.push_cli(json!({
        "category": "cuisine",
    }));

    let merged =
        DiscoverArgs::merge_from_layers(composer.layers()).expect("layers should merge");
    let config = DiscoverConfig::try_from(merged).expect("merged config should build");
    assert_eq!(config.category, "cuisine");
    assert_eq!(config.location, "Lisbon");
    assert_eq!(config.radius_meters, 1_500);
    assert_eq!(config.credentials.google_api_key, "from-env");
    assert_eq!(config.credentials.unsplash_access_key, "from-file");
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "radius_meters": "wide" }));

    let err = DiscoverArgs::merge_from_layers(composer.layers())
        .map_err(CliError::from)
        .expect_err("invalid layer should fail");
    assert!(matches!(err, CliError::Configuration(_)), "got {err:?}");
}

#[rstest]
fn execute_resolves_an_image_per_place() {
    let factory = StubProviderFactory::seattle_beaches();
    let places = execute_discover(&config("beaches", "Seattle"), &factory, &runtime())
        .expect("discovery succeeds");

    let tiers: Vec<&str> = places.iter().map(|p| p.image_tier.as_str()).collect();
    assert_eq!(tiers, ["primary", "secondary"]);
    assert_eq!(
        places.first().map(|p| p.image_url.as_str()),
        Some("https://photos.test/alki-ref")
    );
}

#[rstest]
fn execute_passes_the_radius_through() {
    let factory = StubProviderFactory::seattle_beaches();
    let mut wide = config("beaches", "Seattle");
    wide.radius_meters = 9_000;
    execute_discover(&wide, &factory, &runtime()).expect("discovery succeeds");
    let request = factory.places.last_request().expect("a nearby search ran");
    assert_eq!(request.radius_meters, 9_000);
}

#[rstest]
fn unknown_location_is_reported() {
    let factory = StubProviderFactory::new(
        StubGeocoder::new(),
        StubPlaces::new(),
        StubImageSearch::new(),
    );
    let err = execute_discover(&config("beaches", "Zzqqxx123"), &factory, &runtime())
        .expect_err("unknown location fails");
    assert!(
        matches!(err, CliError::Discovery(DiscoveryError::LocationNotFound { .. })),
        "got {err:?}"
    );
    assert_eq!(factory.places.nearby_calls(), 0);
}

#[rstest]
fn run_prints_json(complete_args: DiscoverArgs) {
    let factory = StubProviderFactory::seattle_beaches();
    let mut stdout = Vec::new();
    run_discover(complete_args, &factory, &runtime(), &mut stdout).expect("command succeeds");

    let printed: Vec<RenderedPlace> =
        serde_json::from_slice(&stdout).expect("output should be JSON");
    let ids: Vec<&str> = printed.iter().map(|p| p.place.id.as_str()).collect();
    assert_eq!(ids, ["A", "B"]);
}

#[rstest]
fn http_factory_rejects_blank_keys() {
    let blank = Credentials {
        google_api_key: " ".into(),
        unsplash_access_key: "unsplash-key".into(),
    };
    let Err(err) = HttpProviderFactory.build(&blank) else {
        panic!("blank key should be rejected");
    };
    assert!(
        matches!(err, CliError::BuildProvider { provider: "Google Maps", .. }),
        "got {err:?}"
    );
}

#[rstest]
fn http_factory_builds_clients_without_network() {
    assert!(HttpProviderFactory.build(&credentials()).is_ok());
}
