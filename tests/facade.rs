//! The facade exposes everything needed to drive the services.

use rstest::rstest;
use vaycay_engine::{
    DiscoveryConfig, FavoritesView, FeedState, ImageConfig, MutationOutcome, ResolverConfig,
    SyncPhase,
};

#[rstest]
fn observer_types_start_empty() {
    assert_eq!(FeedState::default(), FeedState::Idle);
    let view = FavoritesView::default();
    assert_eq!(view.phase, SyncPhase::Uninitialized);
    assert!(!view.contains("p1"));
    assert_ne!(MutationOutcome::Applied, MutationOutcome::AlreadyPresent);
}

#[rstest]
fn configs_carry_documented_defaults() {
    assert_eq!(DiscoveryConfig::default().radius_meters, 4_000);
    assert_eq!(ImageConfig::default().gallery_limit, 5);
    assert!(ResolverConfig::default().capacity > 0);
}

#[cfg(feature = "http")]
#[rstest]
fn http_clients_are_reachable() {
    let config = vaycay_engine::GoogleMapsConfig::new("key");
    assert_eq!(config.photo_max_width, 400);
}
