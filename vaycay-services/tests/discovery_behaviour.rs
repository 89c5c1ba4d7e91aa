//! Behavioural tests for discovery and image rendering end to end.
//!
//! Steps are synchronous, so each scenario owns a current-thread runtime and
//! drives the async services with `block_on`.

use std::cell::RefCell;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::Runtime;
use vaycay_core::{DiscoveryError, PlaceSummary};
use vaycay_services::test_support::{StubGeocoder, StubImageSearch, StubPlaces};
use vaycay_services::{
    CoordinateResolver, DiscoveryService, ImageResolver, ImageTier, ResolvedImage,
};

type Outcome = Result<Vec<PlaceSummary>, DiscoveryError>;

struct DiscoveryWorld {
    runtime: Runtime,
    geocoder: RefCell<Arc<StubGeocoder>>,
    places: RefCell<Arc<StubPlaces>>,
    images: RefCell<Arc<StubImageSearch>>,
    outcome: RefCell<Option<Outcome>>,
    rendered: RefCell<Vec<ResolvedImage>>,
}

impl DiscoveryWorld {
    fn service(&self) -> DiscoveryService {
        let geocoder = self.geocoder.borrow().clone();
        let places = self.places.borrow().clone();
        DiscoveryService::new(CoordinateResolver::new(geocoder), places)
    }

    fn places(&self) -> Vec<PlaceSummary> {
        match &*self.outcome.borrow() {
            Some(Ok(places)) => places.clone(),
            other => panic!("expected places, got {other:?}"),
        }
    }

    fn rendered(&self, index: usize) -> ResolvedImage {
        self.rendered
            .borrow()
            .get(index)
            .cloned()
            .expect("place should be rendered")
    }
}

#[fixture]
fn world() -> DiscoveryWorld {
    DiscoveryWorld {
        runtime: tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime should build"),
        geocoder: RefCell::new(Arc::new(StubGeocoder::new())),
        places: RefCell::new(Arc::new(StubPlaces::new())),
        images: RefCell::new(Arc::new(StubImageSearch::new())),
        outcome: RefCell::new(None),
        rendered: RefCell::new(Vec::new()),
    }
}

fn unquote(text: &str) -> &str {
    text.trim_matches('"')
}

// --- Given steps ---

#[given("a geocoder that knows Seattle")]
fn geocoder_knows_seattle(world: &DiscoveryWorld) {
    world
        .geocoder
        .replace(Arc::new(StubGeocoder::new().with_location("Seattle", 47.6, -122.3)));
}

#[given("three ranked beaches near Seattle")]
fn three_beaches(world: &DiscoveryWorld) {
    let beaches = vec![
        PlaceSummary::new("A", "Alki Beach").with_primary_photo_ref(Some("alki-ref".into())),
        PlaceSummary::new("B", "Golden Gardens"),
        PlaceSummary::new("C", "Hidden Cove"),
    ];
    world
        .places
        .replace(Arc::new(StubPlaces::new().with_nearby("beach", beaches)));
}

#[given("an image search that only finds Golden Gardens")]
fn image_search_finds_one(world: &DiscoveryWorld) {
    world.images.replace(Arc::new(
        StubImageSearch::new()
            .respond("Golden Gardens", Ok(vec!["https://img.test/golden".into()]))
            .respond("Hidden Cove", Ok(Vec::new())),
    ));
}

// --- When steps ---

#[when("I discover {category:word} near {location:word}")]
fn discover(world: &DiscoveryWorld, category: String, location: String) {
    let service = world.service();
    let outcome = world
        .runtime
        .block_on(service.discover(unquote(&category), unquote(&location)));
    world.outcome.replace(Some(outcome));
}

#[when("two discoveries for {category:word} near {location:word} run at once")]
fn discover_twice(world: &DiscoveryWorld, category: String, location: String) {
    let service = world.service();
    let (category, location) = (unquote(&category), unquote(&location));
    let (first, second) = world.runtime.block_on(async {
        tokio::join!(
            service.discover(category, location),
            service.discover(category, location),
        )
    });
    assert_eq!(first, second, "both callers see the same outcome");
    world.outcome.replace(Some(first));
}

#[when("the places are rendered")]
fn render(world: &DiscoveryWorld) {
    let search = world.images.borrow().clone();
    let photos = world.places.borrow().clone();
    let resolver = ImageResolver::new(photos, search);
    let places = world.places();
    let rendered = world.runtime.block_on(async {
        let mut rendered = Vec::with_capacity(places.len());
        for place in &places {
            rendered.push(
                resolver
                    .resolve_image(place.primary_photo_ref.as_deref(), &place.name)
                    .await,
            );
        }
        rendered
    });
    world.rendered.replace(rendered);
}

// --- Then steps ---

#[then("the places are returned in the order {order:word}")]
fn places_in_order(world: &DiscoveryWorld, order: String) {
    let ids: Vec<String> = world.places().into_iter().map(|p| p.id).collect();
    let expected: Vec<&str> = unquote(&order).split(',').collect();
    assert_eq!(ids, expected);
}

#[then("place A uses its provider photo")]
fn a_uses_photo(world: &DiscoveryWorld) {
    let image = world.rendered(0);
    assert_eq!(image.tier, ImageTier::Primary);
    assert_eq!(image.url, "https://photos.test/alki-ref");
}

#[then("place B uses a keyword image")]
fn b_uses_keyword(world: &DiscoveryWorld) {
    let image = world.rendered(1);
    assert_eq!(image.tier, ImageTier::Secondary);
    assert_eq!(image.url, "https://img.test/golden");
}

#[then("place C uses the placeholder")]
fn c_uses_placeholder(world: &DiscoveryWorld) {
    assert_eq!(world.rendered(2).tier, ImageTier::Placeholder);
}

#[then("the location is reported as not found")]
fn location_not_found(world: &DiscoveryWorld) {
    let outcome = world.outcome.borrow();
    assert!(
        matches!(&*outcome, Some(Err(DiscoveryError::LocationNotFound { .. }))),
        "expected LocationNotFound, got {outcome:?}"
    );
}

#[then("no nearby search was made")]
fn no_nearby_search(world: &DiscoveryWorld) {
    assert_eq!(world.places.borrow().nearby_calls(), 0);
}

#[then("the geocoder was called once")]
fn geocoder_called_once(world: &DiscoveryWorld) {
    assert_eq!(world.geocoder.borrow().calls(), 1);
}

#[then("no results are reported")]
fn no_results(world: &DiscoveryWorld) {
    let outcome = world.outcome.borrow();
    assert!(
        matches!(&*outcome, Some(Err(DiscoveryError::NoResults { .. }))),
        "expected NoResults, got {outcome:?}"
    );
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/discovery.feature", name = $title)]
        fn $fn_name(world: DiscoveryWorld) {
            let _ = world;
        }
    };
}

register_scenario!(
    rendering_beaches,
    "Rendering beaches near Seattle through every image tier"
);
register_scenario!(
    unknown_location,
    "An unknown location never reaches the places provider"
);
register_scenario!(
    shared_geocoding,
    "Simultaneous discoveries share one geocoding request"
);
register_scenario!(empty_category, "A category with nothing nearby");
