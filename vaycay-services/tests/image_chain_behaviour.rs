//! Behavioural tests for the image tier chain.

use std::cell::RefCell;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::Runtime;
use vaycay_core::ProviderError;
use vaycay_services::test_support::{StubImageSearch, StubPlaces};
use vaycay_services::{ImageResolver, ImageTier, ResolvedImage};

const PIER: &str = "Pier 57";
const PIER_PHOTO: &str = "pier-ref";
const PIER_IMAGE: &str = "https://img.test/pier";

struct ImageWorld {
    runtime: Runtime,
    search: RefCell<Arc<StubImageSearch>>,
    resolver: RefCell<Option<ImageResolver>>,
    seen: RefCell<Vec<ResolvedImage>>,
}

impl ImageWorld {
    fn resolver(&self) -> ImageResolver {
        self.resolver
            .borrow_mut()
            .get_or_insert_with(|| {
                ImageResolver::new(Arc::new(StubPlaces::new()), self.search.borrow().clone())
            })
            .clone()
    }

    fn resolve(&self, primary_ref: Option<&str>) {
        let resolver = self.resolver();
        let image = self
            .runtime
            .block_on(resolver.resolve_image(primary_ref, PIER));
        self.seen.borrow_mut().push(image);
    }

    fn last(&self) -> ResolvedImage {
        self.seen
            .borrow()
            .last()
            .cloned()
            .expect("an image should be resolved")
    }
}

#[fixture]
fn world() -> ImageWorld {
    ImageWorld {
        runtime: tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime should build"),
        search: RefCell::new(Arc::new(StubImageSearch::new())),
        resolver: RefCell::new(None),
        seen: RefCell::new(Vec::new()),
    }
}

#[given("an image search that finds the pier")]
fn search_finds_pier(world: &ImageWorld) {
    world.search.replace(Arc::new(
        StubImageSearch::new().respond(PIER, Ok(vec![PIER_IMAGE.into()])),
    ));
}

#[given("an image search that fails once for the pier")]
fn search_fails_once(world: &ImageWorld) {
    world.search.replace(Arc::new(
        StubImageSearch::new()
            .respond(
                PIER,
                Err(ProviderError::Http {
                    url: "https://images.test/search".into(),
                    status: 503,
                    message: "unavailable".into(),
                }),
            )
            .respond(PIER, Ok(vec![PIER_IMAGE.into()])),
    ));
}

#[when("the pier image is resolved")]
fn resolve_once(world: &ImageWorld) {
    world.resolve(None);
}

#[when("the pier image is resolved twice")]
fn resolve_twice(world: &ImageWorld) {
    world.resolve(None);
    world.resolve(None);
}

#[when("the pier image is resolved with its photo")]
fn resolve_with_photo(world: &ImageWorld) {
    world.resolve(Some(PIER_PHOTO));
}

#[when("the renderer reports the pier photo as broken")]
fn report_broken(world: &ImageWorld) {
    world.resolver().report_primary_failure(PIER_PHOTO);
}

#[then("both resolutions give the keyword image")]
fn both_keyword(world: &ImageWorld) {
    let seen = world.seen.borrow();
    assert_eq!(seen.len(), 2);
    assert!(seen
        .iter()
        .all(|image| image.tier == ImageTier::Secondary && image.url == PIER_IMAGE));
}

#[then("the placeholder is shown")]
fn placeholder_shown(world: &ImageWorld) {
    assert_eq!(world.last(), world.resolver().placeholder());
}

#[then("the keyword image is shown")]
fn keyword_shown(world: &ImageWorld) {
    let image = world.last();
    assert_eq!(image.tier, ImageTier::Secondary);
    assert_eq!(image.url, PIER_IMAGE);
}

#[then("the image search was called once")]
fn searched_once(world: &ImageWorld) {
    assert_eq!(world.search.borrow().calls(), 1);
}

#[then("the image search was called twice")]
fn searched_twice(world: &ImageWorld) {
    assert_eq!(world.search.borrow().calls(), 2);
}

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/image_chain.feature", name = $title)]
        fn $fn_name(world: ImageWorld) {
            let _ = world;
        }
    };
}

register_scenario!(keyword_hit_reused, "A keyword hit is reused without another search");
register_scenario!(failed_search_retried, "A failed search falls back and is retried later");
register_scenario!(
    broken_photo_falls_back,
    "A broken provider photo falls back to the keyword image"
);
