//! Behavioural tests for the favorites synchronizer.
//!
//! The in-memory store can hold writes open, which lets a scenario observe
//! the optimistic state before the remote outcome is known.

use std::cell::RefCell;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use vaycay_core::{FavoriteRecord, FavoritesError, UserId};
use vaycay_services::test_support::{MemoryFavoritesStore, WriteHold};
use vaycay_services::{FavoritesSynchronizer, MutationOutcome, SyncPhase};

type Outcome = Result<MutationOutcome, FavoritesError>;

struct FavoritesWorld {
    runtime: Runtime,
    user: UserId,
    store: Arc<MemoryFavoritesStore>,
    sync: FavoritesSynchronizer,
    hold: RefCell<Option<WriteHold>>,
    pending: RefCell<Option<JoinHandle<Outcome>>>,
    outcome: RefCell<Option<Outcome>>,
}

impl FavoritesWorld {
    fn wait_until(&self, condition: impl Fn(&vaycay_services::FavoritesView) -> bool) {
        let mut view = self.sync.subscribe();
        self.runtime.block_on(async {
            view.wait_for(|v| condition(v))
                .await
                .expect("synchronizer should stay alive");
        });
    }

    fn ids(&self) -> Vec<String> {
        self.sync.current().into_iter().map(|r| r.place_id).collect()
    }
}

fn record(id: &str) -> FavoriteRecord {
    FavoriteRecord::new(id, format!("Place {id}"))
}

#[fixture]
fn world() -> FavoritesWorld {
    let user = UserId::new("traveller");
    let store = Arc::new(MemoryFavoritesStore::new().with_records(&user, vec![record("A")]));
    FavoritesWorld {
        runtime: tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime should build"),
        sync: FavoritesSynchronizer::new(store.clone()),
        user,
        store,
        hold: RefCell::new(None),
        pending: RefCell::new(None),
        outcome: RefCell::new(None),
    }
}

// --- Given steps ---

#[given("a signed-in user whose favorites are synced")]
fn signed_in(world: &FavoritesWorld) {
    world
        .runtime
        .block_on(world.sync.start_session(world.user.clone()))
        .expect("session should start");
    world.wait_until(|v| v.phase == SyncPhase::Synced);
}

#[given("the favorites store is offline")]
fn store_offline(world: &FavoritesWorld) {
    world.store.set_offline(true);
}

// --- When steps ---

#[when("the user favorites P1 while the write is pending")]
fn favorite_pending(world: &FavoritesWorld) {
    let hold = world.runtime.block_on(world.store.hold_writes());
    world.hold.replace(Some(hold));
    let sync = world.sync.clone();
    let handle = world
        .runtime
        .spawn(async move { sync.add(record("P1")).await });
    world.pending.replace(Some(handle));
    world.wait_until(|v| v.contains("P1"));
}

#[when("the pending write finishes")]
fn pending_finishes(world: &FavoritesWorld) {
    world.hold.replace(None);
    let handle = world
        .pending
        .borrow_mut()
        .take()
        .expect("a write should be pending");
    let outcome = world
        .runtime
        .block_on(handle)
        .expect("mutation task should not panic");
    world.outcome.replace(Some(outcome));
}

#[when("the user favorites A")]
fn favorite_a(world: &FavoritesWorld) {
    let outcome = world.runtime.block_on(world.sync.add(record("A")));
    world.outcome.replace(Some(outcome));
}

#[when("the user unfavorites Z")]
fn unfavorite_z(world: &FavoritesWorld) {
    let outcome = world.runtime.block_on(world.sync.remove("Z"));
    world.outcome.replace(Some(outcome));
}

#[when("another device saves only C")]
fn remote_saves_c(world: &FavoritesWorld) {
    world.store.push_remote(&world.user, vec![record("C")]);
    world.wait_until(|v| v.contains("C"));
}

#[when("the user signs out")]
fn sign_out(world: &FavoritesWorld) {
    world.sync.end_session();
    // Let the aborted listener drop its subscription.
    world.runtime.block_on(async {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    });
}

// --- Then steps ---

#[then("P1 is shown as a favorite")]
fn p1_shown(world: &FavoritesWorld) {
    assert!(world.sync.contains("P1"));
}

#[then("P1 is not shown as a favorite")]
fn p1_hidden(world: &FavoritesWorld) {
    assert!(!world.sync.contains("P1"));
    assert_eq!(world.ids(), ["A"]);
}

#[then("the write failure is reported")]
fn write_failure(world: &FavoritesWorld) {
    let outcome = world.outcome.borrow();
    assert!(
        matches!(&*outcome, Some(Err(FavoritesError::WriteFailed { place_id, .. })) if place_id == "P1"),
        "expected WriteFailed, got {outcome:?}"
    );
}

#[then("the change is reported as already present")]
fn already_present(world: &FavoritesWorld) {
    assert_eq!(
        *world.outcome.borrow(),
        Some(Ok(MutationOutcome::AlreadyPresent))
    );
}

#[then("the change is reported as not present")]
fn not_present(world: &FavoritesWorld) {
    assert_eq!(*world.outcome.borrow(), Some(Ok(MutationOutcome::NotPresent)));
}

#[then("no remote write was made")]
fn no_write(world: &FavoritesWorld) {
    assert_eq!(world.store.writes(), 0);
}

#[then("the favorites are exactly C")]
fn exactly_c(world: &FavoritesWorld) {
    assert_eq!(world.ids(), ["C"]);
}

#[then("no favorites are shown")]
fn none_shown(world: &FavoritesWorld) {
    assert!(world.sync.current().is_empty());
    assert_eq!(world.sync.phase(), SyncPhase::Uninitialized);
}

#[then("the store has no subscribers")]
fn no_subscribers(world: &FavoritesWorld) {
    assert_eq!(world.store.subscriber_count(&world.user), 0);
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/favorites.feature", name = $title)]
        fn $fn_name(world: FavoritesWorld) {
            let _ = world;
        }
    };
}

register_scenario!(
    offline_favorite_reverts,
    "Favoriting while offline shows the place then reverts"
);
register_scenario!(duplicate_favorite, "Favoriting a place twice writes once");
register_scenario!(unknown_unfavorite, "Unfavoriting an unknown place is a no-op");
register_scenario!(remote_replacement, "Another device replaces the set");
register_scenario!(sign_out_clears, "Signing out clears the set");
