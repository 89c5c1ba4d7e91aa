//! Latest-wins wrapper around [`DiscoveryService`] for one query slot.
//!
//! A screen that lets the user change category or location issues a new
//! discovery each time. Requests may finish out of order, so each takes a
//! ticket and only the newest ticket may publish its result.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use vaycay_core::{DiscoveryError, PlaceSummary};

use crate::DiscoveryService;

/// What observers of a [`DiscoveryFeed`] see.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FeedState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// The newest request is in flight.
    Loading {
        /// Category label of the request.
        category: String,
        /// Location text of the request.
        location: String,
    },
    /// The newest request succeeded.
    Loaded(Vec<PlaceSummary>),
    /// The newest request failed.
    Failed(DiscoveryError),
}

/// What the caller of [`DiscoveryFeed::load`] gets back.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedOutcome {
    /// This request was the newest when it finished and was published.
    Completed(Result<Vec<PlaceSummary>, DiscoveryError>),
    /// A newer request started first; this result was discarded.
    Superseded,
}

/// One discovery slot whose published state always reflects the most
/// recently started request.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vaycay_core::PlaceSummary;
/// use vaycay_services::test_support::{StubGeocoder, StubPlaces};
/// use vaycay_services::{CoordinateResolver, DiscoveryFeed, DiscoveryService, FeedState};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let geocoder = Arc::new(StubGeocoder::new().with_location("Seattle", 47.6, -122.3));
/// let places = Arc::new(
///     StubPlaces::new().with_nearby("lodging", vec![PlaceSummary::new("h1", "Hotel Max")]),
/// );
/// let feed = DiscoveryFeed::new(DiscoveryService::new(CoordinateResolver::new(geocoder), places));
///
/// feed.load("Hotels", "Seattle").await;
/// assert!(matches!(feed.state(), FeedState::Loaded(found) if found.len() == 1));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct DiscoveryFeed {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    service: DiscoveryService,
    latest: AtomicU64,
    state: watch::Sender<FeedState>,
}

impl DiscoveryFeed {
    /// Create an idle feed.
    pub fn new(service: DiscoveryService) -> Self {
        let (state, _) = watch::channel(FeedState::Idle);
        Self {
            inner: Arc::new(Inner {
                service,
                latest: AtomicU64::new(0),
                state,
            }),
        }
    }

    /// Current published state.
    #[must_use]
    pub fn state(&self) -> FeedState {
        self.inner.state.borrow().clone()
    }

    /// Follow published state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.inner.state.subscribe()
    }

    /// Run a discovery and publish its result unless a newer one started.
    pub async fn load(&self, category_label: &str, location_text: &str) -> FeedOutcome {
        let ticket = self.inner.take_ticket();
        self.inner.publish(ticket, || FeedState::Loading {
            category: category_label.to_owned(),
            location: location_text.to_owned(),
        });

        let result = self
            .inner
            .service
            .discover(category_label, location_text)
            .await;

        let published = self.inner.publish(ticket, || match &result {
            Ok(places) => FeedState::Loaded(places.clone()),
            Err(err) => FeedState::Failed(err.clone()),
        });
        if published {
            FeedOutcome::Completed(result)
        } else {
            log::debug!("discarding superseded discovery for {category_label:?} near {location_text:?}");
            FeedOutcome::Superseded
        }
    }
}

impl Inner {
    fn take_ticket(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replace the published state if `ticket` is still the newest.
    ///
    /// The ticket comparison and the write happen under the channel's lock,
    /// so a stale request can never overwrite a newer one's state.
    fn publish(&self, ticket: u64, next: impl FnOnce() -> FeedState) -> bool {
        self.state.send_if_modified(|state| {
            if self.latest.load(Ordering::SeqCst) != ticket {
                return false;
            }
            *state = next();
            true
        })
    }
}
