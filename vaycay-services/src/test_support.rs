//! In-memory collaborators for unit and behaviour tests.
//!
//! Every stub counts its calls so tests can assert on caching and request
//! sharing. Async stubs yield once before answering, which gives concurrent
//! callers a chance to pile up on the same key.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock, mpsc};
use vaycay_core::{
    AutocompleteProvider, Coordinate, DetailField, FavoriteRecord, FavoritesStore, Geocoder, ImageSearchProvider,
    NearbyRequest, PhotoUrlBuilder, PlaceDetail, PlaceSummary, PlacesProvider, PreferencesStore,
    ProviderError, SnapshotReceiver, SnapshotSender, UserId,
};

use crate::{lock, normalise_key};

fn offline(target: &str) -> ProviderError {
    ProviderError::Network {
        url: format!("memory://{target}"),
        message: "offline".into(),
    }
}

/// Geocoder answering from a fixed table keyed by normalised text.
///
/// # Examples
///
/// ```
/// use vaycay_core::Geocoder;
/// use vaycay_services::test_support::StubGeocoder;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let geocoder = StubGeocoder::new().with_location("Lisbon", 38.72, -9.14);
/// let hits = geocoder.geocode(" lisbon").await.unwrap();
/// assert_eq!(hits.len(), 1);
/// assert!(geocoder.geocode("Atlantis").await.unwrap().is_empty());
/// assert_eq!(geocoder.calls(), 2);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct StubGeocoder {
    locations: HashMap<String, Vec<Coordinate>>,
    failure: Option<ProviderError>,
    calls: AtomicUsize,
}

impl StubGeocoder {
    /// Empty table: every lookup returns no candidates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Geocoder whose every call fails with `err`.
    #[must_use]
    pub fn failing(err: ProviderError) -> Self {
        Self {
            failure: Some(err),
            ..Self::default()
        }
    }

    /// Add a candidate for `text`.
    #[must_use]
    pub fn with_location(mut self, text: &str, latitude: f64, longitude: f64) -> Self {
        self.locations
            .entry(normalise_key(text))
            .or_default()
            .push(Coordinate {
                latitude,
                longitude,
            });
        self
    }

    /// Number of `geocode` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, text: &str) -> Result<Vec<Coordinate>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self
            .locations
            .get(&normalise_key(text))
            .cloned()
            .unwrap_or_default())
    }
}

/// Places provider with canned nearby results per type filter and canned
/// details per place id.
///
/// Photo URLs are built as `https://photos.test/{ref}`.
#[derive(Debug, Default)]
pub struct StubPlaces {
    nearby: HashMap<String, Result<Vec<PlaceSummary>, ProviderError>>,
    details: HashMap<String, Result<PlaceDetail, ProviderError>>,
    nearby_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    last_request: Mutex<Option<NearbyRequest>>,
    last_fields: Mutex<Vec<DetailField>>,
}

impl StubPlaces {
    /// Provider with no canned answers: searches are empty, details fail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer searches for `type_filter` with `places`.
    #[must_use]
    pub fn with_nearby(mut self, type_filter: &str, places: Vec<PlaceSummary>) -> Self {
        self.nearby.insert(type_filter.to_owned(), Ok(places));
        self
    }

    /// Fail searches for `type_filter` with `err`.
    #[must_use]
    pub fn with_nearby_error(mut self, type_filter: &str, err: ProviderError) -> Self {
        self.nearby.insert(type_filter.to_owned(), Err(err));
        self
    }

    /// Answer detail requests for `place_id` with `detail`.
    #[must_use]
    pub fn with_detail(mut self, place_id: &str, detail: PlaceDetail) -> Self {
        self.details.insert(place_id.to_owned(), Ok(detail));
        self
    }

    /// Fail detail requests for `place_id` with `err`.
    #[must_use]
    pub fn with_detail_error(mut self, place_id: &str, err: ProviderError) -> Self {
        self.details.insert(place_id.to_owned(), Err(err));
        self
    }

    /// Number of nearby searches so far.
    pub fn nearby_calls(&self) -> usize {
        self.nearby_calls.load(Ordering::SeqCst)
    }

    /// Number of detail requests so far.
    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    /// The most recent nearby request.
    pub fn last_request(&self) -> Option<NearbyRequest> {
        *lock(&self.last_request)
    }

    /// Fields asked for by the most recent detail request.
    pub fn last_fields(&self) -> Vec<DetailField> {
        lock(&self.last_fields).clone()
    }
}

#[async_trait]
impl PlacesProvider for StubPlaces {
    async fn nearby_search(
        &self,
        request: &NearbyRequest,
    ) -> Result<Vec<PlaceSummary>, ProviderError> {
        self.nearby_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_request) = Some(*request);
        tokio::task::yield_now().await;
        self.nearby
            .get(request.type_filter.as_str())
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn place_details(
        &self,
        place_id: &str,
        fields: &[DetailField],
    ) -> Result<PlaceDetail, ProviderError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_fields) = fields.to_vec();
        tokio::task::yield_now().await;
        self.details.get(place_id).cloned().unwrap_or_else(|| {
            Err(ProviderError::Service {
                status: "NOT_FOUND".into(),
                message: format!("no place {place_id}"),
            })
        })
    }
}

impl PhotoUrlBuilder for StubPlaces {
    fn photo_url(&self, photo_ref: &str) -> String {
        format!("https://photos.test/{photo_ref}")
    }
}

/// Autocomplete answering from a fixed table keyed by normalised input.
#[derive(Debug, Default)]
pub struct StubAutocomplete {
    predictions: HashMap<String, Vec<String>>,
    failure: Option<ProviderError>,
    calls: AtomicUsize,
}

impl StubAutocomplete {
    /// Empty table: every input has no suggestions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Autocomplete whose every call fails with `err`.
    #[must_use]
    pub fn failing(err: ProviderError) -> Self {
        Self {
            failure: Some(err),
            ..Self::default()
        }
    }

    /// Answer `input` with `suggestions`.
    #[must_use]
    pub fn with_predictions(mut self, input: &str, suggestions: &[&str]) -> Self {
        self.predictions.insert(
            normalise_key(input),
            suggestions.iter().map(|s| (*s).to_owned()).collect(),
        );
        self
    }

    /// Number of `suggest_destinations` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AutocompleteProvider for StubAutocomplete {
    async fn suggest_destinations(&self, input: &str) -> Result<Vec<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self
            .predictions
            .get(&normalise_key(input))
            .cloned()
            .unwrap_or_default())
    }
}

/// Image search with a scripted queue of answers per keyword.
///
/// Each call pops the next scripted answer; the last one repeats. Keywords
/// without a script return no images.
#[derive(Debug, Default)]
pub struct StubImageSearch {
    script: Mutex<HashMap<String, VecDeque<Result<Vec<String>, ProviderError>>>>,
    calls: AtomicUsize,
}

impl StubImageSearch {
    /// Search with no scripted answers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `answer` for `keyword`.
    #[must_use]
    pub fn respond(self, keyword: &str, answer: Result<Vec<String>, ProviderError>) -> Self {
        self.push(keyword, answer);
        self
    }

    /// Queue `answer` for `keyword` on a shared stub.
    pub fn push(&self, keyword: &str, answer: Result<Vec<String>, ProviderError>) {
        lock(&self.script)
            .entry(normalise_key(keyword))
            .or_default()
            .push_back(answer);
    }

    /// Number of searches so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageSearchProvider for StubImageSearch {
    async fn search_images(&self, keyword: &str) -> Result<Vec<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let mut script = lock(&self.script);
        let Some(queue) = script.get_mut(&normalise_key(keyword)) else {
            return Ok(Vec::new());
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_else(|| Ok(Vec::new()))
        } else {
            queue.front().cloned().unwrap_or_else(|| Ok(Vec::new()))
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    collections: HashMap<UserId, Vec<FavoriteRecord>>,
    subscribers: HashMap<UserId, Vec<SnapshotSender>>,
    offline: bool,
    refuse_subscriptions: bool,
}

impl StoreState {
    fn notify(&mut self, user: &UserId) {
        let snapshot = self.collections.get(user).cloned().unwrap_or_default();
        if let Some(senders) = self.subscribers.get_mut(user) {
            senders.retain(|tx| tx.send(Ok(snapshot.clone())).is_ok());
        }
    }
}

/// Favorites store keeping collections in memory and pushing the full set
/// to subscribers after every change.
#[derive(Debug, Default)]
pub struct MemoryFavoritesStore {
    state: Mutex<StoreState>,
    gate: Arc<RwLock<()>>,
    writes: AtomicUsize,
}

/// Blocks store writes until dropped.
#[derive(Debug)]
pub struct WriteHold {
    _guard: OwnedRwLockWriteGuard<()>,
}

impl MemoryFavoritesStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `user`'s collection.
    #[must_use]
    pub fn with_records(self, user: &UserId, records: Vec<FavoriteRecord>) -> Self {
        lock(&self.state).collections.insert(user.clone(), records);
        self
    }

    /// Make every read and write fail with a network error.
    pub fn set_offline(&self, offline: bool) {
        lock(&self.state).offline = offline;
    }

    /// Make subscriptions fail.
    pub fn refuse_subscriptions(&self, refuse: bool) {
        lock(&self.state).refuse_subscriptions = refuse;
    }

    /// Hold all writes until the returned guard is dropped.
    pub async fn hold_writes(&self) -> WriteHold {
        WriteHold {
            _guard: Arc::clone(&self.gate).write_owned().await,
        }
    }

    /// Replace `user`'s collection as if another device wrote it.
    pub fn push_remote(&self, user: &UserId, records: Vec<FavoriteRecord>) {
        let mut state = lock(&self.state);
        state.collections.insert(user.clone(), records);
        state.notify(user);
    }

    /// Deliver a failed snapshot to `user`'s subscribers.
    pub fn push_error(&self, user: &UserId, err: ProviderError) {
        if let Some(senders) = lock(&self.state).subscribers.get_mut(user) {
            senders.retain(|tx| tx.send(Err(err.clone())).is_ok());
        }
    }

    /// The stored collection for `user`.
    pub fn records(&self, user: &UserId) -> Vec<FavoriteRecord> {
        lock(&self.state)
            .collections
            .get(user)
            .cloned()
            .unwrap_or_default()
    }

    /// Live subscriptions for `user`.
    pub fn subscriber_count(&self, user: &UserId) -> usize {
        lock(&self.state)
            .subscribers
            .get(user)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }

    /// Number of `add` and `remove` calls so far, successful or not.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn write<F>(&self, user: &UserId, apply: F) -> Result<(), ProviderError>
    where
        F: FnOnce(&mut Vec<FavoriteRecord>) + Send,
    {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let _gate = self.gate.read().await;
        let mut state = lock(&self.state);
        if state.offline {
            return Err(offline("favorites"));
        }
        apply(state.collections.entry(user.clone()).or_default());
        state.notify(user);
        Ok(())
    }
}

#[async_trait]
impl FavoritesStore for MemoryFavoritesStore {
    async fn fetch_all(&self, user: &UserId) -> Result<Vec<FavoriteRecord>, ProviderError> {
        tokio::task::yield_now().await;
        if lock(&self.state).offline {
            return Err(offline("favorites"));
        }
        Ok(self.records(user))
    }

    async fn add(&self, user: &UserId, record: &FavoriteRecord) -> Result<(), ProviderError> {
        let record = record.clone();
        self.write(user, move |records| {
            records.retain(|r| r.place_id != record.place_id);
            records.push(record);
        })
        .await
    }

    async fn remove(&self, user: &UserId, place_id: &str) -> Result<(), ProviderError> {
        let place_id = place_id.to_owned();
        self.write(user, move |records| {
            records.retain(|r| r.place_id != place_id);
        })
        .await
    }

    async fn subscribe(&self, user: &UserId) -> Result<SnapshotReceiver, ProviderError> {
        tokio::task::yield_now().await;
        let mut state = lock(&self.state);
        if state.refuse_subscriptions {
            return Err(ProviderError::Service {
                status: "PERMISSION_DENIED".into(),
                message: format!("cannot follow favorites of {user}"),
            });
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let current = state.collections.get(user).cloned().unwrap_or_default();
        // The receiver is alive, so the first push cannot fail.
        let _ = tx.send(Ok(current));
        state.subscribers.entry(user.clone()).or_default().push(tx);
        Ok(rx)
    }
}

/// Preferences store keeping lists in memory.
#[derive(Debug, Default)]
pub struct MemoryPreferencesStore {
    lists: Mutex<HashMap<UserId, Vec<String>>>,
    offline: Mutex<bool>,
}

impl MemoryPreferencesStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `user`'s list.
    #[must_use]
    pub fn with_preferences(self, user: &UserId, preferences: &[&str]) -> Self {
        lock(&self.lists).insert(
            user.clone(),
            preferences.iter().map(|p| (*p).to_owned()).collect(),
        );
        self
    }

    /// Make every call fail with a network error.
    pub fn set_offline(&self, offline: bool) {
        *lock(&self.offline) = offline;
    }

    /// The stored list for `user`.
    pub fn saved(&self, user: &UserId) -> Vec<String> {
        lock(&self.lists).get(user).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl PreferencesStore for MemoryPreferencesStore {
    async fn load(&self, user: &UserId) -> Result<Vec<String>, ProviderError> {
        if *lock(&self.offline) {
            return Err(offline("preferences"));
        }
        Ok(self.saved(user))
    }

    async fn save(&self, user: &UserId, preferences: &[String]) -> Result<(), ProviderError> {
        if *lock(&self.offline) {
            return Err(offline("preferences"));
        }
        lock(&self.lists).insert(user.clone(), preferences.to_vec());
        Ok(())
    }
}
