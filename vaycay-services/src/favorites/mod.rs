//! Favorites synchronisation between an optimistic local set and the remote
//! document store.
//!
//! [`FavoritesSynchronizer`] moves through [`SyncPhase::Uninitialized`],
//! [`SyncPhase::Syncing`] and [`SyncPhase::Synced`]. Starting a session
//! subscribes to the store's live stream; every pushed snapshot replaces the
//! confirmed set and re-enters `Synced`. Ending the session unsubscribes and
//! clears everything.
//!
//! Mutations are optimistic: the change is visible immediately, the remote
//! write runs on a background task, and a failed write rolls the change back
//! before the error is returned. At most one mutation per place id is in
//! flight; a second one waits for the first to settle.
//!
//! Observers either pull ([`FavoritesSynchronizer::current`]) or follow a
//! watch channel ([`FavoritesSynchronizer::subscribe`]).

mod keyed;
mod state;

use std::sync::{Arc, Mutex, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use vaycay_core::{
    FavoriteRecord, FavoritesError, FavoritesStore, PlaceSummary, SnapshotReceiver, UserId,
};

use crate::lock;
use keyed::KeyedLocks;
use state::{Pending, SyncState};

/// Lifecycle of the favorites set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    /// No session; the set is empty.
    #[default]
    Uninitialized,
    /// Subscribed, waiting for the first remote snapshot.
    Syncing,
    /// At least one snapshot has been applied.
    Synced,
}

/// What observers see: the phase and the optimistic set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FavoritesView {
    /// Current lifecycle phase.
    pub phase: SyncPhase,
    /// Signed-in user, if any.
    pub user: Option<UserId>,
    /// Optimistic favorites: pending adds shown, pending removes hidden.
    pub records: Vec<FavoriteRecord>,
}

impl FavoritesView {
    /// Whether `place_id` is in the visible set.
    #[must_use]
    pub fn contains(&self, place_id: &str) -> bool {
        self.records.iter().any(|record| record.place_id == place_id)
    }
}

/// Result of a mutation that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The change was written remotely.
    Applied,
    /// Add of a place already in the set; nothing was written.
    AlreadyPresent,
    /// Remove of a place not in the set; nothing was written.
    NotPresent,
}

/// Keeps the user's favorites consistent with the remote store.
///
/// Cloning is cheap; clones share state. Requires a Tokio runtime.
#[derive(Clone)]
pub struct FavoritesSynchronizer {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn FavoritesStore>,
    state: Mutex<SyncState>,
    view: watch::Sender<FavoritesView>,
    /// Only read or replaced while `state` is locked.
    listener: Mutex<Option<JoinHandle<()>>>,
    places: KeyedLocks,
}

impl std::fmt::Debug for FavoritesSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesSynchronizer")
            .field("state", &*lock(&self.inner.state))
            .finish_non_exhaustive()
    }
}

impl FavoritesSynchronizer {
    /// Create an uninitialised synchronizer over `store`.
    pub fn new(store: Arc<dyn FavoritesStore>) -> Self {
        let (view, _) = watch::channel(FavoritesView::default());
        Self {
            inner: Arc::new(Inner {
                store,
                state: Mutex::new(SyncState::default()),
                view,
                listener: Mutex::new(None),
                places: KeyedLocks::default(),
            }),
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        lock(&self.inner.state).phase()
    }

    /// Snapshot of the optimistic set.
    #[must_use]
    pub fn current(&self) -> Vec<FavoriteRecord> {
        lock(&self.inner.state).records()
    }

    /// Whether `place_id` is in the optimistic set.
    #[must_use]
    pub fn contains(&self, place_id: &str) -> bool {
        lock(&self.inner.state).contains(place_id)
    }

    /// Follow changes to the visible set.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FavoritesView> {
        self.inner.view.subscribe()
    }

    /// Subscribe to `user`'s collection and enter [`SyncPhase::Syncing`].
    ///
    /// Starting a session for the already active user is a no-op; starting
    /// one for a different user ends the previous session first.
    ///
    /// # Errors
    ///
    /// Returns [`FavoritesError::SubscribeFailed`] when the store refuses the
    /// subscription; the synchronizer is then back in
    /// [`SyncPhase::Uninitialized`].
    pub async fn start_session(&self, user: UserId) -> Result<(), FavoritesError> {
        let generation = {
            let mut state = lock(&self.inner.state);
            if state.session().is_some_and(|session| session.user == user) {
                return Ok(());
            }
            let generation = state.start(user.clone());
            self.inner.stop_listener();
            self.inner.publish(&state);
            generation
        };
        log::info!("starting favorites session for {user}");

        let receiver = match self.inner.store.subscribe(&user).await {
            Ok(receiver) => receiver,
            Err(source) => {
                let mut state = lock(&self.inner.state);
                if state.is_current(generation) {
                    state.end();
                    self.inner.publish(&state);
                }
                return Err(FavoritesError::SubscribeFailed {
                    user: user.to_string(),
                    source,
                });
            }
        };

        // The session may have ended or been replaced while subscribing.
        let state = lock(&self.inner.state);
        if !state.is_current(generation) {
            log::debug!("discarding subscription for superseded session of {user}");
            return Ok(());
        }
        let weak = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(listen(weak, generation, receiver));
        if let Some(previous) = lock(&self.inner.listener).replace(handle) {
            previous.abort();
        }
        drop(state);
        Ok(())
    }

    /// Unsubscribe, clear the set and return to
    /// [`SyncPhase::Uninitialized`].
    pub fn end_session(&self) {
        let mut state = lock(&self.inner.state);
        if state.session().is_some() {
            log::info!("ending favorites session");
        }
        state.end();
        self.inner.stop_listener();
        self.inner.publish(&state);
    }

    /// Drive sessions from an authentication context.
    ///
    /// Each identity change starts (`Some`) or ends (`None`) a session. The
    /// task stops when the identity sender is dropped.
    pub fn follow_identity(&self, mut identity: watch::Receiver<Option<UserId>>) -> JoinHandle<()> {
        let sync = self.clone();
        tokio::spawn(async move {
            loop {
                let current = identity.borrow_and_update().clone();
                match current {
                    Some(user) => {
                        if let Err(err) = sync.start_session(user).await {
                            log::warn!("{err}");
                        }
                    }
                    None => sync.end_session(),
                }
                if identity.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// Pull the whole collection and apply it as a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`FavoritesError::NoSession`] without a session and
    /// [`FavoritesError::LoadFailed`] when the store read fails.
    pub async fn refresh(&self) -> Result<(), FavoritesError> {
        let session = lock(&self.inner.state)
            .session()
            .cloned()
            .ok_or(FavoritesError::NoSession)?;
        let records = self
            .inner
            .store
            .fetch_all(&session.user)
            .await
            .map_err(FavoritesError::LoadFailed)?;
        self.inner.apply_snapshot(session.generation, records);
        Ok(())
    }

    /// Optimistically add `record`.
    ///
    /// # Errors
    ///
    /// Returns [`FavoritesError::NoSession`] without a session and
    /// [`FavoritesError::WriteFailed`] after rolling back a failed write.
    pub async fn add(&self, record: FavoriteRecord) -> Result<MutationOutcome, FavoritesError> {
        self.mutate(record.place_id.clone(), Pending::Add(record))
            .await
    }

    /// Optimistically remove `place_id`.
    ///
    /// # Errors
    ///
    /// Returns [`FavoritesError::NoSession`] without a session and
    /// [`FavoritesError::WriteFailed`] after restoring a record whose remote
    /// delete failed.
    pub async fn remove(&self, place_id: &str) -> Result<MutationOutcome, FavoritesError> {
        self.mutate(place_id.to_owned(), Pending::Remove).await
    }

    /// Add `summary` if absent, otherwise remove it.
    ///
    /// # Errors
    ///
    /// As for [`FavoritesSynchronizer::add`] and
    /// [`FavoritesSynchronizer::remove`].
    pub async fn toggle(&self, summary: &PlaceSummary) -> Result<MutationOutcome, FavoritesError> {
        if self.contains(&summary.id) {
            self.remove(&summary.id).await
        } else {
            self.add(FavoriteRecord::from_summary(summary)).await
        }
    }

    async fn mutate(
        &self,
        place_id: String,
        op: Pending,
    ) -> Result<MutationOutcome, FavoritesError> {
        let session = lock(&self.inner.state)
            .session()
            .cloned()
            .ok_or(FavoritesError::NoSession)?;

        // The write runs detached so a caller that stops waiting cannot
        // strand a pending entry.
        let inner = Arc::clone(&self.inner);
        let id = place_id.clone();
        let task = tokio::spawn(async move {
            inner
                .run_mutation(session.user, session.generation, id, op)
                .await
        });
        task.await.unwrap_or_else(|err| {
            log::error!("favorite mutation task for {place_id} failed: {err}");
            Err(FavoritesError::Interrupted { place_id })
        })
    }
}

impl Inner {
    fn publish(&self, state: &SyncState) {
        self.view.send_replace(state.view());
    }

    fn stop_listener(&self) {
        if let Some(handle) = lock(&self.listener).take() {
            handle.abort();
        }
    }

    fn apply_snapshot(&self, generation: u64, records: Vec<FavoriteRecord>) {
        let mut state = lock(&self.state);
        if !state.is_current(generation) {
            log::debug!("ignoring snapshot for an ended session");
            return;
        }
        log::debug!("applying favorites snapshot with {} records", records.len());
        state.apply_snapshot(records);
        self.publish(&state);
    }

    async fn run_mutation(
        &self,
        user: UserId,
        generation: u64,
        place_id: String,
        op: Pending,
    ) -> Result<MutationOutcome, FavoritesError> {
        let _turn = self.places.acquire(&place_id).await;

        {
            let mut state = lock(&self.state);
            if !state.is_current(generation) {
                return Err(FavoritesError::SessionChanged { place_id });
            }
            match (&op, state.contains(&place_id)) {
                (Pending::Add(_), true) => {
                    log::warn!("{place_id} is already a favorite");
                    return Ok(MutationOutcome::AlreadyPresent);
                }
                (Pending::Remove, false) => {
                    log::warn!("{place_id} is not a favorite");
                    return Ok(MutationOutcome::NotPresent);
                }
                _ => {}
            }
            state.begin(&place_id, op.clone());
            self.publish(&state);
        }

        let written = match &op {
            Pending::Add(record) => self.store.add(&user, record).await,
            Pending::Remove => self.store.remove(&user, &place_id).await,
        };

        let mut state = lock(&self.state);
        if !state.is_current(generation) {
            return Err(FavoritesError::SessionChanged { place_id });
        }
        state.settle(&place_id, written.is_ok());
        self.publish(&state);
        drop(state);

        match written {
            Ok(()) => Ok(MutationOutcome::Applied),
            Err(source) => {
                log::warn!("rolled back favorite change for {place_id}: {source}");
                Err(FavoritesError::WriteFailed { place_id, source })
            }
        }
    }
}

async fn listen(inner: Weak<Inner>, generation: u64, mut receiver: SnapshotReceiver) {
    while let Some(snapshot) = receiver.recv().await {
        let Some(strong) = inner.upgrade() else {
            break;
        };
        match snapshot {
            Ok(records) => strong.apply_snapshot(generation, records),
            Err(err) => log::warn!("favorites snapshot failed: {err}"),
        }
    }
    log::debug!("favorites subscription closed");
}
