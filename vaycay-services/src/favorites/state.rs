//! Synchronous favorites state: the last remote snapshot plus pending
//! optimistic mutations layered on top.
//!
//! The visible set is always `confirmed` with pending adds shown and
//! pending removes hidden. A snapshot replaces `confirmed` wholesale without
//! touching `pending`, so in-flight mutations survive remote pushes. A
//! settled mutation drops its pending entry; success also applies it to
//! `confirmed` until the next snapshot confirms it, failure leaves
//! `confirmed` untouched, which is the rollback.

use indexmap::IndexMap;
use vaycay_core::{FavoriteRecord, UserId};

use super::{FavoritesView, SyncPhase};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Pending {
    Add(FavoriteRecord),
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Session {
    pub(crate) user: UserId,
    pub(crate) generation: u64,
}

#[derive(Debug, Default)]
pub(crate) struct SyncState {
    phase: SyncPhase,
    session: Option<Session>,
    generation: u64,
    confirmed: IndexMap<String, FavoriteRecord>,
    pending: IndexMap<String, Pending>,
}

impl SyncState {
    pub(crate) const fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub(crate) fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.generation == generation)
    }

    /// Begin a session for `user`, discarding any previous state.
    pub(crate) fn start(&mut self, user: UserId) -> u64 {
        self.reset();
        self.phase = SyncPhase::Syncing;
        self.session = Some(Session {
            user,
            generation: self.generation,
        });
        self.generation
    }

    /// End the session and clear everything.
    pub(crate) fn end(&mut self) {
        self.reset();
        self.phase = SyncPhase::Uninitialized;
    }

    fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.session = None;
        self.confirmed.clear();
        self.pending.clear();
    }

    /// Replace the confirmed set with a remote snapshot.
    pub(crate) fn apply_snapshot(&mut self, records: Vec<FavoriteRecord>) {
        let mut confirmed = IndexMap::with_capacity(records.len());
        for record in records {
            if confirmed.contains_key(&record.place_id) {
                log::warn!("remote snapshot repeats place {}", record.place_id);
                continue;
            }
            confirmed.insert(record.place_id.clone(), record);
        }
        self.confirmed = confirmed;
        self.phase = SyncPhase::Synced;
    }

    pub(crate) fn contains(&self, place_id: &str) -> bool {
        match self.pending.get(place_id) {
            Some(Pending::Add(_)) => true,
            Some(Pending::Remove) => false,
            None => self.confirmed.contains_key(place_id),
        }
    }

    pub(crate) fn begin(&mut self, place_id: &str, op: Pending) {
        self.pending.insert(place_id.to_owned(), op);
    }

    /// Resolve the pending mutation for `place_id`.
    pub(crate) fn settle(&mut self, place_id: &str, succeeded: bool) {
        let Some(op) = self.pending.shift_remove(place_id) else {
            return;
        };
        if !succeeded {
            return;
        }
        match op {
            Pending::Add(record) => {
                self.confirmed.insert(place_id.to_owned(), record);
            }
            Pending::Remove => {
                self.confirmed.shift_remove(place_id);
            }
        }
    }

    /// The optimistic set, in confirmed order followed by pending adds.
    pub(crate) fn records(&self) -> Vec<FavoriteRecord> {
        let confirmed = self
            .confirmed
            .values()
            .filter(|record| !matches!(self.pending.get(&record.place_id), Some(Pending::Remove)));
        let added = self.pending.iter().filter_map(|(id, op)| match op {
            Pending::Add(record) if !self.confirmed.contains_key(id) => Some(record),
            _ => None,
        });
        confirmed.chain(added).cloned().collect()
    }

    pub(crate) fn view(&self) -> FavoritesView {
        FavoritesView {
            phase: self.phase,
            user: self.session.as_ref().map(|session| session.user.clone()),
            records: self.records(),
        }
    }
}
