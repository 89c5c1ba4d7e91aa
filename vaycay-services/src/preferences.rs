//! The signed-in user's preferred destinations.
//!
//! Unlike favorites, preference edits are not optimistic: the whole list is
//! written to the store first and the local copy changes only once the write
//! succeeds. Edits are serialised so concurrent changes cannot lose each
//! other's entries.
//!
//! An optional [`AutocompleteProvider`] supplies destination suggestions
//! while the user types; suggestion failures degrade to an empty list.

use std::sync::{Arc, Mutex};

use vaycay_core::{AutocompleteProvider, PreferencesError, PreferencesStore, UserId};

use crate::lock;

#[derive(Debug, Default)]
struct Loaded {
    user: Option<UserId>,
    items: Vec<String>,
}

/// Travel preferences for one user at a time.
pub struct TravelPreferences {
    store: Arc<dyn PreferencesStore>,
    autocomplete: Option<Arc<dyn AutocompleteProvider>>,
    loaded: Mutex<Loaded>,
    edits: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for TravelPreferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TravelPreferences")
            .field("loaded", &*lock(&self.loaded))
            .field("autocomplete", &self.autocomplete.is_some())
            .finish_non_exhaustive()
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

impl TravelPreferences {
    /// Create an empty, signed-out preference list.
    pub fn new(store: Arc<dyn PreferencesStore>) -> Self {
        Self {
            store,
            autocomplete: None,
            loaded: Mutex::new(Loaded::default()),
            edits: tokio::sync::Mutex::new(()),
        }
    }

    /// Use `provider` for [`TravelPreferences::suggest`].
    #[must_use]
    pub fn with_autocomplete(mut self, provider: Arc<dyn AutocompleteProvider>) -> Self {
        self.autocomplete = Some(provider);
        self
    }

    /// Destination names completing `input`, best match first.
    ///
    /// Blank input, a missing provider and provider failures all yield an
    /// empty list.
    pub async fn suggest(&self, input: &str) -> Vec<String> {
        let input = input.trim();
        let Some(provider) = self.autocomplete.as_ref().filter(|_| !input.is_empty()) else {
            return Vec::new();
        };
        provider
            .suggest_destinations(input)
            .await
            .unwrap_or_else(|err| {
                log::warn!("no destination suggestions for {input:?}: {err}");
                Vec::new()
            })
    }

    /// The current list.
    #[must_use]
    pub fn current(&self) -> Vec<String> {
        lock(&self.loaded).items.clone()
    }

    /// Read `user`'s list from the store and make it current.
    ///
    /// # Errors
    ///
    /// Returns [`PreferencesError::Store`] when the read fails; the previous
    /// list is kept.
    pub async fn load(&self, user: UserId) -> Result<Vec<String>, PreferencesError> {
        let _edit = self.edits.lock().await;
        let items = self.store.load(&user).await?;
        let mut loaded = lock(&self.loaded);
        loaded.user = Some(user);
        loaded.items.clone_from(&items);
        Ok(items)
    }

    /// Forget the list on sign-out.
    pub fn clear(&self) {
        *lock(&self.loaded) = Loaded::default();
    }

    /// Append `name` unless an entry with the same name exists.
    ///
    /// Returns `false` when nothing changed.
    ///
    /// # Errors
    ///
    /// [`PreferencesError::Empty`] for blank text, [`PreferencesError::NoSession`]
    /// before [`TravelPreferences::load`], [`PreferencesError::Store`] when
    /// the write fails.
    pub async fn add(&self, name: &str) -> Result<bool, PreferencesError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PreferencesError::Empty);
        }
        self.edit(|items| {
            if items.iter().any(|item| same_name(item, name)) {
                return Ok(false);
            }
            items.push(name.to_owned());
            Ok(true)
        })
        .await
    }

    /// Replace the entry at `index` with `name`.
    ///
    /// Returns `false` when `name` already names a different entry.
    ///
    /// # Errors
    ///
    /// As for [`TravelPreferences::add`], plus
    /// [`PreferencesError::IndexOutOfRange`].
    pub async fn rename(&self, index: usize, name: &str) -> Result<bool, PreferencesError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PreferencesError::Empty);
        }
        self.edit(|items| {
            let len = items.len();
            let clash = items
                .iter()
                .enumerate()
                .any(|(i, item)| i != index && same_name(item, name));
            let slot = items
                .get_mut(index)
                .ok_or(PreferencesError::IndexOutOfRange { index, len })?;
            if clash || *slot == name {
                return Ok(false);
            }
            name.clone_into(slot);
            Ok(true)
        })
        .await
    }

    /// Remove the entry named `name`.
    ///
    /// Returns `false` when no entry matched.
    ///
    /// # Errors
    ///
    /// [`PreferencesError::NoSession`] before [`TravelPreferences::load`],
    /// [`PreferencesError::Store`] when the write fails.
    pub async fn remove(&self, name: &str) -> Result<bool, PreferencesError> {
        let name = name.trim();
        self.edit(|items| {
            let before = items.len();
            items.retain(|item| !same_name(item, name));
            Ok(items.len() != before)
        })
        .await
    }

    async fn edit<F>(&self, change: F) -> Result<bool, PreferencesError>
    where
        F: FnOnce(&mut Vec<String>) -> Result<bool, PreferencesError>,
    {
        let _edit = self.edits.lock().await;
        let (user, mut items) = {
            let loaded = lock(&self.loaded);
            let user = loaded.user.clone().ok_or(PreferencesError::NoSession)?;
            (user, loaded.items.clone())
        };
        if !change(&mut items)? {
            return Ok(false);
        }
        self.store.save(&user, &items).await.inspect_err(|err| {
            log::warn!("keeping previous travel preferences: {err}");
        })?;

        let mut loaded = lock(&self.loaded);
        if loaded.user.as_ref() != Some(&user) {
            log::debug!("discarding preference edit for signed-out user {user}");
            return Err(PreferencesError::NoSession);
        }
        loaded.items = items;
        Ok(true)
    }
}
