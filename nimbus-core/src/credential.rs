//! API key lifecycle.
//!
//! ```text
//! Unset ──save──▶ Checking ──▶ Valid ──clear──▶ Unset
//!                    │
//!                    └────────▶ Invalid ──save──▶ Checking
//! ```
//!
//! Fetch-capable controls are enabled exactly when the state is
//! [`CredentialState::Valid`].

use std::{
    cell::{Cell, RefCell},
    sync::Arc,
};

use crate::{
    error::{InputField, WidgetError},
    provider::WeatherApi,
    storage::{API_KEY_KEY, KeyValueStore},
};

/// Stored values this short are treated as absent rather than probed.
pub const MIN_STORED_KEY_LEN: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialState {
    #[default]
    Unset,
    Checking,
    Valid,
    Invalid,
}

/// Result of looking for a key at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A stored key passed the probe and is active.
    Valid,
    /// A stored key failed the probe and was purged.
    Rejected,
    /// Nothing usable in storage.
    Missing,
}

/// Result of a successful [`CredentialManager::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Persisted,
    /// Active for this session only; storage refused the write.
    SessionOnly,
}

#[derive(Debug)]
pub struct CredentialManager {
    api: Arc<dyn WeatherApi>,
    store: Arc<dyn KeyValueStore>,
    state: Cell<CredentialState>,
    key: RefCell<Option<String>>,
}

impl CredentialManager {
    pub fn new(api: Arc<dyn WeatherApi>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            api,
            store,
            state: Cell::new(CredentialState::Unset),
            key: RefCell::new(None),
        }
    }

    pub fn state(&self) -> CredentialState {
        self.state.get()
    }

    pub fn is_valid(&self) -> bool {
        self.state.get() == CredentialState::Valid
    }

    /// The active key, if one has been validated.
    pub fn api_key(&self) -> Option<String> {
        if self.is_valid() { self.key.borrow().clone() } else { None }
    }

    /// Probe the API with `key`. Anything but a success is invalid.
    pub async fn validate(&self, key: &str) -> bool {
        match self.api.probe(key).await {
            Ok(()) => true,
            Err(WidgetError::Unauthorized) => false,
            Err(e) => {
                tracing::warn!(error = %e, "API key validation failed");
                false
            }
        }
    }

    pub async fn load(&self) -> LoadOutcome {
        let stored = match self.store.get(API_KEY_KEY).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored API key");
                None
            }
        };

        let Some(stored) = stored.filter(|k| k.len() >= MIN_STORED_KEY_LEN) else {
            self.deactivate(CredentialState::Unset);
            return LoadOutcome::Missing;
        };

        self.state.set(CredentialState::Checking);
        if self.validate(&stored).await {
            self.activate(stored);
            return LoadOutcome::Valid;
        }

        if let Err(e) = self.store.remove(API_KEY_KEY).await {
            tracing::warn!(error = %e, "could not remove rejected API key");
        }
        self.deactivate(CredentialState::Invalid);
        LoadOutcome::Rejected
    }

    /// Validate and activate `candidate`. Blank input never reaches the
    /// network. On any failure the prior state and key are left as they were.
    pub async fn save(&self, candidate: &str) -> Result<SaveOutcome, WidgetError> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return Err(WidgetError::EmptyInput(InputField::ApiKey));
        }

        let prior = self.state.replace(CredentialState::Checking);
        if !self.validate(candidate).await {
            self.state.set(prior);
            return Err(WidgetError::Unauthorized);
        }

        let outcome = match self.store.set(API_KEY_KEY, candidate).await {
            Ok(()) => SaveOutcome::Persisted,
            Err(e) => {
                tracing::warn!(error = %e, "could not persist API key");
                SaveOutcome::SessionOnly
            }
        };

        self.activate(candidate.to_string());
        Ok(outcome)
    }

    /// Forget the key. Confirmation is the caller's job.
    pub async fn clear(&self) -> Result<(), WidgetError> {
        self.store.remove(API_KEY_KEY).await?;
        self.deactivate(CredentialState::Unset);
        Ok(())
    }

    fn activate(&self, key: String) {
        *self.key.borrow_mut() = Some(key);
        self.state.set(CredentialState::Valid);
    }

    fn deactivate(&self, state: CredentialState) {
        *self.key.borrow_mut() = None;
        self.state.set(state);
    }
}
