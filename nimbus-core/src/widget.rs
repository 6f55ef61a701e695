//! Application state and the user actions that drive it.
//!
//! Every action recovers its own errors and reports them through the
//! [`Surface`]; nothing is returned to the caller.
//!
//! Fetches are tagged with a monotonically increasing token. A response whose
//! token is no longer the latest issued is discarded without rendering,
//! recording or reporting, so the most recently started request always wins.

use chrono::Utc;
use serde_json::Value;
use std::{
    cell::{Cell, RefCell},
    sync::Arc,
    time::Duration,
};

use crate::{
    credential::{CredentialManager, LoadOutcome, SaveOutcome},
    error::{InputField, WidgetError},
    geolocation::Geolocation,
    model::{Coordinates, DisplayUnit, Query, demo_payload},
    presenter::present_payload,
    provider::WeatherApi,
    recent::{self, RecentSearches},
    storage::KeyValueStore,
    surface::{ApiStatus, Surface},
};

const STORED_KEY_VALID_CLEAR: Duration = Duration::from_millis(2500);
const SAVED_KEY_CLEAR: Duration = Duration::from_secs(4);
const CLEARED_KEY_CLEAR: Duration = Duration::from_secs(3);
const DEMO_CLEAR: Duration = Duration::from_secs(3);

pub struct Widget<S: Surface> {
    surface: S,
    api: Arc<dyn WeatherApi>,
    store: Arc<dyn KeyValueStore>,
    geolocation: Box<dyn Geolocation>,
    credential: CredentialManager,
    unit: Cell<DisplayUnit>,
    recent: RefCell<RecentSearches>,
    displayed: RefCell<Option<String>>,
    latest_token: Cell<u64>,
    /// Bumped on every change to `recent`; a history write that finishes
    /// behind a newer change is redone with the current list.
    recent_generation: Cell<u64>,
}

impl<S: Surface> Widget<S> {
    pub fn new(
        surface: S,
        api: Arc<dyn WeatherApi>,
        store: Arc<dyn KeyValueStore>,
        geolocation: Box<dyn Geolocation>,
    ) -> Self {
        let credential = CredentialManager::new(api.clone(), store.clone());
        Self {
            surface,
            api,
            store,
            geolocation,
            credential,
            unit: Cell::new(DisplayUnit::default()),
            recent: RefCell::new(RecentSearches::new()),
            displayed: RefCell::new(None),
            latest_token: Cell::new(0),
            recent_generation: Cell::new(0),
        }
    }

    pub fn with_unit(self, unit: DisplayUnit) -> Self {
        self.unit.set(unit);
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn credential(&self) -> &CredentialManager {
        &self.credential
    }

    pub fn unit(&self) -> DisplayUnit {
        self.unit.get()
    }

    pub fn recent_searches(&self) -> Vec<String> {
        self.recent.borrow().entries().to_vec()
    }

    /// Name of the location currently (or most recently) on display.
    pub fn displayed_location(&self) -> Option<String> {
        self.displayed.borrow().clone()
    }

    pub fn controls_enabled(&self) -> bool {
        self.credential.is_valid()
    }

    /// Load history and the stored key, and set the initial control state.
    pub async fn start(&self) {
        let (recent, storage_error) = match RecentSearches::try_load(self.store.as_ref()).await {
            Ok(recent) => (recent, None),
            Err(e) => {
                tracing::warn!(error = %e, "could not read recent searches");
                (RecentSearches::new(), Some(e))
            }
        };
        self.surface.render_recent(recent.entries());
        *self.recent.borrow_mut() = recent;

        self.surface.set_unit_toggles(self.unit.get());
        self.surface.set_controls_enabled(false);
        self.surface
            .set_api_status(&ApiStatus::info("Checking for stored API key..."));

        let status = match self.credential.load().await {
            LoadOutcome::Valid => ApiStatus::success("Stored API key is valid.")
                .clear_after(STORED_KEY_VALID_CLEAR),
            LoadOutcome::Rejected => ApiStatus::plain("Stored API key was invalid and removed."),
            LoadOutcome::Missing => match storage_error {
                Some(e) => ApiStatus::plain(e.user_message()),
                None => ApiStatus::plain(
                    "No API key found. Paste your OpenWeatherMap key and save it.",
                ),
            },
        };
        self.surface.set_api_status(&status);
        self.sync_controls();
    }

    /// Search box submit.
    pub async fn submit_search(&self, input: &str) {
        self.fetch_by_city(input).await;
    }

    pub async fn fetch_by_city(&self, name: &str) {
        if !self.gate("city search") {
            return;
        }

        let name = name.trim();
        if name.is_empty() {
            self.fail(WidgetError::EmptyInput(InputField::City));
            return;
        }

        self.fetch(Query::City(name.to_string())).await;
    }

    pub async fn fetch_by_coordinates(&self, coords: Coordinates) {
        if !self.gate("coordinate lookup") {
            return;
        }

        self.fetch(Query::Coordinates(coords)).await;
    }

    /// Location button.
    pub async fn use_geolocation(&self) {
        if !self.gate("geolocation") {
            return;
        }

        if !self.geolocation.is_supported() {
            self.fail(WidgetError::UnsupportedCapability);
            return;
        }

        let token = self.issue_token();
        self.surface.show_loading();
        let position = self.geolocation.current_position().await;
        if self.is_stale(token) {
            tracing::debug!(token, "discarding stale position");
            return;
        }

        match position {
            Ok(coords) => self.fetch_by_coordinates(coords).await,
            Err(e) => self.fail(e.into()),
        }
    }

    /// Unit toggle. Re-fetches the displayed location, if any, in the new unit.
    pub async fn set_unit(&self, unit: DisplayUnit) {
        if !self.gate("unit toggle") {
            return;
        }

        self.unit.set(unit);
        self.surface.set_unit_toggles(unit);

        let displayed = self.displayed.borrow().clone();
        if let Some(city) = displayed {
            self.fetch_by_city(&city).await;
        }
    }

    /// Recent-search entry click.
    pub async fn select_recent(&self, index: usize) {
        let city = self.recent.borrow().get(index).map(str::to_string);
        match city {
            Some(city) => self.fetch_by_city(&city).await,
            None => tracing::debug!(index, "no recent search at index"),
        }
    }

    pub async fn save_key(&self, candidate: &str) {
        let status = match self.credential.save(candidate).await {
            Ok(SaveOutcome::Persisted) => ApiStatus::success(
                "API key saved and validated. You can now search for weather data.",
            )
            .clear_after(SAVED_KEY_CLEAR),
            Ok(SaveOutcome::SessionOnly) => ApiStatus::plain(
                "API key validated but could not be stored. It will be used for this session only.",
            ),
            Err(WidgetError::Unauthorized) => {
                ApiStatus::plain("API key appears invalid. Please check and try again.")
            }
            Err(e) => ApiStatus::plain(e.user_message()),
        };
        self.surface.set_api_status(&status);
        self.sync_controls();
    }

    pub async fn clear_key(&self) {
        if !self.surface.confirm("Clear stored API key?") {
            return;
        }

        match self.credential.clear().await {
            Ok(()) => {
                self.surface.set_api_status(
                    &ApiStatus::info("Stored API key cleared.").clear_after(CLEARED_KEY_CLEAR),
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not clear stored API key");
                self.surface.set_api_status(&ApiStatus::plain(
                    "Failed to clear stored API key. You may need to remove it manually.",
                ));
            }
        }
        self.sync_controls();
    }

    /// Render the built-in sample payload. No key or network needed.
    pub async fn use_demo_data(&self) {
        self.surface.set_api_status(&ApiStatus::info("Loading demo data..."));

        let token = self.issue_token();
        self.surface.hide_error();
        if self.display(&demo_payload(Utc::now()), token, false).await {
            self.surface.set_api_status(
                &ApiStatus::success("Demo data loaded (no API key required).")
                    .clear_after(DEMO_CLEAR),
            );
        } else {
            self.surface.set_api_status(&ApiStatus::plain("Failed to load demo data."));
        }
    }

    async fn fetch(&self, query: Query) {
        let token = self.issue_token();
        let Some(api_key) = self.credential.api_key() else {
            self.fail(WidgetError::Unauthorized);
            return;
        };

        self.surface.hide_error();
        self.surface.show_loading();

        let unit = self.unit.get();
        let result = self.api.current(&query, Some(unit), &api_key).await;

        if self.is_stale(token) {
            tracing::debug!(token, latest = self.latest_token.get(), ?query, "discarding stale response");
            return;
        }

        match result {
            Ok(payload) => {
                self.display(&payload, token, true).await;
            }
            Err(e) => self.fail(e),
        }
    }

    /// Present `payload` for the request holding `token`; returns whether it
    /// rendered. Everything visible happens before the history write is
    /// awaited, so a newer request cannot be overtaken.
    async fn display(&self, payload: &Value, token: u64, record: bool) -> bool {
        if self.is_stale(token) {
            return false;
        }

        let (snapshot, fields) = match present_payload(payload, self.unit.get()) {
            Ok(presented) => presented,
            Err(e) => {
                self.fail(e);
                return false;
            }
        };

        self.surface.render(&fields);
        self.surface.hide_loading();

        *self.displayed.borrow_mut() = Some(snapshot.location_name.clone());
        if record {
            self.record_recent(&snapshot.location_name);
            self.persist_recent().await;
        }
        true
    }

    fn record_recent(&self, city: &str) {
        let entries = {
            let mut recent = self.recent.borrow_mut();
            recent.record(city);
            recent.entries().to_vec()
        };
        self.recent_generation.set(self.recent_generation.get() + 1);
        self.surface.render_recent(&entries);
    }

    /// Write the history until the stored copy matches the latest in-memory list.
    async fn persist_recent(&self) {
        loop {
            let generation = self.recent_generation.get();
            let entries = self.recent.borrow().entries().to_vec();
            if let Err(e) = recent::persist(self.store.as_ref(), &entries).await {
                tracing::warn!(error = %e, "could not persist recent searches");
                return;
            }
            if generation == self.recent_generation.get() {
                return;
            }
        }
    }

    fn issue_token(&self) -> u64 {
        let token = self.latest_token.get() + 1;
        self.latest_token.set(token);
        token
    }

    fn is_stale(&self, token: u64) -> bool {
        token != self.latest_token.get()
    }

    fn gate(&self, action: &str) -> bool {
        let enabled = self.controls_enabled();
        if !enabled {
            tracing::debug!(action, "ignored while controls are disabled");
        }
        enabled
    }

    fn sync_controls(&self) {
        self.surface.set_controls_enabled(self.controls_enabled());
    }

    fn fail(&self, err: WidgetError) {
        tracing::debug!(error = %err, "action failed");
        self.surface.hide_loading();
        self.surface.show_error(&err.user_message());
    }
}
