//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;

use nimbus_core::{ApiStatus, DisplayFields, DisplayUnit, Surface};
use serde_json::{Value, json};
use wiremock::{Match, Request};

pub const KEY: &str = "0123456789abcdef0123";

/// A current-weather payload for `name` with the given temperature.
pub fn payload(name: &str, temp: f64) -> Value {
    json!({
        "name": name,
        "dt": 1_709_561_100,
        "sys": { "country": "GB", "sunrise": 1_709_533_920, "sunset": 1_709_575_080 },
        "main": {
            "temp": temp,
            "feels_like": temp - 1.0,
            "temp_min": temp - 2.0,
            "temp_max": temp + 2.0,
            "humidity": 72,
            "pressure": 1015
        },
        "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
        "wind": { "speed": 5.1 },
        "clouds": { "all": 90 },
        "visibility": 10000,
        "rain": { "1h": 0.3 }
    })
}

/// Matches requests without a `units` parameter, i.e. credential probes.
pub struct IsProbe;

impl Match for IsProbe {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(k, _)| k == "units")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Loading(bool),
    Error(Option<String>),
    Render(DisplayFields),
    Recent(Vec<String>),
    Unit(DisplayUnit),
    Controls(bool),
    Status(ApiStatus),
    Confirm(String),
}

/// Surface that records every call.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub events: RefCell<Vec<Event>>,
    pub confirm_answer: bool,
}

impl RecordingSurface {
    pub fn confirming(answer: bool) -> Self {
        Self { events: RefCell::default(), confirm_answer: answer }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn renders(&self) -> Vec<DisplayFields> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Render(fields) => Some(fields.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Error(Some(msg)) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<ApiStatus> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            Event::Status(status) => Some(status.clone()),
            _ => None,
        })
    }

    pub fn controls_enabled(&self) -> Option<bool> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            Event::Controls(enabled) => Some(*enabled),
            _ => None,
        })
    }

    pub fn loading(&self) -> bool {
        self.events
            .borrow()
            .iter()
            .rev()
            .find_map(|e| match e {
                Event::Loading(shown) => Some(*shown),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl Surface for RecordingSurface {
    fn show_loading(&self) {
        self.push(Event::Loading(true));
    }

    fn hide_loading(&self) {
        self.push(Event::Loading(false));
    }

    fn show_error(&self, message: &str) {
        self.push(Event::Error(Some(message.to_string())));
    }

    fn hide_error(&self) {
        self.push(Event::Error(None));
    }

    fn render(&self, fields: &DisplayFields) {
        self.push(Event::Render(fields.clone()));
    }

    fn render_recent(&self, cities: &[String]) {
        self.push(Event::Recent(cities.to_vec()));
    }

    fn set_unit_toggles(&self, unit: DisplayUnit) {
        self.push(Event::Unit(unit));
    }

    fn set_controls_enabled(&self, enabled: bool) {
        self.push(Event::Controls(enabled));
    }

    fn set_api_status(&self, status: &ApiStatus) {
        self.push(Event::Status(status.clone()));
    }

    fn confirm(&self, prompt: &str) -> bool {
        self.push(Event::Confirm(prompt.to_string()));
        self.confirm_answer
    }
}
