//! Core library for the `nimbus` weather widget.
//!
//! This crate defines:
//! - The widget state and the user actions that drive it
//! - API key lifecycle and recent-search history
//! - The OpenWeatherMap current-weather client
//! - Mapping of payloads onto display fields
//! - Seams for storage, geolocation and the presentation surface
//!
//! It is used by `nimbus-cli`, but any front-end that implements [`Surface`]
//! can host it.

pub mod config;
pub mod credential;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod presenter;
pub mod provider;
pub mod recent;
pub mod storage;
pub mod surface;
pub mod widget;

pub use config::{Config, GeolocationConfig, GeolocationMode};
pub use credential::{CredentialManager, CredentialState};
pub use error::WidgetError;
pub use geolocation::Geolocation;
pub use model::{Coordinates, DisplayFields, DisplayUnit, WeatherSnapshot};
pub use provider::{OpenWeatherClient, WeatherApi, api_from_config};
pub use recent::RecentSearches;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use surface::{ApiStatus, StatusKind, Surface};
pub use widget::Widget;
