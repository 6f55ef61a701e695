//! Error kinds produced by the widget.
//!
//! Every error is recovered where it originates and shown to the user through
//! [`WidgetError::user_message`]; nothing here is meant to crash a session.

use thiserror::Error;

/// Which user input was blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    City,
    ApiKey,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WidgetError {
    /// Blank city name or API key, rejected before any network call.
    #[error("empty input: {0:?}")]
    EmptyInput(InputField),

    /// The API answered 404.
    #[error("location not found")]
    NotFound,

    /// The API answered 401.
    #[error("API key rejected")]
    Unauthorized,

    /// Any other non-success status or a transport failure.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The payload is missing a field the presenter needs, or is not JSON at all.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// No geolocation capability on this device.
    #[error("geolocation is not supported")]
    UnsupportedCapability,

    /// The geolocation provider could not produce a position.
    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    /// Persistent storage could not be read or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl WidgetError {
    /// Message suitable for the error banner or the credential-status line.
    pub fn user_message(&self) -> String {
        match self {
            WidgetError::EmptyInput(InputField::City) => "Please enter a city name".to_string(),
            WidgetError::EmptyInput(InputField::ApiKey) => {
                "Please enter a valid API key.".to_string()
            }
            WidgetError::NotFound => "City not found".to_string(),
            WidgetError::Unauthorized => "Invalid API key. Please save a valid key.".to_string(),
            WidgetError::NetworkFailure(_) => "Unable to fetch weather data".to_string(),
            WidgetError::MalformedResponse(detail) => {
                format!("Error displaying weather data: {detail}")
            }
            WidgetError::UnsupportedCapability => {
                "Geolocation is not supported on this device".to_string()
            }
            WidgetError::LocationUnavailable(detail) => {
                format!("Unable to access your location: {detail}")
            }
            WidgetError::StorageUnavailable(_) => {
                "Local storage is unavailable; settings will not be saved.".to_string()
            }
        }
    }
}
