//! One-shot device position lookup.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;

use crate::{error::WidgetError, model::Coordinates};

pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com/json/";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("geolocation is not supported")]
    Unsupported,
    #[error("{0}")]
    Unavailable(String),
}

impl From<LocationError> for WidgetError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::Unsupported => WidgetError::UnsupportedCapability,
            other => WidgetError::LocationUnavailable(other.to_string()),
        }
    }
}

#[async_trait]
pub trait Geolocation: Send + Sync + Debug {
    /// Whether a position can be requested at all. Checked before any
    /// loading indicator is shown.
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// No capability on this device.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

#[async_trait]
impl Geolocation for Unsupported {
    fn is_supported(&self) -> bool {
        false
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// A position configured up front.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl Geolocation for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// Approximate position of the public IP address.
#[derive(Debug, Clone)]
pub struct IpLookup {
    url: String,
    http: Client,
}

impl IpLookup {
    pub fn new(url: impl Into<String>, http: Client) -> Self {
        Self { url: url.into(), http }
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

#[async_trait]
impl Geolocation for IpLookup {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| LocationError::Unavailable(format!("lookup failed: {e}")))?;

        if !res.status().is_success() {
            return Err(LocationError::Unavailable(format!(
                "lookup returned status {}",
                res.status()
            )));
        }

        let body: IpLookupResponse = res
            .json()
            .await
            .map_err(|e| LocationError::Unavailable(format!("unreadable lookup response: {e}")))?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(latitude), Some(longitude)) => {
                tracing::debug!(latitude, longitude, "resolved position from IP");
                Ok(Coordinates { latitude, longitude })
            }
            _ => Err(LocationError::Unavailable(
                body.message.unwrap_or_else(|| "position unknown".to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unsupported_fails_immediately() {
        let geo = Unsupported;
        assert!(!geo.is_supported());

        let err: WidgetError = geo.current_position().await.unwrap_err().into();
        assert_eq!(err, WidgetError::UnsupportedCapability);
    }

    #[tokio::test]
    async fn fixed_position_yields_configured_coordinates() {
        let coords = Coordinates { latitude: 51.5, longitude: -0.12 };
        let geo = FixedPosition(coords);

        assert!(geo.is_supported());
        assert_eq!(geo.current_position().await.unwrap(), coords);
    }

    #[test]
    fn failures_carry_their_description() {
        let err: WidgetError = LocationError::Unavailable("reserved range".into()).into();
        assert_eq!(err.user_message(), "Unable to access your location: reserved range");
    }
}
