use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::{
    Config,
    error::WidgetError,
    model::{DisplayUnit, Query},
};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// City used by credential probes.
pub const PROBE_CITY: &str = "London";

/// Current-conditions endpoint of the weather API.
///
/// Implementations perform exactly one round trip per call and never retry.
/// A successful call yields the raw payload; interpreting it is the
/// presenter's job.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    /// `unit` is `None` for credential probes, which only care about the status.
    async fn current(
        &self,
        query: &Query,
        unit: Option<DisplayUnit>,
        api_key: &str,
    ) -> Result<Value, WidgetError>;

    /// Minimal request used only to test whether `api_key` is accepted.
    async fn probe(&self, api_key: &str) -> Result<(), WidgetError> {
        self.current(&Query::City(PROBE_CITY.to_string()), None, api_key)
            .await
            .map(|_| ())
    }
}

/// Construct the API client described by config.
pub fn api_from_config(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    let http = config.http_client()?;
    Ok(OpenWeatherClient::with_base_url(config.api_base_url.clone(), http))
}
