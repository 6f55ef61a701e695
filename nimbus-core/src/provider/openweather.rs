use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::{
    error::WidgetError,
    model::{DisplayUnit, Query},
};

use super::WeatherApi;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    base_url: String,
    http: Client,
}

impl Default for OpenWeatherClient {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, Client::new())
    }
}

impl OpenWeatherClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn current(
        &self,
        query: &Query,
        unit: Option<DisplayUnit>,
        api_key: &str,
    ) -> Result<Value, WidgetError> {
        let url = format!("{}/weather", self.base_url);

        let mut params: Vec<(&str, String)> = match query {
            Query::City(name) => vec![("q", name.clone())],
            Query::Coordinates(c) => {
                vec![("lat", c.latitude.to_string()), ("lon", c.longitude.to_string())]
            }
        };
        if let Some(unit) = unit {
            params.push(("units", unit.as_str().to_string()));
        }
        params.push(("appid", api_key.to_string()));

        tracing::debug!(?query, ?unit, "requesting current weather");

        let res = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| WidgetError::NetworkFailure(format!("request failed: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WidgetError::NetworkFailure(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            tracing::debug!(%status, body = %truncate_body(&body), "weather request rejected");
            return Err(match status {
                StatusCode::NOT_FOUND => WidgetError::NotFound,
                StatusCode::UNAUTHORIZED => WidgetError::Unauthorized,
                other => WidgetError::NetworkFailure(format!(
                    "status {other}: {}",
                    truncate_body(&body)
                )),
            });
        }

        serde_json::from_str(&body).map_err(|e| WidgetError::MalformedResponse(e.to_string()))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = OpenWeatherClient::with_base_url("http://example.test/data/2.5/", Client::new());
        assert_eq!(client.base_url(), "http://example.test/data/2.5");
    }

    #[test]
    fn long_bodies_are_truncated_on_char_boundaries() {
        let body = "é".repeat(300);
        let truncated = truncate_body(&body);

        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
