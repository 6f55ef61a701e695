use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::WidgetError;

/// Unit system the API is asked to express values in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayUnit {
    #[default]
    Metric,
    Imperial,
}

impl DisplayUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayUnit::Metric => "metric",
            DisplayUnit::Imperial => "imperial",
        }
    }

    pub fn wind_suffix(&self) -> &'static str {
        match self {
            DisplayUnit::Metric => "m/s",
            DisplayUnit::Imperial => "mph",
        }
    }
}

impl std::fmt::Display for DisplayUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// What a lookup is keyed on.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    City(String),
    Coordinates(Coordinates),
}

/// One point-in-time reading for a location, built from a current-weather payload.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub country: String,
    pub observed_at: DateTime<Utc>,
    pub utc_offset: FixedOffset,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub wind_speed: f64,
    pub cloud_cover_pct: u8,
    /// Not every station reports visibility.
    pub visibility_m: Option<u32>,
    pub condition_id: i64,
    pub condition: String,
    pub description: String,
    pub icon: String,
    pub rain_1h_mm: Option<f64>,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// Destructure a raw payload. Any missing or mistyped field is a
    /// [`WidgetError::MalformedResponse`].
    pub fn from_payload(payload: &Value) -> Result<Self, WidgetError> {
        let parsed: OwCurrentResponse = serde_json::from_value(payload.clone())
            .map_err(|e| WidgetError::MalformedResponse(e.to_string()))?;

        let condition = parsed
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| WidgetError::MalformedResponse("no weather conditions".into()))?;

        let utc_offset = parsed
            .timezone
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());

        Ok(Self {
            location_name: parsed.name,
            country: parsed.sys.country,
            observed_at: unix_to_utc(parsed.dt, "dt")?,
            utc_offset,
            temperature: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            temp_min: parsed.main.temp_min,
            temp_max: parsed.main.temp_max,
            humidity_pct: parsed.main.humidity,
            pressure_hpa: parsed.main.pressure,
            wind_speed: parsed.wind.speed,
            cloud_cover_pct: parsed.clouds.all,
            visibility_m: parsed.visibility,
            condition_id: condition.id,
            condition: condition.main,
            description: condition.description,
            icon: condition.icon,
            rain_1h_mm: parsed.rain.and_then(|r| r.one_hour),
            sunrise: unix_to_utc(parsed.sys.sunrise, "sys.sunrise")?,
            sunset: unix_to_utc(parsed.sys.sunset, "sys.sunset")?,
        })
    }
}

/// Rendered strings for one snapshot, one per display region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayFields {
    pub location: String,
    pub date: String,
    pub temperature: String,
    pub description: String,
    pub icon_url: String,
    pub humidity: String,
    pub wind_speed: String,
    pub visibility: String,
    pub pressure: String,
    pub feels_like: String,
    pub precipitation: String,
    pub max_temp: String,
    pub min_temp: String,
    pub sunrise: String,
    pub sunset: String,
    pub uv_index: String,
    pub uv_description: String,
}

/// Sample payload shown by the demo action, shaped like a live response.
pub fn demo_payload(now: DateTime<Utc>) -> Value {
    let ts = now.timestamp();
    json!({
        "name": "Sample City",
        "sys": { "country": "SC", "sunrise": ts - 3600, "sunset": ts + 3600 },
        "main": {
            "temp": 22.5,
            "feels_like": 21.0,
            "temp_min": 18.3,
            "temp_max": 24.0,
            "humidity": 56,
            "pressure": 1013
        },
        "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }],
        "wind": { "speed": 3.5 },
        "clouds": { "all": 0 },
        "visibility": 10000,
        "dt": ts,
        "rain": { "1h": 0 }
    })
}

// Timestamps arrive as integers from the API but may be fractional in hand-built payloads.
fn unix_to_utc(ts: f64, field: &str) -> Result<DateTime<Utc>, WidgetError> {
    DateTime::from_timestamp(ts.floor() as i64, 0)
        .ok_or_else(|| WidgetError::MalformedResponse(format!("{field} is out of range")))
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
    sunrise: f64,
    sunset: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: i64,
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: f64,
    timezone: Option<i32>,
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    clouds: OwClouds,
    visibility: Option<u32>,
    rain: Option<OwRain>,
}
