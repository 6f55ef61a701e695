//! Maps a [`WeatherSnapshot`] onto the display fields of the widget.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    error::WidgetError,
    model::{DisplayFields, DisplayUnit, WeatherSnapshot},
};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Estimated UV exposure.
///
/// This is a heuristic derived from the primary condition name only. The
/// current-weather endpoint carries no UV measurement. Matching ignores case so
/// that descriptions such as "Light rain" land in the same bucket as "Rain".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UvEstimate {
    pub index: u8,
    pub category: &'static str,
}

pub fn estimate_uv(condition: &str) -> UvEstimate {
    let condition = condition.to_lowercase();

    if condition.contains("clear") {
        UvEstimate { index: 8, category: "Very High" }
    } else if condition.contains("cloud") {
        UvEstimate { index: 3, category: "Low" }
    } else if condition.contains("rain") || condition.contains("storm") {
        UvEstimate { index: 1, category: "Low" }
    } else {
        UvEstimate { index: 5, category: "Moderate" }
    }
}

/// Parse and render a raw payload in one step.
pub fn present_payload(
    payload: &Value,
    unit: DisplayUnit,
) -> Result<(WeatherSnapshot, DisplayFields), WidgetError> {
    let snapshot = WeatherSnapshot::from_payload(payload)?;
    let fields = present(&snapshot, unit);
    Ok((snapshot, fields))
}

pub fn present(snapshot: &WeatherSnapshot, unit: DisplayUnit) -> DisplayFields {
    let uv = estimate_uv(&snapshot.condition);

    DisplayFields {
        location: format!("{}, {}", snapshot.location_name, snapshot.country),
        date: format_date(snapshot, snapshot.observed_at),
        temperature: degrees(snapshot.temperature),
        description: snapshot.condition.clone(),
        icon_url: format!("{ICON_BASE_URL}/{}@4x.png", snapshot.icon),
        humidity: format!("{}%", snapshot.humidity_pct),
        wind_speed: format!("{} {}", snapshot.wind_speed, unit.wind_suffix()),
        visibility: match snapshot.visibility_m {
            Some(metres) => format!("{:.2} km", f64::from(metres) / 1000.0),
            None => "--".to_string(),
        },
        pressure: format!("{} hPa", snapshot.pressure_hpa),
        feels_like: degrees(snapshot.feels_like),
        precipitation: format!("{} mm", snapshot.rain_1h_mm.unwrap_or(0.0)),
        max_temp: degrees(snapshot.temp_max),
        min_temp: degrees(snapshot.temp_min),
        sunrise: format_time(snapshot, snapshot.sunrise),
        sunset: format_time(snapshot, snapshot.sunset),
        uv_index: uv.index.to_string(),
        uv_description: uv.category.to_string(),
    }
}

/// Round half up (so -2.5 becomes -2) and append the degree sign.
fn degrees(value: f64) -> String {
    let rounded = (value + 0.5).floor() as i64;
    format!("{rounded}°")
}

fn format_date(snapshot: &WeatherSnapshot, at: DateTime<Utc>) -> String {
    at.with_timezone(&snapshot.utc_offset)
        .format("%A, %B %-d, %Y at %I:%M %p")
        .to_string()
}

fn format_time(snapshot: &WeatherSnapshot, at: DateTime<Utc>) -> String {
    at.with_timezone(&snapshot.utc_offset).format("%I:%M %p").to_string()
}
