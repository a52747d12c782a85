//! Open-Meteo weather: current conditions, daily forecast and hourly forecast.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;

use trip_core::{Coordinates, DataSource, ForecastDay, HourlyForecast, WeatherConditions};

use super::{check_status, ProviderError, ProviderResult, WeatherProvider};

const NAME: &str = "open-meteo";
const METERS_PER_MILE: f64 = 1609.344;

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, at: Coordinates, extra: &[(&str, String)]) -> ProviderResult<ForecastResponse> {
        let mut query: Vec<(&str, String)> = vec![
            ("latitude", format!("{:.4}", at.lat)),
            ("longitude", format!("{:.4}", at.lng)),
            ("temperature_unit", "fahrenheit".to_string()),
            ("wind_speed_unit", "mph".to_string()),
            ("timezone", "UTC".to_string()),
        ];
        query.extend(extra.iter().cloned());

        let response = self
            .client
            .get(format!("{}/v1/forecast", self.base_url))
            .query(&query)
            .send()
            .await
            .map_err(|e| ProviderError::request(NAME, e))?;
        check_status(NAME, response)?
            .json()
            .await
            .map_err(|e| ProviderError::invalid(NAME, e.to_string()))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ForecastResponse {
    current: Option<Current>,
    daily: Option<Daily>,
    hourly: Option<Hourly>,
}

#[derive(Debug, Deserialize)]
struct Current {
    temperature_2m: f64,
    #[serde(default)]
    relative_humidity_2m: Option<f64>,
    #[serde(default)]
    apparent_temperature: Option<f64>,
    #[serde(default)]
    precipitation_probability: Option<f64>,
    #[serde(default)]
    weather_code: Option<u32>,
    #[serde(default)]
    wind_speed_10m: Option<f64>,
    #[serde(default)]
    wind_gusts_10m: Option<f64>,
    /// Meters.
    #[serde(default)]
    visibility: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Daily {
    time: Vec<NaiveDate>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<u32>>,
}

#[derive(Debug, Deserialize)]
struct Hourly {
    /// "2024-01-15T08:00", UTC.
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<u32>>,
}

/// WMO weather interpretation code to a condition label.
pub fn condition_label(code: u32) -> &'static str {
    match code {
        0 => "clear",
        1 | 2 => "partly cloudy",
        3 => "cloudy",
        45 | 48 => "foggy",
        56 | 57 | 66 | 67 => "freezing rain",
        51..=55 | 61..=65 | 80..=82 => "rainy",
        71..=77 | 85 | 86 => "snow",
        95..=99 => "thunderstorms",
        _ => "cloudy",
    }
}

fn at<T: Copy>(values: &[Option<T>], idx: usize) -> Option<T> {
    values.get(idx).copied().flatten()
}

fn into_current(current: Current) -> WeatherConditions {
    let temperature_f = current.temperature_2m;
    WeatherConditions {
        temperature_f,
        condition: condition_label(current.weather_code.unwrap_or(3)).to_string(),
        wind_speed_mph: current.wind_speed_10m.unwrap_or(0.0),
        wind_gusts_mph: current.wind_gusts_10m,
        humidity_pct: current.relative_humidity_2m.unwrap_or(50.0),
        visibility_mi: current
            .visibility
            .map(|m| (m / METERS_PER_MILE * 10.0).round() / 10.0)
            .unwrap_or(10.0),
        feels_like_f: current.apparent_temperature.unwrap_or(temperature_f),
        precipitation_chance_pct: current.precipitation_probability.unwrap_or(0.0),
        source: DataSource::Provider,
    }
}

fn into_forecast(daily: Daily) -> Vec<ForecastDay> {
    daily
        .time
        .iter()
        .enumerate()
        .filter_map(|(idx, date)| {
            Some(ForecastDay {
                date: *date,
                high_f: at(&daily.temperature_2m_max, idx)?,
                low_f: at(&daily.temperature_2m_min, idx)?,
                precipitation_chance_pct: at(&daily.precipitation_probability_max, idx)
                    .unwrap_or(0.0),
                wind_speed_mph: at(&daily.wind_speed_10m_max, idx).unwrap_or(0.0),
                condition: condition_label(at(&daily.weather_code, idx).unwrap_or(3)).to_string(),
                source: DataSource::Provider,
            })
        })
        .collect()
}

fn into_hourly(hourly: Hourly) -> Vec<HourlyForecast> {
    hourly
        .time
        .iter()
        .enumerate()
        .filter_map(|(idx, time)| {
            let time = NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M")
                .ok()?
                .and_utc();
            Some(HourlyForecast {
                time,
                temperature_f: at(&hourly.temperature_2m, idx)?,
                precipitation_chance_pct: at(&hourly.precipitation_probability, idx)
                    .unwrap_or(0.0),
                wind_speed_mph: at(&hourly.wind_speed_10m, idx).unwrap_or(0.0),
                condition: condition_label(at(&hourly.weather_code, idx).unwrap_or(3))
                    .to_string(),
                source: DataSource::Provider,
            })
        })
        .collect()
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn current(&self, at: Coordinates) -> ProviderResult<WeatherConditions> {
        let payload = self
            .fetch(
                at,
                &[(
                    "current",
                    "temperature_2m,relative_humidity_2m,apparent_temperature,precipitation_probability,weather_code,wind_speed_10m,wind_gusts_10m,visibility".to_string(),
                )],
            )
            .await?;
        payload
            .current
            .map(into_current)
            .ok_or_else(|| ProviderError::invalid(NAME, "missing current block"))
    }

    async fn forecast(&self, at: Coordinates, days: usize) -> ProviderResult<Vec<ForecastDay>> {
        let payload = self
            .fetch(
                at,
                &[
                    (
                        "daily",
                        "temperature_2m_max,temperature_2m_min,precipitation_probability_max,wind_speed_10m_max,weather_code".to_string(),
                    ),
                    ("forecast_days", days.clamp(1, 16).to_string()),
                ],
            )
            .await?;
        let days = payload.daily.map(into_forecast).unwrap_or_default();
        if days.is_empty() {
            return Err(ProviderError::invalid(NAME, "empty daily forecast"));
        }
        Ok(days)
    }

    async fn hourly(&self, at: Coordinates, hours: usize) -> ProviderResult<Vec<HourlyForecast>> {
        let payload = self
            .fetch(
                at,
                &[
                    (
                        "hourly",
                        "temperature_2m,precipitation_probability,wind_speed_10m,weather_code"
                            .to_string(),
                    ),
                    ("forecast_hours", hours.clamp(1, 384).to_string()),
                ],
            )
            .await?;
        let hours = payload.hourly.map(into_hourly).unwrap_or_default();
        if hours.is_empty() {
            return Err(ProviderError::invalid(NAME, "empty hourly forecast"));
        }
        Ok(hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wmo_codes_map_to_labels() {
        assert_eq!(condition_label(0), "clear");
        assert_eq!(condition_label(2), "partly cloudy");
        assert_eq!(condition_label(63), "rainy");
        assert_eq!(condition_label(67), "freezing rain");
        assert_eq!(condition_label(73), "snow");
        assert_eq!(condition_label(96), "thunderstorms");
    }

    #[test]
    fn parses_current_and_daily_blocks() {
        let payload: ForecastResponse = serde_json::from_value(serde_json::json!({
            "current": {
                "temperature_2m": 44.6,
                "relative_humidity_2m": 61.0,
                "apparent_temperature": 40.1,
                "weather_code": 0,
                "wind_speed_10m": 7.5,
                "visibility": 16093.44
            },
            "daily": {
                "time": ["2024-01-15", "2024-01-16"],
                "temperature_2m_max": [50.0, null],
                "temperature_2m_min": [30.0, 28.0],
                "precipitation_probability_max": [10.0, 20.0],
                "wind_speed_10m_max": [12.0, 9.0],
                "weather_code": [3, 71]
            }
        }))
        .unwrap();

        let current = into_current(payload.current.unwrap());
        assert_eq!(current.short_description(), "Clear, 45°F");
        assert_eq!(current.visibility_mi, 10.0);
        assert_eq!(current.source, DataSource::Provider);

        // Days with a missing high are dropped.
        let days = into_forecast(payload.daily.unwrap());
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].condition, "cloudy");
    }

    #[test]
    fn parses_hourly_times_as_utc() {
        let hourly: Hourly = serde_json::from_value(serde_json::json!({
            "time": ["2024-01-15T08:00", "2024-01-15T09:00"],
            "temperature_2m": [30.0, 32.0],
            "precipitation_probability": [5.0, 5.0],
            "wind_speed_10m": [4.0, 6.0],
            "weather_code": [1, 1]
        }))
        .unwrap();
        let hours = into_hourly(hourly);
        assert_eq!(hours.len(), 2);
        assert_eq!(hours[1].time.to_rfc3339(), "2024-01-15T09:00:00+00:00");
    }
}
