//! In-process providers with canned answers and call counters.
//!
//! A stub built with `failing` returns a 503 status error on every call.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use trip_core::{
    Coordinates, DataSource, ForecastDay, HourlyForecast, RawAlert, WeatherConditions,
};

use super::{
    AlertProvider, Directions, DirectionsProvider, GeocodingProvider, ProviderError,
    ProviderResult, WeatherProvider,
};

#[derive(Debug, Default)]
struct Calls(AtomicUsize);

impl Calls {
    fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

fn unavailable(provider: &'static str) -> ProviderError {
    ProviderError::Status {
        provider,
        status: 503,
    }
}

#[derive(Debug, Default)]
pub struct StubGeocoder {
    places: HashMap<String, Coordinates>,
    calls: Calls,
}

impl StubGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_place(mut self, name: &str, coordinates: Coordinates) -> Self {
        self.places.insert(name.trim().to_lowercase(), coordinates);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

#[async_trait]
impl GeocodingProvider for StubGeocoder {
    fn name(&self) -> &'static str {
        "stub-geocoder"
    }

    async fn geocode(&self, query: &str) -> ProviderResult<Coordinates> {
        self.calls.hit();
        self.places
            .get(&query.trim().to_lowercase())
            .copied()
            .ok_or(ProviderError::NoResult {
                provider: "stub-geocoder",
            })
    }
}

#[derive(Debug, Default)]
pub struct StubDirections {
    response: Option<Directions>,
    calls: Calls,
}

impl StubDirections {
    pub fn new(response: Directions) -> Self {
        Self {
            response: Some(response),
            calls: Calls::default(),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

#[async_trait]
impl DirectionsProvider for StubDirections {
    fn name(&self) -> &'static str {
        "stub-directions"
    }

    async fn directions(&self, _stops: &[Coordinates]) -> ProviderResult<Directions> {
        self.calls.hit();
        self.response
            .clone()
            .ok_or_else(|| unavailable("stub-directions"))
    }
}

/// Weather stub. Every point gets the same conditions.
#[derive(Debug, Default)]
pub struct StubWeather {
    conditions: Option<WeatherConditions>,
    delay: Option<Duration>,
    calls: Calls,
}

impl StubWeather {
    pub fn new(conditions: WeatherConditions) -> Self {
        Self {
            conditions: Some(conditions),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Total calls across current, forecast and hourly.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn conditions(&self) -> ProviderResult<&WeatherConditions> {
        self.conditions
            .as_ref()
            .ok_or_else(|| unavailable("stub-weather"))
    }
}

#[async_trait]
impl WeatherProvider for StubWeather {
    fn name(&self) -> &'static str {
        "stub-weather"
    }

    async fn current(&self, _at: Coordinates) -> ProviderResult<WeatherConditions> {
        self.calls.hit();
        pause(self.delay).await;
        self.conditions().cloned()
    }

    async fn forecast(&self, _at: Coordinates, days: usize) -> ProviderResult<Vec<ForecastDay>> {
        self.calls.hit();
        pause(self.delay).await;
        let current = self.conditions()?;
        let today = Utc::now().date_naive();
        Ok((0..days)
            .map(|offset| ForecastDay {
                date: today + ChronoDuration::days(offset as i64),
                high_f: current.temperature_f + 5.0,
                low_f: current.temperature_f - 10.0,
                precipitation_chance_pct: current.precipitation_chance_pct,
                wind_speed_mph: current.wind_speed_mph,
                condition: current.condition.clone(),
                source: DataSource::Provider,
            })
            .collect())
    }

    async fn hourly(&self, _at: Coordinates, hours: usize) -> ProviderResult<Vec<HourlyForecast>> {
        self.calls.hit();
        pause(self.delay).await;
        let current = self.conditions()?;
        let now = Utc::now();
        Ok((0..hours)
            .map(|offset| HourlyForecast {
                time: now + ChronoDuration::hours(offset as i64),
                temperature_f: current.temperature_f,
                precipitation_chance_pct: current.precipitation_chance_pct,
                wind_speed_mph: current.wind_speed_mph,
                condition: current.condition.clone(),
                source: DataSource::Provider,
            })
            .collect())
    }
}

/// Alert stub. Returns the same alerts for every point.
#[derive(Debug)]
pub struct StubAlerts {
    name: &'static str,
    alerts: Option<Vec<RawAlert>>,
    calls: Calls,
}

impl StubAlerts {
    pub fn new(name: &'static str, alerts: Vec<RawAlert>) -> Self {
        Self {
            name,
            alerts: Some(alerts),
            calls: Calls::default(),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            alerts: None,
            calls: Calls::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

#[async_trait]
impl AlertProvider for StubAlerts {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn alerts(&self, _at: Coordinates) -> ProviderResult<Vec<RawAlert>> {
        self.calls.hit();
        self.alerts.clone().ok_or_else(|| unavailable(self.name))
    }
}
