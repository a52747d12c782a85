//! External data providers.
//!
//! Each concern is an async trait so the HTTP clients can be swapped for
//! stubs. Every call goes through [`CallPolicy`], which applies the shared
//! timeout and per-provider backoff, so a slow or failing provider is just
//! another error for the caller's fallback chain.

pub mod mapbox;
pub mod nws;
pub mod open_meteo;
pub mod stub;
pub mod weatherbit;

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use trip_core::{Coordinates, ForecastDay, HourlyForecast, RawAlert, WeatherConditions};

use crate::backoff::ProviderGates;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {message}")]
    Request {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} returned HTTP {status}")]
    Status { provider: &'static str, status: u16 },
    #[error("{provider} returned an unusable response: {message}")]
    Invalid {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} found nothing for the request")]
    NoResult { provider: &'static str },
    #[error("{provider} timed out after {timeout_ms} ms")]
    Timeout {
        provider: &'static str,
        timeout_ms: u64,
    },
    #[error("{provider} skipped while backing off")]
    BackingOff { provider: &'static str },
}

impl ProviderError {
    /// Whether this error says something about the provider's health.
    fn counts_against_provider(&self) -> bool {
        !matches!(
            self,
            ProviderError::NoResult { .. } | ProviderError::BackingOff { .. }
        )
    }

    pub(crate) fn request(provider: &'static str, err: impl std::fmt::Display) -> Self {
        ProviderError::Request {
            provider,
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid(provider: &'static str, message: impl Into<String>) -> Self {
        ProviderError::Invalid {
            provider,
            message: message.into(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Driving directions through an ordered list of stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Directions {
    pub geometry: Vec<Coordinates>,
    pub distance_miles: f64,
    pub duration_minutes: u32,
    /// One entry per leg between consecutive stops.
    pub leg_durations_minutes: Vec<u32>,
    pub instructions: Vec<String>,
}

#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn geocode(&self, query: &str) -> ProviderResult<Coordinates>;
}

#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn directions(&self, stops: &[Coordinates]) -> ProviderResult<Directions>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn current(&self, at: Coordinates) -> ProviderResult<WeatherConditions>;
    async fn forecast(&self, at: Coordinates, days: usize) -> ProviderResult<Vec<ForecastDay>>;
    async fn hourly(&self, at: Coordinates, hours: usize) -> ProviderResult<Vec<HourlyForecast>>;
}

#[async_trait]
pub trait AlertProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn alerts(&self, at: Coordinates) -> ProviderResult<Vec<RawAlert>>;
}

/// Uniform timeout and backoff contract for provider calls.
#[derive(Debug)]
pub struct CallPolicy {
    timeout: Duration,
    gates: ProviderGates,
}

impl CallPolicy {
    pub fn new(timeout: Duration, backoff_base: Duration, backoff_max: Duration) -> Self {
        Self {
            timeout,
            gates: ProviderGates::new(backoff_base, backoff_max),
        }
    }

    pub async fn call<T, F>(&self, provider: &'static str, request: F) -> ProviderResult<T>
    where
        F: Future<Output = ProviderResult<T>>,
    {
        if !self.gates.ready(provider) {
            return Err(ProviderError::BackingOff { provider });
        }

        let result = match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                provider,
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        };

        match &result {
            Ok(_) => self.gates.succeeded(provider),
            Err(err) if err.counts_against_provider() => {
                let delay = self.gates.failed(provider);
                tracing::debug!("{} backing off for {:?}", provider, delay);
            }
            Err(_) => {}
        }
        result
    }
}

/// Shared HTTP client for provider implementations.
pub fn http_client(user_agent: &str, timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(user_agent.to_string())
        .timeout(timeout)
        .build()
        .unwrap_or_else(|err| {
            tracing::warn!("HTTP client builder failed, using defaults: {}", err);
            reqwest::Client::new()
        })
}

/// Map a non-success status to a provider error.
pub(crate) fn check_status(
    provider: &'static str,
    response: reqwest::Response,
) -> ProviderResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
        })
    }
}
