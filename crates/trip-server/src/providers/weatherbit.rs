//! Weatherbit severe weather alerts (secondary alert provider).

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;

use trip_core::{Coordinates, RawAlert};

use super::{check_status, AlertProvider, ProviderError, ProviderResult};

const NAME: &str = "weatherbit";

#[derive(Debug, Clone)]
pub struct WeatherbitClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherbitClient {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AlertsResponse {
    #[serde(default)]
    alerts: Vec<WeatherbitAlert>,
}

#[derive(Debug, Deserialize)]
struct WeatherbitAlert {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    regions: Vec<String>,
    /// "2024-01-16T13:00:00", UTC without offset.
    #[serde(default)]
    expires_utc: Option<String>,
}

fn into_raw(response: AlertsResponse) -> Vec<RawAlert> {
    response
        .alerts
        .into_iter()
        .filter(|a| !a.title.trim().is_empty())
        .map(|a| RawAlert {
            expires: a
                .expires_utc
                .as_deref()
                .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok())
                .map(|t| t.and_utc()),
            area: (!a.regions.is_empty()).then(|| a.regions.join(", ")),
            description: a.description.unwrap_or_default(),
            event: a.title,
        })
        .collect()
}

#[async_trait]
impl AlertProvider for WeatherbitClient {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn alerts(&self, at: Coordinates) -> ProviderResult<Vec<RawAlert>> {
        let response = self
            .client
            .get(format!("{}/alerts", self.base_url))
            .query(&[
                ("lat", format!("{:.4}", at.lat)),
                ("lon", format!("{:.4}", at.lng)),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::request(NAME, e))?;
        let payload: AlertsResponse = check_status(NAME, response)?
            .json()
            .await
            .map_err(|e| ProviderError::invalid(NAME, e.to_string()))?;
        Ok(into_raw(payload))
    }
}
