//! Blocking HTTP client for the trip server API.

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use trip_core::{
    Alert, OptimizationResult, PlanRequest, Preferences, Route, TimelineSegment, WeatherSnapshot,
};

/// Body of a successful `POST /v1/plans`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub route: Route,
    pub weather: WeatherSnapshot,
    pub alerts: Vec<Alert>,
    pub optimization: OptimizationResult,
    #[serde(default)]
    pub timeline: Vec<TimelineSegment>,
}

pub struct PlannerClient {
    client: Client,
    base_url: String,
}

impl PlannerClient {
    /// `base_url` is the server root, e.g. "http://localhost:3000".
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn plan(&self, request: &PlanRequest) -> Result<PlanResponse> {
        let url = format!("{}/v1/plans", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .with_context(|| format!("Failed to reach {}", url))?;
        read_json(response)
    }

    /// Preferences stored for a user, or the server defaults.
    pub fn preferences(&self, user_id: &str) -> Result<Preferences> {
        let url = format!("{}/v1/users/{}/preferences", self.base_url, user_id);
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("Failed to reach {}", url))?;
        read_json(response)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        bail!("Server returned {}: {}", status, error_message(&body));
    }
    response.json().context("Failed to decode server response")
}

/// The `error` field of an API error body, or the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("error")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
