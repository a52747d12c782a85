//! National Weather Service active alerts (primary alert provider).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use trip_core::{Coordinates, RawAlert};

use super::{check_status, AlertProvider, ProviderError, ProviderResult};

const NAME: &str = "nws";

#[derive(Debug, Clone)]
pub struct NwsClient {
    client: Client,
    base_url: String,
}

impl NwsClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AlertCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: Properties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Properties {
    #[serde(default)]
    event: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    area_desc: Option<String>,
    #[serde(default)]
    expires: Option<DateTime<Utc>>,
}

fn into_raw(collection: AlertCollection) -> Vec<RawAlert> {
    collection
        .features
        .into_iter()
        .map(|f| f.properties)
        .filter(|p| !p.event.trim().is_empty())
        .map(|p| RawAlert {
            event: p.event,
            description: p.description.unwrap_or_default(),
            area: p.area_desc,
            expires: p.expires,
        })
        .collect()
}

#[async_trait]
impl AlertProvider for NwsClient {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn alerts(&self, at: Coordinates) -> ProviderResult<Vec<RawAlert>> {
        let response = self
            .client
            .get(format!("{}/alerts/active", self.base_url))
            .query(&[("point", format!("{:.4},{:.4}", at.lat, at.lng))])
            .header(reqwest::header::ACCEPT, "application/geo+json")
            .send()
            .await
            .map_err(|e| ProviderError::request(NAME, e))?;
        let payload: AlertCollection = check_status(NAME, response)?
            .json()
            .await
            .map_err(|e| ProviderError::invalid(NAME, e.to_string()))?;
        Ok(into_raw(payload))
    }
}
