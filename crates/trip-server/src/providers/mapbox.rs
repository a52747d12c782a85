//! Mapbox geocoding and driving directions.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use trip_core::Coordinates;

use super::{
    check_status, Directions, DirectionsProvider, GeocodingProvider, ProviderError,
    ProviderResult,
};

const NAME: &str = "mapbox";
const METERS_PER_MILE: f64 = 1609.344;

#[derive(Debug, Clone)]
pub struct MapboxClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl MapboxClient {
    pub fn new(client: Client, base_url: &str, access_token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    fn url(&self, segments: &[&str]) -> ProviderResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| ProviderError::request(NAME, e))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::invalid(NAME, "base URL cannot carry a path"))?
            .extend(segments);
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    /// [lng, lat]
    center: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    distance: f64,
    duration: f64,
    geometry: LineString,
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct LineString {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    duration: f64,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Step {
    #[serde(default)]
    name: String,
    #[serde(default, rename = "ref")]
    road_ref: Option<String>,
    maneuver: Maneuver,
}

#[derive(Debug, Deserialize)]
struct Maneuver {
    #[serde(default)]
    instruction: String,
}

#[async_trait]
impl GeocodingProvider for MapboxClient {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn geocode(&self, query: &str) -> ProviderResult<Coordinates> {
        let place = format!("{}.json", query.trim());
        let url = self.url(&["geocoding", "v5", "mapbox.places", &place])?;
        let response = self
            .client
            .get(url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("limit", "1"),
                ("country", "us"),
                ("types", "place,locality,address,poi,region"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::request(NAME, e))?;
        let payload: GeocodeResponse = check_status(NAME, response)?
            .json()
            .await
            .map_err(|e| ProviderError::invalid(NAME, e.to_string()))?;

        let [lng, lat] = payload
            .features
            .first()
            .map(|f| f.center)
            .ok_or(ProviderError::NoResult { provider: NAME })?;
        let coordinates = Coordinates::new(lat, lng);
        if !coordinates.is_finite() {
            return Err(ProviderError::invalid(NAME, "non-finite coordinates"));
        }
        Ok(coordinates)
    }
}

#[async_trait]
impl DirectionsProvider for MapboxClient {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn directions(&self, stops: &[Coordinates]) -> ProviderResult<Directions> {
        if stops.len() < 2 {
            return Err(ProviderError::invalid(NAME, "need at least two stops"));
        }
        let path = stops
            .iter()
            .map(|c| format!("{:.6},{:.6}", c.lng, c.lat))
            .collect::<Vec<_>>()
            .join(";");
        let url = self.url(&["directions", "v5", "mapbox", "driving", &path])?;
        let response = self
            .client
            .get(url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("geometries", "geojson"),
                ("overview", "full"),
                ("steps", "true"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::request(NAME, e))?;
        let payload: DirectionsResponse = check_status(NAME, response)?
            .json()
            .await
            .map_err(|e| ProviderError::invalid(NAME, e.to_string()))?;

        let route = payload
            .routes
            .into_iter()
            .next()
            .ok_or(ProviderError::NoResult { provider: NAME })?;
        into_directions(route)
    }
}

fn into_directions(route: DirectionsRoute) -> ProviderResult<Directions> {
    if !(route.distance > 0.0 && route.duration > 0.0) {
        return Err(ProviderError::invalid(NAME, "empty route"));
    }
    let geometry: Vec<Coordinates> = route
        .geometry
        .coordinates
        .iter()
        .map(|[lng, lat]| Coordinates::new(*lat, *lng))
        .filter(Coordinates::is_finite)
        .collect();
    if geometry.len() < 2 {
        return Err(ProviderError::invalid(NAME, "geometry has fewer than two points"));
    }

    let instructions = route
        .legs
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .flat_map(|step| {
            [
                Some(step.maneuver.instruction.clone()),
                Some(step.name.clone()),
                step.road_ref.clone(),
            ]
        })
        .flatten()
        .filter(|text| !text.is_empty())
        .collect();

    Ok(Directions {
        geometry,
        distance_miles: route.distance / METERS_PER_MILE,
        duration_minutes: (route.duration / 60.0).round().max(1.0) as u32,
        leg_durations_minutes: route
            .legs
            .iter()
            .map(|leg| (leg.duration / 60.0).round() as u32)
            .collect(),
        instructions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_directions_payload() {
        let payload: DirectionsResponse = serde_json::from_value(serde_json::json!({
            "routes": [{
                "distance": 160934.4,
                "duration": 5400.0,
                "geometry": {"coordinates": [[-104.99, 39.74], [-104.5, 39.5], [-104.0, 39.2]]},
                "legs": [{
                    "duration": 5400.0,
                    "steps": [
                        {"name": "", "maneuver": {"instruction": "Merge onto I-70 East"}},
                        {"name": "US 40", "ref": "US 40", "maneuver": {"instruction": "Continue"}}
                    ]
                }]
            }]
        }))
        .unwrap();

        let directions = into_directions(payload.routes.into_iter().next().unwrap()).unwrap();
        assert!((directions.distance_miles - 100.0).abs() < 0.01);
        assert_eq!(directions.duration_minutes, 90);
        assert_eq!(directions.leg_durations_minutes, vec![90]);
        assert_eq!(directions.geometry[0], Coordinates::new(39.74, -104.99));
        let highways = trip_core::extract_highways(directions.instructions.iter().map(String::as_str));
        assert_eq!(highways, vec!["I-70".to_string(), "US-40".to_string()]);
    }

    #[test]
    fn rejects_empty_route() {
        let route = DirectionsRoute {
            distance: 0.0,
            duration: 0.0,
            geometry: LineString {
                coordinates: vec![],
            },
            legs: vec![],
        };
        assert!(into_directions(route).is_err());
    }
}
