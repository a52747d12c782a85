//! Core data models for the trip planning pipeline.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::stable_hash;
use crate::error::ValidationError;

/// Geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// How a location name was turned into coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoConfidence {
    /// Exact match in the static gazetteer.
    Gazetteer,
    /// Resolved by the geocoding provider (possibly from the process cache).
    Geocoded,
    /// Nothing matched; coordinates are the continental centroid default.
    Placeholder,
}

/// Result of resolving a free-text location name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoResolution {
    pub query: String,
    pub coordinates: Coordinates,
    pub confidence: GeoConfidence,
}

impl GeoResolution {
    pub fn is_placeholder(&self) -> bool {
        self.confidence == GeoConfidence::Placeholder
    }
}

/// A named point on a route with its elapsed driving time from the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub label: String,
    pub coordinates: Coordinates,
    pub elapsed_minutes: u32,
}

/// A suggested rest, fuel, or overnight stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedStop {
    pub label: String,
    pub category: String,
    pub rationale: String,
    /// Human readable ETA, e.g. "7 hours from start".
    pub eta: String,
    pub elapsed_minutes: u32,
    pub coordinates: Coordinates,
}

/// Estimated trip costs in whole dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripCosts {
    pub fuel: u32,
    pub tolls: u32,
    pub lodging: u32,
    pub food: u32,
}

impl TripCosts {
    pub fn total(&self) -> u32 {
        self.fuel + self.tolls + self.lodging + self.food
    }
}

/// Which tier produced a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    CorridorOverride,
    Directions,
    CorridorTemplate,
    Interpolated,
}

/// A fully resolved route. Created once per planning request and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub route_id: String,
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub waypoints: Vec<String>,
    /// Ordered by strictly increasing elapsed time; origin first, destination last.
    pub points: Vec<RoutePoint>,
    pub distance_miles: f64,
    pub duration_minutes: u32,
    pub highways: Vec<String>,
    pub recommended_stops: Vec<RecommendedStop>,
    pub costs: TripCosts,
    #[serde(default)]
    pub geometry: Vec<Coordinates>,
    pub source: RouteSource,
    #[serde(default)]
    pub corridor: Option<String>,
    pub departure: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Route {
    pub fn duration_hours(&self) -> f64 {
        self.duration_minutes as f64 / 60.0
    }

    pub fn origin_point(&self) -> Option<&RoutePoint> {
        self.points.first()
    }

    pub fn destination_point(&self) -> Option<&RoutePoint> {
        self.points.last()
    }

    /// Points strictly between origin and destination, in route order.
    pub fn intermediate_points(&self) -> &[RoutePoint] {
        if self.points.len() <= 2 {
            return &[];
        }
        &self.points[1..self.points.len() - 1]
    }

    pub fn has_highway(&self, highway: &str) -> bool {
        self.highways.iter().any(|h| h.eq_ignore_ascii_case(highway))
    }

    /// Identity of the trip itself: endpoints, waypoints and sampled points.
    /// Two routes with the same fingerprint have the same conditions.
    pub fn fingerprint(&self) -> String {
        let mut parts = vec![self.origin.to_lowercase(), self.destination.to_lowercase()];
        parts.extend(self.waypoints.iter().map(|w| w.to_lowercase()));
        parts.extend(self.points.iter().map(|p| {
            format!("{}@{:.4},{:.4}", p.label, p.coordinates.lat, p.coordinates.lng)
        }));
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        format!("{:016x}", stable_hash(&parts))
    }
}

/// Where a piece of conditions data came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Provider,
    Synthetic,
}

/// Current weather at a single point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConditions {
    pub temperature_f: f64,
    pub condition: String,
    pub wind_speed_mph: f64,
    #[serde(default)]
    pub wind_gusts_mph: Option<f64>,
    pub humidity_pct: f64,
    pub visibility_mi: f64,
    pub feels_like_f: f64,
    pub precipitation_chance_pct: f64,
    #[serde(default)]
    pub source: DataSource,
}

impl WeatherConditions {
    /// Short description used to annotate stops, e.g. "Clear, 45°F".
    pub fn short_description(&self) -> String {
        let mut condition = self.condition.clone();
        if let Some(first) = condition.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        format!("{}, {:.0}°F", condition, self.temperature_f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointWeather {
    pub label: String,
    pub coordinates: Coordinates,
    pub weather: WeatherConditions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: chrono::NaiveDate,
    pub high_f: f64,
    pub low_f: f64,
    pub precipitation_chance_pct: f64,
    pub wind_speed_mph: f64,
    pub condition: String,
    #[serde(default)]
    pub source: DataSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: DateTime<Utc>,
    pub temperature_f: f64,
    pub precipitation_chance_pct: f64,
    pub wind_speed_mph: f64,
    pub condition: String,
    #[serde(default)]
    pub source: DataSource,
}

/// Weather for every stop on a route plus a multi-day forecast at the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub route_id: String,
    pub origin: WeatherConditions,
    pub destination: WeatherConditions,
    /// Same order as the route's intermediate points.
    pub waypoints: Vec<WaypointWeather>,
    pub forecast: Vec<ForecastDay>,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// Weather for a route label, matching origin, destination or a waypoint.
    pub fn for_label<'a>(&'a self, route: &Route, label: &str) -> Option<&'a WeatherConditions> {
        if let Some(origin) = route.origin_point() {
            if origin.label.eq_ignore_ascii_case(label) {
                return Some(&self.origin);
            }
        }
        if let Some(dest) = route.destination_point() {
            if dest.label.eq_ignore_ascii_case(label) {
                return Some(&self.destination);
            }
        }
        self.waypoints
            .iter()
            .find(|w| w.label.eq_ignore_ascii_case(label))
            .map(|w| &w.weather)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Minor,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadConditions {
    pub surface: String,
    pub visibility: String,
    pub traffic: String,
}

/// A hazard or advisory affecting part of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    pub location: String,
    pub valid_until: Option<DateTime<Utc>>,
    pub impact: String,
    pub recommendation: String,
    #[serde(default)]
    pub road_conditions: Option<RoadConditions>,
    #[serde(default)]
    pub source: DataSource,
}

/// Alert as returned by a provider, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAlert {
    pub event: String,
    pub description: String,
    pub area: Option<String>,
    pub expires: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnRoute {
    #[default]
    Same,
    Alternate,
}

/// User travel preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub hours_per_day: u32,
    pub max_driving_time: u32,
    /// "HH:MM", 24 hour clock.
    pub preferred_departure_time: String,
    pub avoid_severe_weather: bool,
    pub prioritize_speed: bool,
    pub round_trip: bool,
    pub return_route: ReturnRoute,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            hours_per_day: 8,
            max_driving_time: 12,
            preferred_departure_time: "08:00".to_string(),
            avoid_severe_weather: true,
            prioritize_speed: false,
            round_trip: false,
            return_route: ReturnRoute::Same,
        }
    }
}

impl Preferences {
    pub fn departure_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(self.preferred_departure_time.trim(), "%H:%M").ok()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.departure_time().is_none() {
            return Err(ValidationError::InvalidDepartureTime(
                self.preferred_departure_time.clone(),
            ));
        }
        if !(1..=24).contains(&self.hours_per_day) {
            return Err(ValidationError::InvalidHoursPerDay(self.hours_per_day));
        }
        if !(1..=24).contains(&self.max_driving_time) {
            return Err(ValidationError::InvalidMaxDrivingTime(self.max_driving_time));
        }
        Ok(())
    }
}

/// Inbound planning request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub route_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub waypoints: Vec<String>,
    pub departure_date: DateTime<Utc>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl PlanRequest {
    /// Boundary check. The only failure a planning request can produce.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.origin.trim().is_empty() {
            return Err(ValidationError::EmptyOrigin);
        }
        if self.destination.trim().is_empty() {
            return Err(ValidationError::EmptyDestination);
        }
        self.preferences.validate()
    }

    /// Waypoint names with blanks removed.
    pub fn clean_waypoints(&self) -> Vec<String> {
        self.waypoints
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyRecommendation {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreLabel {
    Excellent,
    Good,
    Poor,
}

impl ScoreLabel {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Self::Excellent,
            60..=79 => Self::Good,
            _ => Self::Poor,
        }
    }
}

/// A recommended stop annotated with weather for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedStop {
    #[serde(flatten)]
    pub stop: RecommendedStop,
    pub weather: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub route_id: String,
    pub route_score: u8,
    pub score_label: ScoreLabel,
    /// Display string, e.g. "6:00 AM".
    pub optimal_departure: String,
    pub total_duration_minutes: u32,
    /// Display string, e.g. "23h 15m".
    pub estimated_duration: String,
    pub travel_days: u32,
    pub recommended_stops: Vec<AnnotatedStop>,
    pub safety_recommendations: Vec<SafetyRecommendation>,
    pub summary: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// One leg of the day-by-day weather timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSegment {
    pub time: DateTime<Utc>,
    pub location: String,
    pub condition: String,
    pub temperature_f: f64,
    pub precipitation_chance_pct: f64,
    pub wind_speed_mph: f64,
    pub is_overnight: bool,
    pub risk: RiskLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_default_matches_product_defaults() {
        let prefs: Preferences = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs.hours_per_day, 8);
        assert_eq!(prefs.max_driving_time, 12);
        assert_eq!(prefs.preferred_departure_time, "08:00");
        assert!(prefs.avoid_severe_weather);
        assert_eq!(prefs.return_route, ReturnRoute::Same);
    }

    fn request(origin: &str, destination: &str) -> PlanRequest {
        serde_json::from_value(serde_json::json!({
            "origin": origin,
            "destination": destination,
            "departure_date": "2024-01-15T08:00:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn validation_rejects_bad_requests() {
        assert!(request("Rapid City", "Miami").validate().is_ok());
        assert_eq!(
            request("  ", "Miami").validate(),
            Err(ValidationError::EmptyOrigin)
        );
        assert_eq!(
            request("Rapid City", "").validate(),
            Err(ValidationError::EmptyDestination)
        );

        let mut bad_time = request("Rapid City", "Miami");
        bad_time.preferences.preferred_departure_time = "25:99".to_string();
        assert!(matches!(
            bad_time.validate(),
            Err(ValidationError::InvalidDepartureTime(_))
        ));

        let mut bad_hours = request("Rapid City", "Miami");
        bad_hours.preferences.hours_per_day = 0;
        assert_eq!(bad_hours.validate(), Err(ValidationError::InvalidHoursPerDay(0)));
    }

    #[test]
    fn blank_waypoints_are_dropped() {
        let mut req = request("Chicago", "Phoenix");
        req.waypoints = vec![" Denver ".to_string(), "".to_string()];
        assert_eq!(req.clean_waypoints(), vec!["Denver".to_string()]);
    }

    fn corridor_route(route_id: &str, corridor_id: &str, created_minute: u32) -> Route {
        use chrono::TimeZone;

        let at = Utc.with_ymd_and_hms(2024, 1, 15, 8, created_minute, 0).unwrap();
        let corridor = crate::corridors::by_id(corridor_id).unwrap();
        let names = crate::routing::RouteRequestNames {
            route_id,
            origin: "Rapid City, SD",
            destination: "Miami, FL",
            waypoints: &[],
            departure: at,
            created_at: at,
        };
        crate::routing::from_corridor(
            &names,
            corridor,
            RouteSource::CorridorOverride,
            &crate::rules::CostModel::default(),
        )
    }

    #[test]
    fn fingerprint_ignores_id_and_timestamps() {
        let first = corridor_route("trip-1", "rapid-city-miami", 0);
        let again = corridor_route("trip-2", "rapid-city-miami", 30);
        assert_eq!(first.fingerprint(), again.fingerprint());
        assert_eq!(first.fingerprint().len(), 16);
    }

    #[test]
    fn fingerprint_tells_trips_apart() {
        let miami = corridor_route("trip-1", "rapid-city-miami", 0);
        let mut other = corridor_route("trip-1", "chicago-miami", 0);
        other.origin = "Chicago, IL".to_string();
        assert_ne!(miami.fingerprint(), other.fingerprint());

        let mut detour = miami.clone();
        detour.waypoints.push("Denver, CO".to_string());
        assert_ne!(miami.fingerprint(), detour.fingerprint());
    }

    #[test]
    fn score_label_thresholds() {
        assert_eq!(ScoreLabel::from_score(100), ScoreLabel::Excellent);
        assert_eq!(ScoreLabel::from_score(80), ScoreLabel::Excellent);
        assert_eq!(ScoreLabel::from_score(79), ScoreLabel::Good);
        assert_eq!(ScoreLabel::from_score(60), ScoreLabel::Good);
        assert_eq!(ScoreLabel::from_score(59), ScoreLabel::Poor);
    }

    #[test]
    fn short_description_capitalizes_condition() {
        let weather = WeatherConditions {
            temperature_f: 44.6,
            condition: "clear".to_string(),
            wind_speed_mph: 5.0,
            wind_gusts_mph: None,
            humidity_pct: 40.0,
            visibility_mi: 10.0,
            feels_like_f: 42.0,
            precipitation_chance_pct: 0.0,
            source: DataSource::Provider,
        };
        assert_eq!(weather.short_description(), "Clear, 45°F");
    }
}
