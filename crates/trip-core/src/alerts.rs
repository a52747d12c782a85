//! Alert classification, deduplication and the synthetic alert generator.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::corridors::{self, CorridorTier};
use crate::models::{Alert, AlertSeverity, DataSource, RawAlert, RoadConditions, Route};
use crate::seasonal::Season;

/// How long a synthetic alert stays valid.
const SYNTHETIC_VALIDITY_HOURS: i64 = 12;

/// Severity from keywords in the event text.
pub fn classify_severity(event: &str) -> AlertSeverity {
    let text = event.to_lowercase();
    if ["warning", "severe", "extreme"].iter().any(|k| text.contains(k)) {
        AlertSeverity::Severe
    } else if ["watch", "advisory"].iter().any(|k| text.contains(k)) {
        AlertSeverity::Moderate
    } else {
        AlertSeverity::Minor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardKind {
    SnowIce,
    RainFlood,
    Wind,
    Heat,
    Fog,
    Other,
}

impl HazardKind {
    pub fn detect(text: &str) -> Self {
        let text = text.to_lowercase();
        let words: Vec<&str> = text
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty())
            .collect();
        if has_word_prefix(&words, &["snow", "ice", "icy", "blizzard", "winter", "freez", "sleet"]) {
            HazardKind::SnowIce
        } else if has_word_prefix(&words, &["rain", "flood", "thunderstorm"]) {
            HazardKind::RainFlood
        } else if has_word_prefix(&words, &["wind"]) {
            HazardKind::Wind
        } else if has_word_prefix(&words, &["heat"]) {
            HazardKind::Heat
        } else if has_word_prefix(&words, &["fog"]) {
            HazardKind::Fog
        } else {
            HazardKind::Other
        }
    }

    fn impact(&self) -> &'static str {
        match self {
            HazardKind::SnowIce => "Hazardous winter driving, travel may be extremely dangerous",
            HazardKind::RainFlood => "Flooded roadways and reduced traction possible",
            HazardKind::Wind => "Difficult driving for high profile vehicles",
            HazardKind::Heat => "Risk of vehicle overheating and heat exhaustion",
            HazardKind::Fog => "Reduced visibility",
            HazardKind::Other => "Conditions may affect travel",
        }
    }

    fn recommendation(&self) -> &'static str {
        match self {
            HazardKind::SnowIce => "Avoid travel if possible; carry a winter emergency kit",
            HazardKind::RainFlood => "Never drive through flooded roads; allow extra following distance",
            HazardKind::Wind => "Use caution, especially with trailers",
            HazardKind::Heat => "Carry extra water and check coolant levels",
            HazardKind::Fog => "Reduce speed and use low beam headlights",
            HazardKind::Other => "Monitor local conditions before departing",
        }
    }

    fn road_conditions(&self) -> Option<RoadConditions> {
        let (surface, visibility, traffic) = match self {
            HazardKind::SnowIce => ("Snow covered", "Less than 1/4 mile", "Severely impacted"),
            HazardKind::RainFlood => ("Wet", "Reduced", "Slow"),
            HazardKind::Wind => ("Dry", "Good", "Normal"),
            HazardKind::Heat => ("Dry", "Good", "Normal"),
            HazardKind::Fog => ("Wet", "Poor", "Slow"),
            HazardKind::Other => return None,
        };
        Some(RoadConditions {
            surface: surface.to_string(),
            visibility: visibility.to_string(),
            traffic: traffic.to_string(),
        })
    }
}

fn has_word_prefix(words: &[&str], keys: &[&str]) -> bool {
    words.iter().any(|w| keys.iter().any(|k| w.starts_with(k)))
}

/// FNV-1a, stable across runs so alert ids survive a cache round trip.
pub(crate) fn stable_hash(parts: &[&str]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for part in parts {
        for byte in part.bytes().chain(std::iter::once(0x1f)) {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}

/// Turn a provider alert into a classified `Alert`.
pub fn classify(raw: &RawAlert, fallback_location: &str, source: DataSource) -> Alert {
    let location = raw
        .area
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(fallback_location)
        .to_string();
    let title = raw.event.trim().to_string();
    let kind = match HazardKind::detect(&title) {
        HazardKind::Other => HazardKind::detect(&raw.description),
        kind => kind,
    };
    let expires = raw.expires.map(|t| t.to_rfc3339()).unwrap_or_default();

    Alert {
        id: format!("alert-{:016x}", stable_hash(&[&title, &location, &expires])),
        severity: classify_severity(&title),
        description: raw.description.trim().to_string(),
        valid_until: raw.expires,
        impact: kind.impact().to_string(),
        recommendation: kind.recommendation().to_string(),
        road_conditions: kind.road_conditions(),
        title,
        location,
        source,
    }
}

/// Drop alerts sharing (title, location) with an earlier one.
pub fn dedupe(alerts: Vec<Alert>) -> Vec<Alert> {
    let mut seen = HashSet::new();
    alerts
        .into_iter()
        .filter(|a| seen.insert((a.title.clone(), a.location.clone())))
        .collect()
}

struct SeasonalHazard {
    corridor: &'static str,
    season: Season,
    event: &'static str,
    description: &'static str,
    location: &'static str,
}

const fn hazard(
    corridor: &'static str,
    season: Season,
    event: &'static str,
    description: &'static str,
    location: &'static str,
) -> SeasonalHazard {
    SeasonalHazard {
        corridor,
        season,
        event,
        description,
        location,
    }
}

static SEASONAL_HAZARDS: &[SeasonalHazard] = &[
    hazard(
        "rapid-city-miami",
        Season::Winter,
        "Winter Weather Advisory",
        "Light snow and blowing snow possible across the northern plains. Slick spots on I-90 and bridges.",
        "Rapid City, SD",
    ),
    hazard(
        "rapid-city-miami",
        Season::Winter,
        "Wind Advisory",
        "Sustained crosswinds of 25-35 mph across the Nebraska and Kansas plains.",
        "North Platte, NE",
    ),
    hazard(
        "rapid-city-miami",
        Season::Summer,
        "Heat Advisory",
        "Heat index values up to 108 expected during the afternoon.",
        "Little Rock, AR to Memphis, TN",
    ),
    hazard(
        "rapid-city-miami",
        Season::Summer,
        "Afternoon Thunderstorm Advisory",
        "Scattered afternoon thunderstorms with heavy rain and lightning are likely.",
        "Miami, FL",
    ),
    hazard(
        "rapid-city-miami",
        Season::Spring,
        "Severe Thunderstorm Watch",
        "Conditions favorable for severe storms with large hail across the mid-south.",
        "Springfield, MO to Memphis, TN",
    ),
    hazard(
        "rapid-city-miami",
        Season::Fall,
        "Dense Fog Advisory",
        "Morning fog reducing visibility to under a quarter mile in river valleys.",
        "Nashville, TN",
    ),
    hazard(
        "rapid-city-los-angeles",
        Season::Winter,
        "Winter Storm Warning",
        "Heavy snow over the mountain passes with chain restrictions likely on I-70.",
        "Denver, CO to Grand Junction, CO",
    ),
    hazard(
        "rapid-city-los-angeles",
        Season::Summer,
        "Excessive Heat Warning",
        "Temperatures up to 115 across the Mojave during the afternoon.",
        "Las Vegas, NV",
    ),
    hazard(
        "chicago-miami",
        Season::Winter,
        "Lake Effect Snow Advisory",
        "Bands of lake effect snow with rapidly changing visibility.",
        "Chicago, IL",
    ),
    hazard(
        "chicago-miami",
        Season::Summer,
        "Afternoon Thunderstorm Advisory",
        "Scattered afternoon thunderstorms with heavy rain and lightning are likely.",
        "Miami, FL",
    ),
    hazard(
        "new-york-los-angeles",
        Season::Winter,
        "Winter Weather Advisory",
        "Snow and freezing drizzle across the Ohio valley and southern plains.",
        "St Louis, MO to Oklahoma City, OK",
    ),
    hazard(
        "new-york-los-angeles",
        Season::Summer,
        "Excessive Heat Warning",
        "Dangerously hot conditions through the desert Southwest.",
        "Phoenix, AZ",
    ),
    hazard(
        "new-york-los-angeles",
        Season::Spring,
        "High Wind Warning",
        "West winds gusting to 60 mph on open stretches of I-40.",
        "Amarillo, TX to Albuquerque, NM",
    ),
];

fn generic_advisory(season: Season) -> (&'static str, &'static str) {
    match season {
        Season::Winter => (
            "Winter Travel Advisory",
            "Cold temperatures and possible snow or ice along the route. Check road conditions before departing.",
        ),
        Season::Spring => (
            "Spring Storm Advisory",
            "Spring storms can bring heavy rain and strong winds with little notice.",
        ),
        Season::Summer => (
            "Summer Heat Advisory",
            "High temperatures expected during afternoon driving hours. Stay hydrated.",
        ),
        Season::Fall => (
            "Fall Fog Advisory",
            "Early morning fog is common in low-lying areas this time of year.",
        ),
    }
}

/// Alerts generated when every provider failed for every stop.
///
/// Curated corridors get hand-authored seasonal hazards. Anything else gets a
/// single generic seasonal advisory for the whole route.
pub fn synthetic_alerts(route: &Route, now: DateTime<Utc>) -> Vec<Alert> {
    let season = Season::from_month(route.departure.month());
    let corridor_id = route.corridor.clone().or_else(|| {
        corridors::find(
            &route.origin,
            &route.destination,
            &[CorridorTier::Override, CorridorTier::Template],
        )
        .map(|c| c.id.to_string())
    });
    let expires = Some(now + Duration::hours(SYNTHETIC_VALIDITY_HOURS));

    let curated: Vec<Alert> = corridor_id
        .as_deref()
        .map(|id| {
            SEASONAL_HAZARDS
                .iter()
                .filter(|h| h.corridor == id && h.season == season)
                .map(|h| {
                    classify(
                        &RawAlert {
                            event: h.event.to_string(),
                            description: h.description.to_string(),
                            area: Some(h.location.to_string()),
                            expires,
                        },
                        h.location,
                        DataSource::Synthetic,
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    if !curated.is_empty() {
        return curated;
    }

    let (event, description) = generic_advisory(season);
    let location = format!("{} to {}", route.origin, route.destination);
    vec![classify(
        &RawAlert {
            event: event.to_string(),
            description: description.to_string(),
            area: Some(location.clone()),
            expires,
        },
        &location,
        DataSource::Synthetic,
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, RoutePoint, RouteSource, TripCosts};
    use chrono::TimeZone;

    fn raw(event: &str, area: Option<&str>) -> RawAlert {
        RawAlert {
            event: event.to_string(),
            description: "details".to_string(),
            area: area.map(str::to_string),
            expires: None,
        }
    }

    fn route(origin: &str, destination: &str, month: u32, corridor: Option<&str>) -> Route {
        let departure = Utc.with_ymd_and_hms(2024, month, 10, 8, 0, 0).unwrap();
        let point = |label: &str, minutes| RoutePoint {
            label: label.to_string(),
            coordinates: Coordinates::new(40.0, -100.0),
            elapsed_minutes: minutes,
        };
        Route {
            route_id: "r".to_string(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            waypoints: vec![],
            points: vec![point(origin, 0), point(destination, 60)],
            distance_miles: 60.0,
            duration_minutes: 60,
            highways: vec![],
            recommended_stops: vec![],
            costs: TripCosts {
                fuel: 0,
                tolls: 0,
                lodging: 0,
                food: 0,
            },
            geometry: vec![],
            source: RouteSource::Interpolated,
            corridor: corridor.map(str::to_string),
            departure,
            created_at: departure,
        }
    }

    #[test]
    fn severity_keywords() {
        assert_eq!(classify_severity("Winter Storm Warning"), AlertSeverity::Severe);
        assert_eq!(classify_severity("Extreme Cold"), AlertSeverity::Severe);
        assert_eq!(classify_severity("Flood Watch"), AlertSeverity::Moderate);
        assert_eq!(classify_severity("Dense Fog Advisory"), AlertSeverity::Moderate);
        assert_eq!(classify_severity("Special Weather Statement"), AlertSeverity::Minor);
    }

    #[test]
    fn templates_follow_keywords() {
        let snow = classify(&raw("Winter Storm Warning", Some("Denver")), "x", DataSource::Provider);
        assert_eq!(snow.road_conditions.unwrap().surface, "Snow covered");

        let fog = classify(&raw("Dense Fog Advisory", None), "Memphis, TN", DataSource::Provider);
        assert_eq!(fog.location, "Memphis, TN");
        assert_eq!(fog.recommendation, "Reduce speed and use low beam headlights");

        let other = classify(&raw("Air Quality Alert", None), "x", DataSource::Provider);
        assert!(other.road_conditions.is_none());
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let mut first = classify(&raw("Wind Advisory", Some("Kansas")), "x", DataSource::Provider);
        first.description = "first".to_string();
        let mut second = first.clone();
        second.description = "second".to_string();
        let other = classify(&raw("Wind Advisory", Some("Nebraska")), "x", DataSource::Provider);

        let deduped = dedupe(vec![first, second, other]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].description, "first");
    }

    #[test]
    fn synthetic_uses_curated_corridor_hazards() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
        let alerts = synthetic_alerts(&route("Rapid City", "Miami", 1, None), now);
        assert!(alerts.len() >= 2);
        assert!(alerts.iter().all(|a| a.source == DataSource::Synthetic));
        assert!(alerts.iter().any(|a| a.location == "Rapid City, SD"));

        let summer = synthetic_alerts(&route("Rapid City", "Miami", 7, Some("rapid-city-miami")), now);
        assert!(summer.iter().any(|a| a.title == "Heat Advisory"));
    }

    #[test]
    fn synthetic_generic_for_unknown_pairs() {
        let now = Utc.with_ymd_and_hms(2024, 10, 10, 8, 0, 0).unwrap();
        let alerts = synthetic_alerts(&route("Unknown Town", "Another Unknown", 10, None), now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].title, "Fall Fog Advisory");
        assert_eq!(alerts[0].location, "Unknown Town to Another Unknown");
        assert!(alerts[0].valid_until.is_some());
    }
}
