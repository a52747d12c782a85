//! Day-by-day weather timeline along a route.

use chrono::Duration;

use crate::models::{Preferences, RiskLevel, Route, TimelineSegment, WeatherSnapshot};

pub const MAX_SEGMENTS: usize = 7;

pub fn risk_level(precipitation_chance_pct: f64, wind_speed_mph: f64) -> RiskLevel {
    if precipitation_chance_pct > 70.0 {
        RiskLevel::High
    } else if wind_speed_mph > 25.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Label of the last route point reached after `elapsed` driving minutes.
fn location_at(route: &Route, elapsed: u32) -> String {
    route
        .points
        .iter()
        .take_while(|p| p.elapsed_minutes <= elapsed)
        .last()
        .map(|p| p.label.clone())
        .unwrap_or_else(|| route.origin.clone())
}

/// One segment per driving day, then the arrival, up to `MAX_SEGMENTS`.
///
/// Day `n` starts `n` calendar days after departure at the location reached
/// after `n * hours_per_day` hours of driving. Weather comes from the forecast
/// day with the same date, else from current conditions at that location.
pub fn build_timeline(
    route: &Route,
    weather: &WeatherSnapshot,
    preferences: &Preferences,
) -> Vec<TimelineSegment> {
    let daily_minutes = preferences.hours_per_day.max(1) * 60;
    let mut segments = Vec::new();

    let mut day: u32 = 0;
    while segments.len() < MAX_SEGMENTS {
        let elapsed = day * daily_minutes;
        let arrived = elapsed >= route.duration_minutes;
        let (time, location) = if arrived {
            let full_days = route.duration_minutes / daily_minutes;
            let remainder = route.duration_minutes % daily_minutes;
            (
                route.departure
                    + Duration::days(full_days as i64)
                    + Duration::minutes(remainder as i64),
                route
                    .destination_point()
                    .map(|p| p.label.clone())
                    .unwrap_or_else(|| route.destination.clone()),
            )
        } else {
            (
                route.departure + Duration::days(day as i64),
                location_at(route, elapsed),
            )
        };

        let forecast = weather.forecast.iter().find(|f| f.date == time.date_naive());
        let (condition, temperature_f, precipitation_chance_pct, wind_speed_mph) = match forecast {
            Some(f) => (f.condition.clone(), f.high_f, f.precipitation_chance_pct, f.wind_speed_mph),
            None => {
                let current = weather
                    .for_label(route, &location)
                    .unwrap_or(if arrived { &weather.destination } else { &weather.origin });
                (
                    current.condition.clone(),
                    current.temperature_f,
                    current.precipitation_chance_pct,
                    current.wind_speed_mph,
                )
            }
        };

        segments.push(TimelineSegment {
            time,
            location,
            condition,
            temperature_f,
            precipitation_chance_pct,
            wind_speed_mph,
            is_overnight: day > 0 && !arrived,
            risk: risk_level(precipitation_chance_pct, wind_speed_mph),
        });

        if arrived {
            break;
        }
        day += 1;
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corridors::by_id;
    use crate::models::{DataSource, ForecastDay, RouteSource, WeatherConditions};
    use crate::routing::{self, RouteRequestNames};
    use crate::rules::CostModel;
    use chrono::{TimeZone, Utc};

    fn conditions(precip: f64, wind: f64) -> WeatherConditions {
        WeatherConditions {
            temperature_f: 50.0,
            condition: "cloudy".to_string(),
            wind_speed_mph: wind,
            wind_gusts_mph: None,
            humidity_pct: 50.0,
            visibility_mi: 10.0,
            feels_like_f: 50.0,
            precipitation_chance_pct: precip,
            source: DataSource::Synthetic,
        }
    }

    fn route() -> Route {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        routing::from_corridor(
            &RouteRequestNames {
                route_id: "t",
                origin: "Rapid City",
                destination: "Miami",
                waypoints: &[],
                departure: at,
                created_at: at,
            },
            by_id("rapid-city-miami").unwrap(),
            RouteSource::CorridorOverride,
            &CostModel::default(),
        )
    }

    #[test]
    fn risk_thresholds() {
        assert_eq!(risk_level(80.0, 5.0), RiskLevel::High);
        assert_eq!(risk_level(20.0, 30.0), RiskLevel::Medium);
        assert_eq!(risk_level(70.0, 25.0), RiskLevel::Low);
    }

    #[test]
    fn segments_follow_driving_days() {
        let route = route();
        let start = route.departure.date_naive();
        let weather = WeatherSnapshot {
            route_id: "t".to_string(),
            origin: conditions(10.0, 5.0),
            destination: conditions(10.0, 5.0),
            waypoints: vec![],
            forecast: (0..7)
                .map(|d| ForecastDay {
                    date: start + Duration::days(d),
                    high_f: 60.0,
                    low_f: 40.0,
                    precipitation_chance_pct: if d == 1 { 90.0 } else { 10.0 },
                    wind_speed_mph: 5.0,
                    condition: "rainy".to_string(),
                    source: DataSource::Synthetic,
                })
                .collect(),
            fetched_at: route.created_at,
        };
        let prefs = Preferences::default();
        let timeline = build_timeline(&route, &weather, &prefs);

        // 23h15m at 8h per day: three starts and the arrival.
        assert_eq!(timeline.len(), 4);
        assert_eq!(timeline[0].location, "Rapid City, SD");
        assert!(!timeline[0].is_overnight);
        assert_eq!(timeline[1].location, "Kansas City, MO");
        assert!(timeline[1].is_overnight);
        assert_eq!(timeline[1].risk, RiskLevel::High);
        assert_eq!(timeline[3].location, "Miami, FL");
        assert!(!timeline[3].is_overnight);
        assert!(timeline.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[test]
    fn capped_at_seven_segments() {
        let route = route();
        let weather = WeatherSnapshot {
            route_id: "t".to_string(),
            origin: conditions(10.0, 30.0),
            destination: conditions(10.0, 5.0),
            waypoints: vec![],
            forecast: vec![],
            fetched_at: route.created_at,
        };
        let prefs = Preferences {
            hours_per_day: 2,
            ..Preferences::default()
        };
        let timeline = build_timeline(&route, &weather, &prefs);
        assert_eq!(timeline.len(), MAX_SEGMENTS);
        assert_eq!(timeline[0].risk, RiskLevel::Medium);
    }
}
