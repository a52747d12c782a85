//! Trip optimizer: score, departure, annotated stops, safety notes, summary
//! and tags. Pure; identical inputs always give identical output.

use chrono::{Datelike, NaiveTime, Timelike};

use crate::corridors;
use crate::models::{
    AnnotatedStop, OptimizationResult, Preferences, RecommendedStop, ReturnRoute, Route,
    SafetyRecommendation, ScoreLabel, WeatherSnapshot,
};
use crate::rules::PlannerRules;
use crate::spatial::haversine_miles;

/// Placeholder when no weather can be matched to a stop.
pub const NO_WEATHER: &str = "Check local conditions";

/// Stops further than this from every weather sample get no annotation.
const WEATHER_MATCH_RADIUS_MI: f64 = 75.0;

/// Facts about the trip shared by every rule.
struct TripProfile {
    long: bool,
    winter: bool,
    mountain: bool,
    desert: bool,
    metro: bool,
}

impl TripProfile {
    fn new(route: &Route, rules: &PlannerRules) -> Self {
        Self {
            long: route.duration_hours() > rules.long_trip_hours,
            winter: rules.is_winter_month(route.departure.month()),
            mountain: uses_any(route, &rules.mountain_highways),
            desert: uses_any(route, &rules.desert_highways),
            metro: uses_any(route, &rules.metro_highways),
        }
    }
}

fn uses_any(route: &Route, highways: &[String]) -> bool {
    highways.iter().any(|h| route.has_highway(h))
}

pub fn optimize(
    route: &Route,
    weather: &WeatherSnapshot,
    preferences: &Preferences,
    rules: &PlannerRules,
) -> OptimizationResult {
    let profile = TripProfile::new(route, rules);
    let route_score = score(&profile, preferences, rules);
    let travel_days = travel_days(route.duration_minutes, preferences);
    let estimated_duration = format_duration(route.duration_minutes);

    let recommended_stops = route
        .recommended_stops
        .iter()
        .map(|stop| AnnotatedStop {
            weather: stop_weather(route, weather, stop),
            stop: stop.clone(),
        })
        .collect();

    OptimizationResult {
        route_id: route.route_id.clone(),
        route_score,
        score_label: ScoreLabel::from_score(route_score),
        optimal_departure: format_clock(optimal_departure(&profile, preferences, rules)),
        total_duration_minutes: route.duration_minutes,
        summary: summary(route, &profile, preferences, travel_days, &estimated_duration),
        estimated_duration,
        travel_days,
        recommended_stops,
        safety_recommendations: safety_recommendations(route, &profile, preferences, rules),
        tags: tags(route, &profile, preferences),
    }
}

fn score(profile: &TripProfile, preferences: &Preferences, rules: &PlannerRules) -> u8 {
    let mut score = i64::from(rules.base_score);
    if profile.long {
        score += i64::from(rules.long_trip_delta);
    }
    if profile.winter {
        score += i64::from(rules.winter_delta);
    }
    if preferences.avoid_severe_weather {
        score += i64::from(rules.avoid_severe_weather_delta);
    }
    let (min, max) = if rules.min_score <= rules.max_score {
        (rules.min_score, rules.max_score)
    } else {
        (rules.max_score, rules.min_score)
    };
    score.clamp(i64::from(min), i64::from(max)) as u8
}

/// Preferred time, pulled earlier for long trips with a small daily budget.
fn optimal_departure(
    profile: &TripProfile,
    preferences: &Preferences,
    rules: &PlannerRules,
) -> NaiveTime {
    let preferred = preferences
        .departure_time()
        .unwrap_or_else(|| NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default());
    if !(profile.long && preferences.hours_per_day <= rules.low_daily_hours) {
        return preferred;
    }
    let earliest = NaiveTime::from_hms_opt(rules.earliest_departure_hour.min(23), 0, 0)
        .unwrap_or_default();
    let shifted_hour = preferred.hour() as i64 - rules.early_start_shift_hours;
    let shifted = if shifted_hour < 0 {
        earliest
    } else {
        preferred
            .with_hour(shifted_hour as u32)
            .unwrap_or(earliest)
    };
    shifted.max(earliest.min(preferred))
}

/// "6:00 AM"
fn format_clock(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// "23h 15m", "45m", "6h"
pub fn format_duration(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

fn travel_days(duration_minutes: u32, preferences: &Preferences) -> u32 {
    let daily_hours = preferences
        .hours_per_day
        .min(preferences.max_driving_time)
        .max(1);
    let days = (duration_minutes as f64 / 60.0 / daily_hours as f64).ceil() as u32;
    days.max(1)
}

fn stop_weather(route: &Route, weather: &WeatherSnapshot, stop: &RecommendedStop) -> String {
    if let Some(conditions) = weather.for_label(route, &stop.label) {
        return conditions.short_description();
    }

    let mut samples = Vec::with_capacity(weather.waypoints.len() + 2);
    if let Some(origin) = route.origin_point() {
        samples.push((origin.coordinates, &weather.origin));
    }
    if let Some(destination) = route.destination_point() {
        samples.push((destination.coordinates, &weather.destination));
    }
    samples.extend(weather.waypoints.iter().map(|w| (w.coordinates, &w.weather)));

    samples
        .into_iter()
        .map(|(at, conditions)| (haversine_miles(at, stop.coordinates), conditions))
        .filter(|(distance, _)| *distance <= WEATHER_MATCH_RADIUS_MI)
        .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, conditions)| conditions.short_description())
        .unwrap_or_else(|| NO_WEATHER.to_string())
}

fn entry(title: &str, description: impl Into<String>) -> SafetyRecommendation {
    SafetyRecommendation {
        title: title.to_string(),
        description: description.into(),
    }
}

fn safety_recommendations(
    route: &Route,
    profile: &TripProfile,
    preferences: &Preferences,
    rules: &PlannerRules,
) -> Vec<SafetyRecommendation> {
    let mut out = vec![
        entry(
            "Vehicle Preparation",
            "Check tire pressure, brakes, fluids and lights before departure.",
        ),
        entry(
            "Emergency Kit",
            "Pack water, snacks, a first aid kit, flashlight and phone charger.",
        ),
    ];

    if profile.winter {
        out.push(entry(
            "Carry Winter Emergency Kit",
            "Pack blankets, food, water, an ice scraper and traction aids.",
        ));
        out.push(entry(
            "Check Tire Conditions",
            "Ensure tires have adequate tread for snow and ice.",
        ));
    }

    if route.duration_hours() > rules.rest_strategy_hours {
        out.push(entry(
            "Rest Strategy",
            format!(
                "Take a break every 2 hours and limit driving to {} hours per day.",
                preferences.hours_per_day
            ),
        ));
    }

    if route.distance_miles > rules.fuel_strategy_miles {
        out.push(entry(
            "Fuel Strategy",
            "Keep the tank above half full in case of unexpected delays.",
        ));
    }

    if profile.mountain {
        out.push(entry(
            "Mountain Pass Caution",
            "Check pass conditions and chain requirements; weather changes quickly at elevation.",
        ));
    }
    if profile.desert {
        out.push(entry(
            "Desert Heat Caution",
            "Carry extra water and watch engine temperature on long desert stretches.",
        ));
    }
    if profile.metro {
        out.push(entry(
            "Metro Traffic",
            "Time your passage through major cities to avoid rush hour congestion.",
        ));
    }

    out
}

fn summary(
    route: &Route,
    profile: &TripProfile,
    preferences: &Preferences,
    travel_days: u32,
    estimated_duration: &str,
) -> String {
    let mut sentences = Vec::new();

    match route.corridor.as_deref().and_then(corridors::by_id) {
        Some(corridor) => sentences.push(corridor.description.to_string()),
        None => sentences.push(format!(
            "Your {:.0}-mile trip from {} to {} takes about {} of driving.",
            route.distance_miles, route.origin, route.destination, estimated_duration
        )),
    }

    if profile.long {
        sentences.push(format!(
            "Plan on {} days of travel at {} hours of driving per day.",
            travel_days, preferences.hours_per_day
        ));
    } else {
        sentences.push("This trip fits comfortably in a single day of driving.".to_string());
    }

    if profile.winter {
        sentences.push(
            "Winter conditions are possible, so allow extra time and check forecasts before each leg."
                .to_string(),
        );
    }

    if preferences.round_trip {
        sentences.push(match preferences.return_route {
            ReturnRoute::Same => "The return trip follows the same route.".to_string(),
            ReturnRoute::Alternate => {
                "An alternate return route adds variety to the trip home.".to_string()
            }
        });
    }

    sentences.join(" ")
}

fn tags(route: &Route, profile: &TripProfile, preferences: &Preferences) -> Vec<String> {
    let mut tags: Vec<&str> = Vec::new();

    if profile.long {
        tags.push("Extended Journey");
    } else if route.duration_hours() <= 4.0 {
        tags.push("Short Trip");
    } else {
        tags.push("Day Trip");
    }
    if profile.winter {
        tags.push("Winter Weather");
    }
    if profile.mountain {
        tags.push("Mountain Driving");
    }
    if profile.desert {
        tags.push("Desert Crossing");
    }
    if profile.metro {
        tags.push("Urban Traffic");
    }
    if preferences.round_trip {
        tags.push("Round Trip");
        if preferences.return_route == ReturnRoute::Alternate {
            tags.push("Alternate Return");
        }
    }
    if preferences.avoid_severe_weather {
        tags.push("Weather Dependent");
    }
    if preferences.prioritize_speed {
        tags.push("Fastest Route");
    }

    let mut out: Vec<String> = tags.into_iter().map(str::to_string).collect();
    if let Some(corridor) = route.corridor.as_deref().and_then(corridors::by_id) {
        out.push(corridor.name.to_string());
    }
    out
}
