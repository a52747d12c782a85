//! Route assembly: curated templates, geometry sampling, interpolation
//! fallback, duration-threshold stops and the cost model.

use chrono::{DateTime, Utc};

use crate::corridors::Corridor;
use crate::models::{
    Coordinates, RecommendedStop, Route, RoutePoint, RouteSource, TripCosts,
};
use crate::rules::{CostModel, StopThresholds};
use crate::spatial::{haversine_miles, lerp, path_length_miles, point_along};

/// Assumed average speed for synthesized routes.
pub const SYNTH_SPEED_MPH: f64 = 65.0;
/// Floor applied to degenerate synthesized distances (origin == destination).
pub const MIN_SYNTH_DISTANCE_MILES: f64 = 1.0;
/// Interpolated points per leg when synthesizing.
const SYNTH_SEGMENTS_PER_LEG: u32 = 5;
/// Maximum geometry samples taken from a directions polyline.
const MAX_GEOMETRY_SAMPLES: usize = 10;

/// Names the caller asked for, carried onto the route unchanged.
#[derive(Debug, Clone)]
pub struct RouteRequestNames<'a> {
    pub route_id: &'a str,
    pub origin: &'a str,
    pub destination: &'a str,
    pub waypoints: &'a [String],
    pub departure: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to build a `Route` before invariants are enforced.
#[derive(Debug, Clone)]
pub struct RouteParts {
    pub points: Vec<RoutePoint>,
    pub distance_miles: f64,
    pub highways: Vec<String>,
    pub recommended_stops: Vec<RecommendedStop>,
    pub geometry: Vec<Coordinates>,
    pub source: RouteSource,
    pub corridor: Option<String>,
}

/// Build a route, enforcing ordering and positivity invariants and pricing it.
pub fn assemble(names: &RouteRequestNames<'_>, parts: RouteParts, costs: &CostModel) -> Route {
    let mut points = parts.points;
    enforce_strict_offsets(&mut points);
    let duration_minutes = points
        .last()
        .map(|p| p.elapsed_minutes)
        .unwrap_or(1)
        .max(1);
    let distance_miles = if parts.distance_miles.is_finite() {
        parts.distance_miles.max(MIN_SYNTH_DISTANCE_MILES)
    } else {
        MIN_SYNTH_DISTANCE_MILES
    };

    let mut stops = parts.recommended_stops;
    stops.sort_by_key(|s| s.elapsed_minutes);

    Route {
        route_id: names.route_id.to_string(),
        origin: names.origin.to_string(),
        destination: names.destination.to_string(),
        waypoints: names.waypoints.to_vec(),
        points,
        distance_miles,
        duration_minutes,
        highways: parts.highways,
        recommended_stops: stops,
        costs: estimate_costs(distance_miles, costs),
        geometry: parts.geometry,
        source: parts.source,
        corridor: parts.corridor,
        departure: names.departure,
        created_at: names.created_at,
    }
}

/// Make elapsed offsets strictly increasing, starting at zero.
fn enforce_strict_offsets(points: &mut [RoutePoint]) {
    let mut previous: Option<u32> = None;
    for point in points.iter_mut() {
        point.elapsed_minutes = match previous {
            None => 0,
            Some(prev) => point.elapsed_minutes.max(prev + 1),
        };
        previous = Some(point.elapsed_minutes);
    }
}

/// Deterministic cost estimate from total distance.
pub fn estimate_costs(distance_miles: f64, model: &CostModel) -> TripCosts {
    let distance = distance_miles.max(0.0);
    let fuel = distance / model.miles_per_gallon * model.price_per_gallon;
    let lodging = if distance > model.lodging_threshold_miles {
        model.lodging_flat_fee
    } else {
        0.0
    };
    TripCosts {
        fuel: fuel.round() as u32,
        tolls: (distance * model.toll_rate_per_mile).round() as u32,
        lodging: lodging.round() as u32,
        food: (distance * model.food_rate_per_mile).round() as u32,
    }
}

/// "7 hours from start", "45 minutes from start", "7h 30m from start".
pub fn format_eta(elapsed_minutes: u32) -> String {
    let hours = elapsed_minutes / 60;
    let minutes = elapsed_minutes % 60;
    match (hours, minutes) {
        (0, m) => format!("{} minutes from start", m),
        (1, 0) => "1 hour from start".to_string(),
        (h, 0) => format!("{} hours from start", h),
        (h, m) => format!("{}h {}m from start", h, m),
    }
}

/// Instantiate a curated corridor as a route.
pub fn from_corridor(
    names: &RouteRequestNames<'_>,
    corridor: &Corridor,
    source: RouteSource,
    costs: &CostModel,
) -> Route {
    let points: Vec<RoutePoint> = corridor
        .points
        .iter()
        .map(|p| RoutePoint {
            label: p.label.to_string(),
            coordinates: p.coordinates(),
            elapsed_minutes: p.elapsed_minutes,
        })
        .collect();
    let geometry = points.iter().map(|p| p.coordinates).collect();
    let stops = corridor
        .stops
        .iter()
        .map(|s| RecommendedStop {
            label: s.label.to_string(),
            category: s.category.to_string(),
            rationale: s.rationale.to_string(),
            eta: format_eta(s.elapsed_minutes),
            elapsed_minutes: s.elapsed_minutes,
            coordinates: Coordinates::new(s.lat, s.lng),
        })
        .collect();

    assemble(
        names,
        RouteParts {
            points,
            distance_miles: corridor.distance_miles,
            highways: corridor.highways.iter().map(|h| h.to_string()).collect(),
            recommended_stops: stops,
            geometry,
            source,
            corridor: Some(corridor.id.to_string()),
        },
        costs,
    )
}

/// Rest/meal/overnight stops placed purely from elapsed-duration thresholds.
pub fn threshold_stops(
    duration_minutes: u32,
    path: &[Coordinates],
    thresholds: &StopThresholds,
) -> Vec<RecommendedStop> {
    let total_hours = duration_minutes as f64 / 60.0;
    let mut stops = Vec::new();
    if total_hours <= 0.0 {
        return stops;
    }

    let mut push = |label: &str, category: &str, rationale: &str, at_hours: f64| {
        let elapsed = (at_hours * 60.0).round() as u32;
        let fraction = at_hours / total_hours;
        let coordinates = point_along(path, fraction).unwrap_or(Coordinates::new(0.0, 0.0));
        stops.push(RecommendedStop {
            label: label.to_string(),
            category: category.to_string(),
            rationale: rationale.to_string(),
            eta: format_eta(elapsed),
            elapsed_minutes: elapsed,
            coordinates,
        });
    };

    if total_hours > thresholds.rest_after_hours {
        push(
            "Rest Stop",
            "Fuel & Rest",
            "Recommended break after 4 hours driving",
            thresholds.rest_after_hours,
        );
    }
    if total_hours > thresholds.meal_after_hours {
        push(
            "Meal Break",
            "Rest & Meal",
            "Lunch stop and vehicle check",
            total_hours / 2.0,
        );
    }
    if total_hours > thresholds.overnight_after_hours {
        push(
            "Overnight Stop",
            "Overnight",
            "Avoid night driving, rest safely",
            total_hours * thresholds.overnight_fraction,
        );
    }
    stops
}

/// Straight-line route through origin, waypoints and destination.
///
/// `stops` are the resolved (label, coordinates) pairs in travel order,
/// origin first and destination last. Never fails.
pub fn interpolate(
    names: &RouteRequestNames<'_>,
    stops: &[(String, Coordinates)],
    thresholds: &StopThresholds,
    costs: &CostModel,
) -> Route {
    let anchors: Vec<(String, Coordinates)> = match stops.len() {
        0 => vec![
            (names.origin.to_string(), crate::gazetteer::CONTINENTAL_CENTROID),
            (names.destination.to_string(), crate::gazetteer::CONTINENTAL_CENTROID),
        ],
        1 => vec![stops[0].clone(), (names.destination.to_string(), stops[0].1)],
        _ => stops.to_vec(),
    };

    let anchor_coords: Vec<Coordinates> = anchors.iter().map(|(_, c)| *c).collect();
    let distance = path_length_miles(&anchor_coords).max(MIN_SYNTH_DISTANCE_MILES);
    let duration_minutes = ((distance / SYNTH_SPEED_MPH) * 60.0).ceil().max(1.0) as u32;
    let legs = (anchors.len() - 1) as u32;
    let segments_per_leg = SYNTH_SEGMENTS_PER_LEG
        .min((duration_minutes / legs.max(1)).max(1));

    let leg_lengths: Vec<f64> = anchor_coords
        .windows(2)
        .map(|pair| haversine_miles(pair[0], pair[1]))
        .collect();
    let raw_total: f64 = leg_lengths.iter().sum();

    let mut points = Vec::new();
    let mut geometry = Vec::new();
    let mut travelled = 0.0;
    for (leg_idx, pair) in anchors.windows(2).enumerate() {
        let (from_label, from) = (&pair[0].0, pair[0].1);
        let to = pair[1].1;
        let leg_len = leg_lengths[leg_idx];
        let leg_share = if raw_total > 0.0 {
            leg_len / raw_total
        } else {
            1.0 / legs as f64
        };
        let leg_start_fraction = if raw_total > 0.0 {
            travelled / raw_total
        } else {
            leg_idx as f64 / legs as f64
        };

        for step in 0..segments_per_leg {
            let t = step as f64 / segments_per_leg as f64;
            let fraction = leg_start_fraction + leg_share * t;
            let coordinates = lerp(from, to, t);
            let label = if step == 0 {
                from_label.clone()
            } else {
                format!("Mile {}", (fraction * distance).round() as u32)
            };
            points.push(RoutePoint {
                label,
                coordinates,
                elapsed_minutes: (fraction * duration_minutes as f64).round() as u32,
            });
            geometry.push(coordinates);
        }
        travelled += leg_len;
    }
    if let Some((label, coordinates)) = anchors.last() {
        points.push(RoutePoint {
            label: label.clone(),
            coordinates: *coordinates,
            elapsed_minutes: duration_minutes,
        });
        geometry.push(*coordinates);
    }

    let recommended_stops = threshold_stops(duration_minutes, &geometry, thresholds);

    assemble(
        names,
        RouteParts {
            points,
            distance_miles: distance,
            highways: Vec::new(),
            recommended_stops,
            geometry,
            source: RouteSource::Interpolated,
            corridor: None,
        },
        costs,
    )
}

/// A named boundary between directions legs (a user waypoint).
#[derive(Debug, Clone)]
pub struct LegBoundary {
    pub label: String,
    pub coordinates: Coordinates,
    pub elapsed_minutes: u32,
}

/// Sample a directions polyline into labelled route points.
///
/// Produces at most `MAX_GEOMETRY_SAMPLES` evenly spaced "Mile N" samples,
/// merged with the waypoint boundaries, with origin first and destination last.
pub fn points_from_geometry(
    origin: (&str, Coordinates),
    destination: (&str, Coordinates),
    geometry: &[Coordinates],
    boundaries: &[LegBoundary],
    duration_minutes: u32,
    distance_miles: f64,
) -> Vec<RoutePoint> {
    let mut points = vec![RoutePoint {
        label: origin.0.to_string(),
        coordinates: geometry.first().copied().unwrap_or(origin.1),
        elapsed_minutes: 0,
    }];

    if geometry.len() > 2 {
        let samples = MAX_GEOMETRY_SAMPLES.min(geometry.len());
        let step = (geometry.len() / samples).max(1);
        for idx in (step..geometry.len() - 1).step_by(step) {
            let progress = idx as f64 / (geometry.len() - 1) as f64;
            points.push(RoutePoint {
                label: format!("Mile {}", (progress * distance_miles).round() as u32),
                coordinates: geometry[idx],
                elapsed_minutes: (progress * duration_minutes as f64).round() as u32,
            });
        }
    }

    for boundary in boundaries {
        points.push(RoutePoint {
            label: boundary.label.clone(),
            coordinates: boundary.coordinates,
            elapsed_minutes: boundary.elapsed_minutes,
        });
    }

    points[1..].sort_by_key(|p| p.elapsed_minutes);
    points.retain(|p| p.elapsed_minutes < duration_minutes || p.label == origin.0);
    points.dedup_by(|b, a| a.elapsed_minutes == b.elapsed_minutes && b.label.starts_with("Mile "));

    points.push(RoutePoint {
        label: destination.0.to_string(),
        coordinates: geometry.last().copied().unwrap_or(destination.1),
        elapsed_minutes: duration_minutes,
    });
    points
}
