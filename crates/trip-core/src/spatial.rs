//! Spatial math for route synthesis.

use crate::models::Coordinates;

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MI: f64 = 3959.0;

/// Great-circle distance between two points in miles (Haversine formula).
pub fn haversine_miles(from: Coordinates, to: Coordinates) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let dphi = (to.lat - from.lat).to_radians();
    let dlambda = (to.lng - from.lng).to_radians();

    let a = (dphi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_MI * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Linear interpolation between two coordinates. `t` is clamped to [0, 1].
pub fn lerp(from: Coordinates, to: Coordinates, t: f64) -> Coordinates {
    let t = t.clamp(0.0, 1.0);
    Coordinates {
        lat: from.lat + (to.lat - from.lat) * t,
        lng: from.lng + (to.lng - from.lng) * t,
    }
}

/// Total length of a polyline in miles.
pub fn path_length_miles(path: &[Coordinates]) -> f64 {
    path.windows(2)
        .map(|pair| haversine_miles(pair[0], pair[1]))
        .sum()
}

/// Position at `fraction` of the way along a polyline, measured by distance.
pub fn point_along(path: &[Coordinates], fraction: f64) -> Option<Coordinates> {
    let first = *path.first()?;
    let total = path_length_miles(path);
    if total <= 0.0 || path.len() < 2 {
        return Some(first);
    }

    let target = total * fraction.clamp(0.0, 1.0);
    let mut travelled = 0.0;
    for pair in path.windows(2) {
        let leg = haversine_miles(pair[0], pair[1]);
        if travelled + leg >= target {
            let t = if leg > 0.0 { (target - travelled) / leg } else { 0.0 };
            return Some(lerp(pair[0], pair[1], t));
        }
        travelled += leg;
    }
    path.last().copied()
}
