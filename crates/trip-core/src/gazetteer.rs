//! Static gazetteer of well-known places.
//!
//! Lookups are exact after normalization (trimmed, lowercase, no whitespace
//! around commas), so "Rapid City, SD" and "rapid city,sd" hit the same entry.

use crate::models::Coordinates;

/// Geographic center of the contiguous United States. Used as the placeholder
/// when nothing else resolves a name.
pub const CONTINENTAL_CENTROID: Coordinates = Coordinates::new(39.8283, -98.5795);

const PLACES: &[(&str, f64, f64)] = &[
    ("rapid city,sd", 44.0805, -103.2310),
    ("miami,fl", 25.7617, -80.1918),
    ("denver,co", 39.7392, -104.9903),
    ("kansas city,mo", 39.0997, -94.5786),
    ("atlanta,ga", 33.7490, -84.3880),
    ("nashville,tn", 36.1627, -86.7816),
    ("memphis,tn", 35.1495, -90.0490),
    ("little rock,ar", 34.7465, -92.2896),
    ("oklahoma city,ok", 35.4676, -97.5164),
    ("dallas,tx", 32.7767, -96.7970),
    ("new orleans,la", 29.9511, -90.0715),
    ("jacksonville,fl", 30.3322, -81.6557),
    ("tallahassee,fl", 30.4518, -84.2807),
    ("chicago,il", 41.8781, -87.6298),
    ("new york,ny", 40.7128, -74.0060),
    ("los angeles,ca", 34.0522, -118.2437),
    ("phoenix,az", 33.4484, -112.0740),
    ("houston,tx", 29.7604, -95.3698),
    ("salt lake city,ut", 40.7608, -111.8910),
    ("minneapolis,mn", 44.9778, -93.2650),
    ("omaha,ne", 41.2565, -95.9345),
    ("des moines,ia", 41.5868, -93.6250),
    ("st louis,mo", 38.6270, -90.1994),
    ("birmingham,al", 33.5207, -86.8025),
    ("jackson,ms", 32.2988, -90.1848),
    ("montgomery,al", 32.3668, -86.3000),
    ("gainesville,fl", 29.6516, -82.3248),
    ("north platte,ne", 41.1238, -100.7654),
    ("springfield,mo", 37.2153, -93.2982),
    ("indianapolis,in", 39.7684, -86.1581),
    ("louisville,ky", 38.2527, -85.7585),
    ("amarillo,tx", 35.2220, -101.8313),
    ("albuquerque,nm", 35.0844, -106.6504),
    ("las vegas,nv", 36.1699, -115.1398),
    ("grand junction,co", 39.0639, -108.5506),
];

/// Normalize a free-text place name into a gazetteer key.
pub fn normalize(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let parts: Vec<String> = lowered
        .split(',')
        .map(|part| part.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();
    parts.join(",")
}

/// Look up a place. Matches either the full "city,st" key or the bare city.
pub fn lookup(name: &str) -> Option<Coordinates> {
    let key = normalize(name);
    if key.is_empty() {
        return None;
    }
    PLACES
        .iter()
        .find(|(place, _, _)| {
            *place == key || place.split(',').next().is_some_and(|city| city == key)
        })
        .map(|(_, lat, lng)| Coordinates::new(*lat, *lng))
}
