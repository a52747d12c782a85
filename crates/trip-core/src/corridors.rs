//! Curated corridor table.
//!
//! General-purpose directions occasionally produce implausible paths for long
//! cross-country pairs. The table maps origin/destination name patterns to
//! hand-authored route templates. `Override` entries are used before any
//! network call; `Template` entries only when directions are unavailable.

use crate::models::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorridorTier {
    Override,
    Template,
}

#[derive(Debug, Clone, Copy)]
pub struct CorridorPoint {
    pub label: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub elapsed_minutes: u32,
}

impl CorridorPoint {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CorridorStop {
    pub label: &'static str,
    pub category: &'static str,
    pub rationale: &'static str,
    pub elapsed_minutes: u32,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug)]
pub struct Corridor {
    pub id: &'static str,
    pub name: &'static str,
    /// Sentence used in trip summaries.
    pub description: &'static str,
    pub tier: CorridorTier,
    pub origin_patterns: &'static [&'static str],
    pub destination_patterns: &'static [&'static str],
    pub distance_miles: f64,
    pub duration_minutes: u32,
    pub highways: &'static [&'static str],
    pub points: &'static [CorridorPoint],
    pub stops: &'static [CorridorStop],
}

const fn point(label: &'static str, lat: f64, lng: f64, elapsed_minutes: u32) -> CorridorPoint {
    CorridorPoint {
        label,
        lat,
        lng,
        elapsed_minutes,
    }
}

const fn stop(
    label: &'static str,
    category: &'static str,
    rationale: &'static str,
    elapsed_minutes: u32,
    lat: f64,
    lng: f64,
) -> CorridorStop {
    CorridorStop {
        label,
        category,
        rationale,
        elapsed_minutes,
        lat,
        lng,
    }
}

pub static CORRIDORS: &[Corridor] = &[
    Corridor {
        id: "rapid-city-miami",
        name: "Southeastern Corridor",
        description: "This southeastern corridor leaves the Black Hills through the plains to Kansas City, then follows the Mississippi valley through Memphis and Atlanta down the Florida peninsula.",
        tier: CorridorTier::Override,
        origin_patterns: &["rapid city", "rapid"],
        destination_patterns: &["miami", "florida"],
        distance_miles: 1547.0,
        duration_minutes: 23 * 60 + 15,
        highways: &["I-90", "I-35", "I-70", "I-44", "I-40", "I-75", "I-95"],
        points: &[
            point("Rapid City, SD", 44.0805, -103.2310, 0),
            point("North Platte, NE", 41.1238, -100.7654, 3 * 60 + 30),
            point("Kansas City, MO", 39.0997, -94.5786, 7 * 60),
            point("Springfield, MO", 37.2153, -93.2982, 9 * 60 + 30),
            point("Little Rock, AR", 34.7465, -92.2896, 11 * 60 + 45),
            point("Memphis, TN", 35.1495, -90.0490, 13 * 60),
            point("Nashville, TN", 36.1627, -86.7816, 16 * 60),
            point("Atlanta, GA", 33.7490, -84.3880, 18 * 60 + 30),
            point("Gainesville, FL", 29.6516, -82.3248, 21 * 60 + 30),
            point("Miami, FL", 25.7617, -80.1918, 23 * 60 + 15),
        ],
        stops: &[
            stop(
                "Kansas City, MO",
                "Fuel & Rest",
                "Major highway junction - I-70/I-35/I-44 interchange",
                7 * 60,
                39.0997,
                -94.5786,
            ),
            stop(
                "Memphis, TN",
                "Overnight",
                "Halfway point, major city with good facilities",
                13 * 60,
                35.1495,
                -90.0490,
            ),
            stop(
                "Atlanta, GA",
                "Final Rest",
                "Last major city before Florida",
                18 * 60 + 30,
                33.7490,
                -84.3880,
            ),
        ],
    },
    Corridor {
        id: "rapid-city-los-angeles",
        name: "Southwest Mountain Corridor",
        description: "The southwest run drops from the Black Hills to Denver, crosses the Rockies on I-70 and finishes across the Mojave through Las Vegas.",
        tier: CorridorTier::Template,
        origin_patterns: &["rapid city"],
        destination_patterns: &["los angeles", "la"],
        distance_miles: 1285.0,
        duration_minutes: 19 * 60 + 30,
        highways: &["I-90", "I-80", "I-76", "I-70", "I-15"],
        points: &[
            point("Rapid City, SD", 44.0805, -103.2310, 0),
            point("Denver, CO", 39.7392, -104.9903, 6 * 60),
            point("Grand Junction, CO", 39.0639, -108.5506, 10 * 60),
            point("Las Vegas, NV", 36.1699, -115.1398, 14 * 60),
            point("Los Angeles, CA", 34.0522, -118.2437, 19 * 60 + 30),
        ],
        stops: &[
            stop(
                "Denver, CO",
                "Fuel & Rest",
                "Major city, mountain gateway",
                6 * 60,
                39.7392,
                -104.9903,
            ),
            stop(
                "Las Vegas, NV",
                "Overnight",
                "Desert crossing point",
                14 * 60,
                36.1699,
                -115.1398,
            ),
        ],
    },
    Corridor {
        id: "chicago-miami",
        name: "Midwest to Florida Corridor",
        description: "The I-65/I-75 corridor runs south from Chicago through Indianapolis and Louisville, over the Appalachian foothills to Atlanta and down to South Florida.",
        tier: CorridorTier::Template,
        origin_patterns: &["chicago"],
        destination_patterns: &["miami"],
        distance_miles: 1285.0,
        duration_minutes: 19 * 60 + 15,
        highways: &["I-65", "I-75", "I-95"],
        points: &[
            point("Chicago, IL", 41.8781, -87.6298, 0),
            point("Indianapolis, IN", 39.7684, -86.1581, 3 * 60),
            point("Louisville, KY", 38.2527, -85.7585, 5 * 60 + 30),
            point("Atlanta, GA", 33.7490, -84.3880, 12 * 60),
            point("Gainesville, FL", 29.6516, -82.3248, 16 * 60 + 30),
            point("Miami, FL", 25.7617, -80.1918, 19 * 60 + 15),
        ],
        stops: &[stop(
            "Atlanta, GA",
            "Overnight",
            "Major southeastern hub",
            12 * 60,
            33.7490,
            -84.3880,
        )],
    },
    Corridor {
        id: "new-york-los-angeles",
        name: "Southern Transcontinental Corridor",
        description: "The southern transcontinental route avoids the high Rockies, running through Chicago and St Louis onto I-40 across the southern plains and the desert Southwest.",
        tier: CorridorTier::Template,
        origin_patterns: &["new york"],
        destination_patterns: &["los angeles", "la"],
        distance_miles: 2789.0,
        duration_minutes: 41 * 60 + 30,
        highways: &["I-80", "I-76", "I-70", "I-44", "I-40", "I-10"],
        points: &[
            point("New York, NY", 40.7128, -74.0060, 0),
            point("Chicago, IL", 41.8781, -87.6298, 12 * 60),
            point("St Louis, MO", 38.6270, -90.1994, 18 * 60),
            point("Oklahoma City, OK", 35.4676, -97.5164, 24 * 60),
            point("Amarillo, TX", 35.2220, -101.8313, 28 * 60),
            point("Albuquerque, NM", 35.0844, -106.6504, 32 * 60),
            point("Phoenix, AZ", 33.4484, -112.0740, 36 * 60),
            point("Los Angeles, CA", 34.0522, -118.2437, 41 * 60 + 30),
        ],
        stops: &[
            stop(
                "Chicago, IL",
                "Rest",
                "Major midwestern hub",
                12 * 60,
                41.8781,
                -87.6298,
            ),
            stop(
                "Oklahoma City, OK",
                "Overnight",
                "Midpoint of journey",
                24 * 60,
                35.4676,
                -97.5164,
            ),
            stop(
                "Phoenix, AZ",
                "Final Rest",
                "Desert crossing point",
                36 * 60,
                33.4484,
                -112.0740,
            ),
        ],
    },
];

/// Lowercase alphanumeric words of a place name.
fn tokens(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when every word of `pattern` appears contiguously in `name`.
fn matches_pattern(name_tokens: &[String], pattern: &str) -> bool {
    let pattern_tokens = tokens(pattern);
    if pattern_tokens.is_empty() || pattern_tokens.len() > name_tokens.len() {
        return false;
    }
    name_tokens
        .windows(pattern_tokens.len())
        .any(|window| window == pattern_tokens.as_slice())
}

impl Corridor {
    pub fn matches(&self, origin: &str, destination: &str) -> bool {
        let origin_tokens = tokens(origin);
        let destination_tokens = tokens(destination);
        self.origin_patterns
            .iter()
            .any(|p| matches_pattern(&origin_tokens, p))
            && self
                .destination_patterns
                .iter()
                .any(|p| matches_pattern(&destination_tokens, p))
    }
}

/// First corridor of one of the given tiers matching the pair.
pub fn find(origin: &str, destination: &str, tiers: &[CorridorTier]) -> Option<&'static Corridor> {
    CORRIDORS
        .iter()
        .filter(|c| tiers.contains(&c.tier))
        .find(|c| c.matches(origin, destination))
}

pub fn by_id(id: &str) -> Option<&'static Corridor> {
    CORRIDORS.iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_matches_loose_names() {
        let c = find("Rapid City, SD", "Miami, FL", &[CorridorTier::Override]).unwrap();
        assert_eq!(c.id, "rapid-city-miami");
        assert!(find("rapid", "somewhere in Florida", &[CorridorTier::Override]).is_some());
    }

    #[test]
    fn template_tier_is_not_an_override() {
        assert!(find("Chicago", "Miami", &[CorridorTier::Override]).is_none());
        let c = find("Chicago", "Miami", &[CorridorTier::Override, CorridorTier::Template]).unwrap();
        assert_eq!(c.id, "chicago-miami");
    }

    #[test]
    fn short_patterns_match_whole_words_only() {
        // "la" must not match Atlanta or Dallas.
        assert!(find("New York", "Atlanta", &[CorridorTier::Template]).is_none());
        assert!(find("New York", "Dallas", &[CorridorTier::Template]).is_none());
        assert!(find("New York", "LA", &[CorridorTier::Template]).is_some());
    }

    #[test]
    fn curated_points_are_strictly_ordered() {
        for corridor in CORRIDORS {
            assert!(corridor.points.len() >= 2, "{}", corridor.id);
            assert_eq!(corridor.points[0].elapsed_minutes, 0);
            assert!(corridor
                .points
                .windows(2)
                .all(|w| w[0].elapsed_minutes < w[1].elapsed_minutes));
            assert_eq!(
                corridor.points.last().map(|p| p.elapsed_minutes),
                Some(corridor.duration_minutes)
            );
        }
    }
}
