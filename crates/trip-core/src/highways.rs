//! Highway tag extraction from turn-by-turn instructions.

use regex::Regex;
use std::sync::OnceLock;

fn highway_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(i|us|interstate)[\s-]?(\d{1,3})\b").expect("highway pattern is valid")
    })
}

/// Scan instructions for interstate and US highway references.
///
/// Returns canonical tags ("I-70", "US-50") in order of first appearance,
/// without duplicates.
pub fn extract_highways<'a, I>(instructions: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut highways: Vec<String> = Vec::new();
    for instruction in instructions {
        for captures in highway_pattern().captures_iter(instruction) {
            let prefix = match captures[1].to_ascii_lowercase().as_str() {
                "us" => "US",
                _ => "I",
            };
            let tag = format!("{}-{}", prefix, &captures[2]);
            if !highways.contains(&tag) {
                highways.push(tag);
            }
        }
    }
    highways
}
