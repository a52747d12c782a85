//! Seasonal synthetic weather.
//!
//! Numeric values are a deterministic function of calendar month and
//! latitude. Only the condition label is drawn at random, from a
//! season-weighted set, through an injectable seed.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{Coordinates, DataSource, ForecastDay, HourlyForecast, WeatherConditions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Dec-Feb winter, Mar-May spring, Jun-Aug summer, Sep-Nov fall.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        }
    }

    /// Condition labels with relative weights.
    fn conditions(&self) -> &'static [(&'static str, u32)] {
        match self {
            Season::Winter => &[
                ("snow", 25),
                ("cloudy", 30),
                ("partly cloudy", 20),
                ("clear", 20),
                ("freezing rain", 5),
            ],
            Season::Spring => &[
                ("rainy", 30),
                ("partly cloudy", 30),
                ("cloudy", 20),
                ("sunny", 15),
                ("thunderstorms", 5),
            ],
            Season::Summer => &[
                ("sunny", 40),
                ("partly cloudy", 30),
                ("thunderstorms", 20),
                ("hazy", 10),
            ],
            Season::Fall => &[
                ("partly cloudy", 30),
                ("sunny", 30),
                ("cloudy", 20),
                ("rainy", 15),
                ("foggy", 5),
            ],
        }
    }

    fn base_precipitation(&self) -> f64 {
        match self {
            Season::Winter => 35.0,
            Season::Spring => 45.0,
            Season::Summer => 30.0,
            Season::Fall => 25.0,
        }
    }

    fn base_wind(&self) -> f64 {
        match self {
            Season::Winter => 14.0,
            Season::Spring => 12.0,
            Season::Summer => 8.0,
            Season::Fall => 10.0,
        }
    }

    fn base_humidity(&self) -> f64 {
        match self {
            Season::Winter => 65.0,
            Season::Spring => 60.0,
            Season::Summer => 70.0,
            Season::Fall => 55.0,
        }
    }
}

/// Where the label randomness comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedSource {
    /// Reproducible output. Each call site mixes in its own salt.
    Fixed(u64),
    #[default]
    Entropy,
}

impl SeedSource {
    fn rng(&self, salt: u64) -> StdRng {
        match self {
            SeedSource::Fixed(seed) => StdRng::seed_from_u64(mix(*seed ^ salt)),
            SeedSource::Entropy => StdRng::seed_from_u64(rand::random::<u64>()),
        }
    }
}

/// splitmix64 finalizer.
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn salt_for(at: Coordinates, ordinal: i64) -> u64 {
    let lat = (at.lat * 10_000.0).round() as i64 as u64;
    let lng = (at.lng * 10_000.0).round() as i64 as u64;
    mix(lat) ^ mix(lng).rotate_left(17) ^ mix(ordinal as u64).rotate_left(31)
}

/// Mean temperature for a month and latitude. Peaks in July, colder northward.
pub fn mean_temperature_f(month: u32, latitude: f64) -> f64 {
    let annual = 55.0 - 25.0 * (2.0 * PI * (month as f64 - 7.0) / 12.0).cos();
    let lat_factor = match Season::from_month(month) {
        Season::Winter => 1.5,
        Season::Summer => 0.7,
        _ => 1.1,
    };
    annual - (latitude - 35.0) * lat_factor
}

fn pick(rng: &mut StdRng, weighted: &[(&'static str, u32)]) -> &'static str {
    let total: u32 = weighted.iter().map(|(_, w)| w).sum();
    if total == 0 {
        return "clear";
    }
    let mut roll = rng.random_range(0..total);
    for (label, weight) in weighted {
        if roll < *weight {
            return *label;
        }
        roll -= weight;
    }
    weighted[weighted.len() - 1].0
}

fn visibility_for(condition: &str) -> f64 {
    match condition {
        "foggy" => 2.0,
        "snow" | "freezing rain" => 3.0,
        "thunderstorms" | "rainy" | "hazy" => 6.0,
        _ => 10.0,
    }
}

fn feels_like(temperature_f: f64, wind_mph: f64, humidity_pct: f64) -> f64 {
    if temperature_f < 50.0 {
        temperature_f - wind_mph * 0.3
    } else if temperature_f > 80.0 {
        temperature_f + (humidity_pct - 40.0).max(0.0) * 0.1
    } else {
        temperature_f
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Fallback weather source of last resort. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonalGenerator {
    seed: SeedSource,
}

impl SeasonalGenerator {
    pub fn new(seed: SeedSource) -> Self {
        Self { seed }
    }

    pub fn current(&self, at: Coordinates, when: DateTime<Utc>) -> WeatherConditions {
        let month = when.month();
        let season = Season::from_month(month);
        let mut rng = self
            .seed
            .rng(salt_for(at, when.date_naive().num_days_from_ce() as i64));
        let condition = pick(&mut rng, season.conditions());

        let temperature_f = round1(mean_temperature_f(month, at.lat));
        let wind_speed_mph = round1(season.base_wind() + (at.lat - 35.0).max(0.0) * 0.2);
        let humidity_pct = round1(
            (season.base_humidity() + if at.lat < 32.0 { 10.0 } else { 0.0 }).clamp(0.0, 100.0),
        );

        WeatherConditions {
            temperature_f,
            condition: condition.to_string(),
            wind_speed_mph,
            wind_gusts_mph: Some(round1(wind_speed_mph * 1.5)),
            humidity_pct,
            visibility_mi: visibility_for(condition),
            feels_like_f: round1(feels_like(temperature_f, wind_speed_mph, humidity_pct)),
            precipitation_chance_pct: season.base_precipitation(),
            source: DataSource::Synthetic,
        }
    }

    pub fn forecast(&self, at: Coordinates, start: NaiveDate, days: usize) -> Vec<ForecastDay> {
        (0..days)
            .map(|offset| {
                let date = start + Duration::days(offset as i64);
                let month = date.month();
                let season = Season::from_month(month);
                let mut rng = self.seed.rng(salt_for(at, date.num_days_from_ce() as i64));
                let condition = pick(&mut rng, season.conditions());

                let wiggle = (offset as f64 * 1.7).sin() * 3.0;
                let high_f = round1(mean_temperature_f(month, at.lat) + 8.0 + wiggle);
                ForecastDay {
                    date,
                    high_f,
                    low_f: round1(high_f - 18.0),
                    precipitation_chance_pct: season.base_precipitation(),
                    wind_speed_mph: round1(season.base_wind() + (at.lat - 35.0).max(0.0) * 0.2),
                    condition: condition.to_string(),
                    source: DataSource::Synthetic,
                }
            })
            .collect()
    }

    pub fn hourly(&self, at: Coordinates, start: DateTime<Utc>, hours: usize) -> Vec<HourlyForecast> {
        let start = start
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(start);
        (0..hours)
            .map(|offset| {
                let time = start + Duration::hours(offset as i64);
                let month = time.month();
                let season = Season::from_month(month);
                let mut rng = self.seed.rng(salt_for(at, time.timestamp() / 3600));
                let condition = pick(&mut rng, season.conditions());
                let diurnal = 8.0 * (2.0 * PI * (time.hour() as f64 - 9.0) / 24.0).sin();

                HourlyForecast {
                    time,
                    temperature_f: round1(mean_temperature_f(month, at.lat) + diurnal),
                    precipitation_chance_pct: season.base_precipitation(),
                    wind_speed_mph: round1(season.base_wind() + (at.lat - 35.0).max(0.0) * 0.2),
                    condition: condition.to_string(),
                    source: DataSource::Synthetic,
                }
            })
            .collect()
    }
}
