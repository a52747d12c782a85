//! Server configuration from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use trip_core::{PlannerRules, RulesError, SeedSource};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid planner rules: {0}")]
    Rules(#[from] RulesError),
    #[error("{name} of {seconds}s is out of range")]
    FreshnessWindow { name: &'static str, seconds: u64 },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_path: String,
    pub database_max_connections: u32,
    /// When false no external provider is constructed and every result
    /// comes from curated tables or synthetic generators.
    pub providers_enabled: bool,
    pub mapbox_access_token: Option<String>,
    pub mapbox_base_url: String,
    pub open_meteo_url: String,
    pub nws_url: String,
    pub weatherbit_url: String,
    pub weatherbit_api_key: Option<String>,
    pub user_agent: String,
    pub provider_timeout_ms: u64,
    pub weather_freshness_s: u64,
    pub alerts_freshness_s: u64,
    pub forecast_days: usize,
    pub synthetic_seed: Option<u64>,
    pub geocode_cache_max_entries: usize,
    pub geocode_cache_ttl_s: u64,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub rules: PlannerRules,
}

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = PlannerRules::default();
        let rules = PlannerRules {
            base_score: parsed("TRIP_SCORE_BASE").unwrap_or(defaults.base_score),
            long_trip_delta: parsed("TRIP_SCORE_LONG_TRIP_DELTA")
                .unwrap_or(defaults.long_trip_delta),
            winter_delta: parsed("TRIP_SCORE_WINTER_DELTA").unwrap_or(defaults.winter_delta),
            avoid_severe_weather_delta: parsed("TRIP_SCORE_AVOID_WEATHER_DELTA")
                .unwrap_or(defaults.avoid_severe_weather_delta),
            ..defaults
        };

        let config = Self {
            server_port: parsed("TRIP_PORT").unwrap_or(3000),
            database_path: env::var("TRIP_DATABASE_PATH")
                .unwrap_or_else(|_| "data/trip.db".to_string()),
            database_max_connections: parsed("TRIP_DATABASE_MAX_CONNECTIONS").unwrap_or(5),
            providers_enabled: parsed("TRIP_PROVIDERS_ENABLED").unwrap_or(true),
            mapbox_access_token: non_empty("MAPBOX_ACCESS_TOKEN"),
            mapbox_base_url: env::var("MAPBOX_BASE_URL")
                .unwrap_or_else(|_| "https://api.mapbox.com".to_string()),
            open_meteo_url: env::var("OPEN_METEO_URL")
                .unwrap_or_else(|_| "https://api.open-meteo.com".to_string()),
            nws_url: env::var("NWS_URL").unwrap_or_else(|_| "https://api.weather.gov".to_string()),
            weatherbit_url: env::var("WEATHERBIT_URL")
                .unwrap_or_else(|_| "https://api.weatherbit.io/v2.0".to_string()),
            weatherbit_api_key: non_empty("WEATHERBIT_API_KEY"),
            user_agent: env::var("TRIP_USER_AGENT")
                .unwrap_or_else(|_| "trip-server/0.2 (road trip planner)".to_string()),
            provider_timeout_ms: parsed("TRIP_PROVIDER_TIMEOUT_MS").unwrap_or(8_000),
            weather_freshness_s: parsed("TRIP_WEATHER_FRESHNESS_S").unwrap_or(30 * 60),
            alerts_freshness_s: parsed("TRIP_ALERTS_FRESHNESS_S").unwrap_or(60 * 60),
            forecast_days: parsed("TRIP_FORECAST_DAYS").unwrap_or(7),
            synthetic_seed: parsed("TRIP_SYNTHETIC_SEED"),
            geocode_cache_max_entries: parsed("TRIP_GEOCODE_CACHE_MAX_ENTRIES").unwrap_or(1024),
            geocode_cache_ttl_s: parsed("TRIP_GEOCODE_CACHE_TTL_S").unwrap_or(24 * 60 * 60),
            backoff_base_ms: parsed("TRIP_BACKOFF_BASE_MS").unwrap_or(1_000),
            backoff_max_ms: parsed("TRIP_BACKOFF_MAX_MS").unwrap_or(60_000),
            rules,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks everything derived later at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules.validate()?;
        self.weather_window()?;
        self.alerts_window()?;
        Ok(())
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms.max(1))
    }

    pub fn seed_source(&self) -> SeedSource {
        match self.synthetic_seed {
            Some(seed) => SeedSource::Fixed(seed),
            None => SeedSource::Entropy,
        }
    }

    pub fn weather_window(&self) -> Result<chrono::Duration, ConfigError> {
        window("TRIP_WEATHER_FRESHNESS_S", self.weather_freshness_s)
    }

    pub fn alerts_window(&self) -> Result<chrono::Duration, ConfigError> {
        window("TRIP_ALERTS_FRESHNESS_S", self.alerts_freshness_s)
    }
}

fn window(name: &'static str, seconds: u64) -> Result<chrono::Duration, ConfigError> {
    i64::try_from(seconds)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .ok_or(ConfigError::FreshnessWindow { name, seconds })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_settings() {
        let mut config = Config::from_env().expect("default config");
        config.synthetic_seed = Some(7);
        config.provider_timeout_ms = 0;
        config.weather_freshness_s = 1800;
        config.alerts_freshness_s = 3600;

        assert_eq!(config.seed_source(), SeedSource::Fixed(7));
        assert_eq!(config.provider_timeout(), Duration::from_millis(1));
        assert_eq!(config.weather_window().unwrap(), chrono::Duration::minutes(30));
        assert_eq!(config.alerts_window().unwrap(), chrono::Duration::hours(1));

        config.synthetic_seed = None;
        assert_eq!(config.seed_source(), SeedSource::Entropy);
    }

    #[test]
    fn oversized_freshness_window_is_an_error() {
        let mut config = Config::from_env().expect("default config");
        config.weather_freshness_s = u64::MAX;
        assert!(matches!(
            config.weather_window(),
            Err(ConfigError::FreshnessWindow {
                name: "TRIP_WEATHER_FRESHNESS_S",
                ..
            })
        ));
        assert!(config.validate().is_err());

        config.weather_freshness_s = 1800;
        config.alerts_freshness_s = i64::MAX as u64;
        assert!(config.alerts_window().is_err());
    }

    #[test]
    fn out_of_range_rules_fail_validation() {
        let mut config = Config::from_env().expect("default config");
        config.rules.base_score = i32::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::Rules(_))));
    }
}
