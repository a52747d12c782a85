//! Shared application state: configuration, database and the wired-up planner.

use std::sync::Arc;
use std::time::Duration;

use trip_core::{Clock, SeasonalGenerator, SystemClock};

use crate::alerts::AlertsAggregator;
use crate::conditions::ConditionsStore;
use crate::config::{Config, ConfigError};
use crate::geo::GeoResolver;
use crate::persistence::{Database, SqliteConditions, SqlitePlanRepository};
use crate::pipeline::{PlanRepository, TripPlanner};
use crate::providers::mapbox::MapboxClient;
use crate::providers::nws::NwsClient;
use crate::providers::open_meteo::OpenMeteoClient;
use crate::providers::weatherbit::WeatherbitClient;
use crate::providers::{
    http_client, AlertProvider, CallPolicy, DirectionsProvider, GeocodingProvider,
    WeatherProvider,
};
use crate::routing::RouteResolver;
use crate::weather::WeatherAggregator;

/// The external providers a planner talks to. Any slot may be empty.
#[derive(Clone, Default)]
pub struct Providers {
    pub geocoder: Option<Arc<dyn GeocodingProvider>>,
    pub directions: Option<Arc<dyn DirectionsProvider>>,
    pub weather: Option<Arc<dyn WeatherProvider>>,
    pub primary_alerts: Option<Arc<dyn AlertProvider>>,
    pub secondary_alerts: Option<Arc<dyn AlertProvider>>,
}

impl Providers {
    /// No providers: curated tables and synthetic generators only.
    pub fn none() -> Self {
        Self::default()
    }

    /// HTTP providers for whatever the configuration enables.
    pub fn from_config(config: &Config) -> Self {
        if !config.providers_enabled {
            tracing::info!("External providers disabled");
            return Self::none();
        }

        let client = http_client(&config.user_agent, config.provider_timeout());
        let mapbox = config.mapbox_access_token.as_deref().map(|token| {
            Arc::new(MapboxClient::new(client.clone(), &config.mapbox_base_url, token))
        });
        if mapbox.is_none() {
            tracing::warn!("MAPBOX_ACCESS_TOKEN not set, geocoding and directions disabled");
        }
        let secondary_alerts = config.weatherbit_api_key.as_deref().map(|key| {
            Arc::new(WeatherbitClient::new(client.clone(), &config.weatherbit_url, key))
                as Arc<dyn AlertProvider>
        });

        Self {
            geocoder: mapbox
                .clone()
                .map(|m| m as Arc<dyn GeocodingProvider>),
            directions: mapbox.map(|m| m as Arc<dyn DirectionsProvider>),
            weather: Some(Arc::new(OpenMeteoClient::new(
                client.clone(),
                &config.open_meteo_url,
            )) as Arc<dyn WeatherProvider>),
            primary_alerts: Some(
                Arc::new(NwsClient::new(client, &config.nws_url)) as Arc<dyn AlertProvider>
            ),
            secondary_alerts,
        }
    }
}

pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub clock: Arc<dyn Clock>,
    pub planner: TripPlanner,
}

impl AppState {
    pub fn from_config(config: Config, db: Database) -> Result<Self, ConfigError> {
        let providers = Providers::from_config(&config);
        Self::new(config, db, providers, Arc::new(SystemClock))
    }

    pub fn new(
        config: Config,
        db: Database,
        providers: Providers,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let policy = Arc::new(CallPolicy::new(
            config.provider_timeout(),
            Duration::from_millis(config.backoff_base_ms),
            Duration::from_millis(config.backoff_max_ms),
        ));
        let store = Arc::new(ConditionsStore::new(
            Arc::new(SqliteConditions::new(db.pool().clone())),
            clock.clone(),
            config.weather_window()?,
            config.alerts_window()?,
        ));

        let geo = Arc::new(GeoResolver::new(
            providers.geocoder,
            policy.clone(),
            config.geocode_cache_max_entries,
            Duration::from_secs(config.geocode_cache_ttl_s),
        ));
        let routes = Arc::new(RouteResolver::new(
            geo,
            providers.directions,
            policy.clone(),
            clock.clone(),
        ));
        let weather = Arc::new(WeatherAggregator::new(
            providers.weather,
            policy.clone(),
            store.clone(),
            clock.clone(),
            SeasonalGenerator::new(config.seed_source()),
            config.forecast_days,
        ));
        let alerts = Arc::new(AlertsAggregator::new(
            providers.primary_alerts,
            providers.secondary_alerts,
            policy,
            store,
            clock.clone(),
        ));
        let repository: Arc<dyn PlanRepository> =
            Arc::new(SqlitePlanRepository::new(db.clone(), clock.clone()));
        let planner = TripPlanner::new(
            routes,
            weather,
            alerts,
            Some(repository),
            config.rules.clone(),
        );

        Ok(Self {
            config,
            db,
            clock,
            planner,
        })
    }
}
