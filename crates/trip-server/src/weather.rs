//! Route weather: cache first, then concurrent provider fetches with a
//! per-fetch seasonal fallback.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;

use trip_core::gazetteer::CONTINENTAL_CENTROID;
use trip_core::{
    Clock, Coordinates, ForecastDay, HourlyForecast, Route, SeasonalGenerator, WaypointWeather,
    WeatherConditions, WeatherSnapshot,
};

use crate::conditions::{ConditionKind, ConditionsStore};
use crate::providers::{CallPolicy, WeatherProvider};

pub const HOURLY_HORIZON: usize = 24;

pub struct WeatherAggregator {
    provider: Option<Arc<dyn WeatherProvider>>,
    policy: Arc<CallPolicy>,
    store: Arc<ConditionsStore>,
    clock: Arc<dyn Clock>,
    generator: SeasonalGenerator,
    forecast_days: usize,
}

impl WeatherAggregator {
    pub fn new(
        provider: Option<Arc<dyn WeatherProvider>>,
        policy: Arc<CallPolicy>,
        store: Arc<ConditionsStore>,
        clock: Arc<dyn Clock>,
        generator: SeasonalGenerator,
        forecast_days: usize,
    ) -> Self {
        Self {
            provider,
            policy,
            store,
            clock,
            generator,
            forecast_days: forecast_days.max(1),
        }
    }

    /// Weather for every stop on the route plus the origin forecast. Never fails.
    pub async fn get_weather(&self, route: &Route) -> WeatherSnapshot {
        let fingerprint = route.fingerprint();
        if let Some(snapshot) = self
            .store
            .get::<WeatherSnapshot>(&route.route_id, &fingerprint, ConditionKind::Weather)
            .await
        {
            tracing::debug!("Weather cache hit for {}", route.route_id);
            return snapshot;
        }

        let now = self.clock.now();
        let origin = route
            .origin_point()
            .map(|p| p.coordinates)
            .unwrap_or(CONTINENTAL_CENTROID);
        let destination = route
            .destination_point()
            .map(|p| p.coordinates)
            .unwrap_or(origin);
        let intermediates = route.intermediate_points();

        let stops = std::iter::once(origin)
            .chain(std::iter::once(destination))
            .chain(intermediates.iter().map(|p| p.coordinates));
        let (mut current, forecast) = tokio::join!(
            join_all(stops.map(|at| self.current(at, now))),
            self.forecast(origin, now),
        );

        let waypoint_weather = current.split_off(2);
        let mut ends = current.into_iter();
        let origin_weather = ends.next().unwrap_or_else(|| self.generator.current(origin, now));
        let destination_weather = ends
            .next()
            .unwrap_or_else(|| self.generator.current(destination, now));

        let snapshot = WeatherSnapshot {
            route_id: route.route_id.clone(),
            origin: origin_weather,
            destination: destination_weather,
            waypoints: intermediates
                .iter()
                .zip(waypoint_weather)
                .map(|(point, weather)| WaypointWeather {
                    label: point.label.clone(),
                    coordinates: point.coordinates,
                    weather,
                })
                .collect(),
            forecast,
            fetched_at: now,
        };

        self.store
            .put(&route.route_id, &fingerprint, ConditionKind::Weather, &snapshot)
            .await;
        snapshot
    }

    /// 24-hour forecast at a point. Not cached.
    pub async fn hourly(&self, at: Coordinates) -> Vec<HourlyForecast> {
        if let Some(provider) = &self.provider {
            match self
                .policy
                .call(provider.name(), provider.hourly(at, HOURLY_HORIZON))
                .await
            {
                Ok(hours) => return hours,
                Err(err) => tracing::warn!("Hourly forecast unavailable: {}", err),
            }
        }
        self.generator.hourly(at, self.clock.now(), HOURLY_HORIZON)
    }

    async fn current(&self, at: Coordinates, now: DateTime<Utc>) -> WeatherConditions {
        if let Some(provider) = &self.provider {
            match self.policy.call(provider.name(), provider.current(at)).await {
                Ok(weather) => return weather,
                Err(err) => tracing::warn!("Current weather unavailable: {}", err),
            }
        }
        self.generator.current(at, now)
    }

    async fn forecast(&self, at: Coordinates, now: DateTime<Utc>) -> Vec<ForecastDay> {
        if let Some(provider) = &self.provider {
            match self
                .policy
                .call(provider.name(), provider.forecast(at, self.forecast_days))
                .await
            {
                Ok(days) => return days,
                Err(err) => tracing::warn!("Forecast unavailable: {}", err),
            }
        }
        self.generator
            .forecast(at, now.date_naive(), self.forecast_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::MemoryConditions;
    use crate::providers::stub::StubWeather;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use std::time::Duration;
    use trip_core::routing::{from_corridor, RouteRequestNames};
    use trip_core::{corridors, CostModel, DataSource, ManualClock, RouteSource, SeedSource};

    fn route() -> Route {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        let names = RouteRequestNames {
            route_id: "r-1",
            origin: "Rapid City, SD",
            destination: "Miami, FL",
            waypoints: &[],
            departure: at,
            created_at: at,
        };
        let corridor = corridors::by_id("rapid-city-miami").unwrap();
        from_corridor(&names, corridor, RouteSource::CorridorOverride, &CostModel::default())
    }

    fn clear() -> WeatherConditions {
        WeatherConditions {
            temperature_f: 45.0,
            condition: "clear".to_string(),
            wind_speed_mph: 5.0,
            wind_gusts_mph: None,
            humidity_pct: 40.0,
            visibility_mi: 10.0,
            feels_like_f: 43.0,
            precipitation_chance_pct: 0.0,
            source: DataSource::Provider,
        }
    }

    fn aggregator(provider: Arc<StubWeather>) -> (WeatherAggregator, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap(),
        ));
        let store = Arc::new(ConditionsStore::new(
            Arc::new(MemoryConditions::new()),
            clock.clone(),
            ChronoDuration::minutes(30),
            ChronoDuration::minutes(60),
        ));
        let policy = Arc::new(CallPolicy::new(
            Duration::from_millis(200),
            Duration::from_secs(30),
            Duration::from_secs(60),
        ));
        let weather = WeatherAggregator::new(
            Some(provider),
            policy,
            store,
            clock.clone(),
            SeasonalGenerator::new(SeedSource::Fixed(7)),
            7,
        );
        (weather, clock)
    }

    #[tokio::test]
    async fn second_read_inside_window_is_cached() {
        let provider = Arc::new(StubWeather::new(clear()));
        let (weather, clock) = aggregator(provider.clone());
        let route = route();

        let first = weather.get_weather(&route).await;
        let calls = provider.calls();
        assert_eq!(calls, route.points.len() + 1);
        assert_eq!(first.waypoints.len(), route.intermediate_points().len());
        assert_eq!(first.forecast.len(), 7);

        clock.advance(ChronoDuration::minutes(10));
        let second = weather.get_weather(&route).await;
        assert_eq!(second, first);
        assert_eq!(provider.calls(), calls);

        clock.advance(ChronoDuration::minutes(25));
        weather.get_weather(&route).await;
        assert_eq!(provider.calls(), calls * 2);
    }

    #[tokio::test]
    async fn reused_route_id_for_another_trip_is_refetched() {
        let provider = Arc::new(StubWeather::new(clear()));
        let (weather, _) = aggregator(provider.clone());
        let first_trip = route();
        weather.get_weather(&first_trip).await;
        let calls = provider.calls();

        let at = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        let names = RouteRequestNames {
            route_id: "r-1",
            origin: "Chicago, IL",
            destination: "Miami, FL",
            waypoints: &[],
            departure: at,
            created_at: at,
        };
        let corridor = corridors::by_id("chicago-miami").unwrap();
        let second_trip =
            from_corridor(&names, corridor, RouteSource::CorridorTemplate, &CostModel::default());

        let snapshot = weather.get_weather(&second_trip).await;
        assert!(provider.calls() > calls);
        let labels: Vec<&str> = snapshot.waypoints.iter().map(|w| w.label.as_str()).collect();
        let expected: Vec<&str> = second_trip
            .intermediate_points()
            .iter()
            .map(|p| p.label.as_str())
            .collect();
        assert_eq!(labels, expected);
    }

    #[tokio::test]
    async fn failing_provider_falls_back_to_synthetic() {
        let (weather, _) = aggregator(Arc::new(StubWeather::failing()));
        let snapshot = weather.get_weather(&route()).await;
        assert_eq!(snapshot.origin.source, DataSource::Synthetic);
        assert!(snapshot
            .waypoints
            .iter()
            .all(|w| w.weather.source == DataSource::Synthetic));
        assert!(!snapshot.forecast.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out_to_synthetic() {
        let provider = Arc::new(StubWeather::new(clear()).with_delay(Duration::from_secs(10)));
        let (weather, _) = aggregator(provider);
        let snapshot = weather.get_weather(&route()).await;
        assert_eq!(snapshot.destination.source, DataSource::Synthetic);
    }

    #[tokio::test]
    async fn hourly_covers_a_day() {
        let (weather, _) = aggregator(Arc::new(StubWeather::failing()));
        let hours = weather.hourly(Coordinates::new(44.08, -103.23)).await;
        assert_eq!(hours.len(), HOURLY_HORIZON);
    }
}
