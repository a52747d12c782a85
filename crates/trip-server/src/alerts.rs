//! Route alerts: cache first, then per-stop primary/secondary providers,
//! with synthetic seasonal alerts when nothing answered.

use futures::future::join_all;
use std::sync::Arc;

use trip_core::{classify, dedupe, synthetic_alerts, Alert, Clock, DataSource, Route, RoutePoint};

use crate::conditions::{ConditionKind, ConditionsStore};
use crate::providers::{AlertProvider, CallPolicy};

pub struct AlertsAggregator {
    primary: Option<Arc<dyn AlertProvider>>,
    secondary: Option<Arc<dyn AlertProvider>>,
    policy: Arc<CallPolicy>,
    store: Arc<ConditionsStore>,
    clock: Arc<dyn Clock>,
}

impl AlertsAggregator {
    pub fn new(
        primary: Option<Arc<dyn AlertProvider>>,
        secondary: Option<Arc<dyn AlertProvider>>,
        policy: Arc<CallPolicy>,
        store: Arc<ConditionsStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            primary,
            secondary,
            policy,
            store,
            clock,
        }
    }

    /// Alerts along the route, deduplicated by (title, location). Never fails.
    pub async fn get_alerts(&self, route: &Route) -> Vec<Alert> {
        let fingerprint = route.fingerprint();
        if let Some(alerts) = self
            .store
            .get::<Vec<Alert>>(&route.route_id, &fingerprint, ConditionKind::Alerts)
            .await
        {
            tracing::debug!("Alerts cache hit for {}", route.route_id);
            return alerts;
        }

        let per_stop = join_all(route.points.iter().map(|point| self.stop_alerts(point))).await;

        let alerts = if per_stop.iter().all(Option::is_none) {
            tracing::info!(
                "No alert provider answered for {}, using seasonal alerts",
                route.route_id
            );
            synthetic_alerts(route, self.clock.now())
        } else {
            dedupe(per_stop.into_iter().flatten().flatten().collect())
        };

        self.store
            .put(&route.route_id, &fingerprint, ConditionKind::Alerts, &alerts)
            .await;
        alerts
    }

    /// Alerts for one stop; None when every provider failed.
    async fn stop_alerts(&self, point: &RoutePoint) -> Option<Vec<Alert>> {
        for provider in [&self.primary, &self.secondary].into_iter().flatten() {
            match self
                .policy
                .call(provider.name(), provider.alerts(point.coordinates))
                .await
            {
                Ok(raw) => {
                    return Some(
                        raw.iter()
                            .map(|r| classify(r, &point.label, DataSource::Provider))
                            .collect(),
                    )
                }
                Err(err) => tracing::warn!("Alerts for {} unavailable: {}", point.label, err),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::MemoryConditions;
    use crate::providers::stub::StubAlerts;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use std::time::Duration;
    use trip_core::routing::{from_corridor, RouteRequestNames};
    use trip_core::{corridors, AlertSeverity, CostModel, ManualClock, RawAlert, RouteSource};

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

    fn aggregator(
        primary: Arc<StubAlerts>,
        secondary: Arc<StubAlerts>,
    ) -> (AlertsAggregator, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap(),
        ));
        let store = Arc::new(ConditionsStore::new(
            Arc::new(MemoryConditions::new()),
            clock.clone(),
            ChronoDuration::minutes(30),
            ChronoDuration::minutes(60),
        ));
        // Zero-length backoff so every stop reaches every stub.
        let policy = Arc::new(CallPolicy::new(
            Duration::from_secs(1),
            Duration::from_millis(1),
            Duration::from_millis(1),
        ));
        let alerts =
            AlertsAggregator::new(Some(primary), Some(secondary), policy, store, clock.clone());
        (alerts, clock)
    }

    fn storm() -> RawAlert {
        RawAlert {
            event: "Winter Storm Warning".to_string(),
            description: "Heavy snow and blowing snow.".to_string(),
            area: Some("Western South Dakota".to_string()),
            expires: None,
        }
    }

    #[tokio::test]
    async fn same_alert_from_every_stop_is_kept_once() {
        let primary = Arc::new(StubAlerts::new("primary", vec![storm()]));
        let secondary = Arc::new(StubAlerts::new("secondary", vec![]));
        let (alerts, _) = aggregator(primary.clone(), secondary.clone());

        let result = alerts.get_alerts(&route()).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].severity, AlertSeverity::Severe);
        assert_eq!(result[0].source, DataSource::Provider);
        assert_eq!(secondary.calls(), 0);

        // Cached inside the window.
        let calls = primary.calls();
        alerts.get_alerts(&route()).await;
        assert_eq!(primary.calls(), calls);
    }

    #[tokio::test]
    async fn secondary_answers_when_primary_fails() {
        let primary = Arc::new(StubAlerts::failing("primary"));
        let secondary = Arc::new(StubAlerts::new("secondary", vec![storm()]));
        let (alerts, _) = aggregator(primary, secondary.clone());
        let result = alerts.get_alerts(&route()).await;
        assert!(secondary.calls() > 0);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].source, DataSource::Provider);
    }

    #[tokio::test]
    async fn empty_answer_is_not_a_failure() {
        let primary = Arc::new(StubAlerts::new("primary", vec![]));
        let secondary = Arc::new(StubAlerts::failing("secondary"));
        let (alerts, _) = aggregator(primary, secondary);
        let result = alerts.get_alerts(&route()).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn total_failure_yields_seasonal_alerts() {
        let primary = Arc::new(StubAlerts::failing("primary"));
        let secondary = Arc::new(StubAlerts::failing("secondary"));
        let (alerts, _) = aggregator(primary, secondary);
        let result = alerts.get_alerts(&route()).await;
        assert!(!result.is_empty());
        assert!(result.iter().all(|a| a.source == DataSource::Synthetic));
    }

    #[tokio::test]
    async fn alerts_are_refetched_once_the_hour_is_up() {
        let primary = Arc::new(StubAlerts::new("primary", vec![storm()]));
        let secondary = Arc::new(StubAlerts::new("secondary", vec![]));
        let (alerts, clock) = aggregator(primary.clone(), secondary);
        let route = route();

        let first = alerts.get_alerts(&route).await;
        let calls = primary.calls();
        assert_eq!(calls, route.points.len());

        clock.advance(ChronoDuration::minutes(45));
        assert_eq!(alerts.get_alerts(&route).await, first);
        assert_eq!(primary.calls(), calls);

        clock.advance(ChronoDuration::minutes(16));
        alerts.get_alerts(&route).await;
        assert_eq!(primary.calls(), calls * 2);
    }
}
