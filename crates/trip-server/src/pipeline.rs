//! Planning pipeline: route (claimed in the repository), then weather and
//! alerts concurrently, then the optimizer and timeline. Only input
//! validation can fail.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;

use trip_core::{
    build_timeline, optimize, Alert, OptimizationResult, PlanRequest, PlannerRules, Route,
    TimelineSegment, ValidationError, WeatherSnapshot,
};

use crate::alerts::AlertsAggregator;
use crate::routing::RouteResolver;
use crate::weather::WeatherAggregator;

/// Fresh ids tried when a requested route id is already taken.
const CLAIM_ATTEMPTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// What happened to a route handed to [`PlanRepository::save_route`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    /// Same trip and owner already stored under the id; the row was refreshed.
    Updated,
    /// The id belongs to a different trip or another user. Nothing was written.
    Conflict,
}

/// Where finished plans are recorded.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn save_route(
        &self,
        user_id: Option<&str>,
        route: &Route,
    ) -> anyhow::Result<SaveOutcome>;
    async fn save_optimization(&self, result: &OptimizationResult) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripPlan {
    pub route: Route,
    pub weather: WeatherSnapshot,
    pub alerts: Vec<Alert>,
    pub optimization: OptimizationResult,
    pub timeline: Vec<TimelineSegment>,
}

/// Alerts still being fetched. Dropping the handle cancels the fetch.
#[derive(Debug)]
pub struct PendingAlerts {
    handle: Option<JoinHandle<Vec<Alert>>>,
}

impl PendingAlerts {
    pub async fn wait(mut self) -> Vec<Alert> {
        let Some(handle) = self.handle.take() else {
            return Vec::new();
        };
        match handle.await {
            Ok(alerts) => alerts,
            Err(err) => {
                tracing::warn!("Alert fetch did not complete: {}", err);
                Vec::new()
            }
        }
    }
}

impl Drop for PendingAlerts {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// A plan whose alerts arrive separately.
#[derive(Debug)]
pub struct StagedPlan {
    pub route: Route,
    pub weather: WeatherSnapshot,
    pub optimization: OptimizationResult,
    pub timeline: Vec<TimelineSegment>,
    pub alerts: PendingAlerts,
}

pub struct TripPlanner {
    routes: Arc<RouteResolver>,
    weather: Arc<WeatherAggregator>,
    alerts: Arc<AlertsAggregator>,
    repository: Option<Arc<dyn PlanRepository>>,
    rules: PlannerRules,
}

impl TripPlanner {
    pub fn new(
        routes: Arc<RouteResolver>,
        weather: Arc<WeatherAggregator>,
        alerts: Arc<AlertsAggregator>,
        repository: Option<Arc<dyn PlanRepository>>,
        rules: PlannerRules,
    ) -> Self {
        Self {
            routes,
            weather,
            alerts,
            repository,
            rules,
        }
    }

    pub fn weather(&self) -> &Arc<WeatherAggregator> {
        &self.weather
    }

    pub fn alerts(&self) -> &Arc<AlertsAggregator> {
        &self.alerts
    }

    pub fn validate(&self, request: &PlanRequest) -> Result<(), PlanError> {
        request.validate().map_err(PlanError::from)
    }

    pub async fn plan(&self, request: PlanRequest) -> Result<TripPlan, PlanError> {
        self.validate(&request)?;
        let route = self.resolve_route(&request).await;

        let (weather, alerts) = tokio::join!(
            self.weather.get_weather(&route),
            self.alerts.get_alerts(&route),
        );
        let optimization = optimize(&route, &weather, &request.preferences, &self.rules);
        let timeline = build_timeline(&route, &weather, &request.preferences);
        self.record_optimization(&optimization).await;

        tracing::info!(
            "Planned {} ({} -> {}): score {}, {} alerts",
            route.route_id,
            route.origin,
            route.destination,
            optimization.route_score,
            alerts.len()
        );
        Ok(TripPlan {
            route,
            weather,
            alerts,
            optimization,
            timeline,
        })
    }

    /// Like [`plan`](Self::plan), but returns before alerts are in.
    pub async fn plan_staged(&self, request: PlanRequest) -> Result<StagedPlan, PlanError> {
        self.validate(&request)?;
        let route = self.resolve_route(&request).await;

        let aggregator = self.alerts.clone();
        let alert_route = route.clone();
        let alerts = PendingAlerts {
            handle: Some(tokio::spawn(async move {
                aggregator.get_alerts(&alert_route).await
            })),
        };

        let weather = self.weather.get_weather(&route).await;
        let optimization = optimize(&route, &weather, &request.preferences, &self.rules);
        let timeline = build_timeline(&route, &weather, &request.preferences);
        self.record_optimization(&optimization).await;

        Ok(StagedPlan {
            route,
            weather,
            optimization,
            timeline,
            alerts,
        })
    }

    async fn resolve_route(&self, request: &PlanRequest) -> Route {
        let route_id = request
            .route_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let waypoints = request.clean_waypoints();
        let mut route = self
            .routes
            .compute_route(
                &route_id,
                request.origin.trim(),
                request.destination.trim(),
                &waypoints,
                request.departure_date,
            )
            .await;
        self.claim_route(request.user_id.as_deref(), &mut route)
            .await;
        route
    }

    /// Save the route before any conditions are keyed by its id. An id that
    /// already names another trip or another user's route is replaced.
    async fn claim_route(&self, user_id: Option<&str>, route: &mut Route) {
        let Some(repository) = &self.repository else {
            return;
        };
        for _ in 0..CLAIM_ATTEMPTS {
            match repository.save_route(user_id, route).await {
                Ok(SaveOutcome::Conflict) => {
                    let fresh = uuid::Uuid::new_v4().to_string();
                    tracing::warn!(
                        "Route id {} is taken by another trip, saving as {}",
                        route.route_id,
                        fresh
                    );
                    route.route_id = fresh;
                }
                Ok(_) => return,
                Err(err) => {
                    tracing::warn!("Failed to save route {}: {}", route.route_id, err);
                    return;
                }
            }
        }
        tracing::warn!("Route {} left unsaved after {} attempts", route.route_id, CLAIM_ATTEMPTS);
    }

    async fn record_optimization(&self, optimization: &OptimizationResult) {
        let Some(repository) = &self.repository else {
            return;
        };
        if let Err(err) = repository.save_optimization(optimization).await {
            tracing::warn!(
                "Failed to save optimization for {}: {}",
                optimization.route_id,
                err
            );
        }
    }
}
