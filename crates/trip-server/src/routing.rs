//! Route resolution through an ordered list of strategies.
//!
//! Each strategy either produces a route or yields to the next one. The
//! geographic synthesizer at the end cannot fail, so every request gets a
//! route with positive distance and duration.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use trip_core::corridors::{self, CorridorTier};
use trip_core::routing::{
    assemble, from_corridor, interpolate, points_from_geometry, threshold_stops, LegBoundary,
    RouteParts, RouteRequestNames,
};
use trip_core::{
    extract_highways, Clock, CostModel, GeoResolution, Route, RouteSource, StopThresholds,
};

use crate::geo::GeoResolver;
use crate::providers::{CallPolicy, Directions, DirectionsProvider};

/// Network-free or provider-backed tiers tried before synthesis, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CorridorOverride,
    Directions,
}

const STRATEGIES: &[Strategy] = &[Strategy::CorridorOverride, Strategy::Directions];

pub struct RouteResolver {
    geo: Arc<GeoResolver>,
    directions: Option<Arc<dyn DirectionsProvider>>,
    policy: Arc<CallPolicy>,
    clock: Arc<dyn Clock>,
    thresholds: StopThresholds,
    costs: CostModel,
}

impl RouteResolver {
    pub fn new(
        geo: Arc<GeoResolver>,
        directions: Option<Arc<dyn DirectionsProvider>>,
        policy: Arc<CallPolicy>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            geo,
            directions,
            policy,
            clock,
            thresholds: StopThresholds::default(),
            costs: CostModel::default(),
        }
    }

    /// Resolve a route. Never fails.
    pub async fn compute_route(
        &self,
        route_id: &str,
        origin: &str,
        destination: &str,
        waypoints: &[String],
        departure: DateTime<Utc>,
    ) -> Route {
        let names = RouteRequestNames {
            route_id,
            origin,
            destination,
            waypoints,
            departure,
            created_at: self.clock.now(),
        };

        // Geocoding is deferred so the override tier costs no network calls.
        let mut resolved: Option<Vec<GeoResolution>> = None;

        for strategy in STRATEGIES {
            let route = match strategy {
                Strategy::CorridorOverride => self.corridor_override(&names),
                Strategy::Directions => {
                    let stops = self.resolve_stops(&names, &mut resolved).await;
                    self.via_directions(&names, stops).await
                }
            };
            match route {
                Some(route) => {
                    tracing::debug!(
                        "Route {} resolved by {:?} ({:.0} mi)",
                        route_id,
                        strategy,
                        route.distance_miles
                    );
                    return route;
                }
                None => tracing::debug!("Route {}: {:?} unavailable, advancing", route_id, strategy),
            }
        }

        let stops = self.resolve_stops(&names, &mut resolved).await;
        let route = self.synthesize(&names, stops);
        tracing::debug!(
            "Route {} synthesized as {:?} ({:.0} mi)",
            route_id,
            route.source,
            route.distance_miles
        );
        route
    }

    async fn resolve_stops<'r>(
        &self,
        names: &RouteRequestNames<'_>,
        slot: &'r mut Option<Vec<GeoResolution>>,
    ) -> &'r [GeoResolution] {
        if slot.is_none() {
            let mut queries: Vec<&str> = Vec::with_capacity(names.waypoints.len() + 2);
            queries.push(names.origin);
            queries.extend(names.waypoints.iter().map(String::as_str));
            queries.push(names.destination);
            *slot = Some(self.geo.resolve_all(&queries).await);
        }
        slot.as_deref().unwrap_or(&[])
    }

    fn corridor_override(&self, names: &RouteRequestNames<'_>) -> Option<Route> {
        if !names.waypoints.is_empty() {
            return None;
        }
        let corridor = corridors::find(names.origin, names.destination, &[CorridorTier::Override])?;
        Some(from_corridor(
            names,
            corridor,
            RouteSource::CorridorOverride,
            &self.costs,
        ))
    }

    async fn via_directions(
        &self,
        names: &RouteRequestNames<'_>,
        stops: &[GeoResolution],
    ) -> Option<Route> {
        let provider = self.directions.as_ref()?;
        if stops.len() < 2 || stops.iter().any(GeoResolution::is_placeholder) {
            tracing::debug!("Skipping directions: unresolved stop names");
            return None;
        }

        let coordinates: Vec<_> = stops.iter().map(|s| s.coordinates).collect();
        let directions = match self
            .policy
            .call(provider.name(), provider.directions(&coordinates))
            .await
        {
            Ok(directions) => directions,
            Err(err) => {
                tracing::warn!("Directions for {} failed: {}", names.route_id, err);
                return None;
            }
        };

        Some(self.route_from_directions(names, stops, directions))
    }

    fn route_from_directions(
        &self,
        names: &RouteRequestNames<'_>,
        stops: &[GeoResolution],
        directions: Directions,
    ) -> Route {
        let boundaries = leg_boundaries(names.waypoints, stops, &directions);
        let first = &stops[0];
        let last = &stops[stops.len() - 1];
        let points = points_from_geometry(
            (names.origin, first.coordinates),
            (names.destination, last.coordinates),
            &directions.geometry,
            &boundaries,
            directions.duration_minutes,
            directions.distance_miles,
        );
        let highways = extract_highways(directions.instructions.iter().map(String::as_str));
        let recommended_stops = threshold_stops(
            directions.duration_minutes,
            &directions.geometry,
            &self.thresholds,
        );

        assemble(
            names,
            RouteParts {
                points,
                distance_miles: directions.distance_miles,
                highways,
                recommended_stops,
                geometry: directions.geometry,
                source: RouteSource::Directions,
                corridor: None,
            },
            &self.costs,
        )
    }

    fn synthesize(&self, names: &RouteRequestNames<'_>, stops: &[GeoResolution]) -> Route {
        if names.waypoints.is_empty() {
            if let Some(corridor) =
                corridors::find(names.origin, names.destination, &[CorridorTier::Template])
            {
                return from_corridor(names, corridor, RouteSource::CorridorTemplate, &self.costs);
            }
        }

        let labels = std::iter::once(names.origin)
            .chain(names.waypoints.iter().map(String::as_str))
            .chain(std::iter::once(names.destination));
        let anchors: Vec<_> = labels
            .zip(stops.iter())
            .map(|(label, stop)| (label.to_string(), stop.coordinates))
            .collect();
        interpolate(names, &anchors, &self.thresholds, &self.costs)
    }
}

/// Waypoint boundaries at cumulative leg durations.
fn leg_boundaries(
    waypoints: &[String],
    stops: &[GeoResolution],
    directions: &Directions,
) -> Vec<LegBoundary> {
    let legs = stops.len().saturating_sub(1).max(1);
    let has_legs = directions.leg_durations_minutes.len() == legs;
    let mut elapsed = 0;
    waypoints
        .iter()
        .enumerate()
        .filter_map(|(idx, label)| {
            elapsed = if has_legs {
                elapsed + directions.leg_durations_minutes[idx]
            } else {
                directions.duration_minutes * (idx as u32 + 1) / legs as u32
            };
            let stop = stops.get(idx + 1)?;
            Some(LegBoundary {
                label: label.clone(),
                coordinates: stop.coordinates,
                elapsed_minutes: elapsed,
            })
        })
        .collect()
}
