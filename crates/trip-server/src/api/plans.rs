//! Planning, saved-route and conditions endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use trip_core::{
    Alert, HourlyForecast, OptimizationResult, PlanRequest, Preferences, Route, WeatherSnapshot,
};

use crate::persistence::{optimizations, preferences, routes};
use crate::persistence::routes::RouteSummary;
use crate::pipeline::{PlanError, TripPlan};
use crate::state::AppState;

pub type ApiError = (StatusCode, Json<Value>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

fn internal(context: &str, err: anyhow::Error) -> ApiError {
    tracing::error!("{}: {}", context, err);
    error(StatusCode::INTERNAL_SERVER_ERROR, context)
}

pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<TripPlan>, ApiError> {
    match state.planner.plan(request).await {
        Ok(plan) => Ok(Json(plan)),
        Err(PlanError::Validation(err)) => Err(error(StatusCode::BAD_REQUEST, err.to_string())),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListRoutesQuery {
    pub user_id: Option<String>,
}

pub async fn list_routes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRoutesQuery>,
) -> Result<Json<Vec<RouteSummary>>, ApiError> {
    let user_id = query
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "user_id is required"))?;
    routes::list_routes_by_user(state.db.pool(), user_id)
        .await
        .map(Json)
        .map_err(|err| internal("Failed to list routes", err))
}

async fn saved_route(state: &AppState, route_id: &str) -> Result<Route, ApiError> {
    routes::load_route(state.db.pool(), route_id)
        .await
        .map_err(|err| internal("Failed to load route", err))?
        .ok_or_else(|| error(StatusCode::NOT_FOUND, format!("route '{}' not found", route_id)))
}

pub async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(route_id): Path<String>,
) -> Result<Json<Route>, ApiError> {
    saved_route(&state, &route_id).await.map(Json)
}

pub async fn get_route_weather(
    State(state): State<Arc<AppState>>,
    Path(route_id): Path<String>,
) -> Result<Json<WeatherSnapshot>, ApiError> {
    let route = saved_route(&state, &route_id).await?;
    Ok(Json(state.planner.weather().get_weather(&route).await))
}

pub async fn get_route_alerts(
    State(state): State<Arc<AppState>>,
    Path(route_id): Path<String>,
) -> Result<Json<Vec<Alert>>, ApiError> {
    let route = saved_route(&state, &route_id).await?;
    Ok(Json(state.planner.alerts().get_alerts(&route).await))
}

/// Optimization audit history for a saved route, oldest first.
pub async fn get_route_optimizations(
    State(state): State<Arc<AppState>>,
    Path(route_id): Path<String>,
) -> Result<Json<Vec<OptimizationResult>>, ApiError> {
    saved_route(&state, &route_id).await?;
    optimizations::list_optimizations(state.db.pool(), &route_id)
        .await
        .map(Json)
        .map_err(|err| internal("Failed to list optimizations", err))
}

#[derive(Debug, Deserialize)]
pub struct HourlyQuery {
    pub lat: f64,
    pub lng: f64,
}

pub async fn get_hourly(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HourlyQuery>,
) -> Result<Json<Vec<HourlyForecast>>, ApiError> {
    if !(-90.0..=90.0).contains(&query.lat) || !(-180.0..=180.0).contains(&query.lng) {
        return Err(error(StatusCode::BAD_REQUEST, "lat/lng out of range"));
    }
    let at = trip_core::Coordinates::new(query.lat, query.lng);
    Ok(Json(state.planner.weather().hourly(at).await))
}

/// Stored preferences, or the defaults for users without any.
pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Preferences>, ApiError> {
    preferences::load_preferences(state.db.pool(), &user_id)
        .await
        .map(|prefs| Json(prefs.unwrap_or_default()))
        .map_err(|err| internal("Failed to load preferences", err))
}

pub async fn put_preferences(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(prefs): Json<Preferences>,
) -> Result<Json<Preferences>, ApiError> {
    prefs
        .validate()
        .map_err(|err| error(StatusCode::BAD_REQUEST, err.to_string()))?;
    preferences::save_preferences(state.db.pool(), &user_id, &prefs, state.clock.now())
        .await
        .map_err(|err| internal("Failed to save preferences", err))?;
    tracing::info!("Saved preferences for {}", user_id);
    Ok(Json(prefs))
}
