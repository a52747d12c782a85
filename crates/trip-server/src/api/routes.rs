//! REST API router.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::{plans, request_id};
use crate::state::AppState;

pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v1/plans", post(plans::create_plan))
        .route("/v1/routes", get(plans::list_routes))
        .route("/v1/routes/:route_id", get(plans::get_route))
        .route("/v1/routes/:route_id/weather", get(plans::get_route_weather))
        .route("/v1/routes/:route_id/alerts", get(plans::get_route_alerts))
        .route(
            "/v1/routes/:route_id/optimizations",
            get(plans::get_route_optimizations),
        )
        .route("/v1/weather/hourly", get(plans::get_hourly))
        .route(
            "/v1/users/:user_id/preferences",
            get(plans::get_preferences).put(plans::put_preferences),
        )
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id::ensure_request_id))
}
