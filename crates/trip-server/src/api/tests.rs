use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::{api, config::Config, persistence, state::AppState};

async fn setup_app() -> axum::Router {
    let mut config = Config::from_env().expect("config");
    config.database_path = ":memory:".to_string();
    config.database_max_connections = 1;
    config.providers_enabled = false;
    config.synthetic_seed = Some(42);

    let db = persistence::init_database(&config.database_path, config.database_max_connections)
        .await
        .expect("init db");
    let state = Arc::new(AppState::from_config(config, db).expect("state"));
    api::routes().with_state(state)
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn send_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_check() {
    let app = setup_app().await;
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn plan_is_saved_and_retrievable() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/plans",
            json!({
                "route_id": "trip-1",
                "user_id": "u-1",
                "origin": "Rapid City, SD",
                "destination": "Miami, FL",
                "departure_date": "2024-01-15T08:00:00Z"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let plan = read_json(response).await;
    assert_eq!(plan["route"]["route_id"], "trip-1");
    assert_eq!(plan["route"]["source"], "corridor_override");
    assert_eq!(plan["optimization"]["route_score"], 65);
    assert_eq!(plan["optimization"]["optimal_departure"], "6:00 AM");
    assert!(!plan["alerts"].as_array().unwrap().is_empty());
    assert!(!plan["timeline"].as_array().unwrap().is_empty());

    let listed = read_json(
        app.clone()
            .oneshot(get("/v1/routes?user_id=u-1"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["route_id"], "trip-1");

    let route = app.clone().oneshot(get("/v1/routes/trip-1")).await.unwrap();
    assert_eq!(route.status(), StatusCode::OK);
    assert_eq!(read_json(route).await, plan["route"]);

    // Served from the conditions store written while planning.
    let weather = read_json(
        app.clone()
            .oneshot(get("/v1/routes/trip-1/weather"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(weather, plan["weather"]);

    let alerts = read_json(
        app.clone()
            .oneshot(get("/v1/routes/trip-1/alerts"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(alerts, plan["alerts"]);

    let history = read_json(
        app.oneshot(get("/v1/routes/trip-1/optimizations"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0], plan["optimization"]);
}

#[tokio::test]
async fn taken_route_id_is_not_overwritten_by_another_trip() {
    let app = setup_app().await;
    let plan = |origin: &str, destination: &str| {
        send_json(
            "POST",
            "/v1/plans",
            json!({
                "route_id": "trip-1",
                "user_id": "u-1",
                "origin": origin,
                "destination": destination,
                "departure_date": "2024-01-15T08:00:00Z"
            }),
        )
    };

    let first = read_json(
        app.clone()
            .oneshot(plan("Rapid City, SD", "Miami, FL"))
            .await
            .unwrap(),
    )
    .await;
    let second = read_json(
        app.clone()
            .oneshot(plan("Chicago, IL", "Denver, CO"))
            .await
            .unwrap(),
    )
    .await;

    let second_id = second["route"]["route_id"].as_str().unwrap().to_string();
    assert_ne!(second_id, "trip-1");
    assert_ne!(second["weather"], first["weather"]);

    let stored = read_json(app.clone().oneshot(get("/v1/routes/trip-1")).await.unwrap()).await;
    assert_eq!(stored["origin"], "Rapid City, SD");
    assert_eq!(stored, first["route"]);

    let weather = read_json(
        app.clone()
            .oneshot(get("/v1/routes/trip-1/weather"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(weather, first["weather"]);

    let moved = read_json(
        app.oneshot(get(&format!("/v1/routes/{second_id}")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(moved["origin"], "Chicago, IL");
}

#[tokio::test]
async fn invalid_plan_request_is_rejected() {
    let app = setup_app().await;
    let response = app
        .oneshot(send_json(
            "POST",
            "/v1/plans",
            json!({
                "origin": "  ",
                "destination": "Miami, FL",
                "departure_date": "2024-01-15T08:00:00Z"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"], "origin must not be empty");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = setup_app().await;
    let response = app.clone().oneshot(get("/v1/routes/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/v1/routes")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn preferences_round_trip() {
    let app = setup_app().await;

    let defaults = read_json(
        app.clone()
            .oneshot(get("/v1/users/u-9/preferences"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(defaults["hours_per_day"], 8);

    let response = app
        .clone()
        .oneshot(send_json(
            "PUT",
            "/v1/users/u-9/preferences",
            json!({"hours_per_day": 10, "preferred_departure_time": "07:30"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = read_json(
        app.clone()
            .oneshot(get("/v1/users/u-9/preferences"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(stored["hours_per_day"], 10);
    assert_eq!(stored["preferred_departure_time"], "07:30");

    let rejected = app
        .oneshot(send_json(
            "PUT",
            "/v1/users/u-9/preferences",
            json!({"hours_per_day": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn hourly_forecast_validates_coordinates() {
    let app = setup_app().await;

    let hours = read_json(
        app.clone()
            .oneshot(get("/v1/weather/hourly?lat=44.08&lng=-103.23"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(hours.as_array().unwrap().len(), 24);
    assert_eq!(hours[0]["source"], "synthetic");

    let response = app
        .oneshot(get("/v1/weather/hourly?lat=120&lng=0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
