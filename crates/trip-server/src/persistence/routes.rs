//! Saved route persistence.

use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;

use trip_core::Route;

use super::db::{parse_timestamp, timestamp};
use crate::pipeline::SaveOutcome;

/// Listing entry for a saved route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub route_id: String,
    pub origin: String,
    pub destination: String,
    pub distance_miles: f64,
    pub duration_minutes: u32,
    pub source: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Store a route under its id.
///
/// An existing row is only refreshed when it holds the same trip and either
/// has no owner or belongs to `user_id`. Anything else is a conflict and the
/// stored route is left alone.
pub async fn save_route(
    pool: &SqlitePool,
    user_id: Option<&str>,
    route: &Route,
) -> Result<SaveOutcome> {
    let payload = serde_json::to_string(route)?;
    let source = serde_json::to_value(route.source)?
        .as_str()
        .unwrap_or_default()
        .to_string();

    let inserted = sqlx::query(
        r#"
        INSERT INTO routes (
            route_id, user_id, origin, destination,
            distance_miles, duration_minutes, source, payload, created_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(route_id) DO NOTHING
        "#,
    )
    .bind(&route.route_id)
    .bind(user_id)
    .bind(&route.origin)
    .bind(&route.destination)
    .bind(route.distance_miles)
    .bind(route.duration_minutes as i64)
    .bind(&source)
    .bind(&payload)
    .bind(timestamp(route.created_at))
    .execute(pool)
    .await?;
    if inserted.rows_affected() > 0 {
        return Ok(SaveOutcome::Inserted);
    }

    let existing: Option<(Option<String>, String)> =
        sqlx::query_as("SELECT user_id, payload FROM routes WHERE route_id = ?1")
            .bind(&route.route_id)
            .fetch_optional(pool)
            .await?;
    let Some((owner, stored)) = existing else {
        return Ok(SaveOutcome::Conflict);
    };
    let stored: Route = serde_json::from_str(&stored)?;
    let same_owner = owner.is_none() || owner.as_deref() == user_id;
    if !same_owner || stored.fingerprint() != route.fingerprint() {
        return Ok(SaveOutcome::Conflict);
    }

    sqlx::query(
        r#"
        UPDATE routes SET
            user_id = COALESCE(?2, user_id), distance_miles = ?3, duration_minutes = ?4,
            source = ?5, payload = ?6, created_at = ?7
        WHERE route_id = ?1
        "#,
    )
    .bind(&route.route_id)
    .bind(user_id)
    .bind(route.distance_miles)
    .bind(route.duration_minutes as i64)
    .bind(&source)
    .bind(&payload)
    .bind(timestamp(route.created_at))
    .execute(pool)
    .await?;

    Ok(SaveOutcome::Updated)
}

pub async fn load_route(pool: &SqlitePool, route_id: &str) -> Result<Option<Route>> {
    let payload: Option<(String,)> = sqlx::query_as("SELECT payload FROM routes WHERE route_id = ?1")
        .bind(route_id)
        .fetch_optional(pool)
        .await?;

    payload
        .map(|(json,)| serde_json::from_str(&json).map_err(anyhow::Error::from))
        .transpose()
}

#[derive(sqlx::FromRow)]
struct RouteSummaryRow {
    route_id: String,
    origin: String,
    destination: String,
    distance_miles: f64,
    duration_minutes: i64,
    source: String,
    created_at: String,
}

impl TryFrom<RouteSummaryRow> for RouteSummary {
    type Error = anyhow::Error;

    fn try_from(row: RouteSummaryRow) -> Result<Self> {
        Ok(RouteSummary {
            route_id: row.route_id,
            origin: row.origin,
            destination: row.destination,
            distance_miles: row.distance_miles,
            duration_minutes: u32::try_from(row.duration_minutes)?,
            source: row.source,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

/// Routes saved for a user, newest first.
pub async fn list_routes_by_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<RouteSummary>> {
    let rows = sqlx::query_as::<_, RouteSummaryRow>(
        r#"
        SELECT route_id, origin, destination, distance_miles, duration_minutes, source, created_at
        FROM routes WHERE user_id = ?1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
}
