//! Optimization audit log.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use trip_core::OptimizationResult;

use super::db::timestamp;

pub async fn insert_optimization(
    pool: &SqlitePool,
    result: &OptimizationResult,
    at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO optimizations (route_id, route_score, payload, created_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(&result.route_id)
    .bind(result.route_score as i64)
    .bind(serde_json::to_string(result)?)
    .bind(timestamp(at))
    .execute(pool)
    .await?;
    Ok(())
}

/// Every optimization recorded for a route, oldest first.
pub async fn list_optimizations(pool: &SqlitePool, route_id: &str) -> Result<Vec<OptimizationResult>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT payload FROM optimizations WHERE route_id = ?1 ORDER BY created_at ASC, id ASC",
    )
    .bind(route_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(json,)| serde_json::from_str(&json).map_err(anyhow::Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::init_database;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn result(route_id: &str, score: u8) -> OptimizationResult {
        serde_json::from_value(json!({
            "route_id": route_id,
            "route_score": score,
            "score_label": "good",
            "optimal_departure": "6:00 AM",
            "total_duration_minutes": 1395,
            "estimated_duration": "23h 15m",
            "travel_days": 3,
            "recommended_stops": [],
            "safety_recommendations": [{"title": "Rest Strategy", "description": "Stop every two hours."}],
            "summary": "Long haul.",
            "tags": ["Extended Journey"]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn audit_log_keeps_every_run_in_order() {
        let db = init_database(":memory:", 1).await.unwrap();
        let t0 = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();

        insert_optimization(db.pool(), &result("trip-1", 65), t0).await.unwrap();
        insert_optimization(db.pool(), &result("trip-2", 90), t0).await.unwrap();
        insert_optimization(db.pool(), &result("trip-1", 70), t0 + Duration::minutes(5))
            .await
            .unwrap();

        let history = list_optimizations(db.pool(), "trip-1").await.unwrap();
        let scores: Vec<u8> = history.iter().map(|r| r.route_score).collect();
        assert_eq!(scores, vec![65, 70]);
        assert_eq!(history[0], result("trip-1", 65));
        assert!(list_optimizations(db.pool(), "nope").await.unwrap().is_empty());
    }
}
