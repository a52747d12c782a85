//! SQLite backend for conditions records.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::db::{parse_timestamp, timestamp};
use crate::conditions::{ConditionKind, ConditionsBackend, ConditionsRecord};

#[derive(Clone)]
pub struct SqliteConditions {
    pool: SqlitePool,
}

impl SqliteConditions {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ConditionsRow {
    route_id: String,
    fingerprint: String,
    kind: String,
    payload: String,
    created_at: String,
}

impl TryFrom<ConditionsRow> for ConditionsRecord {
    type Error = anyhow::Error;

    fn try_from(row: ConditionsRow) -> Result<Self> {
        let kind = ConditionKind::parse(&row.kind)
            .ok_or_else(|| anyhow::anyhow!("unknown conditions kind '{}'", row.kind))?;
        Ok(ConditionsRecord {
            route_id: row.route_id,
            fingerprint: row.fingerprint,
            kind,
            payload: serde_json::from_str(&row.payload)?,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

#[async_trait]
impl ConditionsBackend for SqliteConditions {
    async fn latest(&self, route_id: &str, kind: ConditionKind) -> Result<Option<ConditionsRecord>> {
        let row = sqlx::query_as::<_, ConditionsRow>(
            r#"
            SELECT route_id, fingerprint, kind, payload, created_at FROM conditions
            WHERE route_id = ?1 AND kind = ?2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(route_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ConditionsRecord::try_from).transpose()
    }

    async fn append(&self, record: ConditionsRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO conditions (route_id, fingerprint, kind, payload, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&record.route_id)
        .bind(&record.fingerprint)
        .bind(record.kind.as_str())
        .bind(serde_json::to_string(&record.payload)?)
        .bind(timestamp(record.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn prune(&self, kind: ConditionKind, before: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM conditions WHERE kind = ?1 AND created_at < ?2")
            .bind(kind.as_str())
            .bind(timestamp(before))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::init_database;
    use chrono::{Duration, TimeZone};

    fn record(payload: serde_json::Value, minute: u32) -> ConditionsRecord {
        ConditionsRecord {
            route_id: "r-1".to_string(),
            fingerprint: "3f2a9c0d11e4b7a8".to_string(),
            kind: ConditionKind::Weather,
            payload,
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 8, minute, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn latest_returns_newest_record() {
        let db = init_database(":memory:", 1).await.unwrap();
        let backend = SqliteConditions::new(db.pool().clone());

        backend.append(record(serde_json::json!({"n": 1}), 0)).await.unwrap();
        backend.append(record(serde_json::json!({"n": 2}), 5)).await.unwrap();

        let latest = backend
            .latest("r-1", ConditionKind::Weather)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.payload, serde_json::json!({"n": 2}));
        assert_eq!(
            latest.created_at,
            Utc.with_ymd_and_hms(2024, 1, 15, 8, 5, 0).unwrap()
        );

        assert!(backend
            .latest("r-1", ConditionKind::Alerts)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn float_payloads_round_trip_exactly() {
        let db = init_database(":memory:", 1).await.unwrap();
        let backend = SqliteConditions::new(db.pool().clone());
        let mut rec = record(serde_json::json!({"temperature_f": 44.123456789}), 0);
        rec.created_at += Duration::microseconds(17);
        backend.append(rec.clone()).await.unwrap();

        let latest = backend
            .latest("r-1", ConditionKind::Weather)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest, rec);
    }

    #[tokio::test]
    async fn prune_removes_only_older_records_of_the_kind() {
        let db = init_database(":memory:", 1).await.unwrap();
        let backend = SqliteConditions::new(db.pool().clone());

        backend.append(record(serde_json::json!({"n": 1}), 0)).await.unwrap();
        backend.append(record(serde_json::json!({"n": 2}), 40)).await.unwrap();
        let mut alerts = record(serde_json::json!([]), 0);
        alerts.kind = ConditionKind::Alerts;
        backend.append(alerts).await.unwrap();

        let cutoff = Utc.with_ymd_and_hms(2024, 1, 15, 8, 10, 0).unwrap();
        let removed = backend.prune(ConditionKind::Weather, cutoff).await.unwrap();
        assert_eq!(removed, 1);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conditions")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 2);
        let latest = backend
            .latest("r-1", ConditionKind::Weather)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.payload, serde_json::json!({"n": 2}));
    }
}
