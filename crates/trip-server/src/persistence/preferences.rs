//! Stored travel preferences per user.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use trip_core::Preferences;

use super::db::timestamp;

pub async fn load_preferences(pool: &SqlitePool, user_id: &str) -> Result<Option<Preferences>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT payload FROM user_preferences WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    row.map(|(json,)| serde_json::from_str(&json).map_err(anyhow::Error::from))
        .transpose()
}

pub async fn save_preferences(
    pool: &SqlitePool,
    user_id: &str,
    preferences: &Preferences,
    at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_preferences (user_id, payload, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(user_id) DO UPDATE SET payload = ?2, updated_at = ?3
        "#,
    )
    .bind(user_id)
    .bind(serde_json::to_string(preferences)?)
    .bind(timestamp(at))
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::init_database;

    #[tokio::test]
    async fn upsert_replaces_previous_preferences() {
        let db = init_database(":memory:", 1).await.unwrap();
        assert!(load_preferences(db.pool(), "u-1").await.unwrap().is_none());

        let mut prefs = Preferences::default();
        save_preferences(db.pool(), "u-1", &prefs, Utc::now()).await.unwrap();
        prefs.hours_per_day = 10;
        prefs.round_trip = true;
        save_preferences(db.pool(), "u-1", &prefs, Utc::now()).await.unwrap();

        assert_eq!(load_preferences(db.pool(), "u-1").await.unwrap(), Some(prefs));
    }
}
