//! Freshness-windowed conditions storage.
//!
//! A read takes the newest record for a route and kind and ignores it once it
//! is older than the kind's window or was recorded for a different trip under
//! the same route id. Each write prunes records of its kind that have aged out.
//! Storage errors never reach callers.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use trip_core::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    Weather,
    Alerts,
}

impl ConditionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::Weather => "weather",
            ConditionKind::Alerts => "alerts",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "weather" => Some(ConditionKind::Weather),
            "alerts" => Some(ConditionKind::Alerts),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionsRecord {
    pub route_id: String,
    /// `Route::fingerprint` of the trip the payload describes
    pub fingerprint: String,
    pub kind: ConditionKind,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ConditionsBackend: Send + Sync {
    /// Most recent record for the route and kind, if any.
    async fn latest(
        &self,
        route_id: &str,
        kind: ConditionKind,
    ) -> anyhow::Result<Option<ConditionsRecord>>;

    async fn append(&self, record: ConditionsRecord) -> anyhow::Result<()>;

    /// Delete records of `kind` created before `before`. Returns how many went.
    async fn prune(&self, kind: ConditionKind, before: DateTime<Utc>) -> anyhow::Result<u64>;
}

/// Process-local backend for planners built without a database.
#[derive(Debug, Default)]
pub struct MemoryConditions {
    records: DashMap<(String, ConditionKind), Vec<ConditionsRecord>>,
}

impl MemoryConditions {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConditionsBackend for MemoryConditions {
    async fn latest(
        &self,
        route_id: &str,
        kind: ConditionKind,
    ) -> anyhow::Result<Option<ConditionsRecord>> {
        Ok(self
            .records
            .get(&(route_id.to_string(), kind))
            .and_then(|records| records.iter().max_by_key(|r| r.created_at).cloned()))
    }

    async fn append(&self, record: ConditionsRecord) -> anyhow::Result<()> {
        self.records
            .entry((record.route_id.clone(), record.kind))
            .or_default()
            .push(record);
        Ok(())
    }

    async fn prune(&self, kind: ConditionKind, before: DateTime<Utc>) -> anyhow::Result<u64> {
        let mut removed = 0;
        for mut entry in self.records.iter_mut().filter(|e| e.key().1 == kind) {
            let records = entry.value_mut();
            let len = records.len();
            records.retain(|r| r.created_at >= before);
            removed += (len - records.len()) as u64;
        }
        self.records.retain(|_, records| !records.is_empty());
        Ok(removed)
    }
}

pub struct ConditionsStore {
    backend: Arc<dyn ConditionsBackend>,
    clock: Arc<dyn Clock>,
    weather_window: Duration,
    alerts_window: Duration,
}

impl ConditionsStore {
    pub fn new(
        backend: Arc<dyn ConditionsBackend>,
        clock: Arc<dyn Clock>,
        weather_window: Duration,
        alerts_window: Duration,
    ) -> Self {
        Self {
            backend,
            clock,
            weather_window,
            alerts_window,
        }
    }

    fn window(&self, kind: ConditionKind) -> Duration {
        match kind {
            ConditionKind::Weather => self.weather_window,
            ConditionKind::Alerts => self.alerts_window,
        }
    }

    /// Fresh payload for the route, or None when missing, stale, recorded for
    /// another trip or unreadable.
    pub async fn get<T: DeserializeOwned>(
        &self,
        route_id: &str,
        fingerprint: &str,
        kind: ConditionKind,
    ) -> Option<T> {
        let record = match self.backend.latest(route_id, kind).await {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!("Conditions read for {} failed: {}", route_id, err);
                return None;
            }
        };

        if record.fingerprint != fingerprint {
            tracing::debug!(
                "{} for {} was recorded for a different trip, ignoring",
                kind.as_str(),
                route_id
            );
            return None;
        }

        let age = self.clock.now() - record.created_at;
        if age >= self.window(kind) {
            tracing::debug!("{} for {} is stale ({}s old)", kind.as_str(), route_id, age.num_seconds());
            return None;
        }

        match serde_json::from_value(record.payload) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("Unreadable {} record for {}: {}", kind.as_str(), route_id, err);
                None
            }
        }
    }

    /// Append a new record and prune aged-out ones. Failures are logged and
    /// dropped.
    pub async fn put<T: Serialize>(
        &self,
        route_id: &str,
        fingerprint: &str,
        kind: ConditionKind,
        payload: &T,
    ) {
        let payload = match serde_json::to_value(payload) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!("Could not encode {} for {}: {}", kind.as_str(), route_id, err);
                return;
            }
        };
        let now = self.clock.now();
        let record = ConditionsRecord {
            route_id: route_id.to_string(),
            fingerprint: fingerprint.to_string(),
            kind,
            payload,
            created_at: now,
        };
        if let Err(err) = self.backend.append(record).await {
            tracing::warn!("Conditions write for {} failed: {}", route_id, err);
            return;
        }

        let Some(cutoff) = now.checked_sub_signed(self.window(kind)) else {
            return;
        };
        match self.backend.prune(kind, cutoff).await {
            Ok(0) => {}
            Ok(removed) => tracing::debug!("Pruned {} expired {} records", removed, kind.as_str()),
            Err(err) => tracing::warn!("Conditions prune for {} failed: {}", kind.as_str(), err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use trip_core::ManualClock;

    struct BrokenBackend;

    #[async_trait]
    impl ConditionsBackend for BrokenBackend {
        async fn latest(
            &self,
            _route_id: &str,
            _kind: ConditionKind,
        ) -> anyhow::Result<Option<ConditionsRecord>> {
            anyhow::bail!("disk on fire")
        }

        async fn append(&self, _record: ConditionsRecord) -> anyhow::Result<()> {
            anyhow::bail!("disk on fire")
        }

        async fn prune(&self, _kind: ConditionKind, _before: DateTime<Utc>) -> anyhow::Result<u64> {
            anyhow::bail!("disk on fire")
        }
    }

    const TRIP: &str = "fp-rapid-city-miami";

    fn store(backend: Arc<dyn ConditionsBackend>) -> (ConditionsStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap(),
        ));
        let store = ConditionsStore::new(
            backend,
            clock.clone(),
            Duration::minutes(30),
            Duration::minutes(60),
        );
        (store, clock)
    }

    #[tokio::test]
    async fn fresh_until_window_elapses() {
        let (store, clock) = store(Arc::new(MemoryConditions::new()));
        store.put("r-1", TRIP, ConditionKind::Weather, &vec![1, 2, 3]).await;

        clock.advance(Duration::minutes(29));
        let hit: Option<Vec<u32>> = store.get("r-1", TRIP, ConditionKind::Weather).await;
        assert_eq!(hit, Some(vec![1, 2, 3]));

        clock.advance(Duration::minutes(1));
        let miss: Option<Vec<u32>> = store.get("r-1", TRIP, ConditionKind::Weather).await;
        assert_eq!(miss, None);
    }

    #[tokio::test]
    async fn kinds_have_their_own_windows() {
        let (store, clock) = store(Arc::new(MemoryConditions::new()));
        store.put("r-1", TRIP, ConditionKind::Alerts, &"advisory").await;
        clock.advance(Duration::minutes(45));
        let alerts: Option<String> = store.get("r-1", TRIP, ConditionKind::Alerts).await;
        assert_eq!(alerts.as_deref(), Some("advisory"));
        let weather: Option<String> = store.get("r-1", TRIP, ConditionKind::Weather).await;
        assert!(weather.is_none());
    }

    #[tokio::test]
    async fn newest_record_wins() {
        let (store, clock) = store(Arc::new(MemoryConditions::new()));
        store.put("r-1", TRIP, ConditionKind::Weather, &1u32).await;
        clock.advance(Duration::minutes(1));
        store.put("r-1", TRIP, ConditionKind::Weather, &2u32).await;
        assert_eq!(store.get::<u32>("r-1", TRIP, ConditionKind::Weather).await, Some(2));
    }

    #[tokio::test]
    async fn unreadable_payload_is_a_miss() {
        let (store, _) = store(Arc::new(MemoryConditions::new()));
        store.put("r-1", TRIP, ConditionKind::Weather, &"not a number").await;
        assert_eq!(store.get::<u32>("r-1", TRIP, ConditionKind::Weather).await, None);
    }

    #[tokio::test]
    async fn backend_errors_are_swallowed() {
        let (store, _) = store(Arc::new(BrokenBackend));
        store.put("r-1", TRIP, ConditionKind::Weather, &1u32).await;
        assert_eq!(store.get::<u32>("r-1", TRIP, ConditionKind::Weather).await, None);
    }

    #[tokio::test]
    async fn record_for_another_trip_is_a_miss() {
        let (store, _) = store(Arc::new(MemoryConditions::new()));
        store.put("trip-1", TRIP, ConditionKind::Weather, &1u32).await;

        let other: Option<u32> = store
            .get("trip-1", "fp-chicago-denver", ConditionKind::Weather)
            .await;
        assert_eq!(other, None);
        assert_eq!(store.get::<u32>("trip-1", TRIP, ConditionKind::Weather).await, Some(1));
    }

    #[tokio::test]
    async fn writes_prune_expired_records_of_the_same_kind() {
        let backend = Arc::new(MemoryConditions::new());
        let (store, clock) = store(backend.clone());
        store.put("r-1", TRIP, ConditionKind::Weather, &1u32).await;
        store.put("r-2", TRIP, ConditionKind::Weather, &2u32).await;
        store.put("r-1", TRIP, ConditionKind::Alerts, &3u32).await;

        clock.advance(Duration::minutes(31));
        store.put("r-3", TRIP, ConditionKind::Weather, &4u32).await;

        for route_id in ["r-1", "r-2"] {
            let latest = backend.latest(route_id, ConditionKind::Weather).await.unwrap();
            assert!(latest.is_none(), "{route_id} weather should be pruned");
        }
        // Alerts keep their own 60 minute window.
        assert!(backend
            .latest("r-1", ConditionKind::Alerts)
            .await
            .unwrap()
            .is_some());
        assert_eq!(store.get::<u32>("r-3", TRIP, ConditionKind::Weather).await, Some(4));
    }
}
