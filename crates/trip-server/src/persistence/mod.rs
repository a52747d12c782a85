//! Persistence layer for the trip server.
//!
//! SQLite-backed storage for saved routes, conditions snapshots, the
//! optimization audit log and user preferences.

pub mod conditions;
pub mod db;
pub mod optimizations;
pub mod preferences;
pub mod routes;

use async_trait::async_trait;
use std::sync::Arc;

use trip_core::{Clock, OptimizationResult, Route};

use crate::pipeline::{PlanRepository, SaveOutcome};

pub use conditions::SqliteConditions;
pub use db::{init_database, Database};

/// Records finished plans in SQLite.
pub struct SqlitePlanRepository {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl SqlitePlanRepository {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }
}

#[async_trait]
impl PlanRepository for SqlitePlanRepository {
    async fn save_route(
        &self,
        user_id: Option<&str>,
        route: &Route,
    ) -> anyhow::Result<SaveOutcome> {
        routes::save_route(self.db.pool(), user_id, route).await
    }

    async fn save_optimization(&self, result: &OptimizationResult) -> anyhow::Result<()> {
        optimizations::insert_optimization(self.db.pool(), result, self.clock.now()).await
    }
}
