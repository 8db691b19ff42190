pub mod api_keys;
pub mod history;
pub mod models;
pub mod schema;
pub mod sessions;
pub mod users;

pub use models::*;

use anyhow::Context;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::time::{Duration, Instant};

use crate::config::DatabaseKind;

#[derive(Clone)]
pub struct Database {
    pub pool: AnyPool,
    pub kind: DatabaseKind,
}

impl Database {
    pub fn new(pool: AnyPool, kind: DatabaseKind) -> Self {
        Self { pool, kind }
    }

    /// Open a pool against `url`. In-memory SQLite gets a single connection,
    /// since every new connection would otherwise see an empty database.
    pub async fn connect(kind: DatabaseKind, url: &str) -> anyhow::Result<Self> {
        sqlx::any::install_default_drivers();

        let in_memory = url.contains(":memory:");
        let mut options = AnyPoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .acquire_timeout(Duration::from_secs(5));
        if in_memory {
            options = options.idle_timeout(None).max_lifetime(None);
        }

        let pool = options
            .connect(url)
            .await
            .with_context(|| format!("Failed to connect to {} database", kind.as_str()))?;

        Ok(Self::new(pool, kind))
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn init_schema(&self) -> anyhow::Result<()> {
        for statement in schema::statements(self.kind) {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to apply schema statement: {}", statement))?;
        }
        tracing::info!(backend = self.kind.as_str(), "Database schema ready");
        Ok(())
    }

    /// Round-trip a trivial query, used by the setup connection test
    pub async fn ping(&self) -> anyhow::Result<Duration> {
        let start = Instant::now();
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(start.elapsed())
    }

    /// Log current pool metrics
    pub fn log_pool_metrics(&self) {
        let size = self.pool.size();
        let num_idle = self.pool.num_idle();
        let active = size.saturating_sub(num_idle as u32);

        tracing::info!(
            pool_size = size,
            idle_connections = num_idle,
            active_connections = active,
            "Connection pool metrics"
        );
    }
}
