use crate::engine::{BenchmarkThresholds, MetricId, Threshold};
use crate::storage::trait_def::validate_thresholds;
use crate::storage::{BenchmarkStore, StoreError, StoreResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Durable benchmark store, one row per `(account, metric)`.
pub struct SqliteBenchmarkStore {
    pool: Arc<SqlitePool>,
}

impl SqliteBenchmarkStore {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl BenchmarkStore for SqliteBenchmarkStore {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS benchmarks (
                account_id TEXT NOT NULL,
                metric TEXT NOT NULL,
                low REAL,
                medium REAL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (account_id, metric)
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_benchmarks_account ON benchmarks(account_id)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn get(&self, account_id: &str) -> StoreResult<Option<BenchmarkThresholds>> {
        let rows = sqlx::query("SELECT metric, low, medium FROM benchmarks WHERE account_id = ?")
            .bind(account_id)
            .fetch_all(self.pool.as_ref())
            .await
            .map_err(|e| StoreError::Other(e.into()))?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut thresholds = BenchmarkThresholds::default();
        for row in rows {
            let metric_name: String = row.get("metric");
            let Ok(metric) = metric_name.parse::<MetricId>() else {
                // Rows written by a newer build with metrics this one doesn't
                // know about are skipped, not fatal.
                tracing::warn!("skipping unknown benchmark metric '{metric_name}'");
                continue;
            };
            thresholds.set(
                metric,
                Threshold {
                    low: row.get("low"),
                    medium: row.get("medium"),
                },
            );
        }
        Ok(Some(thresholds))
    }

    async fn put(&self, account_id: &str, thresholds: &BenchmarkThresholds) -> StoreResult<()> {
        validate_thresholds(thresholds)?;

        let updated_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| StoreError::Other(e.into()))?
            .as_secs() as i64;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Other(e.into()))?;

        // Replace the account's whole map so removed metrics don't linger.
        sqlx::query("DELETE FROM benchmarks WHERE account_id = ?")
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Other(e.into()))?;

        for (metric, threshold) in &thresholds.0 {
            sqlx::query(
                r#"
                INSERT INTO benchmarks (account_id, metric, low, medium, updated_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(account_id)
            .bind(metric.as_str())
            .bind(threshold.low)
            .bind(threshold.medium)
            .bind(updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Other(e.into()))?;
        }

        tx.commit().await.map_err(|e| StoreError::Other(e.into()))?;
        Ok(())
    }
}
