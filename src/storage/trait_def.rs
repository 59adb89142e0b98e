use crate::engine::BenchmarkThresholds;
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid benchmark payload: {0}")]
    InvalidPayload(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Reject threshold maps carrying non-finite bounds before they reach a
/// backend.
pub fn validate_thresholds(thresholds: &BenchmarkThresholds) -> StoreResult<()> {
    for (metric, threshold) in &thresholds.0 {
        for bound in [threshold.low, threshold.medium].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(StoreError::InvalidPayload(format!(
                    "non-finite {metric} threshold"
                )));
            }
        }
    }
    Ok(())
}

/// Persistence boundary for benchmark thresholds.
///
/// The aggregation engine never touches this directly; API handlers and the
/// CLI read a snapshot per call and pass it in, so the engine stays pure.
#[async_trait]
pub trait BenchmarkStore: Send + Sync {
    /// Initialize the backing store (create tables, etc.)
    async fn init(&self) -> Result<()>;

    /// Stored thresholds for an account, or `None` if never configured.
    async fn get(&self, account_id: &str) -> StoreResult<Option<BenchmarkThresholds>>;

    /// Upsert the full threshold map for an account.
    async fn put(&self, account_id: &str, thresholds: &BenchmarkThresholds) -> StoreResult<()>;
}
