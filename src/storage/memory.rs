use crate::engine::BenchmarkThresholds;
use crate::storage::trait_def::validate_thresholds;
use crate::storage::{BenchmarkStore, StoreResult};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

/// In-memory benchmark store for tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryBenchmarkStore {
    thresholds: DashMap<String, BenchmarkThresholds>,
}

impl MemoryBenchmarkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BenchmarkStore for MemoryBenchmarkStore {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, account_id: &str) -> StoreResult<Option<BenchmarkThresholds>> {
        Ok(self
            .thresholds
            .get(account_id)
            .map(|entry| entry.value().clone()))
    }

    async fn put(&self, account_id: &str, thresholds: &BenchmarkThresholds) -> StoreResult<()> {
        validate_thresholds(thresholds)?;
        self.thresholds
            .insert(account_id.to_string(), thresholds.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MetricId, Threshold};

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryBenchmarkStore::new();
        store.init().await.unwrap();

        let mut thresholds = BenchmarkThresholds::default();
        thresholds.set(
            MetricId::Roas,
            Threshold {
                low: Some(1.0),
                medium: Some(2.0),
            },
        );

        store.put("act_1", &thresholds).await.unwrap();
        let fetched = store.get("act_1").await.unwrap().unwrap();
        assert_eq!(fetched, thresholds);

        assert!(store.get("act_unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_existing() {
        let store = MemoryBenchmarkStore::new();

        let mut first = BenchmarkThresholds::default();
        first.set(
            MetricId::Ctr,
            Threshold {
                low: Some(0.5),
                medium: Some(1.0),
            },
        );
        store.put("act_1", &first).await.unwrap();

        let second = BenchmarkThresholds::default();
        store.put("act_1", &second).await.unwrap();

        let fetched = store.get("act_1").await.unwrap().unwrap();
        assert!(fetched.0.is_empty());
    }
}
