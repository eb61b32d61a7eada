//! In-memory service store

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{Records, ServiceStore};
use crate::contracts::{CheckResult, ServiceDefinition, ServiceRecord};
use crate::error::StoreResult;

/// Volatile store, suitable for tests and ad-hoc batches
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ServiceStore for MemoryStore {
    async fn upsert(&self, definition: ServiceDefinition) -> StoreResult<ServiceDefinition> {
        self.records.write().await.upsert(definition)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<ServiceDefinition>> {
        Ok(self.records.read().await.get(id))
    }

    async fn list(&self) -> StoreResult<BTreeMap<String, ServiceDefinition>> {
        Ok(self.records.read().await.list())
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        Ok(self.records.write().await.delete(id))
    }

    async fn put_result(&self, id: &str, result: CheckResult) -> StoreResult<()> {
        if !self.records.write().await.put_result(id, result) {
            tracing::debug!(service_id = %id, "Discarding result for unknown service");
        }
        Ok(())
    }

    async fn last_result(&self, id: &str) -> StoreResult<Option<CheckResult>> {
        Ok(self.records.read().await.last_result(id))
    }

    async fn record(&self, id: &str) -> StoreResult<Option<ServiceRecord>> {
        Ok(self.records.read().await.record(id))
    }
}
