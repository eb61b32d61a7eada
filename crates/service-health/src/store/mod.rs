//! Service store
//!
//! Owns service definitions and records the last check result per service.
//! Writes are upserts keyed by service id; concurrent writes to the same id
//! are last-writer-wins.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;

use crate::contracts::{CheckResult, ServiceDefinition, ServiceRecord};
use crate::error::{StoreError, StoreResult};

/// Storage for service definitions and their latest results
#[async_trait]
pub trait ServiceStore: Send + Sync {
    /// Insert or replace a definition, stamping its timestamps
    async fn upsert(&self, definition: ServiceDefinition) -> StoreResult<ServiceDefinition>;

    async fn get(&self, id: &str) -> StoreResult<Option<ServiceDefinition>>;

    async fn list(&self) -> StoreResult<BTreeMap<String, ServiceDefinition>>;

    /// Remove a definition; returns whether it existed
    async fn delete(&self, id: &str) -> StoreResult<bool>;

    /// Record the latest check result; unknown ids are ignored
    async fn put_result(&self, id: &str, result: CheckResult) -> StoreResult<()>;

    async fn last_result(&self, id: &str) -> StoreResult<Option<CheckResult>>;

    /// Definition together with its last check
    async fn record(&self, id: &str) -> StoreResult<Option<ServiceRecord>>;
}

/// In-memory record table shared by the store implementations
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub(crate) struct Records(BTreeMap<String, ServiceRecord>);

impl Records {
    pub(crate) fn upsert(&mut self, mut definition: ServiceDefinition) -> StoreResult<ServiceDefinition> {
        if definition.id.trim().is_empty() {
            return Err(StoreError::InvalidDefinition(
                "service id must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let created_at = self
            .0
            .get(&definition.id)
            .and_then(|existing| existing.definition.created_at)
            .or(definition.created_at)
            .unwrap_or(now);

        definition.created_at = Some(created_at);
        definition.updated_at = Some(now);

        self.0
            .insert(definition.id.clone(), ServiceRecord::new(definition.clone()));
        Ok(definition)
    }

    pub(crate) fn get(&self, id: &str) -> Option<ServiceDefinition> {
        self.0.get(id).map(|record| record.definition.clone())
    }

    pub(crate) fn list(&self) -> BTreeMap<String, ServiceDefinition> {
        self.0
            .iter()
            .map(|(id, record)| (id.clone(), record.definition.clone()))
            .collect()
    }

    pub(crate) fn delete(&mut self, id: &str) -> bool {
        self.0.remove(id).is_some()
    }

    /// Returns whether the result was recorded
    pub(crate) fn put_result(&mut self, id: &str, result: CheckResult) -> bool {
        match self.0.get_mut(id) {
            Some(record) => {
                record.last_check = Some(result.timestamp);
                record.last_result = Some(result);
                true
            }
            None => false,
        }
    }

    pub(crate) fn last_result(&self, id: &str) -> Option<CheckResult> {
        self.0.get(id).and_then(|record| record.last_result.clone())
    }

    pub(crate) fn record(&self, id: &str) -> Option<ServiceRecord> {
        self.0.get(id).cloned()
    }
}
