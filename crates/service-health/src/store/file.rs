//! JSON file-backed service store
//!
//! All records live in one pretty-printed JSON document that is replaced
//! on every mutation.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use super::{Records, ServiceStore};
use crate::contracts::{CheckResult, ServiceDefinition, ServiceRecord};
use crate::error::StoreResult;

/// Persistent store backed by a JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: RwLock<Records>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty when the file does not exist
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let records = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Records::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Records::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(path = %path.display(), "Opened service store");

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `next` to disk, then make it the live table
    ///
    /// The live table is left untouched when the write fails.
    async fn commit(&self, live: &mut Records, next: Records) -> StoreResult<()> {
        self.persist(&next).await?;
        *live = next;
        Ok(())
    }

    /// Replace the file through a sibling temp file and a rename
    async fn persist(&self, records: &Records) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(records)?;
        let tmp = self.temp_path();

        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ServiceStore for JsonFileStore {
    async fn upsert(&self, definition: ServiceDefinition) -> StoreResult<ServiceDefinition> {
        let mut records = self.records.write().await;
        let mut next = records.clone();
        let stored = next.upsert(definition)?;
        self.commit(&mut records, next).await?;
        Ok(stored)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<ServiceDefinition>> {
        Ok(self.records.read().await.get(id))
    }

    async fn list(&self) -> StoreResult<BTreeMap<String, ServiceDefinition>> {
        Ok(self.records.read().await.list())
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let mut records = self.records.write().await;
        let mut next = records.clone();
        let existed = next.delete(id);
        if existed {
            self.commit(&mut records, next).await?;
        }
        Ok(existed)
    }

    async fn put_result(&self, id: &str, result: CheckResult) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let mut next = records.clone();
        if next.put_result(id, result) {
            self.commit(&mut records, next).await?;
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
