//! Health-check dispatch engine
//!
//! Selects an adapter per service type, validates the outcome, records the
//! result and isolates failures across batch runs.

mod validator;

pub use validator::*;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::contracts::*;
use crate::error::{CheckError, StoreResult};
use crate::store::ServiceStore;
use crate::transport::ServiceAdapter;

/// Default bound on concurrently running checks in a batch
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Dispatcher tuning
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Upper bound on checks running at once in `run_all`
    pub max_concurrency: usize,

    /// Outer guard on a single check, on top of the transport's own timeout
    pub check_timeout: Option<Duration>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            check_timeout: None,
        }
    }
}

/// Health-check dispatcher
pub struct Dispatcher {
    adapters: Vec<Arc<dyn ServiceAdapter>>,
    store: Arc<dyn ServiceStore>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Create a dispatcher with no adapters registered
    pub fn new(store: Arc<dyn ServiceStore>) -> Self {
        Self {
            adapters: Vec::new(),
            store,
            config: DispatcherConfig::default(),
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn ServiceAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<dyn ServiceStore> {
        &self.store
    }

    /// Check one service and record the result
    ///
    /// Never fails: every error is reported inside the returned result.
    pub async fn run_one(&self, definition: &ServiceDefinition) -> CheckResult {
        let result = self.execute(definition).await;
        self.record(&definition.id, &result).await;
        result
    }

    /// Check every definition concurrently, isolating failures per service
    pub async fn run_all(self: &Arc<Self>, definitions: Vec<ServiceDefinition>) -> BatchReport {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));

        let checks = definitions.into_iter().map(|definition| {
            let dispatcher = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            let id = definition.id.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                dispatcher.run_one(&definition).await
            });

            async move { (id, handle.await) }
        });

        let mut results = BTreeMap::new();
        for (id, joined) in futures::future::join_all(checks).await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(service_id = %id, error = %e, "Check task aborted");
                    let result = CheckResult::failed(&id, format!("check task panicked: {}", e));
                    self.record(&id, &result).await;
                    result
                }
            };
            results.insert(id, result);
        }

        let report = BatchReport::new(results).with_duration(start.elapsed().as_millis() as u64);
        tracing::info!(
            total = report.total,
            passed = report.passed,
            failed = report.failed,
            duration_ms = report.duration_ms,
            "Batch check completed"
        );
        report
    }

    /// Check a stored service; `None` if the id is unknown
    pub async fn run_stored(&self, id: &str) -> StoreResult<Option<CheckResult>> {
        match self.store.get(id).await? {
            Some(definition) => Ok(Some(self.run_one(&definition).await)),
            None => Ok(None),
        }
    }

    /// Check every stored service
    pub async fn run_all_stored(self: &Arc<Self>) -> StoreResult<BatchReport> {
        let definitions = self.store.list().await?.into_values().collect();
        Ok(self.run_all(definitions).await)
    }

    async fn execute(&self, definition: &ServiceDefinition) -> CheckResult {
        let start = Instant::now();

        match self.invoke(definition).await {
            Ok(outcome) => {
                let validation = evaluate(&outcome, &definition.validation_rules);
                let result = CheckResult::completed(&definition.id, outcome, validation)
                    .with_duration(start.elapsed().as_millis() as u64);

                tracing::info!(
                    service_id = %definition.id,
                    success = result.success,
                    duration_ms = result.duration_ms,
                    "Health check completed"
                );
                result
            }
            Err(e) => {
                tracing::warn!(
                    service_id = %definition.id,
                    service_type = %definition.service_type,
                    unreachable = e.is_unreachable(),
                    error = %e,
                    "Health check failed"
                );
                CheckResult::failed(&definition.id, e.to_string())
                    .with_duration(start.elapsed().as_millis() as u64)
            }
        }
    }

    async fn invoke(&self, definition: &ServiceDefinition) -> Result<CallOutcome, CheckError> {
        let adapter = self
            .adapters
            .iter()
            .find(|a| a.supports(&definition.service_type))
            .ok_or_else(|| match &definition.service_type {
                ServiceType::Unsupported(other) => CheckError::UnknownServiceType(other.clone()),
                known => CheckError::AdapterUnavailable(known.to_string()),
            })?;

        tracing::debug!(
            service_id = %definition.id,
            adapter = adapter.id(),
            "Invoking service"
        );

        match self.config.check_timeout {
            Some(limit) => timeout(limit, adapter.invoke(definition))
                .await
                .map_err(|_| {
                    CheckError::Timeout(format!("check exceeded {}ms", limit.as_millis()))
                })?,
            None => adapter.invoke(definition).await,
        }
    }

    async fn record(&self, id: &str, result: &CheckResult) {
        if let Err(e) = self.store.put_result(id, result.clone()).await {
            tracing::warn!(service_id = %id, error = %e, "Failed to record check result");
        }
    }
}
