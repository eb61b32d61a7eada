//! Runtime configuration
//!
//! Values are read from the environment; the CLI may override them.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::{DispatcherConfig, DEFAULT_MAX_CONCURRENCY};

pub const STORE_PATH_VAR: &str = "SERVICE_HEALTH_STORE";
pub const CONCURRENCY_VAR: &str = "SERVICE_HEALTH_CONCURRENCY";
pub const CHECK_TIMEOUT_VAR: &str = "SERVICE_HEALTH_CHECK_TIMEOUT_MS";

/// Default location of the service definitions file
pub const DEFAULT_STORE_PATH: &str = "services.json";

/// Service Health configuration
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Path of the JSON service store
    pub store_path: PathBuf,

    /// Bound on concurrently running checks
    pub max_concurrency: usize,

    /// Optional outer timeout per check
    pub check_timeout: Option<Duration>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            check_timeout: None,
        }
    }
}

impl HealthConfig {
    /// Load from environment, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let store_path = lookup(STORE_PATH_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.store_path);

        let max_concurrency = parse_var(&lookup, CONCURRENCY_VAR)
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.max_concurrency);

        let check_timeout = parse_var(&lookup, CHECK_TIMEOUT_VAR)
            .filter(|ms: &u64| *ms > 0)
            .map(Duration::from_millis);

        Self {
            store_path,
            max_concurrency,
            check_timeout,
        }
    }

    pub fn dispatcher(&self) -> DispatcherConfig {
        DispatcherConfig {
            max_concurrency: self.max_concurrency,
            check_timeout: self.check_timeout,
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = key, value = %raw, "Ignoring unparsable configuration value");
            None
        }
    }
}
