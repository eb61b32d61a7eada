//! Service Health Contracts
//!
//! Data model shared by the transport adapters, the validation engine,
//! the dispatcher and the result store.

mod rules;
mod service;

pub use rules::*;
pub use service::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Status code reported for a successful SOAP call
pub const SOAP_SUCCESS_STATUS: u16 = 200;

/// Normalized result of one transport call, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallOutcome {
    /// HTTP status (synthesized for SOAP)
    pub status_code: u16,

    /// Response headers (REST only)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Response body: parsed JSON, raw text, or a normalized SOAP result
    pub body: Value,

    /// Transport-level success, independent of validation
    pub success: bool,
}

impl CallOutcome {
    /// Outcome of an HTTP exchange; success is the 2xx band
    pub fn http(status_code: u16, headers: BTreeMap<String, String>, body: Value) -> Self {
        Self {
            status_code,
            headers,
            body,
            success: (200..300).contains(&status_code),
        }
    }

    /// Outcome of a completed RPC call
    pub fn synthesized(body: Value) -> Self {
        Self {
            status_code: SOAP_SUCCESS_STATUS,
            headers: BTreeMap::new(),
            body,
            success: true,
        }
    }
}

/// Verdict of the validation engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff there are no failures
    pub passed: bool,

    /// One message per failing rule, in rule order
    pub failures: Vec<String>,
}

impl ValidationResult {
    pub fn from_failures(failures: Vec<String>) -> Self {
        Self {
            passed: failures.is_empty(),
            failures,
        }
    }

    pub fn passed() -> Self {
        Self::from_failures(Vec::new())
    }
}

/// Combined transport and validation verdict for one service invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub service_id: String,

    /// Outcome success AND validation passed
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CallOutcome>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,

    /// Set when the service could not be invoked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub duration_ms: u64,
}

impl CheckResult {
    /// Result of a call that completed and was validated
    pub fn completed(
        service_id: impl Into<String>,
        outcome: CallOutcome,
        validation: ValidationResult,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            success: outcome.success && validation.passed,
            outcome: Some(outcome),
            validation: Some(validation),
            error: None,
            timestamp: Utc::now(),
            duration_ms: 0,
        }
    }

    /// Result of a call that never produced an outcome
    pub fn failed(service_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            success: false,
            outcome: None,
            validation: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
            duration_ms: 0,
        }
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// Results of a batch run, keyed by service id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub request_id: Uuid,

    pub results: BTreeMap<String, CheckResult>,

    pub total: u32,

    pub passed: u32,

    pub failed: u32,

    pub completed_at: DateTime<Utc>,

    pub duration_ms: u64,
}

impl BatchReport {
    pub fn new(results: BTreeMap<String, CheckResult>) -> Self {
        let total = results.len() as u32;
        let passed = results.values().filter(|r| r.success).count() as u32;

        Self {
            request_id: Uuid::new_v4(),
            results,
            total,
            passed,
            failed: total - passed,
            completed_at: Utc::now(),
            duration_ms: 0,
        }
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }

    /// True when every check in the batch succeeded
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Stored service definition together with its most recent check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    #[serde(flatten)]
    pub definition: ServiceDefinition,

    #[serde(default)]
    pub last_check: Option<DateTime<Utc>>,

    #[serde(default)]
    pub last_result: Option<CheckResult>,
}

impl ServiceRecord {
    pub fn new(definition: ServiceDefinition) -> Self {
        Self {
            definition,
            last_check: None,
            last_result: None,
        }
    }
}
