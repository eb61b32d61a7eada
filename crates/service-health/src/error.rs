//! Error types for Service Health
//!
//! Adapters raise `CheckError`; the dispatcher is the only place that turns
//! one into a `CheckResult`. `RuleError` never escapes the validation engine.

use thiserror::Error;

/// Errors raised while invoking a service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// No adapter handles the definition's service type
    #[error("unknown service type: {0}")]
    UnknownServiceType(String),

    /// The service type is known but no adapter for it is registered
    #[error("no adapter available for service type: {0}")]
    AdapterUnavailable(String),

    /// The remote interface does not declare the requested operation
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Application error declared by the remote service
    #[error("SOAP Fault: {0}")]
    RemoteFault(String),

    /// Transport-layer failure other than timeout or connection loss
    #[error("Transport Error: {0}")]
    TransportFailure(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    ConnectionFailure(String),

    /// The transport provider could not build an authenticated client
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The definition cannot be turned into a request
    #[error("Invalid service definition: {0}")]
    InvalidDefinition(String),
}

impl CheckError {
    pub fn invalid_definition(msg: impl Into<String>) -> Self {
        CheckError::InvalidDefinition(msg.into())
    }

    /// True when the service could not be reached at all
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            CheckError::Timeout(_) | CheckError::ConnectionFailure(_)
        )
    }
}

impl From<reqwest::Error> for CheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CheckError::Timeout(err.to_string())
        } else if err.is_connect() {
            CheckError::ConnectionFailure(err.to_string())
        } else if err.is_builder() {
            CheckError::InvalidDefinition(err.to_string())
        } else {
            CheckError::TransportFailure(err.to_string())
        }
    }
}

/// Errors raised while evaluating a single rule
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised by a service store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid service definition: {0}")]
    InvalidDefinition(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CheckError::UnknownServiceType("graphql".to_string());
        assert_eq!(err.to_string(), "unknown service type: graphql");

        let err = CheckError::AdapterUnavailable("soap".to_string());
        assert_eq!(err.to_string(), "no adapter available for service type: soap");

        let err = CheckError::RemoteFault("Server was unable to process request".to_string());
        assert!(err.to_string().starts_with("SOAP Fault:"));
    }

    #[test]
    fn test_is_unreachable() {
        assert!(CheckError::Timeout("30s".to_string()).is_unreachable());
        assert!(CheckError::ConnectionFailure("refused".to_string()).is_unreachable());
        assert!(!CheckError::RemoteFault("fault".to_string()).is_unreachable());
    }

    #[test]
    fn test_rule_error_display() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = RuleError::InvalidPattern {
            pattern: "(".to_string(),
            source,
        };
        assert!(err.to_string().contains("invalid regex pattern '('"));
    }
}
