//! Transport adapters
//!
//! Each adapter turns a service definition into one outbound call and
//! returns a normalized `CallOutcome`, or a typed `CheckError`.

mod rest;
mod soap;

pub use rest::*;
pub use soap::*;

use async_trait::async_trait;
use std::sync::OnceLock;
use std::time::Duration;

use crate::contracts::{AuthKind, CallOutcome, Credentials, ServiceDefinition, ServiceType};
use crate::error::CheckError;

/// Trait for protocol adapters
#[async_trait]
pub trait ServiceAdapter: Send + Sync {
    /// Adapter identifier
    fn id(&self) -> &str;

    /// Check if this adapter handles the service type
    fn supports(&self, service_type: &ServiceType) -> bool;

    /// Perform exactly one call against the service
    async fn invoke(&self, definition: &ServiceDefinition) -> Result<CallOutcome, CheckError>;
}

/// Authenticated transport capability
///
/// Turns a credential bundle into a configured HTTP client. Handshake-based
/// schemes (NTLM, Kerberos) are supplied by an external implementation.
pub trait ClientProvider: Send + Sync {
    fn build(&self, credentials: Option<&Credentials>) -> Result<reqwest::Client, CheckError>;
}

/// Provider for unauthenticated clients
///
/// One pooled client is built on first use and shared by every check. The
/// connect phase is capped at 10 s by default; the adapter's per-request
/// timeout still bounds the whole call.
#[derive(Debug, Clone)]
pub struct DefaultClientProvider {
    connect_timeout: Duration,
    client: OnceLock<reqwest::Client>,
}

impl DefaultClientProvider {
    pub fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            client: OnceLock::new(),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self.client = OnceLock::new();
        self
    }
}

/// Default cap on establishing a connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

impl Default for DefaultClientProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientProvider for DefaultClientProvider {
    fn build(&self, credentials: Option<&Credentials>) -> Result<reqwest::Client, CheckError> {
        if let Some(creds) = credentials {
            if creds.kind != AuthKind::None {
                return Err(CheckError::Authentication(format!(
                    "{} authentication for '{}' requires an authenticated transport provider",
                    creds.kind,
                    creds.qualified_username()
                )));
            }
        }

        if let Some(client) = self.client.get() {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| CheckError::TransportFailure(format!("Failed to create HTTP client: {}", e)))?;

        Ok(self.client.get_or_init(|| client).clone())
    }
}
