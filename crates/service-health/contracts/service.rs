//! Service definitions
//!
//! Describes the remote services that can be health-checked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use super::Rule;

/// A monitored service and the check to run against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Unique service identifier
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Protocol used to reach the service
    #[serde(rename = "type")]
    pub service_type: ServiceType,

    /// Base URL (REST) or descriptor location (SOAP)
    pub endpoint: String,

    /// Service-relative path appended to the endpoint (REST only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Operation name (SOAP) or HTTP verb (REST, defaults to GET)
    #[serde(default)]
    pub method: String,

    /// Operation arguments (SOAP) or query/body parameters (REST)
    #[serde(default)]
    pub params: Map<String, Value>,

    /// Explicit request body (REST only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// Request headers (REST only)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Credentials handed to the authenticated transport provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Credentials>,

    /// Rules evaluated against the call outcome, in order
    #[serde(default)]
    pub validation_rules: Vec<Rule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ServiceDefinition {
    /// Create a REST definition issuing `GET endpoint`
    pub fn rest(id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(id, ServiceType::Rest, endpoint, "GET")
    }

    /// Create a SOAP definition invoking `operation`
    pub fn soap(
        id: impl Into<String>,
        endpoint: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self::new(id, ServiceType::Soap, endpoint, operation)
    }

    fn new(
        id: impl Into<String>,
        service_type: ServiceType,
        endpoint: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            service_type,
            endpoint: endpoint.into(),
            path: None,
            method: method.into(),
            params: Map::new(),
            body: None,
            headers: BTreeMap::new(),
            auth: None,
            validation_rules: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_auth(mut self, auth: Credentials) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.validation_rules.push(rule);
        self
    }

    /// Full request URL: endpoint joined with the optional relative path
    pub fn request_url(&self) -> String {
        match self.path.as_deref() {
            Some(path) if !path.is_empty() => format!(
                "{}/{}",
                self.endpoint.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            _ => self.endpoint.clone(),
        }
    }
}

/// Service protocol
///
/// Unrecognised type names are kept as `Unsupported` so that a definition
/// still loads and the dispatcher can report it as a failed check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceType {
    Soap,
    Rest,
    Unsupported(String),
}

impl ServiceType {
    pub fn as_str(&self) -> &str {
        match self {
            ServiceType::Soap => "soap",
            ServiceType::Rest => "rest",
            ServiceType::Unsupported(other) => other,
        }
    }
}

impl From<String> for ServiceType {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "soap" => ServiceType::Soap,
            "rest" => ServiceType::Rest,
            _ => ServiceType::Unsupported(value),
        }
    }
}

impl From<ServiceType> for String {
    fn from(value: ServiceType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential bundle for the authenticated transport provider
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default, alias = "auth_type")]
    pub kind: AuthKind,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>, kind: AuthKind) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            domain: None,
            kind,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// User name in `DOMAIN\user` form when a domain is set
    pub fn qualified_username(&self) -> String {
        match self.domain.as_deref() {
            Some(domain) if !domain.is_empty() => format!("{}\\{}", domain, self.username),
            _ => self.username.clone(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("domain", &self.domain)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Authentication scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    Ntlm,
    Kerberos,
    #[default]
    None,
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthKind::Ntlm => write!(f, "ntlm"),
            AuthKind::Kerberos => write!(f, "kerberos"),
            AuthKind::None => write!(f, "none"),
        }
    }
}
