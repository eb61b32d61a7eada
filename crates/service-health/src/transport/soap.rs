//! SOAP adapter
//!
//! Resolves the operation against a remote interface descriptor, binds
//! parameters by name, and normalizes the typed return value into JSON.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use super::{ClientProvider, DefaultClientProvider, ServiceAdapter};
use crate::contracts::{CallOutcome, Credentials, ServiceDefinition, ServiceType};
use crate::error::CheckError;

/// Declared input field of a remote operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub required: bool,
}

impl ParamDescriptor {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            required,
        }
    }
}

/// Typed value returned by a remote call
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteValue {
    Nil,
    Scalar(Value),
    /// Object-like value with named fields, in declaration order
    Object(Vec<(String, RemoteValue)>),
    List(Vec<RemoteValue>),
}

impl RemoteValue {
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, RemoteValue)>,
        K: Into<String>,
    {
        RemoteValue::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn scalar(value: impl Into<Value>) -> Self {
        RemoteValue::Scalar(value.into())
    }

    /// Recursively convert into JSON
    ///
    /// Object fields whose name starts with `_` are private to the remote
    /// stack and are dropped.
    pub fn normalize(&self) -> Value {
        match self {
            RemoteValue::Nil => Value::Null,
            RemoteValue::Scalar(value) => value.clone(),
            RemoteValue::Object(fields) => Value::Object(
                fields
                    .iter()
                    .filter(|(name, _)| !name.starts_with('_'))
                    .map(|(name, value)| (name.clone(), value.normalize()))
                    .collect(),
            ),
            RemoteValue::List(items) => Value::Array(items.iter().map(Self::normalize).collect()),
        }
    }

    /// Call outcome body for this return value
    ///
    /// Objects become mappings; any other value is wrapped as
    /// `{"result": ...}` with scalars rendered as text.
    pub fn into_body(self) -> Value {
        let result = match self {
            object @ RemoteValue::Object(_) => return object.normalize(),
            RemoteValue::Nil => Value::Null,
            RemoteValue::Scalar(Value::String(s)) => Value::String(s),
            RemoteValue::Scalar(other) => Value::String(other.to_string()),
            list @ RemoteValue::List(_) => list.normalize(),
        };

        let mut body = Map::new();
        body.insert("result".to_string(), result);
        Value::Object(body)
    }
}

/// Failure reported by a remote interface call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteCallError {
    /// Application fault declared by the remote service
    #[error("{0}")]
    Fault(String),

    /// Transport-layer failure
    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Timeout(String),
}

impl From<RemoteCallError> for CheckError {
    fn from(err: RemoteCallError) -> Self {
        match err {
            RemoteCallError::Fault(msg) => CheckError::RemoteFault(msg),
            RemoteCallError::Transport(msg) => CheckError::TransportFailure(msg),
            RemoteCallError::Timeout(msg) => CheckError::Timeout(msg),
        }
    }
}

/// Remote interface descriptor and invocation capability
#[async_trait]
pub trait RemoteInterface: Send + Sync {
    /// Names of all callable operations
    fn list_operations(&self) -> Vec<String>;

    /// Ordered input fields of an operation, `None` if it does not exist
    fn describe_operation(&self, operation: &str) -> Option<Vec<ParamDescriptor>>;

    /// Example value for a declared type, for payload authoring
    fn example_value(&self, type_name: &str) -> Value {
        example_for_type(type_name)
    }

    /// Invoke an operation with named arguments in binding order
    async fn call(
        &self,
        operation: &str,
        params: Vec<(String, Value)>,
    ) -> Result<RemoteValue, RemoteCallError>;
}

/// Loads the remote interface for an endpoint
#[async_trait]
pub trait InterfaceLoader: Send + Sync {
    async fn load(
        &self,
        endpoint: &str,
        client: reqwest::Client,
    ) -> Result<Arc<dyn RemoteInterface>, CheckError>;
}

/// Example values for common XML schema types
pub fn example_for_type(type_name: &str) -> Value {
    let local = type_name.rsplit(':').next().unwrap_or(type_name);
    match local.to_ascii_lowercase().as_str() {
        "string" | "normalizedstring" | "token" | "anyuri" => Value::String("string".to_string()),
        "int" | "integer" | "long" | "short" | "byte" | "unsignedint" | "unsignedlong"
        | "unsignedshort" | "nonnegativeinteger" | "positiveinteger" => Value::from(0),
        "decimal" | "double" | "float" => Value::from(0.0),
        "boolean" => Value::Bool(false),
        "datetime" => Value::String("2024-01-01T00:00:00".to_string()),
        "date" => Value::String("2024-01-01".to_string()),
        "time" => Value::String("00:00:00".to_string()),
        _ => Value::Null,
    }
}

/// Bind params to declared fields by name
///
/// Declared fields come first in declaration order; undeclared params
/// follow. Missing required fields are left for the remote stack to reject.
pub fn bind_params(
    declared: &[ParamDescriptor],
    params: &Map<String, Value>,
) -> Vec<(String, Value)> {
    let mut bound = Vec::with_capacity(params.len());

    for field in declared {
        match params.get(&field.name) {
            Some(value) => bound.push((field.name.clone(), value.clone())),
            None if field.required => {
                tracing::debug!(field = %field.name, "Required SOAP parameter not supplied");
            }
            None => {}
        }
    }

    for (name, value) in params {
        if !declared.iter().any(|field| &field.name == name) {
            tracing::debug!(param = %name, "Passing undeclared SOAP parameter through");
            bound.push((name.clone(), value.clone()));
        }
    }

    bound
}

/// Typed RPC adapter over a remote interface descriptor
pub struct SoapAdapter {
    loader: Arc<dyn InterfaceLoader>,
    provider: Arc<dyn ClientProvider>,
}

impl SoapAdapter {
    pub fn new(loader: Arc<dyn InterfaceLoader>) -> Self {
        Self {
            loader,
            provider: Arc::new(DefaultClientProvider::new()),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn ClientProvider>) -> Self {
        self.provider = provider;
        self
    }

    async fn interface(
        &self,
        endpoint: &str,
        auth: Option<&Credentials>,
    ) -> Result<Arc<dyn RemoteInterface>, CheckError> {
        let client = self.provider.build(auth)?;
        self.loader.load(endpoint, client).await
    }

    /// Operations exposed by the interface at `endpoint`
    pub async fn operations(
        &self,
        endpoint: &str,
        auth: Option<&Credentials>,
    ) -> Result<Vec<String>, CheckError> {
        Ok(self.interface(endpoint, auth).await?.list_operations())
    }

    /// Declared input fields of `operation`
    pub async fn describe(
        &self,
        endpoint: &str,
        auth: Option<&Credentials>,
        operation: &str,
    ) -> Result<Vec<ParamDescriptor>, CheckError> {
        Ok(self.operation_description(endpoint, auth, operation).await?.params)
    }

    /// Example parameter mapping for `operation`
    pub async fn example_payload(
        &self,
        endpoint: &str,
        auth: Option<&Credentials>,
        operation: &str,
    ) -> Result<Map<String, Value>, CheckError> {
        Ok(self.operation_description(endpoint, auth, operation).await?.example)
    }

    /// Declared fields and an example payload, from a single interface load
    pub async fn operation_description(
        &self,
        endpoint: &str,
        auth: Option<&Credentials>,
        operation: &str,
    ) -> Result<OperationDescription, CheckError> {
        let interface = self.interface(endpoint, auth).await?;
        let params = interface
            .describe_operation(operation)
            .ok_or_else(|| CheckError::UnknownOperation(operation.to_string()))?;

        let example = params
            .iter()
            .map(|field| (field.name.clone(), interface.example_value(&field.type_name)))
            .collect();

        Ok(OperationDescription { params, example })
    }
}

/// Input fields of an operation with an example payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationDescription {
    pub params: Vec<ParamDescriptor>,
    pub example: Map<String, Value>,
}

#[async_trait]
impl ServiceAdapter for SoapAdapter {
    fn id(&self) -> &str {
        "soap"
    }

    fn supports(&self, service_type: &ServiceType) -> bool {
        matches!(service_type, ServiceType::Soap)
    }

    async fn invoke(&self, definition: &ServiceDefinition) -> Result<CallOutcome, CheckError> {
        let operation = definition.method.as_str();
        let interface = self
            .interface(&definition.endpoint, definition.auth.as_ref())
            .await?;

        if !interface.list_operations().iter().any(|op| op == operation) {
            return Err(CheckError::UnknownOperation(operation.to_string()));
        }

        let declared = interface.describe_operation(operation).unwrap_or_default();
        let params = bind_params(&declared, &definition.params);

        tracing::debug!(
            service_id = %definition.id,
            operation = %operation,
            params = params.len(),
            "Invoking SOAP operation"
        );

        let value = interface.call(operation, params).await.map_err(|e| {
            tracing::warn!(service_id = %definition.id, operation = %operation, error = %e, "SOAP call failed");
            CheckError::from(e)
        })?;

        Ok(CallOutcome::synthesized(value.into_body()))
    }
}
