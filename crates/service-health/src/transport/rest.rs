//! REST adapter
//!
//! Issues one HTTP request per check and captures status, headers and body.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::{ClientProvider, DefaultClientProvider, ServiceAdapter};
use crate::contracts::{CallOutcome, ServiceDefinition, ServiceType};
use crate::error::CheckError;

/// Fixed per-request timeout for REST checks
pub const REST_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP/JSON service adapter
pub struct RestAdapter {
    provider: Arc<dyn ClientProvider>,
    timeout: Duration,
}

impl RestAdapter {
    pub fn new(provider: Arc<dyn ClientProvider>) -> Self {
        Self {
            provider,
            timeout: REST_REQUEST_TIMEOUT,
        }
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn method(definition: &ServiceDefinition) -> Result<Method, CheckError> {
        let verb = definition.method.trim();
        if verb.is_empty() {
            return Ok(Method::GET);
        }
        Method::from_bytes(verb.to_ascii_uppercase().as_bytes()).map_err(|_| {
            CheckError::invalid_definition(format!("invalid HTTP method '{}'", definition.method))
        })
    }

    /// Body for non-GET requests: explicit body, else the params mapping
    fn payload(definition: &ServiceDefinition, method: &Method) -> Option<Value> {
        if let Some(body) = &definition.body {
            return Some(body.clone());
        }
        if *method != Method::GET && !definition.params.is_empty() {
            return Some(Value::Object(definition.params.clone()));
        }
        None
    }
}

impl Default for RestAdapter {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClientProvider::new()))
    }
}

#[async_trait]
impl ServiceAdapter for RestAdapter {
    fn id(&self) -> &str {
        "rest"
    }

    fn supports(&self, service_type: &ServiceType) -> bool {
        matches!(service_type, ServiceType::Rest)
    }

    async fn invoke(&self, definition: &ServiceDefinition) -> Result<CallOutcome, CheckError> {
        let client = self.provider.build(definition.auth.as_ref())?;
        let method = Self::method(definition)?;
        let url = definition.request_url();

        let mut request = client.request(method.clone(), &url).timeout(self.timeout);

        if method == Method::GET && !definition.params.is_empty() {
            request = request.query(&query_pairs(definition));
        }

        for (name, value) in &definition.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        if let Some(payload) = Self::payload(definition, &method) {
            let has_content_type = definition
                .headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
            if !has_content_type {
                request = request.header(CONTENT_TYPE, "application/json");
            }

            request = match payload {
                Value::String(raw) => request.body(raw),
                other => request.body(
                    serde_json::to_vec(&other)
                        .map_err(|e| CheckError::invalid_definition(e.to_string()))?,
                ),
            };
        }

        tracing::debug!(service_id = %definition.id, method = %method, url = %url, "Sending REST request");

        let response = request.send().await.map_err(|e| {
            tracing::warn!(service_id = %definition.id, url = %url, error = %e, "REST request failed");
            CheckError::from(e)
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect::<BTreeMap<_, _>>();

        let text = response.text().await.map_err(CheckError::from)?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        tracing::debug!(service_id = %definition.id, status, "REST response received");

        Ok(CallOutcome::http(status, headers, body))
    }
}

/// Flatten params into query pairs; non-string values use their JSON text
fn query_pairs(definition: &ServiceDefinition) -> Vec<(String, String)> {
    definition
        .params
        .iter()
        .map(|(name, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.clone(), text)
        })
        .collect()
}
