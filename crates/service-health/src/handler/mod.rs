//! HTTP handler for Service Health
//!
//! Thin JSON surface over the store and the dispatcher.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::contracts::*;
use crate::engine::Dispatcher;
use crate::error::{CheckError, StoreError};
use crate::transport::{OperationDescription, SoapAdapter};

/// Application state
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// Present when a SOAP interface loader is configured
    pub soap: Option<Arc<SoapAdapter>>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            soap: None,
        }
    }

    pub fn with_soap(mut self, soap: Arc<SoapAdapter>) -> Self {
        self.soap = Some(soap);
        self
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/services", get(list_services))
        .route(
            "/api/v1/services/:id",
            get(get_service).put(put_service).delete(delete_service),
        )
        .route("/api/v1/services/:id/check", post(check_service))
        .route("/api/v1/check", post(check_all))
        .route("/api/v1/check/adhoc", post(check_adhoc))
        .route("/api/v1/soap/operations", post(soap_operations))
        .route("/api/v1/soap/describe", post(soap_describe))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn list_services(State(state): State<Arc<AppState>>) -> ApiResult<BTreeMap<String, ServiceDefinition>> {
    let services = state.dispatcher.store().list().await.map_err(store_error)?;
    Ok(Json(services))
}

async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ServiceRecord> {
    state
        .dispatcher
        .store()
        .record(&id)
        .await
        .map_err(store_error)?
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

/// Upsert; the path id wins over any id in the body
async fn put_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut definition): Json<ServiceDefinition>,
) -> ApiResult<ServiceDefinition> {
    definition.id = id;
    let stored = state
        .dispatcher
        .store()
        .upsert(definition)
        .await
        .map_err(store_error)?;
    Ok(Json(stored))
}

async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    if state
        .dispatcher
        .store()
        .delete(&id)
        .await
        .map_err(store_error)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&id))
    }
}

async fn check_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<CheckResult> {
    state
        .dispatcher
        .run_stored(&id)
        .await
        .map_err(store_error)?
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

async fn check_all(State(state): State<Arc<AppState>>) -> ApiResult<BatchReport> {
    let report = state
        .dispatcher
        .run_all_stored()
        .await
        .map_err(store_error)?;
    Ok(Json(report))
}

/// Run a check for a definition that is not stored
async fn check_adhoc(
    State(state): State<Arc<AppState>>,
    Json(definition): Json<ServiceDefinition>,
) -> Json<CheckResult> {
    Json(state.dispatcher.run_one(&definition).await)
}

async fn soap_operations(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InterfaceRequest>,
) -> ApiResult<OperationsResponse> {
    let soap = soap_adapter(&state)?;
    let operations = soap
        .operations(&request.endpoint, request.auth.as_ref())
        .await
        .map_err(check_error)?;
    Ok(Json(OperationsResponse { operations }))
}

async fn soap_describe(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DescribeRequest>,
) -> ApiResult<OperationDescription> {
    let soap = soap_adapter(&state)?;
    let description = soap
        .operation_description(&request.endpoint, request.auth.as_ref(), &request.method)
        .await
        .map_err(check_error)?;
    Ok(Json(description))
}

fn soap_adapter(state: &AppState) -> Result<Arc<SoapAdapter>, (StatusCode, Json<ApiError>)> {
    state.soap.clone().ok_or_else(|| {
        api_error(
            StatusCode::NOT_IMPLEMENTED,
            "SoapUnavailable",
            "No SOAP interface loader is configured",
        )
    })
}

fn api_error(
    status: StatusCode,
    error: &str,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: error.to_string(),
            message: message.into(),
        }),
    )
}

fn not_found(id: &str) -> (StatusCode, Json<ApiError>) {
    api_error(
        StatusCode::NOT_FOUND,
        "NotFound",
        format!("Service '{}' not found", id),
    )
}

fn store_error(err: StoreError) -> (StatusCode, Json<ApiError>) {
    match err {
        StoreError::InvalidDefinition(msg) => api_error(StatusCode::BAD_REQUEST, "InvalidInput", msg),
        other => {
            tracing::error!(error = %other, "Store operation failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "StoreError", other.to_string())
        }
    }
}

fn check_error(err: CheckError) -> (StatusCode, Json<ApiError>) {
    let status = match err {
        CheckError::UnknownOperation(_) => StatusCode::NOT_FOUND,
        CheckError::InvalidDefinition(_) => StatusCode::BAD_REQUEST,
        CheckError::AdapterUnavailable(_) => StatusCode::NOT_IMPLEMENTED,
        _ => StatusCode::BAD_GATEWAY,
    };
    api_error(status, "InterfaceError", err.to_string())
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Interface lookup request
#[derive(Debug, Deserialize)]
pub struct InterfaceRequest {
    pub endpoint: String,
    #[serde(default)]
    pub auth: Option<Credentials>,
}

/// Operation description request
#[derive(Debug, Deserialize)]
pub struct DescribeRequest {
    pub endpoint: String,
    pub method: String,
    #[serde(default)]
    pub auth: Option<Credentials>,
}

#[derive(Debug, Serialize)]
pub struct OperationsResponse {
    pub operations: Vec<String>,
}

/// API error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::transport::{InterfaceLoader, ParamDescriptor, RemoteCallError, RemoteInterface, RemoteValue};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    struct Echo;

    #[async_trait]
    impl RemoteInterface for Echo {
        fn list_operations(&self) -> Vec<String> {
            vec!["Echo".to_string()]
        }

        fn describe_operation(&self, operation: &str) -> Option<Vec<ParamDescriptor>> {
            (operation == "Echo").then(|| vec![ParamDescriptor::new("Text", "xs:string", true)])
        }

        async fn call(
            &self,
            _operation: &str,
            _params: Vec<(String, Value)>,
        ) -> Result<RemoteValue, RemoteCallError> {
            Ok(RemoteValue::Nil)
        }
    }

    /// Loader that counts interface loads
    #[derive(Default)]
    struct CountingLoader {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl InterfaceLoader for CountingLoader {
        async fn load(
            &self,
            _endpoint: &str,
            _client: reqwest::Client,
        ) -> Result<Arc<dyn RemoteInterface>, CheckError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Echo) as Arc<dyn RemoteInterface>)
        }
    }

    fn router() -> Router {
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(MemoryStore::new())));
        create_router(Arc::new(AppState::new(dispatcher)))
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_service_lifecycle() {
        let router = router();
        let definition = json!({
            "id": "ignored",
            "name": "Orders API",
            "type": "rest",
            "endpoint": "http://127.0.0.1:9",
            "validation_rules": [{"type": "status_code", "value": 200}]
        });

        let (status, stored) = send(&router, "PUT", "/api/v1/services/orders", Some(definition)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["id"], "orders");
        assert!(stored["created_at"].is_string());

        let (status, record) = send(&router, "GET", "/api/v1/services/orders", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["name"], "Orders API");
        assert!(record["last_result"].is_null());

        let (status, _) = send(&router, "DELETE", "/api/v1/services/orders", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&router, "GET", "/api/v1/services/orders", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NotFound");
    }

    #[tokio::test]
    async fn test_adhoc_check_reports_missing_adapter() {
        let router = router();
        let (status, result) = send(
            &router,
            "POST",
            "/api/v1/check/adhoc",
            Some(json!({"id": "x", "type": "rest", "endpoint": "http://127.0.0.1:9"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["success"], false);
        assert_eq!(result["error"], "no adapter available for service type: rest");
    }

    #[tokio::test]
    async fn test_soap_routes_without_loader() {
        let router = router();
        let (status, body) = send(
            &router,
            "POST",
            "/api/v1/soap/operations",
            Some(json!({"endpoint": "http://x?wsdl"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body["error"], "SoapUnavailable");
    }

    #[tokio::test]
    async fn test_soap_describe_loads_interface_once() {
        let loader = Arc::new(CountingLoader::default());
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(MemoryStore::new())));
        let soap = Arc::new(SoapAdapter::new(loader.clone()));
        let router = create_router(Arc::new(AppState::new(dispatcher).with_soap(soap)));

        let (status, body) = send(
            &router,
            "POST",
            "/api/v1/soap/describe",
            Some(json!({"endpoint": "http://echo.local/?wsdl", "method": "Echo"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["params"][0]["name"], "Text");
        assert_eq!(body["example"], json!({"Text": "string"}));
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);

        let (status, body) = send(
            &router,
            "POST",
            "/api/v1/soap/describe",
            Some(json!({"endpoint": "http://echo.local/?wsdl", "method": "Nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "InterfaceError");
    }
}
