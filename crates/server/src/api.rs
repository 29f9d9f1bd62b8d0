//! HTTP API: model listing, prediction, stream replay, evaluation metrics,
//! health checks and Prometheus exposition

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use server_lib::{
    health::{ComponentStatus, HealthRegistry},
    observability::{ServiceMetrics, StructuredLogger},
    FeatureVector, MetricsStore, PredictionResult, PredictionRouter, ServiceError, StreamItem,
    StreamSimulator, DEFAULT_MODEL, FEATURE_NAMES,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Shared application state
pub struct AppState {
    pub router: Arc<PredictionRouter>,
    pub simulator: Arc<StreamSimulator>,
    pub metrics_store: MetricsStore,
    pub health_registry: HealthRegistry,
    pub metrics: ServiceMetrics,
    pub logger: StructuredLogger,
    pub default_stream_rows: i64,
}

/// Error returned by handlers, rendered as a JSON body
#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    /// Body or query string the extractors could not decode
    BadRequest { status: StatusCode, message: String },
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Service(ServiceError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Service(ServiceError::MetricsUnavailable(_)) => StatusCode::NOT_FOUND,
            ApiError::Service(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            ApiError::Service(err) => err.reason(),
            ApiError::BadRequest { .. } => "invalid_request",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

/// `Json` extractor whose rejections render as [`ApiError`]
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor whose rejections render as [`ApiError`]
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = self.reason();
        ServiceMetrics::new().inc_request_errors(reason);

        let mut body = json!({
            "error": match &self {
                ApiError::Service(err) => err.to_string(),
                ApiError::BadRequest { message, .. } => message.clone(),
                ApiError::Internal(_) => "Internal server error".to_string(),
            },
            "reason": reason,
            "status": status.as_u16(),
        });

        match &self {
            ApiError::Service(ServiceError::Validation(validation)) => {
                body["details"] = json!(validation.issues);
            }
            ApiError::Internal(msg) => error!("Internal error: {}", msg),
            ApiError::Service(err) if status.is_server_error() => {
                error!(reason = reason, "Request failed: {}", err)
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    pub features: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// Validated after parsing so every offending attribute is reported
    #[serde(default)]
    pub features: Map<String, Value>,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub n: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StreamResponse {
    pub items: Vec<StreamItem>,
}

async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.router.registry().list_models(),
        features: FEATURE_NAMES.iter().map(|f| f.to_string()).collect(),
    })
}

async fn predict(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<PredictRequest>,
) -> Result<Json<PredictionResult>, ApiError> {
    let features = FeatureVector::from_raw(&request.features).map_err(|e| {
        state.metrics.inc_validation_failures();
        ServiceError::from(e)
    })?;

    let start = Instant::now();
    let result = state.router.predict(&request.model, &features)?;
    let elapsed = start.elapsed();

    state
        .metrics
        .observe_prediction(&result.model, elapsed.as_secs_f64());
    state.logger.log_prediction(
        &result.model,
        &result.prediction,
        result.proba.is_some(),
        elapsed.as_micros(),
    );
    Ok(Json(result))
}

async fn sample_stream(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<StreamQuery>,
) -> Result<Json<StreamResponse>, ApiError> {
    let n = query.n.unwrap_or(state.default_stream_rows);
    let simulator = Arc::clone(&state.simulator);

    let items = tokio::task::spawn_blocking(move || simulator.simulate(n))
        .await
        .map_err(|e| ApiError::Internal(format!("stream simulation task failed: {}", e)))??;

    state.metrics.add_stream_rows(items.len() as u64);
    state
        .logger
        .log_stream(n, items.len(), state.router.registry().len());
    Ok(Json(StreamResponse { items }))
}

async fn model_metrics(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.metrics_store.load()?))
}

/// Health check response - 200 while operational, 503 when unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn prometheus_metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::Internal(format!("metrics encoding failed: {}", e)))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/models", get(list_models))
        .route("/predict", post(predict))
        .route("/sample-stream", get(sample_stream))
        .route("/metrics", get(model_metrics))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/internal/metrics", get(prometheus_metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(addr: String, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
