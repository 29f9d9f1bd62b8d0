//! Observability infrastructure for the inference service
//!
//! Provides:
//! - Prometheus metrics (prediction latency and counts, validation failures,
//!   request errors, replayed stream rows, loaded models)
//! - Structured lifecycle events with tracing

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for inference latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    prediction_latency_seconds: HistogramVec,
    predictions_total: IntCounterVec,
    validation_failures_total: IntCounter,
    request_errors_total: IntCounterVec,
    stream_rows_total: IntCounter,
    models_loaded: IntGauge,
    scaler_loaded: IntGauge,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram_vec!(
                "quality_api_prediction_latency_seconds",
                "Time spent in model inference for one prediction",
                &["model"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "quality_api_predictions_total",
                "Predictions served, by model",
                &["model"]
            )
            .expect("Failed to register predictions_total"),

            validation_failures_total: register_int_counter!(
                "quality_api_validation_failures_total",
                "Feature vectors rejected before reaching a model"
            )
            .expect("Failed to register validation_failures_total"),

            request_errors_total: register_int_counter_vec!(
                "quality_api_request_errors_total",
                "Failed requests, by error reason",
                &["reason"]
            )
            .expect("Failed to register request_errors_total"),

            stream_rows_total: register_int_counter!(
                "quality_api_stream_rows_total",
                "Dataset rows replayed through the stream simulator"
            )
            .expect("Failed to register stream_rows_total"),

            models_loaded: register_int_gauge!(
                "quality_api_models_loaded",
                "Number of models in the registry"
            )
            .expect("Failed to register models_loaded"),

            scaler_loaded: register_int_gauge!(
                "quality_api_scaler_loaded",
                "1 when the shared scaler is loaded, otherwise 0"
            )
            .expect("Failed to register scaler_loaded"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    inner: &'static ServiceMetricsInner,
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            inner: GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new),
        }
    }

    /// Record one served prediction and its inference latency
    pub fn observe_prediction(&self, model: &str, duration_secs: f64) {
        self.inner
            .prediction_latency_seconds
            .with_label_values(&[model])
            .observe(duration_secs);
        self.inner.predictions_total.with_label_values(&[model]).inc();
    }

    pub fn inc_validation_failures(&self) {
        self.inner.validation_failures_total.inc();
    }

    pub fn inc_request_errors(&self, reason: &str) {
        self.inner.request_errors_total.with_label_values(&[reason]).inc();
    }

    pub fn add_stream_rows(&self, rows: u64) {
        self.inner.stream_rows_total.inc_by(rows);
    }

    pub fn set_registry_state(&self, models_loaded: usize, scaler_loaded: bool) {
        self.inner.models_loaded.set(models_loaded as i64);
        self.inner.scaler_loaded.set(i64::from(scaler_loaded));
    }

    pub fn predictions_served(&self, model: &str) -> u64 {
        self.inner.predictions_total.with_label_values(&[model]).get()
    }

    pub fn validation_failures(&self) -> u64 {
        self.inner.validation_failures_total.get()
    }
}

/// Structured logger for service lifecycle events
///
/// Every event carries a stable `event` field so log pipelines can filter on
/// it regardless of message wording.
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn log_startup(&self, version: &str, models: &[String], scaler_loaded: bool) {
        info!(
            event = "service_started",
            service = %self.service_name,
            version = %version,
            models = %models.join(","),
            scaler_loaded = scaler_loaded,
            "Inference service started"
        );
    }

    pub fn log_model_loaded(&self, model: &str, classes: usize, requires_scaling: bool) {
        info!(
            event = "model_loaded",
            service = %self.service_name,
            model = %model,
            classes = classes,
            requires_scaling = requires_scaling,
            "Model available for serving"
        );
    }

    pub fn log_model_missing(&self, model: &str) {
        info!(
            event = "model_missing",
            service = %self.service_name,
            model = %model,
            "Model artifact not present, skipping"
        );
    }

    /// A scaling model will receive raw features
    pub fn log_scaler_missing(&self, model: &str) {
        warn!(
            event = "scaler_missing",
            service = %self.service_name,
            model = %model,
            "No scaler loaded; model will receive unscaled features"
        );
    }

    pub fn log_prediction(
        &self,
        model: &str,
        prediction: &str,
        has_proba: bool,
        elapsed_us: u128,
    ) {
        info!(
            event = "prediction_served",
            service = %self.service_name,
            model = %model,
            prediction = %prediction,
            has_proba = has_proba,
            elapsed_us = elapsed_us,
            "Prediction served"
        );
    }

    pub fn log_stream(&self, requested: i64, rows: usize, models: usize) {
        info!(
            event = "stream_simulated",
            service = %self.service_name,
            requested = requested,
            rows = rows,
            models = models,
            "Sample stream replayed"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service_name,
            reason = %reason,
            "Inference service shutting down"
        );
    }
}
