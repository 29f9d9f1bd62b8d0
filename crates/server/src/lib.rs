//! HTTP boundary of the polymer quality inference service

pub mod api;
pub mod config;

use anyhow::{Context, Result};
use server_lib::{
    health::HealthRegistry,
    observability::{ServiceMetrics, StructuredLogger},
    Dataset, MetricsStore, ModelName, ModelRegistry, PredictionRouter, StreamSimulator,
};
use std::sync::Arc;

/// Load the model store and assemble the shared state
///
/// Fails when the store yields no models or holds an invalid artifact; the
/// service must not start in that case.
pub async fn initialize(
    config: &config::ServiceConfig,
    logger: &StructuredLogger,
) -> Result<Arc<api::AppState>> {
    let registry = ModelRegistry::load(&config.model_dir)
        .with_context(|| format!("Failed to load models from {}", config.model_dir.display()))?;

    for name in ModelName::ALL {
        match registry.get(name.as_str()) {
            Ok(entry) => logger.log_model_loaded(
                name.as_str(),
                entry.classes().len(),
                entry.requires_scaling(),
            ),
            Err(_) => logger.log_model_missing(name.as_str()),
        }
    }
    for name in registry.scaling_models_without_scaler() {
        logger.log_scaler_missing(name.as_str());
    }

    let metrics = ServiceMetrics::new();
    metrics.set_registry_state(registry.len(), registry.has_scaler());

    let metrics_store = MetricsStore::new(&config.metrics_file);
    let dataset = Dataset::new(&config.dataset_path);

    let health_registry = HealthRegistry::new();
    health_registry
        .record_startup(&registry, &metrics_store, &dataset)
        .await;

    let router = Arc::new(PredictionRouter::new(Arc::new(registry)));
    let simulator = Arc::new(StreamSimulator::new(Arc::clone(&router), dataset));

    Ok(Arc::new(api::AppState {
        router,
        simulator,
        metrics_store,
        health_registry,
        metrics,
        logger: logger.clone(),
        default_stream_rows: config.default_stream_rows,
    }))
}
