//! Component health and readiness for the inference service
//!
//! The model registry itself is immutable; what can change is how well the
//! service's collaborators (scaler, metrics side file, reference dataset)
//! are covered, which this registry reports to `/healthz` and `/readyz`.

use crate::error::ServiceError;
use crate::metrics_store::MetricsStore;
use crate::registry::ModelRegistry;
use crate::stream::Dataset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Serving, with reduced fidelity or a missing optional input
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        matches!(self, ComponentStatus::Healthy | ComponentStatus::Degraded)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn with_status(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::with_status(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Unhealthy, Some(message.into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: BTreeMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status across components; no components counts as healthy
    pub fn compute_status(components: &BTreeMap<String, ComponentHealth>) -> ComponentStatus {
        components
            .values()
            .map(|health| health.status)
            .fold(ComponentStatus::Healthy, |worst, status| match (worst, status) {
                (ComponentStatus::Unhealthy, _) | (_, ComponentStatus::Unhealthy) => {
                    ComponentStatus::Unhealthy
                }
                (ComponentStatus::Degraded, _) | (_, ComponentStatus::Degraded) => {
                    ComponentStatus::Degraded
                }
                _ => ComponentStatus::Healthy,
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names for health tracking
pub mod components {
    pub const REGISTRY: &str = "registry";
    pub const METRICS_STORE: &str = "metrics_store";
    pub const DATASET: &str = "dataset";
}

/// Registry health: degraded when a scaling model is served unscaled
pub fn assess_registry(registry: &ModelRegistry) -> ComponentHealth {
    let unscaled = registry.scaling_models_without_scaler();
    if unscaled.is_empty() {
        return ComponentHealth::healthy();
    }
    let names: Vec<&str> = unscaled.iter().map(|name| name.as_str()).collect();
    ComponentHealth::degraded(format!(
        "no scaler loaded; {} receive unscaled features",
        names.join(", ")
    ))
}

/// Missing or unparsable metrics only affect `/metrics`, never predictions
pub fn assess_metrics_store(store: &MetricsStore) -> ComponentHealth {
    match store.records() {
        Ok(_) => ComponentHealth::healthy(),
        Err(ServiceError::MetricsUnavailable(path)) => {
            ComponentHealth::degraded(format!("metrics file {} not found", path.display()))
        }
        Err(e) => ComponentHealth::degraded(e.to_string()),
    }
}

pub fn assess_dataset(dataset: &Dataset) -> ComponentHealth {
    if dataset.exists() {
        ComponentHealth::healthy()
    } else {
        ComponentHealth::degraded(format!("dataset {} not found", dataset.path().display()))
    }
}

/// Shared, updatable health state
#[derive(Debug, Clone)]
pub struct HealthRegistry {
    components: Arc<RwLock<BTreeMap<String, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self {
            components: Arc::new(RwLock::new(BTreeMap::new())),
            ready: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn update(&self, name: &str, health: ComponentHealth) {
        let mut components = self.components.write().await;
        components.insert(name.to_string(), health);
    }

    pub async fn set_healthy(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::degraded(message)).await;
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::unhealthy(message)).await;
    }

    /// Record the state of every component after startup loading
    pub async fn record_startup(
        &self,
        registry: &ModelRegistry,
        metrics: &MetricsStore,
        dataset: &Dataset,
    ) {
        self.update(components::REGISTRY, assess_registry(registry)).await;
        self.update(components::METRICS_STORE, assess_metrics_store(metrics))
            .await;
        self.update(components::DATASET, assess_dataset(dataset)).await;
    }

    pub async fn set_ready(&self, ready: bool) {
        let mut r = self.ready.write().await;
        *r = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse { status, components }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        if !*self.ready.read().await {
            return ReadinessResponse {
                ready: false,
                reason: Some("Model registry not yet loaded".to_string()),
            };
        }

        let components = self.components.read().await;
        let registry_ok = components
            .get(components::REGISTRY)
            .map_or(true, |health| health.status.is_operational());
        if registry_ok {
            ReadinessResponse {
                ready: true,
                reason: None,
            }
        } else {
            ReadinessResponse {
                ready: false,
                reason: Some("Model registry unhealthy".to_string()),
            }
        }
    }
}
