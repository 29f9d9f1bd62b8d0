//! Core library for the polymer quality inference service
//!
//! This crate provides:
//! - Feature vector validation
//! - Inference-only classifiers and the shared scaler
//! - The model registry and prediction routing
//! - Read-only metrics and dataset replay
//! - Health checks and observability

pub mod classifiers;
pub mod error;
pub mod health;
pub mod metrics_store;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod registry;
pub mod stream;

pub use error::{FieldIssue, IssueKind, Result, ServiceError, ValidationError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use metrics_store::MetricsStore;
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use predictor::{needs_scaling, PredictionRouter, StandardScaler};
pub use registry::{ModelEntry, ModelRegistry};
pub use stream::{Dataset, StreamSimulator};
