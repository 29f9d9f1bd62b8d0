//! Prediction routing with conditional scaling

use crate::classifiers::Classify;
use crate::error::Result;
use crate::models::{FeatureVector, PredictionResult};
use crate::registry::{ModelEntry, ModelRegistry};
use ndarray::Array1;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Inference latency above which a prediction is logged as slow
const MAX_INFERENCE_MS: u128 = 5;

/// Whether a model's input goes through the scaler
///
/// Depends only on the model's flag and on the scaler being loaded, never on
/// the request.
pub fn needs_scaling(requires_scaling: bool, scaler_present: bool) -> bool {
    requires_scaling && scaler_present
}

/// Routes validated feature vectors to registry models
pub struct PredictionRouter {
    registry: Arc<ModelRegistry>,
    prediction_count: AtomicU64,
    slow_prediction_count: AtomicU64,
}

impl PredictionRouter {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            prediction_count: AtomicU64::new(0),
            slow_prediction_count: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Label and, when supported, class probabilities from the named model
    pub fn predict(&self, model: &str, features: &FeatureVector) -> Result<PredictionResult> {
        let entry = self.registry.get(model)?;
        let start = Instant::now();

        let input = self.prepare_input(entry, features);
        let classifier = entry.classifier();
        let prediction = classifier.predict_label(input.view()).to_string();
        let proba = classifier.predict_proba(input.view()).map(|p| {
            classifier
                .classes()
                .iter()
                .cloned()
                .zip(p.iter().copied())
                .collect::<BTreeMap<_, _>>()
        });

        let elapsed = start.elapsed();
        self.prediction_count.fetch_add(1, Ordering::Relaxed);
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            self.slow_prediction_count.fetch_add(1, Ordering::Relaxed);
            warn!(
                model = %entry.name(),
                elapsed_ms = elapsed.as_millis(),
                "Inference exceeded {}ms target",
                MAX_INFERENCE_MS
            );
        } else {
            debug!(model = %entry.name(), elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(PredictionResult {
            model: entry.name().to_string(),
            prediction,
            proba,
        })
    }

    /// The numeric row actually fed to `entry`'s classifier
    pub fn prepare_input(&self, entry: &ModelEntry, features: &FeatureVector) -> Array1<f64> {
        let raw = features.to_array();
        if !needs_scaling(entry.requires_scaling(), self.registry.has_scaler()) {
            return raw;
        }
        match self.registry.scaler() {
            Some(scaler) => scaler.transform(raw.view()),
            None => raw,
        }
    }

    /// Label-only inference, used when replaying the dataset
    pub fn label(&self, entry: &ModelEntry, features: &FeatureVector) -> String {
        let input = self.prepare_input(entry, features);
        entry.classifier().predict_label(input.view()).to_string()
    }

    pub fn stats(&self) -> RouterStats {
        RouterStats {
            total_predictions: self.prediction_count.load(Ordering::Relaxed),
            slow_predictions: self.slow_prediction_count.load(Ordering::Relaxed),
        }
    }
}

/// Prediction counters since startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterStats {
    pub total_predictions: u64,
    pub slow_predictions: u64,
}
