//! Shared standardization stage
//!
//! Fit once by the training pipeline on the reference dataset and applied to
//! inputs of models trained on standardized features.

use crate::models::NUM_FEATURES;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Serialized form of the scaler (`scaler.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerData {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Per-feature `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    pub fn from_data(data: ScalerData) -> Result<Self, String> {
        if data.mean.len() != NUM_FEATURES || data.scale.len() != NUM_FEATURES {
            return Err(format!(
                "scaler has {} means and {} scales, expected {}",
                data.mean.len(),
                data.scale.len(),
                NUM_FEATURES
            ));
        }
        if data.mean.iter().chain(&data.scale).any(|v| !v.is_finite()) {
            return Err("scaler contains non-finite values".to_string());
        }

        // Constant features were fit with zero variance; leave them centred only
        let scale = data
            .scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();

        Ok(Self {
            mean: Array1::from_vec(data.mean),
            scale: Array1::from_vec(scale),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        let data: ScalerData =
            serde_json::from_str(json).map_err(|e| format!("JSON parse failed: {}", e))?;
        Self::from_data(data)
    }

    pub fn transform(&self, x: ArrayView1<f64>) -> Array1<f64> {
        (&x - &self.mean) / &self.scale
    }

    pub fn mean(&self) -> ArrayView1<f64> {
        self.mean.view()
    }

    pub fn scale(&self) -> ArrayView1<f64> {
        self.scale.view()
    }
}
