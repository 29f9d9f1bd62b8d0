//! Multi-layer perceptron classifier
//!
//! Dense feed-forward network. Hidden layers share one activation; the
//! output layer is a softmax over the classes, or a single logistic unit
//! when there are exactly two classes.

use super::{argmax, check_classes, normalize, softmax, to_matrix, Classify};
use crate::models::NUM_FEATURES;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    Tanh,
    Logistic,
    Identity,
}

impl Activation {
    fn apply(&self, z: &mut Array1<f64>) {
        match self {
            Activation::Relu => z.mapv_inplace(|v| v.max(0.0)),
            Activation::Tanh => z.mapv_inplace(f64::tanh),
            Activation::Logistic => z.mapv_inplace(logistic),
            Activation::Identity => {}
        }
    }
}

/// One dense layer; `weights` has one row per input unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerData {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpModelData {
    pub classes: Vec<String>,
    pub activation: Activation,
    pub layers: Vec<LayerData>,
}

#[derive(Debug, Clone)]
struct Layer {
    weights: Array2<f64>,
    biases: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct MlpClassifier {
    classes: Vec<String>,
    activation: Activation,
    layers: Vec<Layer>,
}

impl MlpClassifier {
    pub fn from_data(data: MlpModelData) -> Result<Self, String> {
        check_classes(&data.classes)?;
        if data.layers.is_empty() {
            return Err("MLP has no layers".to_string());
        }

        let mut layers = Vec::with_capacity(data.layers.len());
        let mut n_in = NUM_FEATURES;
        for (i, layer) in data.layers.into_iter().enumerate() {
            if layer.weights.len() != n_in {
                return Err(format!(
                    "layer {} has {} weight rows, expected {}",
                    i,
                    layer.weights.len(),
                    n_in
                ));
            }
            let n_out = layer.biases.len();
            if n_out == 0 {
                return Err(format!("layer {} has no units", i));
            }
            let weights = to_matrix(layer.weights, n_out, &format!("layer {} weights", i))?;
            let biases = Array1::from_vec(layer.biases);
            if biases.iter().any(|b| !b.is_finite()) {
                return Err(format!("layer {} has non-finite biases", i));
            }
            layers.push(Layer { weights, biases });
            n_in = n_out;
        }

        let n_classes = data.classes.len();
        let binary_output = n_in == 1 && n_classes == 2;
        if n_in != n_classes && !binary_output {
            return Err(format!(
                "output layer has {} units for {} classes",
                n_in, n_classes
            ));
        }

        Ok(Self {
            classes: data.classes,
            activation: data.activation,
            layers,
        })
    }

    /// Forward pass to class probabilities
    fn forward(&self, x: ArrayView1<f64>) -> Array1<f64> {
        let mut a = x.to_owned();
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            let mut z = a.dot(&layer.weights) + &layer.biases;
            if i < last {
                self.activation.apply(&mut z);
            }
            a = z;
        }

        if a.len() == 1 {
            let p = logistic(a[0]);
            normalize(Array1::from_vec(vec![1.0 - p, p]))
        } else {
            softmax(a.view())
        }
    }
}

fn logistic(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

impl Classify for MlpClassifier {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_index(&self, x: ArrayView1<f64>) -> usize {
        argmax(self.forward(x).view())
    }

    fn predict_proba(&self, x: ArrayView1<f64>) -> Option<Array1<f64>> {
        Some(self.forward(x))
    }
}
