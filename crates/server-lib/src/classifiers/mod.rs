//! Inference-only classifier family
//!
//! Training happens outside this service; each model is loaded from a JSON
//! artifact written by the training pipeline. The artifact is tagged by
//! `"algorithm"` and deserializes into a [`ModelArtifact`], which is then
//! checked for shape consistency and turned into a runtime [`Classifier`].
//!
//! Algorithms:
//! - k-nearest neighbours: uniform majority vote, vote fractions as probabilities
//! - decision tree: threshold splits, normalized leaf weights as probabilities
//! - Gaussian naive Bayes: joint log-likelihood, softmax probabilities
//! - SVM: one-vs-one voting, Platt-scaled pairwise coupling for probabilities
//! - MLP: feed-forward network with softmax (or logistic) output

mod knn;
mod mlp;
mod naive_bayes;
mod svm;
mod tree;

pub use knn::{KnnClassifier, KnnModelData};
pub use mlp::{Activation, LayerData, MlpClassifier, MlpModelData};
pub use naive_bayes::{NaiveBayesClassifier, NaiveBayesModelData};
pub use svm::{Kernel, PairwiseMachineData, PlattParams, SvmClassifier, SvmModelData};
pub use tree::{TreeClassifier, TreeModelData, TreeNode};

use crate::models::ModelName;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Uniform inference capability shared by every classifier
pub trait Classify: Send + Sync {
    /// Known class labels, in the order probabilities are reported
    fn classes(&self) -> &[String];

    /// Index into [`Classify::classes`] of the predicted label
    fn predict_index(&self, x: ArrayView1<f64>) -> usize;

    /// Class probabilities aligned with [`Classify::classes`], if supported
    fn predict_proba(&self, x: ArrayView1<f64>) -> Option<Array1<f64>>;

    fn predict_label(&self, x: ArrayView1<f64>) -> &str {
        &self.classes()[self.predict_index(x)]
    }
}

/// Serialized form of a trained model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum ModelArtifact {
    Knn(KnnModelData),
    Tree(TreeModelData),
    NaiveBayes(NaiveBayesModelData),
    Svm(SvmModelData),
    Mlp(MlpModelData),
}

impl ModelArtifact {
    pub fn name(&self) -> ModelName {
        match self {
            ModelArtifact::Knn(_) => ModelName::Knn,
            ModelArtifact::Tree(_) => ModelName::Tree,
            ModelArtifact::NaiveBayes(_) => ModelName::NaiveBayes,
            ModelArtifact::Svm(_) => ModelName::Svm,
            ModelArtifact::Mlp(_) => ModelName::Mlp,
        }
    }
}

/// A loaded classifier, one variant per supported algorithm
#[derive(Debug, Clone)]
pub enum Classifier {
    Knn(KnnClassifier),
    Tree(TreeClassifier),
    NaiveBayes(NaiveBayesClassifier),
    Svm(SvmClassifier),
    Mlp(MlpClassifier),
}

impl Classifier {
    /// Check an artifact's shapes and build the runtime model
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, String> {
        Ok(match artifact {
            ModelArtifact::Knn(data) => Classifier::Knn(KnnClassifier::from_data(data)?),
            ModelArtifact::Tree(data) => Classifier::Tree(TreeClassifier::from_data(data)?),
            ModelArtifact::NaiveBayes(data) => {
                Classifier::NaiveBayes(NaiveBayesClassifier::from_data(data)?)
            }
            ModelArtifact::Svm(data) => Classifier::Svm(SvmClassifier::from_data(data)?),
            ModelArtifact::Mlp(data) => Classifier::Mlp(MlpClassifier::from_data(data)?),
        })
    }

    /// Load model from JSON
    pub fn from_json(json: &str) -> Result<Self, String> {
        let artifact: ModelArtifact =
            serde_json::from_str(json).map_err(|e| format!("JSON parse failed: {}", e))?;
        Self::from_artifact(artifact)
    }

    pub fn algorithm(&self) -> ModelName {
        match self {
            Classifier::Knn(_) => ModelName::Knn,
            Classifier::Tree(_) => ModelName::Tree,
            Classifier::NaiveBayes(_) => ModelName::NaiveBayes,
            Classifier::Svm(_) => ModelName::Svm,
            Classifier::Mlp(_) => ModelName::Mlp,
        }
    }

    fn inner(&self) -> &dyn Classify {
        match self {
            Classifier::Knn(c) => c,
            Classifier::Tree(c) => c,
            Classifier::NaiveBayes(c) => c,
            Classifier::Svm(c) => c,
            Classifier::Mlp(c) => c,
        }
    }
}

impl Classify for Classifier {
    fn classes(&self) -> &[String] {
        self.inner().classes()
    }

    fn predict_index(&self, x: ArrayView1<f64>) -> usize {
        self.inner().predict_index(x)
    }

    fn predict_proba(&self, x: ArrayView1<f64>) -> Option<Array1<f64>> {
        self.inner().predict_proba(x)
    }
}

/// Classes must be non-empty and unique
pub(crate) fn check_classes(classes: &[String]) -> Result<(), String> {
    if classes.is_empty() {
        return Err("artifact declares no classes".to_string());
    }
    let mut seen = HashSet::new();
    for class in classes {
        if !seen.insert(class.as_str()) {
            return Err(format!("duplicate class label '{}'", class));
        }
    }
    Ok(())
}

pub(crate) fn class_index(classes: &[String], label: &str) -> Result<usize, String> {
    classes
        .iter()
        .position(|c| c == label)
        .ok_or_else(|| format!("label '{}' is not a declared class", label))
}

/// Restore a dense matrix, requiring `cols` columns and finite values
pub(crate) fn to_matrix(rows: Vec<Vec<f64>>, cols: usize, what: &str) -> Result<Array2<f64>, String> {
    let n = rows.len();
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
        return Err(format!(
            "{} row {} has {} values, expected {}",
            what,
            i,
            row.len(),
            cols
        ));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    if flat.iter().any(|v| !v.is_finite()) {
        return Err(format!("{} contains non-finite values", what));
    }
    Array2::from_shape_vec((n, cols), flat)
        .map_err(|e| format!("Failed to restore {}: {}", what, e))
}

/// Index of the first maximum
pub(crate) fn argmax(values: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Rescale non-negative weights so they sum to one
pub(crate) fn normalize(mut weights: Array1<f64>) -> Array1<f64> {
    weights.mapv_inplace(|w| w.max(0.0));
    let total = weights.sum();
    if total > 0.0 {
        weights /= total;
    } else {
        let n = weights.len() as f64;
        weights.fill(1.0 / n);
    }
    weights
}

/// Numerically stable softmax
pub(crate) fn softmax(scores: ArrayView1<f64>) -> Array1<f64> {
    let max = scores.fold(f64::NEG_INFINITY, |m, &s| m.max(s));
    normalize(scores.mapv(|s| (s - max).exp()))
}
