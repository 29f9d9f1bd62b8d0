//! Core data models for the classifier service

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Feature attribute names, in the order fed to inference
pub const FEATURE_NAMES: [&str; 4] = [
    "drcPercentage",
    "moistureContent",
    "impurities",
    "colorScore",
];

/// Number of input features expected by every model
pub const NUM_FEATURES: usize = FEATURE_NAMES.len();

/// Model used by `/predict` when the request names none
pub const DEFAULT_MODEL: &str = "knn";

/// Validated feature vector for one latex sample
///
/// Only constructible through validation (see `predictor::features`), so every
/// instance is fully populated and within [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "Map<String, Value>")]
pub struct FeatureVector {
    pub(crate) drc_percentage: f64,
    pub(crate) moisture_content: f64,
    pub(crate) impurities: f64,
    pub(crate) color_score: f64,
}

impl FeatureVector {
    pub fn drc_percentage(&self) -> f64 {
        self.drc_percentage
    }

    pub fn moisture_content(&self) -> f64 {
        self.moisture_content
    }

    pub fn impurities(&self) -> f64 {
        self.impurities
    }

    pub fn color_score(&self) -> f64 {
        self.color_score
    }

    /// Values in `FEATURE_NAMES` order
    pub fn values(&self) -> [f64; NUM_FEATURES] {
        [
            self.drc_percentage,
            self.moisture_content,
            self.impurities,
            self.color_score,
        ]
    }
}

/// The fixed set of servable classifiers, ordered by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelName {
    Knn,
    Tree,
    NaiveBayes,
    Svm,
    Mlp,
}

impl ModelName {
    pub const ALL: [ModelName; 5] = [
        ModelName::Knn,
        ModelName::Tree,
        ModelName::NaiveBayes,
        ModelName::Svm,
        ModelName::Mlp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelName::Knn => "knn",
            ModelName::Tree => "tree",
            ModelName::NaiveBayes => "naive_bayes",
            ModelName::Svm => "svm",
            ModelName::Mlp => "mlp",
        }
    }

    /// Whether the model was fit on standardized features
    pub fn requires_scaling(&self) -> bool {
        matches!(self, ModelName::Knn | ModelName::Svm | ModelName::Mlp)
    }

    /// File name of the model's artifact inside the model store
    pub fn artifact_file_name(&self) -> String {
        format!("{}_model.json", self.as_str())
    }
}

impl Ord for ModelName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for ModelName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown model '{}'", s))
    }
}

/// Outcome of one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub model: String,
    pub prediction: String,
    /// Class label → probability, `None` when the model has no estimates
    pub proba: Option<BTreeMap<String, f64>>,
}

/// Evaluation metrics computed by the training pipeline for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// One replayed dataset row with every loaded model's label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamItem {
    pub features: FeatureVector,
    pub pred: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_name_round_trip() {
        for name in ModelName::ALL {
            assert_eq!(name.as_str().parse::<ModelName>().unwrap(), name);
        }
        assert!("scaler".parse::<ModelName>().is_err());
    }

    #[test]
    fn test_model_names_sort_alphabetically() {
        let mut names = ModelName::ALL.to_vec();
        names.sort();
        let sorted: Vec<&str> = names.iter().map(ModelName::as_str).collect();
        assert_eq!(sorted, vec!["knn", "mlp", "naive_bayes", "svm", "tree"]);
    }

    #[test]
    fn test_scaling_flags() {
        assert!(ModelName::Knn.requires_scaling());
        assert!(ModelName::Svm.requires_scaling());
        assert!(ModelName::Mlp.requires_scaling());
        assert!(!ModelName::Tree.requires_scaling());
        assert!(!ModelName::NaiveBayes.requires_scaling());
    }

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(
            ModelName::NaiveBayes.artifact_file_name(),
            "naive_bayes_model.json"
        );
    }

    #[test]
    fn test_prediction_result_serializes_null_proba() {
        let result = PredictionResult {
            model: "tree".to_string(),
            prediction: "A".to_string(),
            proba: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["proba"].is_null());
        assert_eq!(json["prediction"], "A");
    }
}
