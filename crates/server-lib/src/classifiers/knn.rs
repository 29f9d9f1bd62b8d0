//! K-nearest neighbours classifier
//!
//! Brute-force Euclidean search over the stored training points with a
//! uniform majority vote. Ties in distance keep training order; ties in votes
//! go to the class declared first.

use super::{argmax, check_classes, class_index, to_matrix, Classify};
use crate::models::NUM_FEATURES;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Model data for JSON serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnModelData {
    pub classes: Vec<String>,
    pub k: usize,
    pub points: Vec<Vec<f64>>,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct KnnClassifier {
    k: usize,
    classes: Vec<String>,
    points: Array2<f64>,
    /// Class index of each stored point
    targets: Vec<usize>,
}

impl KnnClassifier {
    pub fn from_data(data: KnnModelData) -> Result<Self, String> {
        check_classes(&data.classes)?;
        if data.k == 0 {
            return Err("k must be at least 1".to_string());
        }
        if data.points.is_empty() {
            return Err("KNN artifact has no training points".to_string());
        }
        if data.points.len() != data.labels.len() {
            return Err(format!(
                "{} points but {} labels",
                data.points.len(),
                data.labels.len()
            ));
        }

        let targets = data
            .labels
            .iter()
            .map(|label| class_index(&data.classes, label))
            .collect::<Result<Vec<_>, _>>()?;
        let points = to_matrix(data.points, NUM_FEATURES, "points")?;

        Ok(Self {
            k: data.k.min(targets.len()),
            classes: data.classes,
            points,
            targets,
        })
    }

    /// Vote count per class among the k nearest points
    fn votes(&self, x: ArrayView1<f64>) -> Array1<f64> {
        let mut distances: Vec<(f64, usize)> = self
            .points
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let sq_dist: f64 = row.iter().zip(x.iter()).map(|(a, b)| (a - b).powi(2)).sum();
                (sq_dist, i)
            })
            .collect();
        distances.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut votes = Array1::zeros(self.classes.len());
        for (_, i) in distances.iter().take(self.k) {
            votes[self.targets[*i]] += 1.0;
        }
        votes
    }
}

impl Classify for KnnClassifier {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_index(&self, x: ArrayView1<f64>) -> usize {
        argmax(self.votes(x).view())
    }

    fn predict_proba(&self, x: ArrayView1<f64>) -> Option<Array1<f64>> {
        Some(self.votes(x) / self.k as f64)
    }
}
