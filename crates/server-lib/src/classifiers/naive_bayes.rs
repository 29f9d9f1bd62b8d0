//! Gaussian naive Bayes classifier

use super::{argmax, check_classes, softmax, to_matrix, Classify};
use crate::models::NUM_FEATURES;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaiveBayesModelData {
    pub classes: Vec<String>,
    pub class_prior: Vec<f64>,
    /// Per-class feature means
    pub theta: Vec<Vec<f64>>,
    /// Per-class feature variances
    pub var: Vec<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct NaiveBayesClassifier {
    classes: Vec<String>,
    log_prior: Array1<f64>,
    theta: Array2<f64>,
    var: Array2<f64>,
    /// -0.5 * Σ ln(2π var) per class, fixed at load
    log_norm: Array1<f64>,
}

impl NaiveBayesClassifier {
    pub fn from_data(data: NaiveBayesModelData) -> Result<Self, String> {
        check_classes(&data.classes)?;
        let n_classes = data.classes.len();

        if data.class_prior.len() != n_classes {
            return Err(format!(
                "{} priors for {} classes",
                data.class_prior.len(),
                n_classes
            ));
        }
        if data.class_prior.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err("class priors must be positive".to_string());
        }
        if data.theta.len() != n_classes || data.var.len() != n_classes {
            return Err("theta and var need one row per class".to_string());
        }

        let theta = to_matrix(data.theta, NUM_FEATURES, "theta")?;
        let var = to_matrix(data.var, NUM_FEATURES, "var")?;
        if var.iter().any(|v| *v <= 0.0) {
            return Err("variances must be positive".to_string());
        }

        let log_norm = var
            .mapv(|v| (2.0 * PI * v).ln())
            .sum_axis(Axis(1))
            .mapv(|s| -0.5 * s);

        Ok(Self {
            classes: data.classes,
            log_prior: Array1::from_vec(data.class_prior).mapv(f64::ln),
            theta,
            var,
            log_norm,
        })
    }

    /// Joint log-likelihood ln P(c) + ln P(x | c) per class
    fn joint_log_likelihood(&self, x: ArrayView1<f64>) -> Array1<f64> {
        let mut jll = &self.log_prior + &self.log_norm;
        for (c, (mean, var)) in self
            .theta
            .rows()
            .into_iter()
            .zip(self.var.rows())
            .enumerate()
        {
            let sq: f64 = x
                .iter()
                .zip(mean.iter().zip(var.iter()))
                .map(|(xi, (m, v))| (xi - m).powi(2) / v)
                .sum();
            jll[c] -= 0.5 * sq;
        }
        jll
    }
}

impl Classify for NaiveBayesClassifier {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_index(&self, x: ArrayView1<f64>) -> usize {
        argmax(self.joint_log_likelihood(x).view())
    }

    fn predict_proba(&self, x: ArrayView1<f64>) -> Option<Array1<f64>> {
        Some(softmax(self.joint_log_likelihood(x).view()))
    }
}
