//! SVM (Support Vector Machine) inference
//!
//! Multiclass classification is one-vs-one: one binary machine per class
//! pair, each voting for its `positive` class when its decision value is
//! positive. Supports both Linear and RBF kernels:
//!
//! - Linear kernel: k(x, y) = x·y
//! - RBF kernel: k(x, y) = exp(-γ||x-y||²)
//!
//! Probabilities follow the libsvm approach: each pairwise decision value is
//! mapped through its Platt sigmoid, and the pairwise estimates are coupled
//! into one distribution. They are only available when every machine carries
//! Platt parameters.

use super::{argmax, check_classes, class_index, normalize, to_matrix, Classify};
use crate::models::NUM_FEATURES;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lower clamp for pairwise probabilities, keeps coupling well conditioned
const MIN_PAIRWISE_PROB: f64 = 1e-7;

/// Kernel type for SVM
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf { gamma: f64 },
}

impl Kernel {
    #[inline]
    fn apply(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
        match self {
            Kernel::Linear => x.dot(&y),
            Kernel::Rbf { gamma } => {
                let sq_dist: f64 = x.iter().zip(y.iter()).map(|(a, b)| (a - b).powi(2)).sum();
                (-gamma * sq_dist).exp()
            }
        }
    }
}

/// Sigmoid parameters fit on decision values: P = 1 / (1 + exp(a·f + b))
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattParams {
    pub a: f64,
    pub b: f64,
}

impl PlattParams {
    fn probability(&self, decision: f64) -> f64 {
        let f_ab = decision * self.a + self.b;
        // Branch keeps exp() from overflowing
        if f_ab >= 0.0 {
            (-f_ab).exp() / (1.0 + (-f_ab).exp())
        } else {
            1.0 / (1.0 + f_ab.exp())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairwiseMachineData {
    pub positive: String,
    pub negative: String,
    pub support_vectors: Vec<Vec<f64>>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub platt: Option<PlattParams>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmModelData {
    pub classes: Vec<String>,
    pub kernel: Kernel,
    pub machines: Vec<PairwiseMachineData>,
}

#[derive(Debug, Clone)]
struct PairwiseMachine {
    positive: usize,
    negative: usize,
    support_vectors: Array2<f64>,
    coefficients: Array1<f64>,
    intercept: f64,
    platt: Option<PlattParams>,
}

#[derive(Debug, Clone)]
pub struct SvmClassifier {
    classes: Vec<String>,
    kernel: Kernel,
    machines: Vec<PairwiseMachine>,
    has_probability: bool,
}

impl SvmClassifier {
    pub fn from_data(data: SvmModelData) -> Result<Self, String> {
        check_classes(&data.classes)?;
        let n_classes = data.classes.len();
        if n_classes < 2 {
            return Err("SVM needs at least two classes".to_string());
        }
        if let Kernel::Rbf { gamma } = data.kernel {
            if !gamma.is_finite() || gamma <= 0.0 {
                return Err(format!("invalid RBF gamma {}", gamma));
            }
        }

        let expected = n_classes * (n_classes - 1) / 2;
        if data.machines.len() != expected {
            return Err(format!(
                "{} machines for {} classes, expected {}",
                data.machines.len(),
                n_classes,
                expected
            ));
        }

        let mut pairs = HashSet::new();
        let mut machines = Vec::with_capacity(expected);
        for m in data.machines {
            let positive = class_index(&data.classes, &m.positive)?;
            let negative = class_index(&data.classes, &m.negative)?;
            if positive == negative {
                return Err(format!("machine compares '{}' with itself", m.positive));
            }
            if !pairs.insert((positive.min(negative), positive.max(negative))) {
                return Err(format!(
                    "duplicate machine for '{}' vs '{}'",
                    m.positive, m.negative
                ));
            }
            if m.support_vectors.is_empty() || m.support_vectors.len() != m.coefficients.len() {
                return Err(format!(
                    "machine '{}' vs '{}' has {} support vectors and {} coefficients",
                    m.positive,
                    m.negative,
                    m.support_vectors.len(),
                    m.coefficients.len()
                ));
            }
            if !m.intercept.is_finite() || m.coefficients.iter().any(|c| !c.is_finite()) {
                return Err("non-finite SVM coefficients".to_string());
            }

            machines.push(PairwiseMachine {
                positive,
                negative,
                support_vectors: to_matrix(m.support_vectors, NUM_FEATURES, "support_vectors")?,
                coefficients: Array1::from_vec(m.coefficients),
                intercept: m.intercept,
                platt: m.platt,
            });
        }

        let has_probability = machines.iter().all(|m| m.platt.is_some());

        Ok(Self {
            classes: data.classes,
            kernel: data.kernel,
            machines,
            has_probability,
        })
    }

    /// Whether `predict_proba` yields estimates
    pub fn has_probability(&self) -> bool {
        self.has_probability
    }

    /// Decision function: f(x) = Σ(cᵢ·k(svᵢ, x)) + intercept
    fn decision(&self, machine: &PairwiseMachine, x: ArrayView1<f64>) -> f64 {
        machine
            .support_vectors
            .rows()
            .into_iter()
            .zip(machine.coefficients.iter())
            .map(|(sv, c)| c * self.kernel.apply(sv, x))
            .sum::<f64>()
            + machine.intercept
    }

    fn votes(&self, x: ArrayView1<f64>) -> Array1<f64> {
        let mut votes = Array1::zeros(self.classes.len());
        for machine in &self.machines {
            let winner = if self.decision(machine, x) > 0.0 {
                machine.positive
            } else {
                machine.negative
            };
            votes[winner] += 1.0;
        }
        votes
    }
}

impl Classify for SvmClassifier {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_index(&self, x: ArrayView1<f64>) -> usize {
        argmax(self.votes(x).view())
    }

    fn predict_proba(&self, x: ArrayView1<f64>) -> Option<Array1<f64>> {
        if !self.has_probability {
            return None;
        }

        let k = self.classes.len();
        let mut pairwise = Array2::<f64>::zeros((k, k));
        for machine in &self.machines {
            let platt = machine.platt?;
            let p = platt
                .probability(self.decision(machine, x))
                .clamp(MIN_PAIRWISE_PROB, 1.0 - MIN_PAIRWISE_PROB);
            pairwise[[machine.positive, machine.negative]] = p;
            pairwise[[machine.negative, machine.positive]] = 1.0 - p;
        }

        let p = if k == 2 {
            Array1::from_vec(vec![pairwise[[0, 1]], pairwise[[1, 0]]])
        } else {
            couple_pairwise(&pairwise)
        };
        Some(normalize(p))
    }
}

/// Pairwise coupling (Wu, Lin and Weng, method 2)
///
/// `r[[i, j]]` estimates P(class i | class i or j). Finds the distribution p
/// minimizing Σ (r_ji·p_i - r_ij·p_j)² by fixed-point iteration.
fn couple_pairwise(r: &Array2<f64>) -> Array1<f64> {
    let k = r.nrows();
    let max_iter = 100.max(k);
    let eps = 0.005 / k as f64;

    let mut q = Array2::<f64>::zeros((k, k));
    for t in 0..k {
        for j in 0..k {
            if j == t {
                continue;
            }
            q[[t, t]] += r[[j, t]] * r[[j, t]];
            q[[t, j]] = -r[[j, t]] * r[[t, j]];
        }
    }

    let mut p = Array1::from_elem(k, 1.0 / k as f64);
    let mut qp = Array1::<f64>::zeros(k);

    for _ in 0..max_iter {
        let mut p_qp = 0.0;
        for t in 0..k {
            qp[t] = q.row(t).dot(&p);
            p_qp += p[t] * qp[t];
        }

        let max_error = qp.iter().map(|v| (v - p_qp).abs()).fold(0.0, f64::max);
        if max_error < eps {
            break;
        }

        for t in 0..k {
            let diff = (-qp[t] + p_qp) / q[[t, t]];
            p[t] += diff;
            p_qp = (p_qp + diff * (diff * q[[t, t]] + 2.0 * qp[t])) / (1.0 + diff) / (1.0 + diff);
            for j in 0..k {
                qp[j] = (qp[j] + diff * q[[t, j]]) / (1.0 + diff);
                p[j] /= 1.0 + diff;
            }
        }
    }
    p
}

#[cfg(test)]
mod tests {
    use super::super::test_support::svm_data;
    use super::*;
    use ndarray::array;

    #[test]
    fn test_one_vs_one_voting() {
        // A-vs-B: x0 - 0.5, A-vs-C: x0, B-vs-C: x0 + 0.5
        let svm = SvmClassifier::from_data(svm_data()).unwrap();
        assert_eq!(svm.predict_label(array![1.0, 0.0, 0.0, 0.0].view()), "A");
        assert_eq!(svm.predict_label(array![-0.25, 0.0, 0.0, 0.0].view()), "B");
        assert_eq!(svm.predict_label(array![-1.0, 0.0, 0.0, 0.0].view()), "C");
    }

    #[test]
    fn test_rbf_kernel() {
        let kernel = Kernel::Rbf { gamma: 0.5 };
        let x = array![1.0, 0.0, 0.0, 0.0];
        let y = array![0.0, 0.0, 0.0, 0.0];
        assert!((kernel.apply(x.view(), y.view()) - (-0.5f64).exp()).abs() < 1e-12);
        assert_eq!(kernel.apply(x.view(), x.view()), 1.0);
    }

    #[test]
    fn test_probabilities_follow_decision() {
        let svm = SvmClassifier::from_data(svm_data()).unwrap();
        assert!(svm.has_probability());
        let p = svm.predict_proba(array![2.0, 0.0, 0.0, 0.0].view()).unwrap();
        assert!((p.sum() - 1.0).abs() < 1e-6);
        assert_eq!(argmax(p.view()), 0);
        let p = svm.predict_proba(array![-2.0, 0.0, 0.0, 0.0].view()).unwrap();
        assert_eq!(argmax(p.view()), 2);
    }

    #[test]
    fn test_no_probability_without_platt() {
        let mut data = svm_data();
        data.machines[1].platt = None;
        let svm = SvmClassifier::from_data(data).unwrap();
        assert!(!svm.has_probability());
        assert!(svm.predict_proba(array![1.0, 0.0, 0.0, 0.0].view()).is_none());
    }

    #[test]
    fn test_binary_probability_uses_sigmoid_directly() {
        let data = SvmModelData {
            classes: vec!["A".to_string(), "B".to_string()],
            kernel: Kernel::Linear,
            machines: vec![PairwiseMachineData {
                positive: "A".to_string(),
                negative: "B".to_string(),
                support_vectors: vec![vec![1.0, 0.0, 0.0, 0.0]],
                coefficients: vec![1.0],
                intercept: 0.0,
                platt: Some(PlattParams { a: -1.0, b: 0.0 }),
            }],
        };
        let svm = SvmClassifier::from_data(data).unwrap();
        let p = svm.predict_proba(array![0.0, 0.0, 0.0, 0.0].view()).unwrap();
        assert!((p[0] - 0.5).abs() < 1e-12);
        let p = svm.predict_proba(array![1.0, 0.0, 0.0, 0.0].view()).unwrap();
        let expected = 1.0 / (1.0 + (-1.0f64).exp());
        assert!((p[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_coupling_of_consistent_estimates() {
        // Pairwise estimates derived from p = (0.5, 0.3, 0.2)
        let target = [0.5, 0.3, 0.2];
        let mut r = Array2::zeros((3, 3));
        for i in 0..3 {
            for j in 0..3 {
                if i != j {
                    r[[i, j]] = target[i] / (target[i] + target[j]);
                }
            }
        }
        let p = couple_pairwise(&r);
        for (got, want) in p.iter().zip(target) {
            assert!((got - want).abs() < 2e-2, "{} vs {}", got, want);
        }
    }

    #[test]
    fn test_rejects_incomplete_pairs() {
        let mut data = svm_data();
        data.machines.pop();
        assert!(SvmClassifier::from_data(data).is_err());

        let mut data = svm_data();
        data.machines[2].positive = "A".to_string();
        data.machines[2].negative = "B".to_string();
        assert!(SvmClassifier::from_data(data).unwrap_err().contains("duplicate"));

        let mut data = svm_data();
        data.kernel = Kernel::Rbf { gamma: -1.0 };
        assert!(SvmClassifier::from_data(data).is_err());
    }

    #[test]
    fn test_kernel_json_shape() {
        let kernel: Kernel = serde_json::from_str(r#"{"type":"rbf","gamma":0.25}"#).unwrap();
        assert_eq!(kernel, Kernel::Rbf { gamma: 0.25 });
        let kernel: Kernel = serde_json::from_str(r#"{"type":"linear"}"#).unwrap();
        assert_eq!(kernel, Kernel::Linear);
    }
}
