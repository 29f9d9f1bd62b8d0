//! Decision tree classifier

use super::{argmax, check_classes, normalize, Classify};
use crate::models::NUM_FEATURES;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// One tree node; nodes are stored in pre-order so children follow parents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go to `left` when `x[feature] <= threshold`, otherwise `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class training weight reaching this leaf
    Leaf { value: Vec<f64> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeModelData {
    pub classes: Vec<String>,
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(Array1<f64>),
}

#[derive(Debug, Clone)]
pub struct TreeClassifier {
    classes: Vec<String>,
    nodes: Vec<Node>,
}

impl TreeClassifier {
    pub fn from_data(data: TreeModelData) -> Result<Self, String> {
        check_classes(&data.classes)?;
        if data.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        let n_nodes = data.nodes.len();
        let n_classes = data.classes.len();
        let mut nodes = Vec::with_capacity(n_nodes);

        for (idx, node) in data.nodes.into_iter().enumerate() {
            let node = match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= NUM_FEATURES {
                        return Err(format!("node {} splits on unknown feature {}", idx, feature));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", idx));
                    }
                    // Children must come later, which also rules out cycles
                    for child in [left, right] {
                        if child <= idx || child >= n_nodes {
                            return Err(format!("node {} has invalid child {}", idx, child));
                        }
                    }
                    Node::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(format!(
                            "leaf {} has {} weights for {} classes",
                            idx,
                            value.len(),
                            n_classes
                        ));
                    }
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0) || value.iter().sum::<f64>() <= 0.0 {
                        return Err(format!("leaf {} has invalid weights", idx));
                    }
                    Node::Leaf(normalize(Array1::from_vec(value)))
                }
            };
            nodes.push(node);
        }

        Ok(Self {
            classes: data.classes,
            nodes,
        })
    }

    fn leaf(&self, x: ArrayView1<f64>) -> &Array1<f64> {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
                Node::Leaf(proba) => return proba,
            }
        }
    }
}

impl Classify for TreeClassifier {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_index(&self, x: ArrayView1<f64>) -> usize {
        argmax(self.leaf(x).view())
    }

    fn predict_proba(&self, x: ArrayView1<f64>) -> Option<Array1<f64>> {
        Some(self.leaf(x).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::tree_data;
    use super::*;
    use ndarray::array;

    #[test]
    fn test_tree_routes_on_thresholds() {
        let tree = TreeClassifier::from_data(tree_data()).unwrap();
        assert_eq!(tree.predict_label(array![40.0, 1.0, 0.5, 5.0].view()), "C");
        assert_eq!(tree.predict_label(array![65.5, 0.5, 0.3, 9.0].view()), "A");
        assert_eq!(tree.predict_label(array![65.5, 0.5, 3.0, 9.0].view()), "B");
    }

    #[test]
    fn test_threshold_is_inclusive_left() {
        let tree = TreeClassifier::from_data(tree_data()).unwrap();
        assert_eq!(tree.predict_label(array![60.0, 0.0, 0.0, 0.0].view()), "C");
    }

    #[test]
    fn test_tree_proba_is_normalized_leaf() {
        let tree = TreeClassifier::from_data(tree_data()).unwrap();
        let p = tree.predict_proba(array![65.5, 0.5, 0.3, 9.0].view()).unwrap();
        assert!((p[0] - 0.9).abs() < 1e-12);
        assert!((p[1] - 0.1).abs() < 1e-12);
        assert_eq!(p[2], 0.0);
    }

    #[test]
    fn test_rejects_backward_children() {
        let mut data = tree_data();
        data.nodes[2] = TreeNode::Split {
            feature: 0,
            threshold: 1.0,
            left: 0,
            right: 4,
        };
        assert!(TreeClassifier::from_data(data).unwrap_err().contains("invalid child"));
    }

    #[test]
    fn test_rejects_bad_leaf_and_feature() {
        let mut data = tree_data();
        data.nodes[1] = TreeNode::Leaf {
            value: vec![1.0, 1.0],
        };
        assert!(TreeClassifier::from_data(data).is_err());

        let mut data = tree_data();
        data.nodes[0] = TreeNode::Split {
            feature: 7,
            threshold: 1.0,
            left: 1,
            right: 2,
        };
        assert!(TreeClassifier::from_data(data).is_err());
    }

    #[test]
    fn test_node_json_shapes() {
        let nodes: Vec<TreeNode> = serde_json::from_str(
            r#"[{"feature":0,"threshold":1.5,"left":1,"right":2},{"value":[1,0]},{"value":[0,1]}]"#,
        )
        .unwrap();
        assert!(matches!(nodes[0], TreeNode::Split { feature: 0, .. }));
        assert!(matches!(nodes[2], TreeNode::Leaf { .. }));
    }
}
