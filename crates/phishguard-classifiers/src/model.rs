//! Model specifications and their scorers
//!
//! A trained model is described declaratively (see [`ModelSpec`]) and turned
//! into a [`Scorer`] once its shape has been validated against the feature
//! columns of the bundle it ships in.

use crate::classifier::{check_width, logit, sigmoid, Scorer};
use phishguard_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Model specification as stored in a bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    /// Gradient-boosted regression trees with a logistic link
    GradientBoostedTrees {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scaler: Option<StandardScaler>,

        /// Prior probability the tree margins are added to
        #[serde(default = "default_base_score")]
        base_score: f64,

        trees: Vec<RegressionTree>,
    },

    /// Linear model with a logistic link
    LogisticRegression {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scaler: Option<StandardScaler>,

        weights: Vec<f64>,

        #[serde(default)]
        intercept: f64,
    },
}

fn default_base_score() -> f64 {
    0.5
}

/// Per-feature standardization `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// A single regression tree stored as a flat node array, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

/// Tree node: either a split or a leaf value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go to `left` when `x[feature] < threshold`, otherwise to `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f64,
    },
}

impl ModelSpec {
    /// Short name of the model family
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GradientBoostedTrees { .. } => "gradient_boosted_trees",
            Self::LogisticRegression { .. } => "logistic_regression",
        }
    }

    /// Validate the parameters and build a scorer for `width` features
    pub fn build(&self, width: usize) -> Result<Arc<dyn Scorer>> {
        match self {
            Self::GradientBoostedTrees {
                scaler,
                base_score,
                trees,
            } => {
                if let Some(scaler) = scaler {
                    scaler.validate(width)?;
                }
                if !(*base_score > 0.0 && *base_score < 1.0) {
                    return Err(Error::bundle(format!(
                        "base_score must be strictly between 0 and 1, got {}",
                        base_score
                    )));
                }
                for (idx, tree) in trees.iter().enumerate() {
                    tree.validate(width)
                        .map_err(|e| Error::bundle(format!("tree {}: {}", idx, e)))?;
                }

                Ok(Arc::new(GradientBoostedTrees {
                    scaler: scaler.clone(),
                    base_margin: logit(*base_score),
                    trees: trees.clone(),
                    width,
                }))
            }

            Self::LogisticRegression {
                scaler,
                weights,
                intercept,
            } => {
                if let Some(scaler) = scaler {
                    scaler.validate(width)?;
                }
                if weights.len() != width {
                    return Err(Error::bundle(format!(
                        "logistic_regression has {} weights for {} feature columns",
                        weights.len(),
                        width
                    )));
                }
                if !intercept.is_finite() || weights.iter().any(|w| !w.is_finite()) {
                    return Err(Error::bundle("logistic_regression parameters must be finite"));
                }

                Ok(Arc::new(LogisticRegression {
                    scaler: scaler.clone(),
                    weights: weights.clone(),
                    intercept: *intercept,
                }))
            }
        }
    }
}

impl StandardScaler {
    fn validate(&self, width: usize) -> Result<()> {
        if self.mean.len() != width || self.scale.len() != width {
            return Err(Error::bundle(format!(
                "scaler has {} means and {} scales for {} feature columns",
                self.mean.len(),
                self.scale.len(),
                width
            )));
        }
        if self.mean.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            return Err(Error::bundle("scaler parameters must be finite"));
        }
        Ok(())
    }

    /// Standardize a feature vector. A zero scale is treated as 1.
    pub fn transform(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect()
    }
}

impl RegressionTree {
    fn validate(&self, width: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= width {
                        return Err(format!(
                            "node {} splits on feature {} but only {} columns exist",
                            idx, feature, width
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", idx));
                    }
                    // Children must come later in the array, which rules out cycles
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!(
                                "node {} has invalid child index {}",
                                idx, child
                            ));
                        }
                    }
                }
                TreeNode::Leaf { leaf } => {
                    if !leaf.is_finite() {
                        return Err(format!("node {} has a non-finite leaf value", idx));
                    }
                }
            }
        }
        Ok(())
    }

    /// Leaf value reached by `features`.
    ///
    /// Returns `None` when the walk leaves the node array, reads past the
    /// end of `features`, or moves backwards. Trees that passed validation
    /// never hit any of these.
    pub fn predict(&self, features: &[f64]) -> Option<f64> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx)? {
                TreeNode::Leaf { leaf } => return Some(*leaf),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let next = if *features.get(*feature)? < *threshold {
                        *left
                    } else {
                        *right
                    };
                    if next <= idx {
                        return None;
                    }
                    idx = next;
                }
            }
        }
    }
}

/// Scorer backed by a gradient-boosted tree ensemble
pub struct GradientBoostedTrees {
    scaler: Option<StandardScaler>,
    base_margin: f64,
    trees: Vec<RegressionTree>,
    width: usize,
}

impl Scorer for GradientBoostedTrees {
    fn score(&self, features: &[f64]) -> Result<f64> {
        check_width(self.name(), self.width, features)?;

        let scaled;
        let input = match &self.scaler {
            Some(scaler) => {
                scaled = scaler.transform(features);
                &scaled[..]
            }
            None => features,
        };

        let mut margin = self.base_margin;
        for (idx, tree) in self.trees.iter().enumerate() {
            margin += tree.predict(input).ok_or_else(|| {
                Error::internal(format!("tree {} has no reachable leaf for this input", idx))
            })?;
        }

        Ok(sigmoid(margin))
    }

    fn input_width(&self) -> usize {
        self.width
    }

    fn name(&self) -> &str {
        "gradient_boosted_trees"
    }
}

/// Scorer backed by a logistic regression
pub struct LogisticRegression {
    scaler: Option<StandardScaler>,
    weights: Vec<f64>,
    intercept: f64,
}

impl Scorer for LogisticRegression {
    fn score(&self, features: &[f64]) -> Result<f64> {
        check_width(self.name(), self.weights.len(), features)?;

        let scaled;
        let input = match &self.scaler {
            Some(scaler) => {
                scaled = scaler.transform(features);
                &scaled[..]
            }
            None => features,
        };

        let margin = input
            .iter()
            .zip(&self.weights)
            .fold(self.intercept, |acc, (x, w)| acc + x * w);

        Ok(sigmoid(margin))
    }

    fn input_width(&self) -> usize {
        self.weights.len()
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, below: f64, above: f64) -> RegressionTree {
        RegressionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { leaf: below },
                TreeNode::Leaf { leaf: above },
            ],
        }
    }

    #[test]
    fn test_parse_tree_model() {
        let yaml = r#"
type: gradient_boosted_trees
base_score: 0.5
trees:
  - nodes:
      - { feature: 0, threshold: 50.0, left: 1, right: 2 }
      - { leaf: -1.5 }
      - { leaf: 2.0 }
"#;

        let spec: ModelSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.kind(), "gradient_boosted_trees");

        match &spec {
            ModelSpec::GradientBoostedTrees { trees, scaler, .. } => {
                assert!(scaler.is_none());
                assert_eq!(trees[0], stump(0, 50.0, -1.5, 2.0));
            }
            _ => panic!("Expected tree model"),
        }
    }

    #[test]
    fn test_tree_ensemble_scoring() {
        let spec = ModelSpec::GradientBoostedTrees {
            scaler: None,
            base_score: 0.5,
            trees: vec![stump(0, 50.0, -1.0, 1.0), stump(1, 3.0, -0.5, 0.5)],
        };
        let scorer = spec.build(2).unwrap();

        // Both trees go right: margin = 0 + 1.0 + 0.5
        let p = scorer.score(&[80.0, 4.0]).unwrap();
        assert!((p - sigmoid(1.5)).abs() < 1e-12);

        // Split boundary goes right: 50 is not < 50
        let p = scorer.score(&[50.0, 0.0]).unwrap();
        assert!((p - sigmoid(0.5)).abs() < 1e-12);

        let p = scorer.score(&[10.0, 0.0]).unwrap();
        assert!(p < 0.5);
    }

    #[test]
    fn test_base_score_shifts_margin() {
        let spec = ModelSpec::GradientBoostedTrees {
            scaler: None,
            base_score: 0.8,
            trees: vec![],
        };
        let p = spec.build(1).unwrap().score(&[0.0]).unwrap();
        assert!((p - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_scaler_applied_before_trees() {
        let spec = ModelSpec::GradientBoostedTrees {
            scaler: Some(StandardScaler {
                mean: vec![40.0],
                scale: vec![10.0],
            }),
            base_score: 0.5,
            trees: vec![stump(0, 0.0, -2.0, 2.0)],
        };
        let scorer = spec.build(1).unwrap();

        assert!(scorer.score(&[30.0]).unwrap() < 0.5);
        assert!(scorer.score(&[45.0]).unwrap() > 0.5);
    }

    #[test]
    fn test_zero_scale_treated_as_one() {
        let scaler = StandardScaler {
            mean: vec![1.0, 1.0],
            scale: vec![0.0, 2.0],
        };
        assert_eq!(scaler.transform(&[3.0, 3.0]), vec![2.0, 1.0]);
    }

    #[test]
    fn test_logistic_scoring() {
        let spec = ModelSpec::LogisticRegression {
            scaler: None,
            weights: vec![0.5, -1.0],
            intercept: 0.25,
        };
        let scorer = spec.build(2).unwrap();
        assert_eq!(scorer.input_width(), 2);

        let p = scorer.score(&[2.0, 1.0]).unwrap();
        assert!((p - sigmoid(0.25)).abs() < 1e-12);
    }

    #[test]
    fn test_wrong_width_is_an_error() {
        let spec = ModelSpec::LogisticRegression {
            scaler: None,
            weights: vec![1.0; 19],
            intercept: 0.0,
        };
        let scorer = spec.build(19).unwrap();
        assert!(scorer.score(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_feature() {
        let spec = ModelSpec::GradientBoostedTrees {
            scaler: None,
            base_score: 0.5,
            trees: vec![stump(5, 1.0, 0.0, 0.0)],
        };
        let err = spec.build(3).err().unwrap();
        assert!(err.to_string().contains("tree 0"));
    }

    #[test]
    fn test_rejects_cyclic_tree() {
        let tree = RegressionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 1,
                    right: 0,
                },
                TreeNode::Leaf { leaf: 0.0 },
            ],
        };
        let spec = ModelSpec::GradientBoostedTrees {
            scaler: None,
            base_score: 0.5,
            trees: vec![tree],
        };
        assert!(spec.build(1).is_err());
    }

    #[test]
    fn test_tree_walk_is_total() {
        let tree = stump(3, 1.0, -1.0, 1.0);
        assert_eq!(tree.predict(&[]), None);
        assert_eq!(tree.predict(&[0.0, 0.0, 0.0, 2.0]), Some(1.0));

        let cyclic = RegressionTree {
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 1.0,
                left: 0,
                right: 0,
            }],
        };
        assert_eq!(cyclic.predict(&[0.0]), None);
        assert_eq!(RegressionTree { nodes: vec![] }.predict(&[0.0]), None);
    }

    #[test]
    fn test_unreachable_leaf_is_internal_error() {
        // Bypasses build() so the tree is never validated
        let scorer = GradientBoostedTrees {
            scaler: None,
            base_margin: 0.0,
            trees: vec![stump(0, 1.0, 0.5, 0.5), stump(7, 1.0, 0.5, 0.5)],
            width: 1,
        };
        let err = scorer.score(&[0.0]).unwrap_err();
        assert_eq!(err.kind(), "internal");
        assert!(err.to_string().contains("tree 1"), "{}", err);
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let spec = ModelSpec::LogisticRegression {
            scaler: None,
            weights: vec![1.0; 3],
            intercept: 0.0,
        };
        assert!(spec.build(19).is_err());

        let spec = ModelSpec::GradientBoostedTrees {
            scaler: Some(StandardScaler {
                mean: vec![0.0; 19],
                scale: vec![1.0; 18],
            }),
            base_score: 0.5,
            trees: vec![],
        };
        assert!(spec.build(19).is_err());

        let spec = ModelSpec::GradientBoostedTrees {
            scaler: None,
            base_score: 1.0,
            trees: vec![],
        };
        assert!(spec.build(19).is_err());
    }
}
