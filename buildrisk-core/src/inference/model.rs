//! Serialized model forms: linear models and gradient-boosted tree ensembles.

use crate::error::RiskError;
use serde::{Deserialize, Serialize};

/// One node of a regression tree.
///
/// Split nodes send a row left when `x[feature] < threshold`. Every node carries `value`, the
/// mean training target of the rows that reached it; path attribution credits the change in
/// `value` along the taken edge to the split feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default)]
        value: f64,
    },
    Leaf {
        value: f64,
    },
}

impl TreeNode {
    fn value(&self) -> f64 {
        match self {
            Self::Split { value, .. } | Self::Leaf { value } => *value,
        }
    }
}

/// A single tree, stored as a flat node array rooted at index 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Children must point strictly forward, which also rules out cycles.
    fn check(&self, width: usize) -> Result<(), RiskError> {
        if self.nodes.is_empty() {
            return Err(RiskError::artifact("tree has no nodes"));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
                ..
            } = node
            {
                if *feature >= width {
                    return Err(RiskError::artifact(format!(
                        "node {idx} splits on input {feature}, model has {width} inputs"
                    )));
                }
                if !threshold.is_finite() {
                    return Err(RiskError::artifact(format!(
                        "node {idx} has a non-finite threshold"
                    )));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(RiskError::artifact(format!(
                            "node {idx} has invalid child index {child}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk to a leaf, reporting each `(feature, value delta)` on the way.
    fn walk(&self, x: &[f64], mut on_edge: impl FnMut(usize, f64)) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    value,
                } => {
                    let next = if x[*feature] < *threshold { *left } else { *right };
                    on_edge(*feature, self.nodes[next].value() - value);
                    idx = next;
                }
            }
        }
    }
}

/// A model in its serialized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    TreeEnsemble {
        n_features: usize,
        #[serde(default)]
        base_score: f64,
        trees: Vec<DecisionTree>,
    },
}

impl ModelSpec {
    /// Number of inputs the model was trained on.
    pub fn input_width(&self) -> usize {
        match self {
            Self::Linear { coefficients, .. } => coefficients.len(),
            Self::TreeEnsemble { n_features, .. } => *n_features,
        }
    }

    /// Load-time structural checks.
    pub fn check(&self) -> Result<(), RiskError> {
        match self {
            Self::Linear {
                intercept,
                coefficients,
            } => {
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(RiskError::artifact("linear model has non-finite weights"));
                }
                Ok(())
            }
            Self::TreeEnsemble {
                n_features, trees, ..
            } => {
                if trees.is_empty() {
                    return Err(RiskError::artifact("tree ensemble has no trees"));
                }
                trees.iter().try_for_each(|t| t.check(*n_features))
            }
        }
    }

    fn ensure_width(&self, x: &[f64]) -> Result<(), RiskError> {
        if x.len() != self.input_width() {
            return Err(RiskError::inference(format!(
                "shape mismatch: model expects {} inputs, got {}",
                self.input_width(),
                x.len()
            )));
        }
        Ok(())
    }

    /// Raw model output (log-odds for classifiers).
    pub fn raw(&self, x: &[f64]) -> Result<f64, RiskError> {
        self.ensure_width(x)?;
        Ok(match self {
            Self::Linear {
                intercept,
                coefficients,
            } => {
                intercept
                    + coefficients
                        .iter()
                        .zip(x)
                        .map(|(c, v)| c * v)
                        .sum::<f64>()
            }
            Self::TreeEnsemble {
                base_score, trees, ..
            } => base_score + trees.iter().map(|t| t.walk(x, |_, _| {})).sum::<f64>(),
        })
    }

    /// Decompose the raw output into a bias and one contribution per input.
    ///
    /// `bias + contributions.sum()` equals [`ModelSpec::raw`].
    pub fn contributions(&self, x: &[f64]) -> Result<(f64, Vec<f64>), RiskError> {
        self.ensure_width(x)?;
        match self {
            Self::Linear {
                intercept,
                coefficients,
            } => Ok((
                *intercept,
                coefficients.iter().zip(x).map(|(c, v)| c * v).collect(),
            )),
            Self::TreeEnsemble {
                base_score, trees, ..
            } => {
                let mut contribs = vec![0.0; x.len()];
                let mut bias = *base_score;
                for tree in trees {
                    bias += tree.nodes[0].value();
                    tree.walk(x, |feature, delta| contribs[feature] += delta);
                }
                Ok((bias, contribs))
            }
        }
    }
}
