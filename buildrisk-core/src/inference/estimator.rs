//! A preprocessor, a model and an output link, loaded together from one artifact entry.

use super::model::ModelSpec;
use super::preprocess::Preprocessor;
use super::{Classifier, DelayRegressor, Regressor};
use crate::error::RiskError;
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};

/// Output link applied to the raw model value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Link {
    #[default]
    Identity,
    Logistic,
}

impl Link {
    pub fn apply(self, raw: f64) -> f64 {
        match self {
            Self::Identity => raw,
            Self::Logistic => 1.0 / (1.0 + (-raw).exp()),
        }
    }
}

/// Raw-space decomposition of one prediction, folded back onto feature names.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    pub bias: f64,
    /// One entry per source feature, in preprocessor order.
    pub contributions: Vec<(String, f64)>,
}

impl Attribution {
    pub fn total(&self) -> f64 {
        self.bias + self.contributions.iter().map(|(_, v)| v).sum::<f64>()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estimator {
    pub name: String,
    #[serde(default)]
    pub preprocessor: Preprocessor,
    pub model: ModelSpec,
    #[serde(default)]
    pub link: Link,
}

impl Estimator {
    /// Load-time checks. Width agreement between preprocessor and model is checked per call.
    pub fn check(&self) -> Result<(), RiskError> {
        self.preprocessor
            .check()
            .and_then(|_| self.model.check())
            .map_err(|e| RiskError::artifact(format!("estimator '{}': {e}", self.name)))
    }

    /// Raw model output before the link.
    pub fn raw(&self, features: &FeatureVector) -> Result<f64, RiskError> {
        let row = self.preprocessor.transform(features)?;
        self.model.raw(&row)
    }

    pub fn evaluate(&self, features: &FeatureVector) -> Result<f64, RiskError> {
        Ok(self.link.apply(self.raw(features)?))
    }

    /// Decompose the raw output, summing one-hot blocks back onto their source feature.
    pub fn attribute(&self, features: &FeatureVector) -> Result<Attribution, RiskError> {
        let row = self.preprocessor.transform(features)?;
        let (bias, columns) = self.model.contributions(&row)?;

        let mut contributions: Vec<(String, f64)> = Vec::new();
        for (source, value) in self.preprocessor.output_sources().into_iter().zip(columns) {
            match contributions.last_mut() {
                Some((name, total)) if name == source => *total += value,
                _ => contributions.push((source.to_string(), value)),
            }
        }

        Ok(Attribution {
            bias,
            contributions,
        })
    }
}

impl Classifier for Estimator {
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, RiskError> {
        let p = self.evaluate(features)?;
        if !p.is_finite() {
            return Err(RiskError::inference(format!(
                "classifier '{}' produced a non-finite probability",
                self.name
            )));
        }
        Ok(p.clamp(0.0, 1.0))
    }
}

impl Regressor for Estimator {
    fn predict(&self, features: &FeatureVector) -> Result<f64, RiskError> {
        self.evaluate(features)
    }

    fn explain(&self, features: &FeatureVector) -> Result<Vec<(String, f64)>, RiskError> {
        Ok(self.attribute(features)?.contributions)
    }
}

impl DelayRegressor for Estimator {
    fn predict_log_days(&self, features: &FeatureVector) -> Result<f64, RiskError> {
        self.evaluate(features)
    }
}
