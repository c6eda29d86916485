//! Inference: model capabilities, serialized estimators and the shared model context.

pub mod artifacts;
pub mod context;
pub mod ensemble;
pub mod estimator;
pub mod model;
pub mod preprocess;

pub use artifacts::{ArtifactBundle, ArtifactDigest, ArtifactStore, FsArtifactStore};
pub use context::{CostModels, DelayModels, ModelContext};
pub use ensemble::WeightedEnsemble;
pub use estimator::{Attribution, Estimator, Link};
pub use model::ModelSpec;
pub use preprocess::Preprocessor;

use crate::error::RiskError;
use crate::features::FeatureVector;

/// Binary classifier producing the probability of the positive class.
pub trait Classifier: Send + Sync {
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, RiskError>;
}

/// Plain regressor, optionally able to explain its output.
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64, RiskError>;

    /// Signed per-feature contributions. Models without attribution support return an empty
    /// list.
    fn explain(&self, _features: &FeatureVector) -> Result<Vec<(String, f64)>, RiskError> {
        Ok(Vec::new())
    }
}

/// Regressor trained on `ln(1 + days)`.
///
/// Implemented by single estimators and by [`WeightedEnsemble`]; callers only ever ask for
/// days.
pub trait DelayRegressor: Send + Sync {
    fn predict_log_days(&self, features: &FeatureVector) -> Result<f64, RiskError>;

    fn predict_days(&self, features: &FeatureVector) -> Result<f64, RiskError> {
        Ok(invert_log_days(self.predict_log_days(features)?))
    }
}

/// `exp(x) - 1`, floored at zero. NaN maps to zero.
pub fn invert_log_days(log_days: f64) -> f64 {
    log_days.exp_m1().max(0.0)
}
