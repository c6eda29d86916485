//! The read-only model context shared by every inference call.

use super::artifacts::{ArtifactBundle, ArtifactDigest, ArtifactStore, ModelMetrics};
use super::ensemble::WeightedEnsemble;
use super::{Classifier, DelayRegressor, Regressor};
use crate::drift::ReferenceStatistics;
use crate::error::RiskError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Models behind the delay cascade.
pub struct DelayModels {
    pub version: String,
    pub classifier: Arc<dyn Classifier>,
    pub regressor: Arc<dyn DelayRegressor>,
    pub ensemble: Option<Arc<dyn DelayRegressor>>,
}

/// Models behind the cost-overrun estimator.
pub struct CostModels {
    pub version: String,
    pub model_name: String,
    pub feature_columns: Vec<String>,
    pub metrics: BTreeMap<String, ModelMetrics>,
    pub point: Arc<dyn Regressor>,
    pub lower: Arc<dyn Regressor>,
    pub upper: Arc<dyn Regressor>,
    pub reference: Arc<ReferenceStatistics>,
}

impl CostModels {
    /// Metrics recorded for the selected point model, if any.
    pub fn point_metrics(&self) -> Option<&ModelMetrics> {
        self.metrics.get(&self.model_name)
    }
}

/// Loaded once at startup and shared through `Arc`; nothing mutates it afterwards.
pub struct ModelContext {
    delay: DelayModels,
    cost: CostModels,
    digests: Vec<ArtifactDigest>,
}

impl ModelContext {
    pub fn new(delay: DelayModels, cost: CostModels) -> Self {
        Self {
            delay,
            cost,
            digests: Vec::new(),
        }
    }

    /// Load and validate artifacts from a store. Any failure is fatal.
    pub fn load(store: &dyn ArtifactStore) -> Result<Arc<Self>, RiskError> {
        Self::from_bundle(store.load()?).map(Arc::new)
    }

    pub fn from_bundle(bundle: ArtifactBundle) -> Result<Self, RiskError> {
        let ArtifactBundle {
            delay,
            ensemble,
            cost,
            digests,
        } = bundle;

        delay.classifier.check()?;
        delay.regressor.check()?;
        cost.check_columns()?;
        for est in [&cost.point_model, &cost.quantile_lower, &cost.quantile_upper] {
            est.check()?;
        }

        let ensemble = match ensemble {
            Some(artifact) => {
                let mut members: Vec<(Arc<dyn DelayRegressor>, f64)> = Vec::new();
                for member in artifact.members {
                    member.estimator.check()?;
                    let regressor: Arc<dyn DelayRegressor> = Arc::new(member.estimator);
                    members.push((regressor, member.weight));
                }
                let ensemble = WeightedEnsemble::new(members)?;
                info!(members = ensemble.len(), "Delay ensemble ready");
                Some(Arc::new(ensemble) as Arc<dyn DelayRegressor>)
            }
            None => None,
        };

        for digest in &digests {
            info!(file = %digest.file, sha256 = %digest.sha256, "Artifact fingerprint");
        }

        Ok(Self {
            delay: DelayModels {
                version: delay.version,
                classifier: Arc::new(delay.classifier),
                regressor: Arc::new(delay.regressor),
                ensemble,
            },
            cost: CostModels {
                version: cost.version,
                model_name: cost.model_name,
                feature_columns: cost.feature_columns,
                metrics: cost.metrics,
                point: Arc::new(cost.point_model),
                lower: Arc::new(cost.quantile_lower),
                upper: Arc::new(cost.quantile_upper),
                reference: Arc::new(cost.reference_stats),
            },
            digests,
        })
    }

    pub fn delay(&self) -> &DelayModels {
        &self.delay
    }

    pub fn cost(&self) -> &CostModels {
        &self.cost
    }

    pub fn reference_stats(&self) -> Arc<ReferenceStatistics> {
        Arc::clone(&self.cost.reference)
    }

    pub fn has_ensemble(&self) -> bool {
        self.delay.ensemble.is_some()
    }

    pub fn digests(&self) -> &[ArtifactDigest] {
        &self.digests
    }
}

impl std::fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelContext")
            .field("delay_version", &self.delay.version)
            .field("cost_version", &self.cost.version)
            .field("ensemble", &self.has_ensemble())
            .field("digests", &self.digests)
            .finish()
    }
}
