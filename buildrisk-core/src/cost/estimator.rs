//! Point and quantile cost-overrun estimation with attribution.

use super::advice;
use crate::config::CostConfig;
use crate::drift::{DriftMonitor, DriftSignal};
use crate::error::RiskError;
use crate::features::{FeatureDeriver, FeatureVector};
use crate::inference::{ModelContext, Regressor};
use crate::project::ProjectSnapshot;
use crate::tier::RiskTier;
use crate::validate::ValidationGate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
}

/// One entry of the attribution list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub feature: String,
    /// `|contribution|`, rounded to three decimals.
    pub impact: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub version: String,
    pub name: String,
    pub r2: Option<f64>,
    pub mae: Option<f64>,
}

/// Cost-overrun prediction for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostVerdict {
    pub model_version: String,
    pub expected_overrun_pct: f64,
    /// Lower quantile. Not reordered against `interval_high`.
    pub interval_low: f64,
    pub interval_high: f64,
    pub predicted_final_cost: f64,
    pub cost_interval_low: f64,
    pub cost_interval_high: f64,
    pub risk_tier: RiskTier,
    pub alerts: Vec<String>,
    pub attributions: Vec<FactorContribution>,
    pub recommendations: Vec<String>,
    pub model_info: ModelInfo,
    pub drift_signals: Vec<DriftSignal>,
}

/// Rank raw contributions by magnitude and keep the top `n`.
pub fn top_contributors(mut contributions: Vec<(String, f64)>, n: usize) -> Vec<FactorContribution> {
    contributions.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    contributions
        .into_iter()
        .take(n)
        .map(|(feature, value)| FactorContribution {
            feature,
            impact: (value.abs() * 1000.0).round() / 1000.0,
            direction: if value >= 0.0 {
                Direction::Positive
            } else {
                Direction::Negative
            },
        })
        .collect()
}

/// Final cost implied by an overrun percentage.
pub fn apply_overrun(cost: f64, overrun_pct: f64) -> f64 {
    cost * (1.0 + overrun_pct / 100.0)
}

/// Derive, validate, then run the point and quantile regressors.
pub struct CostOverrunEstimator {
    context: Arc<ModelContext>,
    config: CostConfig,
    gate: ValidationGate,
    deriver: FeatureDeriver,
    drift: Option<DriftMonitor>,
}

impl CostOverrunEstimator {
    pub fn new(context: Arc<ModelContext>, config: CostConfig, gate: ValidationGate) -> Self {
        Self {
            context,
            config,
            gate,
            deriver: FeatureDeriver::new(),
            drift: None,
        }
    }

    /// Attach drift signals to every verdict.
    pub fn with_drift(mut self, monitor: DriftMonitor) -> Self {
        self.drift = Some(monitor);
        self
    }

    pub fn predict(&self, snapshot: &ProjectSnapshot) -> Result<CostVerdict, RiskError> {
        let project = snapshot.resolve();
        self.gate.ensure(&project)?;
        let features = self.deriver.derive_resolved(&project);

        let drift_signals = self.track_drift(&features);
        let models = self.context.cost();

        let expected = models.point.predict(&features)?;
        let low = models.lower.predict(&features)?;
        let high = models.upper.predict(&features)?;

        let tier = RiskTier::bucket(
            expected,
            self.config.risk_medium_threshold,
            self.config.risk_high_threshold,
        );
        let attributions = self.attribute(models.point.as_ref(), &features);
        let metrics = models.point_metrics();

        info!(
            model = %models.model_name,
            version = %models.version,
            r2 = metrics.map(|m| m.r2),
            mae = metrics.map(|m| m.mae),
            expected,
            risk = %tier,
            "Cost prediction"
        );

        Ok(CostVerdict {
            model_version: models.version.clone(),
            expected_overrun_pct: expected,
            interval_low: low,
            interval_high: high,
            predicted_final_cost: apply_overrun(project.cost, expected),
            cost_interval_low: apply_overrun(project.cost, low),
            cost_interval_high: apply_overrun(project.cost, high),
            risk_tier: tier,
            alerts: advice::alerts(expected, snapshot, &project, &self.config),
            recommendations: advice::recommendations(tier, snapshot, &attributions),
            attributions,
            model_info: ModelInfo {
                version: models.version.clone(),
                name: models.model_name.clone(),
                r2: metrics.map(|m| m.r2),
                mae: metrics.map(|m| m.mae),
            },
            drift_signals,
        })
    }

    /// Drift signals for a feature vector; empty when drift monitoring is off.
    pub fn track_drift(&self, features: &FeatureVector) -> Vec<DriftSignal> {
        let Some(monitor) = &self.drift else {
            return Vec::new();
        };
        let signals = monitor.track(features);
        if !signals.is_empty() {
            let names: Vec<&str> = signals.iter().map(|s| s.feature.as_str()).collect();
            warn!(features = ?names, "Potential drift detected");
        }
        signals
    }

    fn attribute(&self, model: &dyn Regressor, features: &FeatureVector) -> Vec<FactorContribution> {
        match model.explain(features) {
            Ok(contributions) => top_contributors(contributions, self.config.top_contributors),
            Err(e) => {
                error!(error = %e, "Failed to compute attributions");
                Vec::new()
            }
        }
    }
}
