//! Two-stage delay prediction: gate classifier, then a day estimate for delayed projects only.

use super::override_policy::apply_override;
use crate::error::RiskError;
use crate::features::FeatureDeriver;
use crate::inference::{Classifier, DelayRegressor, ModelContext};
use crate::project::ProjectSnapshot;
use crate::tier::{Confidence, RiskTier};
use crate::validate::ValidationGate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// `is_delayed` iff the effective probability reaches this value.
pub const DELAY_THRESHOLD: f64 = 0.5;
pub const HIGH_TIER_CUTOFF: f64 = 0.65;
pub const MEDIUM_TIER_CUTOFF: f64 = 0.25;
const HIGH_CONFIDENCE_MARGIN: f64 = 0.25;
const MEDIUM_CONFIDENCE_MARGIN: f64 = 0.12;
/// Day estimates above this add timeline recommendations.
const LONG_DELAY_DAYS: u32 = 60;

/// Delay prediction for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskVerdict {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub is_delayed: bool,
    /// Effective probability, after the override policy.
    pub probability: f64,
    /// Classifier output before the override policy.
    pub raw_probability: f64,
    /// Zero whenever `is_delayed` is false.
    pub predicted_days: u32,
    pub risk_tier: RiskTier,
    pub confidence: Confidence,
    pub override_applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_reason: Option<String>,
    /// True when the day estimate came from the ensemble.
    pub ensemble_used: bool,
    pub model_version: String,
    pub recommendations: Vec<String>,
}

pub fn risk_tier(probability: f64) -> RiskTier {
    if probability >= HIGH_TIER_CUTOFF {
        RiskTier::High
    } else if probability >= MEDIUM_TIER_CUTOFF {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

pub fn confidence(probability: f64) -> Confidence {
    let margin = (probability - DELAY_THRESHOLD).abs();
    if margin > HIGH_CONFIDENCE_MARGIN {
        Confidence::High
    } else if margin > MEDIUM_CONFIDENCE_MARGIN {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Action items for a delay verdict.
pub fn recommendations(probability: f64, predicted_days: u32) -> Vec<String> {
    let mut out: Vec<String> = if probability > 0.7 {
        vec![
            "High delay risk detected: immediate action required.".into(),
            "Consider increasing workforce allocation.".into(),
            "Review critical path activities.".into(),
        ]
    } else if probability > 0.4 {
        vec![
            "Moderate delay risk: enhanced monitoring recommended.".into(),
            "Identify potential bottlenecks early.".into(),
        ]
    } else {
        vec!["Low delay risk: continue normal monitoring.".into()]
    };

    if predicted_days > LONG_DELAY_DAYS {
        out.push(format!(
            "Predicted delay of {predicted_days} days requires timeline revision."
        ));
        out.push("Budget for potential cost escalations.".into());
    }
    out
}

/// Gate classifier -> override policy -> threshold -> conditional day estimate.
pub struct DelayRiskCascade {
    context: Arc<ModelContext>,
    gate: ValidationGate,
    deriver: FeatureDeriver,
}

impl DelayRiskCascade {
    pub fn new(context: Arc<ModelContext>, gate: ValidationGate) -> Self {
        Self {
            context,
            gate,
            deriver: FeatureDeriver::new(),
        }
    }

    pub fn predict(
        &self,
        snapshot: &ProjectSnapshot,
        use_ensemble: bool,
    ) -> Result<RiskVerdict, RiskError> {
        let project = snapshot.resolve();
        self.gate.ensure(&project)?;
        let features = self.deriver.derive_resolved(&project);
        let models = self.context.delay();

        let raw_probability = models.classifier.predict_proba(&features)?;
        let decision = apply_override(raw_probability, &project, &features);
        if let Some(reason) = &decision.reason {
            warn!(
                project_id = snapshot.project_id.as_deref().unwrap_or("-"),
                raw_probability,
                effective = decision.effective_probability,
                reason = %reason,
                "Extreme-risk override applied"
            );
        }

        let probability = decision.effective_probability;
        let is_delayed = probability >= DELAY_THRESHOLD;

        let mut ensemble_used = false;
        let predicted_days = if is_delayed {
            let regressor = match (&models.ensemble, use_ensemble) {
                (Some(ensemble), true) => {
                    ensemble_used = true;
                    ensemble
                }
                (None, true) => {
                    info!("Ensemble requested but not loaded; using single regressor");
                    &models.regressor
                }
                (_, false) => &models.regressor,
            };
            // Saturating cast truncates toward zero.
            regressor.predict_days(&features)? as u32
        } else {
            0
        };

        let tier = risk_tier(probability);
        info!(
            model_version = %models.version,
            probability,
            is_delayed,
            predicted_days,
            risk_tier = %tier,
            "Delay prediction"
        );

        Ok(RiskVerdict {
            project_id: snapshot.project_id.clone(),
            is_delayed,
            probability,
            raw_probability,
            predicted_days,
            risk_tier: tier,
            confidence: confidence(probability),
            override_applied: decision.applied,
            override_reason: decision.reason,
            ensemble_used,
            model_version: models.version.clone(),
            recommendations: recommendations(probability, predicted_days),
        })
    }
}
