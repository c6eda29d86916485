//! Hand-tuned floor on the delay probability for extreme-risk inputs.
//!
//! The gate classifier under-predicts on the rare projects that are both badly over budget and
//! barely started. These rules lift its probability to a fixed floor; they never lower it.

use crate::features::FeatureVector;
use crate::features::catalogue::RISK_SCORE;
use crate::project::ResolvedProject;
use serde::{Deserialize, Serialize};

/// One extreme-risk rule.
#[derive(Debug, Clone, Copy)]
struct OverrideRule {
    floor: f64,
    reason: &'static str,
    applies: fn(&ResolvedProject, &FeatureVector) -> bool,
}

const RULES: &[OverrideRule] = &[
    OverrideRule {
        floor: 0.85,
        reason: "budget overrun above 20% with progress below 25%",
        applies: |p, _| p.budget_overrun_percent > 20.0 && p.progress_ratio < 0.25,
    },
    OverrideRule {
        floor: 0.75,
        reason: "budget overrun above 15% with progress below 35%",
        applies: |p, _| p.budget_overrun_percent > 15.0 && p.progress_ratio < 0.35,
    },
    OverrideRule {
        floor: 0.80,
        reason: "composite risk score above 70",
        applies: |_, f| f.get(RISK_SCORE).is_some_and(|s| s > 70.0),
    },
];

/// Result of applying the override policy to a raw probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideDecision {
    pub effective_probability: f64,
    /// True iff the effective probability is strictly above the raw one.
    pub applied: bool,
    pub reason: Option<String>,
}

/// `override(raw, snapshot, features) -> (effective, applied, reason)`.
///
/// The highest floor among the matching rules wins; the effective probability is
/// `max(raw, floor)`.
pub fn apply_override(
    raw_probability: f64,
    project: &ResolvedProject,
    features: &FeatureVector,
) -> OverrideDecision {
    let strongest = RULES
        .iter()
        .filter(|rule| (rule.applies)(project, features))
        .max_by(|a, b| a.floor.total_cmp(&b.floor));

    match strongest {
        Some(rule) if rule.floor > raw_probability => OverrideDecision {
            effective_probability: rule.floor,
            applied: true,
            reason: Some(rule.reason.to_string()),
        },
        _ => OverrideDecision {
            effective_probability: raw_probability,
            applied: false,
            reason: None,
        },
    }
}
