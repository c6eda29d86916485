//! Feature drift against training-time reference statistics.
//!
//! Advisory only: drift signals are attached to verdicts as warnings and never block a
//! prediction.

use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Mean and standard deviation of one feature over the training set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub mean: f64,
    pub std: f64,
}

/// Per-feature reference statistics captured at training time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceStatistics(BTreeMap<String, FeatureStats>);

impl ReferenceStatistics {
    pub fn new(stats: impl IntoIterator<Item = (String, FeatureStats)>) -> Self {
        Self(stats.into_iter().collect())
    }

    pub fn get(&self, feature: &str) -> Option<&FeatureStats> {
        self.0.get(feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureStats)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftSignal {
    pub feature: String,
    pub zscore: f64,
    pub current_value: f64,
    pub reference_mean: f64,
}

/// Compares live feature vectors against [`ReferenceStatistics`].
#[derive(Debug, Clone)]
pub struct DriftMonitor {
    reference: Arc<ReferenceStatistics>,
    threshold: f64,
}

impl DriftMonitor {
    pub const DEFAULT_THRESHOLD: f64 = 3.0;

    pub fn new(reference: Arc<ReferenceStatistics>, threshold: f64) -> Self {
        Self {
            reference,
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Signal every referenced feature whose z-score reaches the threshold.
    ///
    /// Features with zero or non-finite spread, and features absent from the vector, are
    /// skipped.
    pub fn track(&self, features: &FeatureVector) -> Vec<DriftSignal> {
        self.reference
            .iter()
            .filter_map(|(name, stats)| {
                if stats.std == 0.0 || !stats.std.is_finite() || !stats.mean.is_finite() {
                    return None;
                }
                let value = features.get(name)?;
                let zscore = (value - stats.mean).abs() / stats.std.abs();
                (zscore >= self.threshold).then(|| DriftSignal {
                    feature: name.to_string(),
                    zscore,
                    current_value: value,
                    reference_mean: stats.mean,
                })
            })
            .collect()
    }
}
