//! Fixed-weight averaging over log-day regressors.

use super::DelayRegressor;
use crate::error::RiskError;
use crate::features::FeatureVector;
use std::sync::Arc;

/// Weighted average of several delay regressors.
///
/// Each member is inverted to days on its own before averaging, so the ensemble answers in
/// day space and reports `ln(1 + days)` when asked for a log value.
pub struct WeightedEnsemble {
    members: Vec<(Arc<dyn DelayRegressor>, f64)>,
    total_weight: f64,
}

impl WeightedEnsemble {
    /// Weights must be finite and non-negative with a positive sum.
    pub fn new(members: Vec<(Arc<dyn DelayRegressor>, f64)>) -> Result<Self, RiskError> {
        if members.is_empty() {
            return Err(RiskError::artifact("ensemble has no members"));
        }
        if let Some((_, w)) = members.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(RiskError::artifact(format!(
                "ensemble weight {w} is not a finite non-negative number"
            )));
        }
        let total_weight: f64 = members.iter().map(|(_, w)| w).sum();
        if total_weight <= 0.0 {
            return Err(RiskError::artifact("ensemble weights sum to zero"));
        }
        Ok(Self {
            members,
            total_weight,
        })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl DelayRegressor for WeightedEnsemble {
    fn predict_log_days(&self, features: &FeatureVector) -> Result<f64, RiskError> {
        Ok(self.predict_days(features)?.ln_1p())
    }

    fn predict_days(&self, features: &FeatureVector) -> Result<f64, RiskError> {
        let mut weighted = 0.0;
        for (member, weight) in &self.members {
            weighted += weight * member.predict_days(features)?;
        }
        Ok(weighted / self.total_weight)
    }
}

impl std::fmt::Debug for WeightedEnsemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightedEnsemble")
            .field("members", &self.members.len())
            .field("total_weight", &self.total_weight)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLog(f64);

    impl DelayRegressor for FixedLog {
        fn predict_log_days(&self, _: &FeatureVector) -> Result<f64, RiskError> {
            Ok(self.0)
        }
    }

    fn member(days: f64) -> Arc<dyn DelayRegressor> {
        Arc::new(FixedLog(days.ln_1p()))
    }

    fn empty() -> FeatureVector {
        FeatureVector::from_parts(Vec::new(), Vec::new())
    }

    #[test]
    fn test_members_averaged_in_day_space() {
        let ens = WeightedEnsemble::new(vec![(member(100.0), 3.0), (member(200.0), 1.0)]).unwrap();
        let days = ens.predict_days(&empty()).unwrap();
        assert!((days - 125.0).abs() < 1e-9, "{days}");
        assert!((ens.predict_log_days(&empty()).unwrap() - days.ln_1p()).abs() < 1e-12);
    }

    #[test]
    fn test_negative_members_floor_before_averaging() {
        let ens = WeightedEnsemble::new(vec![
            (Arc::new(FixedLog(-5.0)) as Arc<dyn DelayRegressor>, 1.0),
            (member(40.0), 1.0),
        ])
        .unwrap();
        assert!((ens.predict_days(&empty()).unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_bad_weights_rejected() {
        assert!(WeightedEnsemble::new(vec![]).is_err());
        assert!(WeightedEnsemble::new(vec![(member(1.0), -1.0)]).is_err());
        assert!(WeightedEnsemble::new(vec![(member(1.0), f64::NAN)]).is_err());
        assert!(matches!(
            WeightedEnsemble::new(vec![(member(1.0), 0.0), (member(2.0), 0.0)]),
            Err(RiskError::ArtifactLoad(_))
        ));
    }

    #[test]
    fn test_zero_weight_member_is_ignored() {
        let ens = WeightedEnsemble::new(vec![(member(10.0), 1.0), (member(1000.0), 0.0)]).unwrap();
        assert!((ens.predict_days(&empty()).unwrap() - 10.0).abs() < 1e-9);
    }
}
