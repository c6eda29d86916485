//! Alert and recommendation text for cost verdicts.
//!
//! Progress checks read the value the caller actually supplied. The collections check needs a
//! supplied received amount and compares it against the resolved selling amount, so a
//! defaulted selling amount still counts.

use super::estimator::FactorContribution;
use crate::config::CostConfig;
use crate::features::catalogue::CASH_FLOW_FEATURES;
use crate::project::ProjectSnapshot;
use crate::project::defaults::ResolvedProject;
use crate::tier::RiskTier;

pub const ALERT_OVERRUN: &str = "Predicted cost overrun exceeds alert threshold.";
pub const ALERT_LOW_PROGRESS: &str = "Low progress ratio with rising costs.";

pub const REC_HIGH: &str = "Activate cost-control task force and re-baseline budget.";
pub const REC_MEDIUM: &str = "Tighten procurement approvals and monitor weekly.";
pub const REC_LOW: &str = "Maintain monthly monitoring cadence.";
pub const REC_THROUGHPUT: &str = "Increase execution throughput to avoid compounding overruns.";
pub const REC_CASH_COLLECTION: &str = "Improve cash collection to reduce financing strain.";

/// Progress below this adds the throughput recommendation.
const THROUGHPUT_PROGRESS_CUTOFF: f64 = 0.5;
/// How many of the leading attributions are checked for cash-flow features.
const CASH_FLOW_LOOKAHEAD: usize = 2;

/// Supplied and non-zero, as a truthiness test on optional input.
fn supplied(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

pub fn alerts(
    expected_pct: f64,
    snapshot: &ProjectSnapshot,
    project: &ResolvedProject,
    config: &CostConfig,
) -> Vec<String> {
    let mut alerts = Vec::new();

    if expected_pct >= config.alert_threshold_percent {
        alerts.push(ALERT_OVERRUN.to_string());
    }

    if supplied(snapshot.progress_ratio).is_some_and(|p| p < config.liquidity_progress_cutoff) {
        alerts.push(ALERT_LOW_PROGRESS.to_string());
    }

    if let Some(received) = supplied(snapshot.received_amount)
        && project.selling_amount > 0.0
        && received / project.selling_amount < config.collection_efficiency_floor
    {
        alerts.push(format!(
            "Collections below {:.0}% of sales; liquidity risk.",
            config.collection_efficiency_floor * 100.0
        ));
    }

    alerts
}

pub fn recommendations(
    tier: RiskTier,
    snapshot: &ProjectSnapshot,
    contributors: &[FactorContribution],
) -> Vec<String> {
    let mut recs = vec![
        match tier {
            RiskTier::High => REC_HIGH,
            RiskTier::Medium => REC_MEDIUM,
            RiskTier::Low => REC_LOW,
        }
        .to_string(),
    ];

    if supplied(snapshot.progress_ratio).is_some_and(|p| p < THROUGHPUT_PROGRESS_CUTOFF) {
        recs.push(REC_THROUGHPUT.to_string());
    }

    if contributors
        .iter()
        .take(CASH_FLOW_LOOKAHEAD)
        .any(|c| CASH_FLOW_FEATURES.contains(&c.feature.as_str()))
    {
        recs.push(REC_CASH_COLLECTION.to_string());
    }

    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::estimator::Direction;
    use serde_json::json;

    fn snapshot(extra: serde_json::Value) -> ProjectSnapshot {
        let mut raw = json!({
            "final_project_cost": 1e7,
            "totalunits": 50,
            "planned_duration_days": 400,
            "final_project_type": "Commercial",
            "promotertype": "INDIVIDUAL",
            "districttype": "Surat"
        });
        if let (Some(base), Some(extra)) = (raw.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        ProjectSnapshot::from_json(&raw).unwrap()
    }

    fn contributor(feature: &str) -> FactorContribution {
        FactorContribution {
            feature: feature.to_string(),
            impact: 1.0,
            direction: Direction::Positive,
        }
    }

    #[test]
    fn test_sparse_input_raises_only_threshold_alert() {
        let config = CostConfig::default();
        let s = snapshot(json!({}));
        assert!(alerts(10.0, &s, &s.resolve(), &config).is_empty());
        assert_eq!(
            alerts(25.0, &s, &s.resolve(), &config),
            vec![ALERT_OVERRUN.to_string()]
        );
    }

    #[test]
    fn test_progress_and_collection_alerts() {
        let s = snapshot(json!({
            "progress_ratio": 0.3,
            "totalreceivedamount": 2e6,
            "totalsellingamount": 1e7
        }));
        let a = alerts(0.0, &s, &s.resolve(), &CostConfig::default());
        assert_eq!(
            a,
            vec![
                ALERT_LOW_PROGRESS.to_string(),
                "Collections below 50% of sales; liquidity risk.".to_string()
            ]
        );
    }

    #[test]
    fn test_collection_alert_uses_defaulted_selling_amount() {
        let config = CostConfig::default();
        // selling defaults to 1.2 * 1e7
        let s = snapshot(json!({"totalreceivedamount": 3e6}));
        assert_eq!(
            alerts(0.0, &s, &s.resolve(), &config),
            vec!["Collections below 50% of sales; liquidity risk.".to_string()]
        );

        let s = snapshot(json!({"totalreceivedamount": 6e6}));
        assert!(alerts(0.0, &s, &s.resolve(), &config).is_empty());
    }

    #[test]
    fn test_zero_progress_counts_as_unspecified() {
        let s = snapshot(json!({"progress_ratio": 0.0}));
        assert!(alerts(0.0, &s, &s.resolve(), &CostConfig::default()).is_empty());
        assert_eq!(recommendations(RiskTier::Low, &s, &[]), vec![REC_LOW]);
    }

    #[test]
    fn test_recommendations_by_tier() {
        let s = snapshot(json!({}));
        assert_eq!(recommendations(RiskTier::High, &s, &[])[0], REC_HIGH);
        assert_eq!(recommendations(RiskTier::Medium, &s, &[])[0], REC_MEDIUM);
    }

    #[test]
    fn test_cash_flow_recommendation_checks_top_two_only() {
        let s = snapshot(json!({"progress_ratio": 0.45}));
        let recs = recommendations(
            RiskTier::Low,
            &s,
            &[contributor("cost_per_unit"), contributor("cashflow_pressure")],
        );
        assert_eq!(recs, vec![REC_LOW, REC_THROUGHPUT, REC_CASH_COLLECTION]);

        let recs = recommendations(
            RiskTier::Low,
            &s,
            &[
                contributor("cost_per_unit"),
                contributor("booking_rate"),
                contributor("collection_efficiency"),
            ],
        );
        assert_eq!(recs, vec![REC_LOW, REC_THROUGHPUT]);
    }
}
