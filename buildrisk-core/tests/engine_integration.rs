//! End-to-end tests for the risk engine over small hand-built artifacts.

mod common;

use buildrisk_core::audit::{
    AuditMetadata, AuditSink, MemoryAuditSink, PredictionKind, PredictionOutput,
    SqlitePredictionLog,
};
use buildrisk_core::config::{ArtifactConfig, RiskConfig};
use buildrisk_core::cost::advice;
use buildrisk_core::inference::{FsArtifactStore, ModelContext};
use buildrisk_core::{Confidence, ProjectSnapshot, RiskEngine, RiskError, RiskTier, Scenario};
use pretty_assertions::assert_eq;
use serde_json::{Map, json};
use std::sync::Arc;

struct FailingSink;

impl AuditSink for FailingSink {
    fn record(
        &self,
        _input: &ProjectSnapshot,
        _output: PredictionOutput<'_>,
        _metadata: &AuditMetadata,
    ) -> Result<(), RiskError> {
        Err(RiskError::storage("disk full"))
    }
}

// --- Delay cascade ---

#[test]
fn distressed_project_is_overridden_to_delayed() {
    let engine = common::engine(false);
    let verdict = engine
        .predict_delay(&common::distressed_project(), false)
        .unwrap();

    assert!(verdict.override_applied);
    assert!(verdict.is_delayed);
    assert!(verdict.raw_probability < 0.5);
    assert_eq!(verdict.probability, 0.85);
    assert_eq!(verdict.risk_tier, RiskTier::High);
    assert_eq!(verdict.confidence, Confidence::High);
    // exp(4.5) - 1 = 89.02
    assert_eq!(verdict.predicted_days, 89);
    assert!(!verdict.ensemble_used);
    assert_eq!(verdict.model_version, "delay-2024.1");
    assert_eq!(verdict.project_id.as_deref(), Some("GJ-0001"));
    assert_eq!(verdict.recommendations.len(), 5);
}

#[test]
fn healthy_project_is_not_delayed() {
    let engine = common::engine(false);
    let verdict = engine
        .predict_delay(&common::healthy_project(), false)
        .unwrap();

    assert!(!verdict.is_delayed);
    assert!(!verdict.override_applied);
    assert!(verdict.override_reason.is_none());
    assert_eq!(verdict.predicted_days, 0);
    assert_eq!(verdict.risk_tier, RiskTier::Low);
    assert_eq!(verdict.probability, verdict.raw_probability);
    assert_eq!(verdict.recommendations.len(), 1);
}

#[test]
fn ensemble_averages_member_days() {
    let engine = common::engine(true);
    let verdict = engine
        .predict_delay(&common::distressed_project(), true)
        .unwrap();
    assert!(verdict.ensemble_used);
    // ((e^4 - 1) + (e^5 - 1)) / 2 = 100.5
    assert_eq!(verdict.predicted_days, 100);

    let single = engine
        .predict_delay(&common::distressed_project(), false)
        .unwrap();
    assert!(!single.ensemble_used);
    assert_eq!(single.predicted_days, 89);
}

#[test]
fn missing_ensemble_degrades_to_single_regressor() {
    let engine = common::engine(false);
    let verdict = engine
        .predict_delay(&common::distressed_project(), true)
        .unwrap();
    assert!(!verdict.ensemble_used);
    assert_eq!(verdict.predicted_days, 89);
}

#[test]
fn malformed_delay_input_is_rejected_before_inference() {
    let engine = common::engine(false);
    let mut raw = common::distressed_project();
    raw["totalunits"] = json!("a hundred");
    let err = engine.predict_delay(&raw, false).unwrap_err();
    assert!(matches!(err, RiskError::MalformedInput(_)));
    assert!(err.to_string().contains("totalunits"));
}

#[test]
fn delay_prediction_is_deterministic() {
    let engine = common::engine(true);
    let a = engine.predict_delay(&common::distressed_project(), true).unwrap();
    let b = engine.predict_delay(&common::distressed_project(), true).unwrap();
    assert_eq!(a, b);
}

// --- Batch ---

#[test]
fn batch_isolates_failing_items() {
    let engine = common::engine(false);
    let mut broken = common::healthy_project();
    broken["project_id"] = json!("GJ-BROKEN");
    broken.as_object_mut().unwrap().remove("totalunits");

    let items = vec![
        common::distressed_project(),
        broken,
        common::healthy_project(),
    ];
    let outcomes = engine.predict_delay_batch(&items, false);

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 2);
    assert_eq!(
        outcomes.iter().map(|o| o.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert!(outcomes[0].verdict().unwrap().is_delayed);
    assert!(!outcomes[2].verdict().unwrap().is_delayed);

    assert_eq!(outcomes[1].project_id.as_deref(), Some("GJ-BROKEN"));
    let json = serde_json::to_value(&outcomes[1]).unwrap();
    assert!(json["error"].as_str().unwrap().contains("totalunits"));
}

#[test]
fn sequential_batch_matches_parallel() {
    let mut config = RiskConfig::default();
    config.batch.parallel = false;
    let sequential = RiskEngine::new(common::context(false), config);
    let parallel = common::engine(false);

    let items = vec![common::healthy_project(), common::distressed_project()];
    assert_eq!(
        sequential.predict_delay_batch(&items, false),
        parallel.predict_delay_batch(&items, false)
    );
}

// --- Cost ---

#[test]
fn cost_verdict_for_distressed_project() {
    let engine = common::engine(false);
    let verdict = engine
        .predict_cost_overrun(&common::distressed_project())
        .unwrap();

    // 5 + 10*0.4 - 4*0.5 - 6*0.2 + 0.8*22 + 1
    assert!((verdict.expected_overrun_pct - 24.4).abs() < 1e-6);
    assert!((verdict.interval_low - 16.4).abs() < 1e-6);
    assert!((verdict.interval_high - 33.4).abs() < 1e-6);
    assert!((verdict.predicted_final_cost - 50_000_000.0 * 1.244).abs() < 1.0);
    assert_eq!(verdict.risk_tier, RiskTier::Medium);

    assert_eq!(verdict.alerts, vec![advice::ALERT_LOW_PROGRESS.to_string()]);
    assert_eq!(
        verdict.recommendations,
        vec![
            advice::REC_MEDIUM.to_string(),
            advice::REC_THROUGHPUT.to_string(),
            advice::REC_CASH_COLLECTION.to_string(),
        ]
    );

    let names: Vec<&str> = verdict
        .attributions
        .iter()
        .map(|a| a.feature.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "budget_overrun_percent",
            "cashflow_pressure",
            "collection_efficiency",
            "progress_ratio",
            "promotertype"
        ]
    );
    assert_eq!(verdict.attributions[0].impact, 17.6);

    assert_eq!(verdict.model_info.name, "linear_baseline");
    assert_eq!(verdict.model_info.r2, Some(0.71));
    assert_eq!(verdict.drift_signals.len(), 1);
    assert_eq!(verdict.drift_signals[0].feature, "budget_overrun_percent");
}

#[test]
fn drift_can_be_disabled() {
    let mut config = RiskConfig::default();
    config.drift.enabled = false;
    let engine = RiskEngine::new(common::context(false), config);
    let verdict = engine
        .predict_cost_overrun(&common::distressed_project())
        .unwrap();
    assert!(verdict.drift_signals.is_empty());

    let features = engine
        .derive_features(&common::distressed_project())
        .unwrap();
    assert_eq!(engine.drift_signals(&features).len(), 1);
}

#[test]
fn cost_validation_reports_every_issue() {
    let engine = common::engine(false);
    let mut raw = common::distressed_project();
    raw["final_project_cost"] = json!(1000.0);
    raw["progress_ratio"] = json!(1.5);

    let err = engine.predict_cost_overrun(&raw).unwrap_err();
    assert!(matches!(err, RiskError::Validation { .. }));
    assert_eq!(err.issues().len(), 2);
    assert!(err.issues().iter().any(|i| i.contains("final_project_cost")));
    assert!(err.issues().iter().any(|i| i.contains("progress_ratio")));
}

#[test]
fn delay_path_uses_the_same_gate() {
    let engine = common::engine(false);
    let mut raw = common::distressed_project();
    raw["planned_duration_days"] = json!(5);
    assert!(matches!(
        engine.predict_delay(&raw, false),
        Err(RiskError::Validation { .. })
    ));
}

// --- Scenarios ---

#[test]
fn scenario_matches_direct_prediction_of_merged_input() {
    let engine = common::engine(false);
    let base_raw = common::distressed_project();
    let base = ProjectSnapshot::from_json(&base_raw).unwrap();

    let mut overrides = Map::new();
    overrides.insert("final_project_cost".into(), json!(base.cost * 1.2));
    let scenarios = vec![Scenario {
        name: "A".into(),
        overrides: overrides.clone(),
    }];

    let simulated = engine.simulate_cost_overrun(&base_raw, &scenarios).unwrap();
    let direct = engine
        .predict_cost_snapshot(&base.merged(&overrides).unwrap())
        .unwrap();

    assert_eq!(simulated.len(), 1);
    assert_eq!(simulated[0].name, "A");
    assert_eq!(simulated[0].overrides, overrides);
    assert_eq!(simulated[0].verdict, direct);
}

#[test]
fn scenarios_do_not_leak_into_each_other() {
    let engine = common::engine(false);
    let base_raw = common::distressed_project();

    let mut lower_overrun = Map::new();
    lower_overrun.insert("budget_overrun_percent".into(), json!(2));
    let scenarios = vec![
        Scenario {
            name: "recovered".into(),
            overrides: lower_overrun,
        },
        Scenario {
            name: "baseline".into(),
            overrides: Map::new(),
        },
    ];

    let results = engine.simulate_cost_overrun(&base_raw, &scenarios).unwrap();
    let baseline = engine.predict_cost_overrun(&base_raw).unwrap();
    assert_eq!(results[1].verdict, baseline);
    assert!(results[0].verdict.expected_overrun_pct < baseline.expected_overrun_pct);
}

#[test]
fn failing_scenario_is_named() {
    let engine = common::engine(false);
    let mut overrides = Map::new();
    overrides.insert("progress_ratio".into(), json!(3.0));
    let err = engine
        .simulate_cost_overrun(
            &common::distressed_project(),
            &[Scenario {
                name: "overshoot".into(),
                overrides,
            }],
        )
        .unwrap_err();
    assert!(err.issues()[0].starts_with("scenario 'overshoot'"));
}

// --- Audit ---

#[test]
fn predictions_are_logged_but_simulations_are_not() {
    let dir = tempfile::TempDir::new().unwrap();
    let log = Arc::new(SqlitePredictionLog::open(&dir.path().join("predictions.db")).unwrap());
    let engine = common::engine(false).with_audit(log.clone());

    engine
        .predict_delay(&common::distressed_project(), false)
        .unwrap();
    engine
        .predict_cost_overrun(&common::healthy_project())
        .unwrap();
    engine
        .simulate_cost_overrun(
            &common::healthy_project(),
            &[Scenario {
                name: "noop".into(),
                overrides: Map::new(),
            }],
        )
        .unwrap();

    let delays = log.recent_delays(10).unwrap();
    assert_eq!(delays.len(), 1);
    assert!(delays[0].is_delayed);
    assert!(delays[0].override_applied);
    assert_eq!(delays[0].predicted_delay_days, 89);

    let costs = log.recent_cost(10).unwrap();
    assert_eq!(costs.len(), 1);
    assert_eq!(costs[0].model_version, "cost-2024.1");
    assert_eq!(costs[0].risk_level, "Low");

    let stats = log.delay_stats().unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.delay_rate, 1.0);
}

#[test]
fn memory_sink_records_kind_and_version() {
    let sink = Arc::new(MemoryAuditSink::new());
    let engine = common::engine(false).with_audit(sink.clone());
    engine
        .predict_cost_overrun(&common::distressed_project())
        .unwrap();

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, PredictionKind::Cost);
    assert_eq!(entries[0].metadata.model_version, "cost-2024.1");
    assert_eq!(entries[0].input["districttype"], "Ahmedabad");
}

#[test]
fn audit_failure_never_fails_the_prediction() {
    let engine = common::engine(false).with_audit(Arc::new(FailingSink));
    assert!(engine.predict_delay(&common::healthy_project(), false).is_ok());
    assert!(engine.predict_cost_overrun(&common::healthy_project()).is_ok());
}

// --- Artifacts ---

#[test]
fn engine_loads_from_workspace_layout() {
    let dir = tempfile::TempDir::new().unwrap();
    let models = dir.path().join("models");
    std::fs::create_dir_all(&models).unwrap();
    common::write_artifacts(&models, true);

    let engine = RiskEngine::load(RiskConfig::default(), dir.path()).unwrap();
    assert!(engine.context().has_ensemble());
    assert_eq!(engine.context().digests().len(), 3);
    assert!(dir.path().join("data").join("predictions.db").exists());

    let verdict = engine
        .predict_delay(&common::distressed_project(), true)
        .unwrap();
    assert!(verdict.ensemble_used);
}

#[test]
fn broken_tree_fails_artifact_load() {
    let dir = tempfile::TempDir::new().unwrap();
    common::write_artifacts(dir.path(), false);
    let mut delay = common::delay();
    delay["regressor"]["model"]["trees"][0]["nodes"][0]["left"] = json!(0);
    std::fs::write(dir.path().join("delay_models.json"), delay.to_string()).unwrap();

    let store = FsArtifactStore::new(dir.path(), &ArtifactConfig::default());
    assert!(matches!(
        ModelContext::load(&store),
        Err(RiskError::ArtifactLoad(_))
    ));
}

#[test]
fn bad_ensemble_weights_fail_artifact_load() {
    let dir = tempfile::TempDir::new().unwrap();
    common::write_artifacts(dir.path(), true);
    let mut ensemble = common::ensemble();
    ensemble["members"][0]["weight"] = json!(-1.0);
    std::fs::write(dir.path().join("delay_ensemble.json"), ensemble.to_string()).unwrap();

    let store = FsArtifactStore::new(dir.path(), &ArtifactConfig::default());
    assert!(ModelContext::load(&store).is_err());
}

#[test]
fn shape_mismatch_is_a_per_prediction_error() {
    let mut cost = common::cost();
    cost["point_model"]["model"]["coefficients"] = json!([1.0, 2.0]);
    let mut bundle = common::bundle(false);
    bundle.cost = serde_json::from_value(cost).unwrap();
    let engine = RiskEngine::new(
        Arc::new(ModelContext::from_bundle(bundle).unwrap()),
        RiskConfig::default(),
    );

    let err = engine
        .predict_cost_overrun(&common::distressed_project())
        .unwrap_err();
    assert!(matches!(err, RiskError::Inference(_)));
    // the delay pipeline is unaffected
    assert!(engine.predict_delay(&common::distressed_project(), false).is_ok());
}

// --- Cost edge cases ---

#[test]
fn collections_alert_fires_against_defaulted_selling_amount() {
    let engine = common::engine(false);
    let mut raw = common::healthy_project();
    // selling defaults to 1.2 * 2e7, so collections are at 25%
    raw["totalreceivedamount"] = json!(6_000_000.0);

    let features = engine.derive_features(&raw).unwrap();
    let efficiency = features.get("collection_efficiency").unwrap();
    assert!((efficiency - 0.25).abs() < 1e-9);

    let verdict = engine.predict_cost_overrun(&raw).unwrap();
    assert_eq!(
        verdict.alerts,
        vec!["Collections below 50% of sales; liquidity risk.".to_string()]
    );
}

#[test]
fn inverted_quantile_interval_passes_through() {
    let mut cost = common::cost();
    cost["quantile_lower"]["model"]["intercept"] = json!(50.0);
    cost["quantile_upper"]["model"]["intercept"] = json!(-50.0);
    let mut bundle = common::bundle(false);
    bundle.cost = serde_json::from_value(cost).unwrap();
    let engine = RiskEngine::new(
        Arc::new(ModelContext::from_bundle(bundle).unwrap()),
        RiskConfig::default(),
    );

    let verdict = engine
        .predict_cost_overrun(&common::distressed_project())
        .unwrap();
    assert!((verdict.interval_low - 69.4).abs() < 1e-6);
    assert!((verdict.interval_high + 30.6).abs() < 1e-6);
    assert!(verdict.interval_low > verdict.interval_high);
    assert!((verdict.cost_interval_low - 84_700_000.0).abs() < 1.0);
    assert!((verdict.cost_interval_high - 34_700_000.0).abs() < 1.0);
    assert!(verdict.cost_interval_low > verdict.cost_interval_high);
}
