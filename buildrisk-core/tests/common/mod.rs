//! Shared fixtures: small hand-built model artifacts and sample projects.
#![allow(dead_code)]

use buildrisk_core::inference::artifacts::{ArtifactBundle, CostArtifacts, DelayArtifacts};
use buildrisk_core::inference::artifacts::EnsembleArtifacts;
use buildrisk_core::{ModelContext, RiskConfig, RiskEngine};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;

/// Logistic gate on the composite risk score and promoter type.
pub fn classifier() -> Value {
    json!({
        "name": "delay_gate",
        "preprocessor": {
            "numeric": [{"name": "risk_score"}],
            "categorical": [{"name": "promotertype", "categories": ["COMPANY", "INDIVIDUAL"]}]
        },
        "model": {"kind": "linear", "intercept": -3.0, "coefficients": [0.06, 0.2, -0.1]},
        "link": "logistic"
    })
}

/// Single stump on progress: `ln(1 + days)` is 4.5 below half progress, 2.0 above.
pub fn regressor() -> Value {
    json!({
        "name": "delay_days",
        "preprocessor": {"numeric": [{"name": "progress_ratio"}]},
        "model": {
            "kind": "tree_ensemble",
            "n_features": 1,
            "base_score": 0.0,
            "trees": [{"nodes": [
                {"node": "split", "feature": 0, "threshold": 0.5, "left": 1, "right": 2, "value": 3.25},
                {"node": "leaf", "value": 4.5},
                {"node": "leaf", "value": 2.0}
            ]}]
        }
    })
}

fn constant_log_days(name: &str, log_days: f64) -> Value {
    json!({
        "name": name,
        "preprocessor": {"numeric": [{"name": "progress_ratio"}]},
        "model": {"kind": "linear", "intercept": log_days, "coefficients": [0.0]}
    })
}

/// Two members at `ln(1 + days)` of 4.0 and 5.0, equally weighted.
pub fn ensemble() -> Value {
    json!({
        "members": [
            {"weight": 1.0, "estimator": constant_log_days("member_a", 4.0)},
            {"weight": 1.0, "estimator": constant_log_days("member_b", 5.0)}
        ]
    })
}

pub const COST_COLUMNS: &[&str] = &[
    "cashflow_pressure",
    "collection_efficiency",
    "progress_ratio",
    "budget_overrun_percent",
    "promotertype",
];

fn cost_estimator(name: &str, intercept: f64) -> Value {
    json!({
        "name": name,
        "preprocessor": {
            "numeric": [
                {"name": "cashflow_pressure"},
                {"name": "collection_efficiency"},
                {"name": "progress_ratio"},
                {"name": "budget_overrun_percent"}
            ],
            "categorical": [{"name": "promotertype", "categories": ["COMPANY", "INDIVIDUAL"]}]
        },
        "model": {
            "kind": "linear",
            "intercept": intercept,
            "coefficients": [10.0, -4.0, -6.0, 0.8, 1.0, -1.0]
        }
    })
}

pub fn cost() -> Value {
    json!({
        "version": "cost-2024.1",
        "model_name": "linear_baseline",
        "feature_columns": COST_COLUMNS,
        "metrics": {"linear_baseline": {"r2": 0.71, "mae": 4.2}},
        "reference_stats": {
            "budget_overrun_percent": {"mean": 5.0, "std": 5.0},
            "risk_score": {"mean": 35.0, "std": 10.0},
            "avg_temp": {"mean": 27.0, "std": 0.0}
        },
        "point_model": cost_estimator("point", 5.0),
        "quantile_lower": cost_estimator("p10", -3.0),
        "quantile_upper": cost_estimator("p90", 14.0)
    })
}

pub fn delay() -> Value {
    json!({
        "version": "delay-2024.1",
        "classifier": classifier(),
        "regressor": regressor()
    })
}

/// Write the fixture artifacts into `dir`.
pub fn write_artifacts(dir: &Path, with_ensemble: bool) {
    std::fs::write(dir.join("delay_models.json"), delay().to_string()).unwrap();
    std::fs::write(dir.join("cost_overrun.json"), cost().to_string()).unwrap();
    if with_ensemble {
        std::fs::write(dir.join("delay_ensemble.json"), ensemble().to_string()).unwrap();
    }
}

/// The fixture artifacts, parsed without touching disk.
pub fn bundle(with_ensemble: bool) -> ArtifactBundle {
    ArtifactBundle {
        delay: serde_json::from_value::<DelayArtifacts>(delay()).unwrap(),
        ensemble: with_ensemble
            .then(|| serde_json::from_value::<EnsembleArtifacts>(ensemble()).unwrap()),
        cost: serde_json::from_value::<CostArtifacts>(cost()).unwrap(),
        digests: Vec::new(),
    }
}

pub fn context(with_ensemble: bool) -> Arc<ModelContext> {
    Arc::new(ModelContext::from_bundle(bundle(with_ensemble)).unwrap())
}

/// Engine over in-memory fixture artifacts, no prediction log.
pub fn engine(with_ensemble: bool) -> RiskEngine {
    RiskEngine::new(context(with_ensemble), RiskConfig::default())
}

/// Badly over budget and barely started.
pub fn distressed_project() -> Value {
    json!({
        "project_id": "GJ-0001",
        "final_project_cost": 50_000_000.0,
        "totalunits": 100,
        "planned_duration_days": 730,
        "progress_ratio": 0.2,
        "budget_overrun_percent": 22,
        "final_project_type": "Residential",
        "promotertype": "COMPANY",
        "districttype": "Ahmedabad"
    })
}

/// Nearly finished and on budget.
pub fn healthy_project() -> Value {
    json!({
        "project_id": "GJ-0002",
        "final_project_cost": 20_000_000.0,
        "totalunits": 60,
        "planned_duration_days": 540,
        "progress_ratio": 0.9,
        "budget_overrun_percent": 0,
        "bookedunits": 58,
        "final_project_type": "Commercial",
        "promotertype": "INDIVIDUAL",
        "districttype": "Surat"
    })
}
