//! The risk engine: one entry point over both prediction pipelines.
//!
//! Holds the shared [`ModelContext`] and the component instances built from it. Every
//! operation is a synchronous pure computation over its input; only [`RiskEngine::load`]
//! touches the filesystem for artifacts. Successful predictions are handed to the audit sink
//! when one is attached.

use crate::audit::{AuditMetadata, AuditSink, PredictionOutput, SqlitePredictionLog};
use crate::config::{RiskConfig, resolve_path};
use crate::cost::{CostOverrunEstimator, CostVerdict, Scenario, ScenarioResult, simulate};
use crate::delay::{DelayRiskCascade, RiskVerdict};
use crate::drift::{DriftMonitor, DriftSignal};
use crate::error::RiskError;
use crate::features::{FeatureDeriver, FeatureVector};
use crate::inference::{FsArtifactStore, ModelContext};
use crate::project::{ProjectSnapshot, fields};
use crate::validate::{ValidationGate, ValidationResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Result of one batch item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemResult {
    Verdict(RiskVerdict),
    Error(String),
}

/// Per-item batch outcome, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub index: usize,
    pub project_id: Option<String>,
    #[serde(flatten)]
    pub result: ItemResult,
}

impl BatchOutcome {
    pub fn verdict(&self) -> Option<&RiskVerdict> {
        match &self.result {
            ItemResult::Verdict(v) => Some(v),
            ItemResult::Error(_) => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.verdict().is_some()
    }
}

pub struct RiskEngine {
    context: Arc<ModelContext>,
    config: RiskConfig,
    deriver: FeatureDeriver,
    gate: ValidationGate,
    delay: DelayRiskCascade,
    cost: CostOverrunEstimator,
    drift: DriftMonitor,
    audit: Option<Arc<dyn AuditSink>>,
}

impl RiskEngine {
    pub fn new(context: Arc<ModelContext>, config: RiskConfig) -> Self {
        let gate = ValidationGate::new(&config.validation);
        let drift = DriftMonitor::new(context.reference_stats(), config.drift.zscore_threshold);

        let mut cost =
            CostOverrunEstimator::new(Arc::clone(&context), config.cost.clone(), gate.clone());
        if config.drift.enabled {
            cost = cost.with_drift(drift.clone());
        }

        Self {
            delay: DelayRiskCascade::new(Arc::clone(&context), gate.clone()),
            cost,
            drift,
            gate,
            deriver: FeatureDeriver::new(),
            context,
            config,
            audit: None,
        }
    }

    /// Load artifacts and open the prediction log per `config`, resolving relative paths
    /// against `workspace`.
    ///
    /// Artifact failures are fatal. A prediction log that cannot be opened is logged and
    /// skipped.
    pub fn load(config: RiskConfig, workspace: &Path) -> Result<Self, RiskError> {
        let dir = resolve_path(workspace, &config.artifacts.dir);
        info!(dir = %dir.display(), "Loading model artifacts");
        let context = ModelContext::load(&FsArtifactStore::new(dir, &config.artifacts))?;

        let audit: Option<Arc<dyn AuditSink>> = if config.audit.enabled {
            let db_path = resolve_path(workspace, &config.audit.db_path);
            match SqlitePredictionLog::open(&db_path) {
                Ok(log) => Some(Arc::new(log) as Arc<dyn AuditSink>),
                Err(e) => {
                    warn!(
                        path = %db_path.display(),
                        error = %e,
                        "Prediction log unavailable; history disabled"
                    );
                    None
                }
            }
        } else {
            None
        };

        let engine = Self::new(context, config);
        Ok(match audit {
            Some(sink) => engine.with_audit(sink),
            None => engine,
        })
    }

    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn context(&self) -> &Arc<ModelContext> {
        &self.context
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Parse and derive without running any model.
    pub fn derive_features(&self, raw: &Value) -> Result<FeatureVector, RiskError> {
        self.deriver.derive_json(raw)
    }

    /// Run the validation gate on a raw record, after defaults are applied.
    pub fn validate(&self, raw: &Value) -> Result<ValidationResult, RiskError> {
        let snapshot = ProjectSnapshot::from_json(raw)?;
        Ok(self.gate.validate(&snapshot.resolve()))
    }

    pub fn predict_delay(&self, raw: &Value, use_ensemble: bool) -> Result<RiskVerdict, RiskError> {
        let snapshot = ProjectSnapshot::from_json(raw)?;
        self.predict_delay_snapshot(&snapshot, use_ensemble)
    }

    pub fn predict_delay_snapshot(
        &self,
        snapshot: &ProjectSnapshot,
        use_ensemble: bool,
    ) -> Result<RiskVerdict, RiskError> {
        let verdict = self.delay.predict(snapshot, use_ensemble)?;
        self.record(snapshot, PredictionOutput::Delay(&verdict));
        Ok(verdict)
    }

    /// Predict every item independently. A failing item yields an error outcome and never
    /// affects its siblings.
    pub fn predict_delay_batch(&self, items: &[Value], use_ensemble: bool) -> Vec<BatchOutcome> {
        let run = |(index, raw): (usize, &Value)| BatchOutcome {
            index,
            project_id: project_id_of(raw),
            result: match self.predict_delay(raw, use_ensemble) {
                Ok(verdict) => ItemResult::Verdict(verdict),
                Err(e) => {
                    warn!(index, error = %e, "Batch item failed");
                    ItemResult::Error(e.to_string())
                }
            },
        };

        let outcomes: Vec<BatchOutcome> = if self.config.batch.parallel {
            items.par_iter().enumerate().map(run).collect()
        } else {
            items.iter().enumerate().map(run).collect()
        };

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        info!(total = outcomes.len(), failed, "Delay batch complete");
        outcomes
    }

    pub fn predict_cost_overrun(&self, raw: &Value) -> Result<CostVerdict, RiskError> {
        let snapshot = ProjectSnapshot::from_json(raw)?;
        self.predict_cost_snapshot(&snapshot)
    }

    pub fn predict_cost_snapshot(&self, snapshot: &ProjectSnapshot) -> Result<CostVerdict, RiskError> {
        let verdict = self.cost.predict(snapshot)?;
        self.record(snapshot, PredictionOutput::Cost(&verdict));
        Ok(verdict)
    }

    /// What-if simulation over `base`. Nothing is persisted.
    pub fn simulate_cost_overrun(
        &self,
        base: &Value,
        scenarios: &[Scenario],
    ) -> Result<Vec<ScenarioResult>, RiskError> {
        let base = ProjectSnapshot::from_json(base)?;
        let results = simulate(&self.cost, &base, scenarios)?;
        info!(scenarios = results.len(), "Scenario simulation complete");
        Ok(results)
    }

    /// Drift signals for a feature vector against the cost model's reference statistics.
    pub fn drift_signals(&self, features: &FeatureVector) -> Vec<DriftSignal> {
        self.drift.track(features)
    }

    fn record(&self, snapshot: &ProjectSnapshot, output: PredictionOutput<'_>) {
        let Some(sink) = &self.audit else {
            return;
        };
        let metadata = AuditMetadata::new(output.model_version(), snapshot.scenario_name.clone());
        if let Err(e) = sink.record(snapshot, output, &metadata) {
            error!(
                prediction_id = %metadata.prediction_id,
                kind = output.kind().as_str(),
                error = %e,
                "Failed to record prediction"
            );
        }
    }
}

/// `project_id` of a raw record, if it has a usable one.
fn project_id_of(raw: &Value) -> Option<String> {
    match raw.get(fields::PROJECT_ID)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl std::fmt::Debug for RiskEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskEngine")
            .field("context", &self.context)
            .field("audit", &self.audit.is_some())
            .finish()
    }
}
