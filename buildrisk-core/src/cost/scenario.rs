//! What-if simulation: rerun the cost pipeline over field overrides of a base project.

use super::estimator::{CostOverrunEstimator, CostVerdict};
use crate::error::RiskError;
use crate::project::ProjectSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub overrides: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub overrides: Map<String, Value>,
    pub verdict: CostVerdict,
}

/// Run every scenario against `base`. Each one starts from an untouched copy of the base, so
/// defaults that depend on an overridden field are recomputed.
///
/// Stops at the first failing scenario; the error names it.
pub fn simulate(
    estimator: &CostOverrunEstimator,
    base: &ProjectSnapshot,
    scenarios: &[Scenario],
) -> Result<Vec<ScenarioResult>, RiskError> {
    scenarios
        .iter()
        .map(|scenario| {
            let scope = format!("scenario '{}'", scenario.name);
            let mut merged = base
                .merged(&scenario.overrides)
                .map_err(|e| e.scoped(&scope))?;
            merged.scenario_name = Some(scenario.name.clone());
            let verdict = estimator.predict(&merged).map_err(|e| e.scoped(&scope))?;
            Ok(ScenarioResult {
                name: scenario.name.clone(),
                overrides: scenario.overrides.clone(),
                verdict,
            })
        })
        .collect()
}
