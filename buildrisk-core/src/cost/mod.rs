//! Cost overrun: point + quantile estimate, attribution, alerts and scenario simulation.

pub mod advice;
pub mod estimator;
pub mod scenario;

pub use estimator::{CostOverrunEstimator, CostVerdict, Direction, FactorContribution, ModelInfo};
pub use scenario::{Scenario, ScenarioResult, simulate};
