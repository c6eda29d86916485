//! # buildrisk-core: Construction project delay and cost-overrun inference
//!
//! Estimates schedule delay and budget overrun from a snapshot of project attributes using
//! pre-trained model artifacts.
//!
//! ## Pipeline
//!
//! raw record -> [`ProjectSnapshot`] -> [`FeatureVector`] -> [`ValidationGate`] ->
//! {[`DelayRiskCascade`] | [`CostOverrunEstimator`]} -> verdict, with [`DriftMonitor`]
//! signals attached as advisory warnings. Scenario simulation reruns the cost pipeline per
//! variant.
//!
//! Artifacts are loaded once into a read-only [`ModelContext`] and shared through `Arc`.

// Foundation
pub mod config;
pub mod error;

// Input and features
pub mod features;
pub mod project;
pub mod validate;

// Models
pub mod inference;

// Pipelines
pub mod cost;
pub mod delay;
pub mod drift;
pub mod tier;

// History and facade
pub mod audit;
pub mod engine;

// Re-exports
pub use config::{RiskConfig, load_config};
pub use cost::{CostOverrunEstimator, CostVerdict, Scenario, ScenarioResult};
pub use delay::{DelayRiskCascade, RiskVerdict};
pub use drift::{DriftMonitor, DriftSignal, ReferenceStatistics};
pub use engine::{BatchOutcome, ItemResult, RiskEngine};
pub use error::RiskError;
pub use features::{FeatureDeriver, FeatureVector};
pub use inference::ModelContext;
pub use project::ProjectSnapshot;
pub use tier::{Confidence, RiskTier};
pub use validate::{ValidationGate, ValidationResult};
