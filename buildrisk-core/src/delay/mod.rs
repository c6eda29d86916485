//! Delay risk: gate classifier, extreme-risk override and conditional day estimate.

pub mod cascade;
pub mod override_policy;

pub use cascade::{DelayRiskCascade, RiskVerdict};
pub use override_policy::{OverrideDecision, apply_override};
