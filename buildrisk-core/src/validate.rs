//! Validation gate: required-field and range checks before any model runs.

use crate::config::{Bounds, ValidationConfig};
use crate::error::RiskError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read access to named numeric and label fields.
///
/// Implemented by the resolved project record and by the derived feature vector, so the gate
/// can inspect either.
pub trait FieldSource {
    fn numeric(&self, name: &str) -> Option<f64>;
    fn label(&self, name: &str) -> Option<&str>;
}

/// Outcome of a validation pass. Carries every issue found, not just the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

/// Range and presence checks with configurable bounds.
#[derive(Debug, Clone)]
pub struct ValidationGate {
    required_fields: Vec<String>,
    bounds: BTreeMap<String, Bounds>,
}

impl Default for ValidationGate {
    fn default() -> Self {
        Self::new(&ValidationConfig::default())
    }
}

impl ValidationGate {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            required_fields: config.required_fields.clone(),
            bounds: config.bounds.clone(),
        }
    }

    /// Check a record. Never fails; an invalid record yields `is_valid == false`.
    pub fn validate(&self, record: &dyn FieldSource) -> ValidationResult {
        let mut issues = Vec::new();

        for field in &self.required_fields {
            let present = match record.numeric(field) {
                Some(_) => true,
                None => record.label(field).is_some_and(|s| !s.trim().is_empty()),
            };
            if !present {
                issues.push(format!("Field '{field}' is required but missing."));
            }
        }

        for (field, bounds) in &self.bounds {
            let Some(value) = record.numeric(field) else {
                continue;
            };
            if !value.is_finite() {
                issues.push(format!("{field} is not a finite number ({value})."));
                continue;
            }
            if value < bounds.min {
                issues.push(format!(
                    "{field} below minimum ({value} < {}).",
                    bounds.min
                ));
            }
            if value > bounds.max {
                issues.push(format!(
                    "{field} above maximum ({value} > {}).",
                    bounds.max
                ));
            }
        }

        ValidationResult {
            is_valid: issues.is_empty(),
            issues,
        }
    }

    /// Validate and turn a failure into [`RiskError::Validation`].
    pub fn ensure(&self, record: &dyn FieldSource) -> Result<(), RiskError> {
        let result = self.validate(record);
        if result.is_valid {
            Ok(())
        } else {
            Err(RiskError::validation(result.issues))
        }
    }
}
