//! Prediction audit trail.
//!
//! The engine hands every successful prediction to an [`AuditSink`] after the fact. Sinks are
//! best-effort: a failing sink is logged and never fails the prediction.

pub mod memory;
pub mod sqlite;

pub use memory::{AuditEntry, MemoryAuditSink};
pub use sqlite::{CostRecord, CostStats, DelayRecord, DelayStats, SqlitePredictionLog};

use crate::cost::CostVerdict;
use crate::delay::RiskVerdict;
use crate::error::RiskError;
use crate::project::ProjectSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which pipeline produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionKind {
    Delay,
    Cost,
}

impl PredictionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delay => "delay",
            Self::Cost => "cost",
        }
    }
}

/// A verdict handed to a sink.
#[derive(Debug, Clone, Copy)]
pub enum PredictionOutput<'a> {
    Delay(&'a RiskVerdict),
    Cost(&'a CostVerdict),
}

impl PredictionOutput<'_> {
    pub fn kind(&self) -> PredictionKind {
        match self {
            Self::Delay(_) => PredictionKind::Delay,
            Self::Cost(_) => PredictionKind::Cost,
        }
    }

    pub fn model_version(&self) -> &str {
        match self {
            Self::Delay(v) => &v.model_version,
            Self::Cost(v) => &v.model_version,
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value, RiskError> {
        Ok(match self {
            Self::Delay(v) => serde_json::to_value(v)?,
            Self::Cost(v) => serde_json::to_value(v)?,
        })
    }
}

/// Bookkeeping attached to each audited prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditMetadata {
    pub prediction_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub model_version: String,
    pub scenario_name: Option<String>,
}

impl AuditMetadata {
    pub fn new(model_version: impl Into<String>, scenario_name: Option<String>) -> Self {
        Self {
            prediction_id: Uuid::new_v4(),
            created_at: Utc::now(),
            model_version: model_version.into(),
            scenario_name,
        }
    }
}

/// Destination for prediction history.
pub trait AuditSink: Send + Sync {
    fn record(
        &self,
        input: &ProjectSnapshot,
        output: PredictionOutput<'_>,
        metadata: &AuditMetadata,
    ) -> Result<(), RiskError>;
}
