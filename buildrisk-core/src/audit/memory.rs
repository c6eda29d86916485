//! In-process audit sink.

use super::{AuditMetadata, AuditSink, PredictionKind, PredictionOutput};
use crate::error::RiskError;
use crate::project::ProjectSnapshot;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub kind: PredictionKind,
    pub metadata: AuditMetadata,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
}

/// Keeps every recorded prediction in memory, oldest first.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(
        &self,
        input: &ProjectSnapshot,
        output: PredictionOutput<'_>,
        metadata: &AuditMetadata,
    ) -> Result<(), RiskError> {
        let entry = AuditEntry {
            kind: output.kind(),
            metadata: metadata.clone(),
            input: serde_json::Value::Object(input.to_json()),
            output: output.to_json()?,
        };
        self.entries
            .lock()
            .map_err(|_| RiskError::storage("audit buffer lock poisoned"))?
            .push(entry);
        Ok(())
    }
}
