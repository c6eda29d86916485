//! SQLite-backed prediction history.

use super::{AuditMetadata, AuditSink, PredictionOutput};
use crate::error::RiskError;
use crate::project::ProjectSnapshot;
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS cost_predictions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        prediction_id TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL,
        model_version TEXT NOT NULL,
        scenario_name TEXT,
        risk_level TEXT NOT NULL,
        expected_overrun_pct REAL NOT NULL,
        predicted_final_cost REAL NOT NULL,
        alerts TEXT NOT NULL,
        input_payload TEXT NOT NULL,
        output_payload TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS delay_predictions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        prediction_id TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL,
        model_version TEXT NOT NULL,
        project_id TEXT,
        project_type TEXT NOT NULL,
        district TEXT NOT NULL,
        is_delayed INTEGER NOT NULL,
        delay_probability REAL NOT NULL,
        predicted_delay_days INTEGER NOT NULL,
        risk_level TEXT NOT NULL,
        confidence TEXT NOT NULL,
        override_applied INTEGER NOT NULL,
        ensemble_used INTEGER NOT NULL,
        recommendations TEXT NOT NULL,
        input_payload TEXT NOT NULL,
        output_payload TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_cost_created ON cost_predictions(created_at);
    CREATE INDEX IF NOT EXISTS idx_delay_created ON delay_predictions(created_at);
";

/// A stored cost prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRecord {
    pub id: i64,
    pub prediction_id: String,
    pub created_at: String,
    pub model_version: String,
    pub scenario_name: Option<String>,
    pub risk_level: String,
    pub alerts: Vec<String>,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
}

/// A stored delay prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayRecord {
    pub id: i64,
    pub prediction_id: String,
    pub created_at: String,
    pub model_version: String,
    pub project_id: Option<String>,
    pub is_delayed: bool,
    pub delay_probability: f64,
    pub predicted_delay_days: i64,
    pub risk_level: String,
    pub confidence: String,
    pub override_applied: bool,
    pub ensemble_used: bool,
    pub recommendations: Vec<String>,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostStats {
    pub total: u64,
    pub risk_counts: BTreeMap<String, u64>,
    pub mean_overrun_pct: Option<f64>,
    pub mean_final_cost: Option<f64>,
    pub latest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayStats {
    pub total: u64,
    pub delayed: u64,
    pub on_time: u64,
    /// Delayed share of all predictions, `0.0` when there are none.
    pub delay_rate: f64,
    pub risk_counts: BTreeMap<String, u64>,
    pub confidence_counts: BTreeMap<String, u64>,
    pub mean_probability: Option<f64>,
    /// Mean predicted days over delayed predictions only.
    pub mean_delay_days: Option<f64>,
    pub project_type_distribution: BTreeMap<String, u64>,
    pub district_distribution: BTreeMap<String, u64>,
    pub latest: Option<String>,
}

/// Prediction log stored in a single SQLite file.
pub struct SqlitePredictionLog {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqlitePredictionLog {
    /// Open (or create) the log at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, RiskError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> Result<Self, RiskError> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, RiskError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, RiskError>,
    ) -> Result<T, RiskError> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| RiskError::storage("prediction log lock poisoned"))?;
        f(&guard)
    }

    pub fn recent_cost(&self, limit: usize) -> Result<Vec<CostRecord>, RiskError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, prediction_id, created_at, model_version, scenario_name, risk_level,
                        alerts, input_payload, output_payload
                 FROM cost_predictions ORDER BY created_at DESC, id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map([sql_limit(limit)], |row| {
                Ok(CostRecord {
                    id: row.get(0)?,
                    prediction_id: row.get(1)?,
                    created_at: row.get(2)?,
                    model_version: row.get(3)?,
                    scenario_name: row.get(4)?,
                    risk_level: row.get(5)?,
                    alerts: json_column(row, 6)?,
                    input: json_column(row, 7)?,
                    output: json_column(row, 8)?,
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    pub fn recent_delays(&self, limit: usize) -> Result<Vec<DelayRecord>, RiskError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, prediction_id, created_at, model_version, project_id, is_delayed,
                        delay_probability, predicted_delay_days, risk_level, confidence,
                        override_applied, ensemble_used, recommendations, input_payload,
                        output_payload
                 FROM delay_predictions ORDER BY created_at DESC, id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map([sql_limit(limit)], |row| {
                Ok(DelayRecord {
                    id: row.get(0)?,
                    prediction_id: row.get(1)?,
                    created_at: row.get(2)?,
                    model_version: row.get(3)?,
                    project_id: row.get(4)?,
                    is_delayed: row.get(5)?,
                    delay_probability: row.get(6)?,
                    predicted_delay_days: row.get(7)?,
                    risk_level: row.get(8)?,
                    confidence: row.get(9)?,
                    override_applied: row.get(10)?,
                    ensemble_used: row.get(11)?,
                    recommendations: json_column(row, 12)?,
                    input: json_column(row, 13)?,
                    output: json_column(row, 14)?,
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    pub fn cost_stats(&self) -> Result<CostStats, RiskError> {
        self.with_conn(|conn| {
            let (total, mean_overrun_pct, mean_final_cost, latest) = conn.query_row(
                "SELECT COUNT(*), AVG(expected_overrun_pct), AVG(predicted_final_cost),
                        MAX(created_at)
                 FROM cost_predictions",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<f64>>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )?;
            Ok(CostStats {
                total: total.max(0) as u64,
                risk_counts: group_counts(conn, "cost_predictions", "risk_level", TIERS)?,
                mean_overrun_pct,
                mean_final_cost,
                latest,
            })
        })
    }

    pub fn delay_stats(&self) -> Result<DelayStats, RiskError> {
        self.with_conn(|conn| {
            let (total, delayed, mean_probability, mean_delay_days, latest) = conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(is_delayed), 0),
                        AVG(delay_probability),
                        AVG(CASE WHEN is_delayed = 1 THEN predicted_delay_days END),
                        MAX(created_at)
                 FROM delay_predictions",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )?;
            let total = total.max(0) as u64;
            let delayed = delayed.max(0) as u64;
            Ok(DelayStats {
                total,
                delayed,
                on_time: total - delayed,
                delay_rate: if total == 0 {
                    0.0
                } else {
                    delayed as f64 / total as f64
                },
                risk_counts: group_counts(conn, "delay_predictions", "risk_level", TIERS)?,
                confidence_counts: group_counts(conn, "delay_predictions", "confidence", TIERS)?,
                mean_probability,
                mean_delay_days,
                project_type_distribution: group_counts(
                    conn,
                    "delay_predictions",
                    "project_type",
                    &[],
                )?,
                district_distribution: group_counts(conn, "delay_predictions", "district", &[])?,
                latest,
            })
        })
    }
}

impl AuditSink for SqlitePredictionLog {
    fn record(
        &self,
        input: &ProjectSnapshot,
        output: PredictionOutput<'_>,
        metadata: &AuditMetadata,
    ) -> Result<(), RiskError> {
        let input_json = serde_json::to_string(&input.to_json())?;
        let output_json = output.to_json()?.to_string();
        let prediction_id = metadata.prediction_id.to_string();
        let created_at = metadata.created_at.to_rfc3339();

        self.with_conn(|conn| {
            match output {
                PredictionOutput::Cost(v) => {
                    conn.execute(
                        "INSERT INTO cost_predictions (
                            prediction_id, created_at, model_version, scenario_name, risk_level,
                            expected_overrun_pct, predicted_final_cost, alerts, input_payload,
                            output_payload
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                        params![
                            prediction_id,
                            created_at,
                            metadata.model_version,
                            metadata.scenario_name,
                            v.risk_tier.as_str(),
                            v.expected_overrun_pct,
                            v.predicted_final_cost,
                            serde_json::to_string(&v.alerts)?,
                            input_json,
                            output_json,
                        ],
                    )?;
                }
                PredictionOutput::Delay(v) => {
                    conn.execute(
                        "INSERT INTO delay_predictions (
                            prediction_id, created_at, model_version, project_id, project_type,
                            district, is_delayed, delay_probability, predicted_delay_days,
                            risk_level, confidence, override_applied, ensemble_used,
                            recommendations, input_payload, output_payload
                        ) VALUES (
                            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16
                        )",
                        params![
                            prediction_id,
                            created_at,
                            metadata.model_version,
                            v.project_id,
                            input.project_type,
                            input.district,
                            v.is_delayed,
                            v.probability,
                            i64::from(v.predicted_days),
                            v.risk_tier.as_str(),
                            v.confidence.as_str(),
                            v.override_applied,
                            v.ensemble_used,
                            serde_json::to_string(&v.recommendations)?,
                            input_json,
                            output_json,
                        ],
                    )?;
                }
            }
            debug!(
                prediction_id = %prediction_id,
                kind = output.kind().as_str(),
                "Prediction logged"
            );
            Ok(())
        })
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

const TIERS: &[&str] = &["High", "Medium", "Low"];

/// Counts per distinct value of `column`, always including every key in `seed`.
fn group_counts(
    conn: &Connection,
    table: &str,
    column: &str,
    seed: &[&str],
) -> Result<BTreeMap<String, u64>, RiskError> {
    let mut counts: BTreeMap<String, u64> = seed
        .iter()
        .map(|k| (k.to_string(), 0))
        .collect();
    let mut stmt = conn.prepare(&format!(
        "SELECT {column}, COUNT(*) FROM {table} GROUP BY {column}"
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (key, n) = row?;
        counts.insert(key, n.max(0) as u64);
    }
    Ok(counts)
}
