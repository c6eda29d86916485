//! Snapshot -> feature vector.
//!
//! The transforms here must match the ones applied when the models were trained, bit for bit.
//! Everything is a pure function of the resolved snapshot.

use super::binning::{OVERRUN_BANDS, PROGRESS_STAGES};
use super::catalogue as names;
use crate::error::RiskError;
use crate::project::{ProjectSnapshot, ResolvedProject, fields};
use crate::validate::FieldSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every numeric feature is clamped into `[-FEATURE_LIMIT, FEATURE_LIMIT]`.
pub const FEATURE_LIMIT: f64 = 1e10;

const EPS: f64 = 1e-6;
const REFERENCE_TEMP: f64 = 27.0;
const LARGE_PROJECT_UNITS: f64 = 100.0;
const HIGH_COST: f64 = 5e7;

// Risk score weights; the score stays within [0, 100].
const RISK_WEIGHT_OVERRUN: f64 = 0.35;
const RISK_WEIGHT_INVERSE_PROGRESS: f64 = 0.30;
const RISK_WEIGHT_BOOKING_LAG: f64 = 0.15;
const RISK_WEIGHT_DURATION_OVERRUN: f64 = 0.20;

/// Replace non-finite values with 0 and clamp into the feature range.
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-FEATURE_LIMIT, FEATURE_LIMIT)
    } else {
        0.0
    }
}

/// Derived features for one snapshot: numerics plus categorical labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    numerics: BTreeMap<String, f64>,
    labels: BTreeMap<String, String>,
}

impl FeatureVector {
    /// Build a vector directly. Numerics are sanitized on the way in.
    pub fn from_parts(
        numerics: impl IntoIterator<Item = (String, f64)>,
        labels: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            numerics: numerics
                .into_iter()
                .map(|(name, value)| (name, sanitize(value)))
                .collect(),
            labels: labels.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.numerics.get(name).copied()
    }

    pub fn get_label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    pub fn numerics(&self) -> impl Iterator<Item = (&str, f64)> {
        self.numerics.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.numerics.len() + self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numerics.is_empty() && self.labels.is_empty()
    }
}

impl FieldSource for FeatureVector {
    fn numeric(&self, name: &str) -> Option<f64> {
        self.get(name)
    }

    fn label(&self, name: &str) -> Option<&str> {
        self.get_label(name)
    }
}

/// Stateless feature deriver.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureDeriver;

impl FeatureDeriver {
    pub fn new() -> Self {
        Self
    }

    /// Parse a raw JSON record and derive its features.
    pub fn derive_json(&self, raw: &serde_json::Value) -> Result<FeatureVector, RiskError> {
        Ok(self.derive(&ProjectSnapshot::from_json(raw)?))
    }

    /// Resolve defaults and derive.
    pub fn derive(&self, snapshot: &ProjectSnapshot) -> FeatureVector {
        self.derive_resolved(&snapshot.resolve())
    }

    /// Derive the full feature superset from an already resolved record.
    pub fn derive_resolved(&self, p: &ResolvedProject) -> FeatureVector {
        let mut numerics: Vec<(&'static str, f64)> = fields::NUMERIC
            .iter()
            .map(|name| (*name, p.numeric(name).unwrap_or(0.0)))
            .collect();
        numerics.extend(delay_features(p));
        numerics.extend(cost_features(p));

        let labels = [
            (fields::PROJECT_TYPE, p.project_type.clone()),
            (fields::PROMOTER_TYPE, p.promoter_type.clone()),
            (fields::DISTRICT, p.district.clone()),
            (
                names::OVERRUN_BAND,
                OVERRUN_BANDS.label(p.budget_overrun_percent).to_string(),
            ),
            (
                names::PROGRESS_STAGE,
                PROGRESS_STAGES.label(p.progress_ratio).to_string(),
            ),
        ];

        FeatureVector::from_parts(
            numerics.into_iter().map(|(k, v)| (k.to_string(), v)),
            labels.into_iter().map(|(k, v)| (k.to_string(), v)),
        )
    }
}

fn delay_features(p: &ResolvedProject) -> Vec<(&'static str, f64)> {
    let cost = p.cost;
    let units = p.total_units;
    let planned = p.planned_duration_days;

    let booking_rate = p.booked_units / (units + 1.0);
    let duration_ratio = p.actual_duration_days / (planned + 1.0);
    let booking_lag = (booking_rate - p.progress_ratio).max(0.0);

    vec![
        (names::COST_PER_UNIT, cost / (units + 1.0)),
        (names::COST_PER_SQFT, cost / (p.built_area_sqft + 1.0)),
        (names::LAND_COST_RATIO_SMOOTHED, p.land_cost / (cost + 1.0)),
        (names::OVERRUN_SEVERITY, p.budget_overrun_percent * cost / 1e6),
        (names::BOOKING_RATE_SMOOTHED, booking_rate),
        (
            names::UTILIZATION_EFFICIENCY,
            p.land_utilization * p.progress_ratio,
        ),
        (names::DURATION_RATIO, duration_ratio),
        (names::PROJECT_COMPLEXITY, units * cost / 1e9),
        (names::DURATION_PER_UNIT, planned / (units + 1.0)),
        (names::WEATHER_RISK, p.total_rain * planned / 1000.0),
        (names::TEMP_DEVIATION, (p.avg_temp - REFERENCE_TEMP).abs()),
        (names::COST_DURATION_INTERACTION, cost * planned / 1e9),
        (names::WEATHER_DURATION, p.total_rain * planned / 365.0),
        (names::IS_LARGE_PROJECT, indicator(units > LARGE_PROJECT_UNITS)),
        (names::IS_HIGH_COST, indicator(cost > HIGH_COST)),
        (names::PROGRESS_BOOKING_LAG, booking_lag),
        (
            names::RISK_SCORE,
            risk_score(
                p.budget_overrun_percent,
                p.progress_ratio,
                booking_lag,
                duration_ratio,
            ),
        ),
    ]
}

fn cost_features(p: &ResolvedProject) -> Vec<(&'static str, f64)> {
    let cost = p.cost;
    vec![
        (names::LAND_COST_RATIO, p.land_cost / (cost + EPS)),
        (names::BOOKING_RATE, p.booked_units / (p.total_units + EPS)),
        (
            names::COLLECTION_EFFICIENCY,
            p.received_amount / (p.selling_amount + EPS),
        ),
        (
            names::CASHFLOW_PRESSURE,
            (cost - p.received_amount) / (cost + EPS),
        ),
        (names::GOVT_DEPENDENCY, p.government_payable / (cost + EPS)),
        (
            names::UNIT_REVENUE_GAP,
            (p.booked_selling_amount - p.received_amount) / (p.booked_units + 1.0),
        ),
        (
            names::DURATION_INTENSITY,
            p.planned_duration_days / (p.total_units + 1.0),
        ),
        (
            names::PROGRESS_COST_RATIO,
            p.progress_ratio / ((cost / 1e7) + 1.0),
        ),
    ]
}

/// Bounded composite risk score in `[0, 100]`.
pub fn risk_score(overrun_pct: f64, progress: f64, booking_lag: f64, duration_ratio: f64) -> f64 {
    let overrun = finite_or_zero(overrun_pct).clamp(0.0, 100.0);
    let inverse_progress = 100.0 * (1.0 - finite_or_zero(progress).clamp(0.0, 1.0));
    let lag = 100.0 * finite_or_zero(booking_lag).clamp(0.0, 1.0);
    let duration_overrun = 100.0 * (finite_or_zero(duration_ratio) - 1.0).clamp(0.0, 1.0);

    RISK_WEIGHT_OVERRUN * overrun
        + RISK_WEIGHT_INVERSE_PROGRESS * inverse_progress
        + RISK_WEIGHT_BOOKING_LAG * lag
        + RISK_WEIGHT_DURATION_OVERRUN * duration_overrun
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn indicator(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}
