//! Names of every derived feature.
//!
//! The delay and cost models were trained with different smoothing on a few ratios. Where the
//! formulas differ the delay variant carries a `_smoothed` suffix (denominator `+ 1`) and the
//! cost variant keeps the plain name (denominator `+ eps`).

use crate::project::fields;

// Delay-path derived features.
pub const COST_PER_UNIT: &str = "cost_per_unit";
pub const COST_PER_SQFT: &str = "cost_per_sqft";
pub const LAND_COST_RATIO_SMOOTHED: &str = "land_cost_ratio_smoothed";
pub const OVERRUN_SEVERITY: &str = "overrun_severity";
pub const BOOKING_RATE_SMOOTHED: &str = "booking_rate_smoothed";
pub const UTILIZATION_EFFICIENCY: &str = "utilization_efficiency";
pub const DURATION_RATIO: &str = "duration_ratio";
pub const PROJECT_COMPLEXITY: &str = "project_complexity";
pub const DURATION_PER_UNIT: &str = "duration_per_unit";
pub const WEATHER_RISK: &str = "weather_risk";
pub const TEMP_DEVIATION: &str = "temp_deviation";
pub const COST_DURATION_INTERACTION: &str = "cost_duration_interaction";
pub const WEATHER_DURATION: &str = "weather_duration";
pub const IS_LARGE_PROJECT: &str = "is_large_project";
pub const IS_HIGH_COST: &str = "is_high_cost";
pub const PROGRESS_BOOKING_LAG: &str = "progress_booking_lag";
pub const RISK_SCORE: &str = "risk_score";

// Cost-path derived features.
pub const LAND_COST_RATIO: &str = "land_cost_ratio";
pub const BOOKING_RATE: &str = "booking_rate";
pub const COLLECTION_EFFICIENCY: &str = "collection_efficiency";
pub const CASHFLOW_PRESSURE: &str = "cashflow_pressure";
pub const GOVT_DEPENDENCY: &str = "govt_dependency";
pub const UNIT_REVENUE_GAP: &str = "unit_revenue_gap";
pub const DURATION_INTENSITY: &str = "duration_intensity";
pub const PROGRESS_COST_RATIO: &str = "progress_cost_ratio";

// Binned labels.
pub const OVERRUN_BAND: &str = "overrun_band";
pub const PROGRESS_STAGE: &str = "progress_stage";

pub const DELAY_DERIVED: &[&str] = &[
    COST_PER_UNIT,
    COST_PER_SQFT,
    LAND_COST_RATIO_SMOOTHED,
    OVERRUN_SEVERITY,
    BOOKING_RATE_SMOOTHED,
    UTILIZATION_EFFICIENCY,
    DURATION_RATIO,
    PROJECT_COMPLEXITY,
    DURATION_PER_UNIT,
    WEATHER_RISK,
    TEMP_DEVIATION,
    COST_DURATION_INTERACTION,
    WEATHER_DURATION,
    IS_LARGE_PROJECT,
    IS_HIGH_COST,
    PROGRESS_BOOKING_LAG,
    RISK_SCORE,
];

pub const COST_DERIVED: &[&str] = &[
    COST_PER_UNIT,
    LAND_COST_RATIO,
    BOOKING_RATE,
    COLLECTION_EFFICIENCY,
    CASHFLOW_PRESSURE,
    GOVT_DEPENDENCY,
    UNIT_REVENUE_GAP,
    DURATION_INTENSITY,
    PROGRESS_COST_RATIO,
];

pub const BINNED_LABELS: &[&str] = &[OVERRUN_BAND, PROGRESS_STAGE];

/// Attributions on these features trigger the cash-collection recommendation.
pub const CASH_FLOW_FEATURES: &[&str] = &[CASHFLOW_PRESSURE, COLLECTION_EFFICIENCY];

/// Whether `name` is a numeric column of the feature vector.
pub fn is_numeric_feature(name: &str) -> bool {
    fields::NUMERIC.contains(&name) || DELAY_DERIVED.contains(&name) || COST_DERIVED.contains(&name)
}

/// Whether `name` is a label column of the feature vector.
pub fn is_label_feature(name: &str) -> bool {
    fields::CATEGORICAL.contains(&name) || BINNED_LABELS.contains(&name)
}

pub fn is_known_feature(name: &str) -> bool {
    is_numeric_feature(name) || is_label_feature(name)
}
