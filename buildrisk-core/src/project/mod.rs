//! Project input records: the raw snapshot and its default-resolved form.
//!
//! Wire field names follow the training dataset columns so that a record exported from the
//! dataset can be fed straight back into inference.

pub mod defaults;
pub mod snapshot;

pub use defaults::ResolvedProject;
pub use snapshot::ProjectSnapshot;

/// Dataset column names.
pub mod fields {
    pub const PROJECT_ID: &str = "project_id";
    pub const SCENARIO_NAME: &str = "scenario_name";

    pub const FINAL_PROJECT_COST: &str = "final_project_cost";
    pub const TOTAL_UNITS: &str = "totalunits";
    pub const PLANNED_DURATION_DAYS: &str = "planned_duration_days";

    pub const INCURRED_COST: &str = "totalincurredcost";
    pub const LAND_COST: &str = "totallandcost";
    pub const SELLING_AMOUNT: &str = "totalsellingamount";
    pub const GOVERNMENT_PAYABLE: &str = "totalpayableamountgovernment";
    pub const DEVELOPMENT_COST: &str = "totaldevelopcost";
    pub const RECEIVED_AMOUNT: &str = "totalreceivedamount";
    pub const BOOKED_SELLING_AMOUNT: &str = "bookedsellingamount";
    pub const BOOKED_UNITS: &str = "bookedunits";
    pub const PROGRESS_RATIO: &str = "progress_ratio";
    pub const LAND_UTILIZATION: &str = "land_utilization";
    pub const PROJECT_DURATION_PLANNED_DAYS: &str = "projectduration_planned_days";
    pub const ACTUAL_DURATION_DAYS: &str = "actual_duration_days";
    pub const BUDGET_OVERRUN_PERCENT: &str = "budget_overrun_percent";
    pub const AVG_TEMP: &str = "avg_temp";
    pub const TOTAL_RAIN: &str = "total_rain";
    pub const BUILT_AREA_SQFT: &str = "totalsquarefootbuild";

    pub const PROJECT_TYPE: &str = "final_project_type";
    pub const PROMOTER_TYPE: &str = "promotertype";
    pub const DISTRICT: &str = "districttype";

    /// Every numeric input column, in dataset order.
    pub const NUMERIC: &[&str] = &[
        FINAL_PROJECT_COST,
        INCURRED_COST,
        LAND_COST,
        SELLING_AMOUNT,
        GOVERNMENT_PAYABLE,
        DEVELOPMENT_COST,
        RECEIVED_AMOUNT,
        BOOKED_SELLING_AMOUNT,
        BOOKED_UNITS,
        TOTAL_UNITS,
        PROGRESS_RATIO,
        LAND_UTILIZATION,
        PLANNED_DURATION_DAYS,
        PROJECT_DURATION_PLANNED_DAYS,
        ACTUAL_DURATION_DAYS,
        BUDGET_OVERRUN_PERCENT,
        AVG_TEMP,
        TOTAL_RAIN,
        BUILT_AREA_SQFT,
    ];

    pub const CATEGORICAL: &[&str] = &[PROJECT_TYPE, PROMOTER_TYPE, DISTRICT];
}
