//! The defaults table and the resolved project record.
//!
//! Both the delay and cost paths resolve through [`ProjectSnapshot::resolve`]; there is no
//! second set of defaults anywhere else in the crate.

use super::fields;
use super::snapshot::ProjectSnapshot;
use crate::validate::FieldSource;
use serde::Serialize;

pub const DEFAULT_AVG_TEMP: f64 = 27.0;
pub const DEFAULT_TOTAL_RAIN: f64 = 0.0;
/// Selling amount as a multiple of project cost.
pub const DEFAULT_SELLING_MULTIPLE: f64 = 1.2;
/// Received amount as a share of selling amount.
pub const DEFAULT_RECEIVED_SHARE: f64 = 0.5;
/// Booked selling amount as a share of selling amount.
pub const DEFAULT_BOOKED_SELLING_SHARE: f64 = 0.7;
/// Booked units as a share of total units.
pub const DEFAULT_BOOKED_UNITS_SHARE: f64 = 0.6;

/// A snapshot with every optional numeric filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedProject {
    pub cost: f64,
    pub total_units: f64,
    pub planned_duration_days: f64,
    pub incurred_cost: f64,
    pub land_cost: f64,
    pub selling_amount: f64,
    pub government_payable: f64,
    pub development_cost: f64,
    pub received_amount: f64,
    pub booked_selling_amount: f64,
    pub booked_units: f64,
    pub progress_ratio: f64,
    pub land_utilization: f64,
    pub project_duration_planned_days: f64,
    pub actual_duration_days: f64,
    pub budget_overrun_percent: f64,
    pub avg_temp: f64,
    pub total_rain: f64,
    pub built_area_sqft: f64,
    pub project_type: String,
    pub promoter_type: String,
    pub district: String,
}

impl ProjectSnapshot {
    /// Apply the defaults table. Chained defaults resolve in order: selling amount first,
    /// then the received and booked amounts that depend on it.
    pub fn resolve(&self) -> ResolvedProject {
        let selling_amount = self
            .selling_amount
            .unwrap_or(self.cost * DEFAULT_SELLING_MULTIPLE);

        ResolvedProject {
            cost: self.cost,
            total_units: self.total_units,
            planned_duration_days: self.planned_duration_days,
            incurred_cost: self.incurred_cost.unwrap_or(0.0),
            land_cost: self.land_cost.unwrap_or(0.0),
            selling_amount,
            government_payable: self.government_payable.unwrap_or(0.0),
            development_cost: self.development_cost.unwrap_or(0.0),
            received_amount: self
                .received_amount
                .unwrap_or(selling_amount * DEFAULT_RECEIVED_SHARE),
            booked_selling_amount: self
                .booked_selling_amount
                .unwrap_or(selling_amount * DEFAULT_BOOKED_SELLING_SHARE),
            booked_units: self
                .booked_units
                .unwrap_or(self.total_units * DEFAULT_BOOKED_UNITS_SHARE),
            progress_ratio: self.progress_ratio.unwrap_or(0.0),
            land_utilization: self.land_utilization.unwrap_or(0.0),
            project_duration_planned_days: self
                .project_duration_planned_days
                .unwrap_or(self.planned_duration_days),
            actual_duration_days: self
                .actual_duration_days
                .unwrap_or(self.planned_duration_days),
            budget_overrun_percent: self.budget_overrun_percent.unwrap_or(0.0),
            avg_temp: self.avg_temp.unwrap_or(DEFAULT_AVG_TEMP),
            total_rain: self.total_rain.unwrap_or(DEFAULT_TOTAL_RAIN),
            built_area_sqft: self.built_area_sqft.unwrap_or(0.0),
            project_type: self.project_type.clone(),
            promoter_type: self.promoter_type.clone(),
            district: self.district.clone(),
        }
    }
}

impl FieldSource for ResolvedProject {
    fn numeric(&self, name: &str) -> Option<f64> {
        let value = match name {
            fields::FINAL_PROJECT_COST => self.cost,
            fields::TOTAL_UNITS => self.total_units,
            fields::PLANNED_DURATION_DAYS => self.planned_duration_days,
            fields::INCURRED_COST => self.incurred_cost,
            fields::LAND_COST => self.land_cost,
            fields::SELLING_AMOUNT => self.selling_amount,
            fields::GOVERNMENT_PAYABLE => self.government_payable,
            fields::DEVELOPMENT_COST => self.development_cost,
            fields::RECEIVED_AMOUNT => self.received_amount,
            fields::BOOKED_SELLING_AMOUNT => self.booked_selling_amount,
            fields::BOOKED_UNITS => self.booked_units,
            fields::PROGRESS_RATIO => self.progress_ratio,
            fields::LAND_UTILIZATION => self.land_utilization,
            fields::PROJECT_DURATION_PLANNED_DAYS => self.project_duration_planned_days,
            fields::ACTUAL_DURATION_DAYS => self.actual_duration_days,
            fields::BUDGET_OVERRUN_PERCENT => self.budget_overrun_percent,
            fields::AVG_TEMP => self.avg_temp,
            fields::TOTAL_RAIN => self.total_rain,
            fields::BUILT_AREA_SQFT => self.built_area_sqft,
            _ => return None,
        };
        Some(value)
    }

    fn label(&self, name: &str) -> Option<&str> {
        match name {
            fields::PROJECT_TYPE => Some(&self.project_type),
            fields::PROMOTER_TYPE => Some(&self.promoter_type),
            fields::DISTRICT => Some(&self.district),
            _ => None,
        }
    }
}
