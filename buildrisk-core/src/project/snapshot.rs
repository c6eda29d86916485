//! Raw project snapshot and lenient JSON coercion.

use super::fields;
use crate::error::RiskError;
use serde::Serialize;
use serde_json::{Map, Value};

/// An immutable project record as supplied by a caller.
///
/// Optional numerics stay `None` until [`ProjectSnapshot::resolve`] applies the defaults
/// table; alerting logic needs to know which values were actually supplied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_name: Option<String>,

    #[serde(rename = "final_project_cost")]
    pub cost: f64,
    #[serde(rename = "totalunits")]
    pub total_units: f64,
    pub planned_duration_days: f64,

    #[serde(rename = "final_project_type")]
    pub project_type: String,
    #[serde(rename = "promotertype")]
    pub promoter_type: String,
    #[serde(rename = "districttype")]
    pub district: String,

    #[serde(rename = "totalincurredcost", skip_serializing_if = "Option::is_none")]
    pub incurred_cost: Option<f64>,
    #[serde(rename = "totallandcost", skip_serializing_if = "Option::is_none")]
    pub land_cost: Option<f64>,
    #[serde(rename = "totalsellingamount", skip_serializing_if = "Option::is_none")]
    pub selling_amount: Option<f64>,
    #[serde(
        rename = "totalpayableamountgovernment",
        skip_serializing_if = "Option::is_none"
    )]
    pub government_payable: Option<f64>,
    #[serde(rename = "totaldevelopcost", skip_serializing_if = "Option::is_none")]
    pub development_cost: Option<f64>,
    #[serde(rename = "totalreceivedamount", skip_serializing_if = "Option::is_none")]
    pub received_amount: Option<f64>,
    #[serde(rename = "bookedsellingamount", skip_serializing_if = "Option::is_none")]
    pub booked_selling_amount: Option<f64>,
    #[serde(rename = "bookedunits", skip_serializing_if = "Option::is_none")]
    pub booked_units: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub land_utilization: Option<f64>,
    #[serde(
        rename = "projectduration_planned_days",
        skip_serializing_if = "Option::is_none"
    )]
    pub project_duration_planned_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_duration_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_overrun_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rain: Option<f64>,
    #[serde(rename = "totalsquarefootbuild", skip_serializing_if = "Option::is_none")]
    pub built_area_sqft: Option<f64>,
}

impl ProjectSnapshot {
    /// Parse a snapshot from a JSON object.
    ///
    /// Numbers may be JSON numbers or numeric strings; `null` means unspecified. Unknown keys
    /// are ignored. A missing required field or an uncoercible value is a
    /// [`RiskError::MalformedInput`] naming the field.
    pub fn from_json(value: &Value) -> Result<Self, RiskError> {
        let map = value
            .as_object()
            .ok_or_else(|| RiskError::malformed("project record must be a JSON object"))?;
        let reader = FieldReader { map };

        Ok(Self {
            project_id: reader.text(fields::PROJECT_ID)?,
            scenario_name: reader.text(fields::SCENARIO_NAME)?,
            cost: reader.required_number(fields::FINAL_PROJECT_COST)?,
            total_units: reader.required_number(fields::TOTAL_UNITS)?,
            planned_duration_days: reader.required_number(fields::PLANNED_DURATION_DAYS)?,
            project_type: reader.required_text(fields::PROJECT_TYPE)?,
            promoter_type: reader.required_text(fields::PROMOTER_TYPE)?,
            district: reader.required_text(fields::DISTRICT)?,
            incurred_cost: reader.number(fields::INCURRED_COST)?,
            land_cost: reader.number(fields::LAND_COST)?,
            selling_amount: reader.number(fields::SELLING_AMOUNT)?,
            government_payable: reader.number(fields::GOVERNMENT_PAYABLE)?,
            development_cost: reader.number(fields::DEVELOPMENT_COST)?,
            received_amount: reader.number(fields::RECEIVED_AMOUNT)?,
            booked_selling_amount: reader.number(fields::BOOKED_SELLING_AMOUNT)?,
            booked_units: reader.number(fields::BOOKED_UNITS)?,
            progress_ratio: reader.number(fields::PROGRESS_RATIO)?,
            land_utilization: reader.number(fields::LAND_UTILIZATION)?,
            project_duration_planned_days: reader.number(fields::PROJECT_DURATION_PLANNED_DAYS)?,
            actual_duration_days: reader.number(fields::ACTUAL_DURATION_DAYS)?,
            budget_overrun_percent: reader.number(fields::BUDGET_OVERRUN_PERCENT)?,
            avg_temp: reader.number(fields::AVG_TEMP)?,
            total_rain: reader.number(fields::TOTAL_RAIN)?,
            built_area_sqft: reader.number(fields::BUILT_AREA_SQFT)?,
        })
    }

    /// The snapshot as a JSON object with unspecified fields omitted.
    pub fn to_json(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            // Non-finite floats serialize as null; the struct itself always maps to an object.
            _ => Map::new(),
        }
    }

    /// A new snapshot with `overrides` merged key-by-key onto this one.
    ///
    /// The merged record is parsed exactly like a direct request, so defaults that depend on
    /// an overridden field are recomputed from the new value.
    pub fn merged(&self, overrides: &Map<String, Value>) -> Result<Self, RiskError> {
        let mut record = self.to_json();
        for (key, value) in overrides {
            record.insert(key.clone(), value.clone());
        }
        Self::from_json(&Value::Object(record))
    }
}

struct FieldReader<'a> {
    map: &'a Map<String, Value>,
}

impl FieldReader<'_> {
    fn number(&self, name: &str) -> Result<Option<f64>, RiskError> {
        match self.map.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| {
                RiskError::malformed(format!("field '{name}' is not representable as a number"))
            }),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| {
                RiskError::malformed(format!("field '{name}' must be numeric, got \"{s}\""))
            }),
            Some(other) => Err(RiskError::malformed(format!(
                "field '{name}' must be numeric, got {}",
                json_kind(other)
            ))),
        }
    }

    fn required_number(&self, name: &str) -> Result<f64, RiskError> {
        self.number(name)?
            .ok_or_else(|| RiskError::malformed(format!("missing required field '{name}'")))
    }

    fn text(&self, name: &str) -> Result<Option<String>, RiskError> {
        match self.map.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(RiskError::malformed(format!(
                "field '{name}' must be a string, got {}",
                json_kind(other)
            ))),
        }
    }

    fn required_text(&self, name: &str) -> Result<String, RiskError> {
        self.text(name)?
            .ok_or_else(|| RiskError::malformed(format!("missing required field '{name}'")))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
