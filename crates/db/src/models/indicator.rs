//! Indicator value models and DTOs for scenario overlays.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use urban_core::overlay::OverlayCandidate;
use urban_core::types::DbId;

use super::source_of;

#[derive(Debug, Clone, FromRow)]
pub struct IndicatorValueCandidate {
    pub is_scenario_object: bool,
    pub id: DbId,
    pub indicator_id: DbId,
    pub indicator_name: String,
    pub measurement_unit: Option<String>,
    pub territory_id: Option<DbId>,
    pub date_value: NaiveDate,
    pub value: f64,
    pub value_type: String,
    pub information_source: Option<String>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndicatorValueView {
    pub indicator_value_id: DbId,
    pub indicator_id: DbId,
    pub indicator_name: String,
    pub measurement_unit: Option<String>,
    pub territory_id: Option<DbId>,
    pub date_value: NaiveDate,
    pub value: f64,
    pub value_type: String,
    pub information_source: Option<String>,
}

impl IndicatorValueCandidate {
    /// Indicator values carry no geometry and are never locked.
    pub fn into_candidate(self) -> OverlayCandidate<IndicatorValueView> {
        OverlayCandidate {
            source: source_of(self.is_scenario_object),
            id: self.id,
            geometry: None,
            is_deleted: self.is_deleted,
            item: IndicatorValueView {
                indicator_value_id: self.id,
                indicator_id: self.indicator_id,
                indicator_name: self.indicator_name,
                measurement_unit: self.measurement_unit,
                territory_id: self.territory_id,
                date_value: self.date_value,
                value: self.value,
                value_type: self.value_type,
                information_source: self.information_source,
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndicatorValueFilter {
    pub indicator_id: Option<DbId>,
}

/// A row from `scenario_indicator_values`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScenarioIndicatorValue {
    pub id: DbId,
    pub scenario_id: DbId,
    pub public_indicator_value_id: Option<DbId>,
    pub indicator_id: DbId,
    pub territory_id: Option<DbId>,
    pub date_value: NaiveDate,
    pub value: f64,
    pub value_type: String,
    pub information_source: Option<String>,
    pub is_deleted: bool,
}

/// Body of `POST /scenarios/{id}/indicators`. Without `territory_id` the
/// value applies to the project territory as a whole.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScenarioIndicatorValue {
    pub indicator_id: DbId,
    pub territory_id: Option<DbId>,
    pub date_value: NaiveDate,
    pub value: f64,
    pub value_type: String,
    pub information_source: Option<String>,
}

/// Body of `PUT /scenarios/{id}/indicators/{value_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PutIndicatorValue {
    pub date_value: NaiveDate,
    pub value: f64,
    pub value_type: String,
    pub information_source: Option<String>,
}
