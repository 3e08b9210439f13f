//! Functional zone models and DTOs for scenario overlays.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use urban_core::overlay::OverlayCandidate;
use urban_core::types::DbId;

use super::source_of;

#[derive(Debug, Clone, FromRow)]
pub struct FunctionalZoneCandidate {
    pub is_scenario_object: bool,
    pub id: DbId,
    pub functional_zone_type_id: DbId,
    pub functional_zone_type_name: String,
    pub name: Option<String>,
    pub year: i32,
    pub source: String,
    pub properties: serde_json::Value,
    pub geometry: serde_json::Value,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionalZoneView {
    pub functional_zone_id: DbId,
    pub functional_zone_type_id: DbId,
    pub functional_zone_type_name: String,
    pub name: Option<String>,
    pub year: i32,
    pub source: String,
    pub properties: serde_json::Value,
}

impl FunctionalZoneCandidate {
    pub fn into_candidate(self) -> OverlayCandidate<FunctionalZoneView> {
        OverlayCandidate {
            source: source_of(self.is_scenario_object),
            id: self.id,
            geometry: Some(self.geometry),
            is_deleted: self.is_deleted,
            item: FunctionalZoneView {
                functional_zone_id: self.id,
                functional_zone_type_id: self.functional_zone_type_id,
                functional_zone_type_name: self.functional_zone_type_name,
                name: self.name,
                year: self.year,
                source: self.source,
                properties: self.properties,
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionalZoneFilter {
    pub functional_zone_type_id: Option<DbId>,
}

/// A row from `scenario_functional_zones`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScenarioFunctionalZone {
    pub id: DbId,
    pub scenario_id: DbId,
    pub public_functional_zone_id: Option<DbId>,
    pub functional_zone_type_id: DbId,
    pub name: Option<String>,
    pub geometry: serde_json::Value,
    pub year: i32,
    pub source: String,
    pub properties: serde_json::Value,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateScenarioFunctionalZone {
    pub functional_zone_type_id: DbId,
    pub name: Option<String>,
    pub geometry: serde_json::Value,
    pub year: i32,
    pub source: String,
    pub properties: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PutFunctionalZone {
    pub functional_zone_type_id: DbId,
    pub name: Option<String>,
    pub geometry: serde_json::Value,
    pub year: i32,
    pub source: String,
    pub properties: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatchFunctionalZone {
    pub functional_zone_type_id: Option<DbId>,
    pub name: Option<String>,
    pub geometry: Option<serde_json::Value>,
    pub year: Option<i32>,
    pub source: Option<String>,
    pub properties: Option<serde_json::Value>,
}

impl From<PutFunctionalZone> for PatchFunctionalZone {
    fn from(put: PutFunctionalZone) -> Self {
        Self {
            functional_zone_type_id: Some(put.functional_zone_type_id),
            name: put.name,
            geometry: Some(put.geometry),
            year: Some(put.year),
            source: Some(put.source),
            properties: Some(put.properties),
        }
    }
}
