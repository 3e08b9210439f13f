//! Service models and DTOs for scenario overlays.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use urban_core::overlay::OverlayCandidate;
use urban_core::types::DbId;

use super::source_of;

/// One service reachable through a scenario link.
#[derive(Debug, Clone, FromRow)]
pub struct ServiceCandidate {
    pub is_scenario_object: bool,
    pub id: DbId,
    pub service_type_id: DbId,
    pub service_type_name: String,
    pub urban_function_id: DbId,
    pub name: Option<String>,
    pub capacity: Option<i32>,
    pub is_capacity_real: bool,
    pub properties: serde_json::Value,
    pub geometry: serde_json::Value,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceView {
    pub service_id: DbId,
    pub service_type_id: DbId,
    pub service_type_name: String,
    pub urban_function_id: DbId,
    pub name: Option<String>,
    pub capacity: Option<i32>,
    pub is_capacity_real: bool,
    pub properties: serde_json::Value,
}

impl ServiceCandidate {
    pub fn into_candidate(self) -> OverlayCandidate<ServiceView> {
        OverlayCandidate {
            source: source_of(self.is_scenario_object),
            id: self.id,
            geometry: Some(self.geometry),
            is_deleted: self.is_deleted,
            item: ServiceView {
                service_id: self.id,
                service_type_id: self.service_type_id,
                service_type_name: self.service_type_name,
                urban_function_id: self.urban_function_id,
                name: self.name,
                capacity: self.capacity,
                is_capacity_real: self.is_capacity_real,
                properties: self.properties,
            },
        }
    }
}

/// Overlay filters. At most one of the two may be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceFilter {
    pub service_type_id: Option<DbId>,
    pub urban_function_id: Option<DbId>,
}

/// A row from `scenario_services`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScenarioService {
    pub id: DbId,
    pub public_service_id: Option<DbId>,
    pub service_type_id: DbId,
    pub name: Option<String>,
    pub capacity: Option<i32>,
    pub is_capacity_real: bool,
    pub properties: serde_json::Value,
    pub is_deleted: bool,
}

/// Body of `POST /scenarios/{id}/services`.
///
/// The service is attached to the scenario link whose physical object and
/// geometry match the given ids.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScenarioService {
    pub service_type_id: DbId,
    pub name: Option<String>,
    pub capacity: Option<i32>,
    #[serde(default)]
    pub is_capacity_real: bool,
    pub properties: Option<serde_json::Value>,
    pub physical_object_id: DbId,
    pub is_scenario_physical_object: bool,
    pub object_geometry_id: DbId,
    pub is_scenario_geometry: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PutService {
    pub service_type_id: DbId,
    pub name: Option<String>,
    pub capacity: Option<i32>,
    pub is_capacity_real: bool,
    pub properties: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatchService {
    pub service_type_id: Option<DbId>,
    pub name: Option<String>,
    pub capacity: Option<i32>,
    pub is_capacity_real: Option<bool>,
    pub properties: Option<serde_json::Value>,
}
