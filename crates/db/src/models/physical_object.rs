//! Physical object models and DTOs for scenario overlays.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use urban_core::overlay::OverlayCandidate;
use urban_core::types::DbId;

use super::source_of;

// ---------------------------------------------------------------------------
// Overlay
// ---------------------------------------------------------------------------

/// One physical object reachable through a scenario link, public or private.
#[derive(Debug, Clone, FromRow)]
pub struct PhysicalObjectCandidate {
    pub is_scenario_object: bool,
    pub id: DbId,
    pub physical_object_type_id: DbId,
    pub physical_object_type_name: String,
    pub physical_object_function_id: DbId,
    pub name: Option<String>,
    pub properties: serde_json::Value,
    pub object_geometry_id: DbId,
    pub geometry: serde_json::Value,
    pub is_deleted: bool,
}

/// A physical object as shown in a scenario overlay.
#[derive(Debug, Clone, Serialize)]
pub struct PhysicalObjectView {
    pub physical_object_id: DbId,
    pub physical_object_type_id: DbId,
    pub physical_object_type_name: String,
    pub physical_object_function_id: DbId,
    pub name: Option<String>,
    pub properties: serde_json::Value,
    pub object_geometry_id: DbId,
}

impl PhysicalObjectCandidate {
    pub fn into_candidate(self) -> OverlayCandidate<PhysicalObjectView> {
        OverlayCandidate {
            source: source_of(self.is_scenario_object),
            id: self.id,
            geometry: Some(self.geometry),
            is_deleted: self.is_deleted,
            item: PhysicalObjectView {
                physical_object_id: self.id,
                physical_object_type_id: self.physical_object_type_id,
                physical_object_type_name: self.physical_object_type_name,
                physical_object_function_id: self.physical_object_function_id,
                name: self.name,
                properties: self.properties,
                object_geometry_id: self.object_geometry_id,
            },
        }
    }
}

/// Overlay filters. At most one of the two may be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhysicalObjectFilter {
    pub physical_object_type_id: Option<DbId>,
    pub physical_object_function_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Private rows
// ---------------------------------------------------------------------------

/// A row from `scenario_physical_objects`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScenarioPhysicalObject {
    pub id: DbId,
    pub public_physical_object_id: Option<DbId>,
    pub physical_object_type_id: DbId,
    pub name: Option<String>,
    pub properties: serde_json::Value,
    pub is_deleted: bool,
}

/// Body of `POST /scenarios/{id}/physical_objects`: a new object and its geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScenarioPhysicalObject {
    pub physical_object_type_id: DbId,
    pub name: Option<String>,
    pub properties: Option<serde_json::Value>,
    pub territory_id: DbId,
    pub geometry: serde_json::Value,
    pub address: Option<String>,
    pub osm_id: Option<String>,
}

/// Body of `PUT /scenarios/{id}/physical_objects/{object_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PutPhysicalObject {
    pub physical_object_type_id: DbId,
    pub name: Option<String>,
    pub properties: serde_json::Value,
}

/// Body of `PATCH /scenarios/{id}/physical_objects/{object_id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatchPhysicalObject {
    pub physical_object_type_id: Option<DbId>,
    pub name: Option<String>,
    pub properties: Option<serde_json::Value>,
}
