//! Object geometry models and DTOs for scenario overlays.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use urban_core::overlay::OverlayCandidate;
use urban_core::types::DbId;

use super::source_of;

/// One object geometry reachable through a scenario link.
#[derive(Debug, Clone, FromRow)]
pub struct ObjectGeometryCandidate {
    pub is_scenario_object: bool,
    pub id: DbId,
    pub territory_id: DbId,
    pub address: Option<String>,
    pub osm_id: Option<String>,
    pub geometry: serde_json::Value,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectGeometryView {
    pub object_geometry_id: DbId,
    pub territory_id: DbId,
    pub address: Option<String>,
    pub osm_id: Option<String>,
}

impl ObjectGeometryCandidate {
    pub fn into_candidate(self) -> OverlayCandidate<ObjectGeometryView> {
        OverlayCandidate {
            source: source_of(self.is_scenario_object),
            id: self.id,
            geometry: Some(self.geometry),
            is_deleted: self.is_deleted,
            item: ObjectGeometryView {
                object_geometry_id: self.id,
                territory_id: self.territory_id,
                address: self.address,
                osm_id: self.osm_id,
            },
        }
    }
}

/// A row from `scenario_object_geometries`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScenarioObjectGeometry {
    pub id: DbId,
    pub public_object_geometry_id: Option<DbId>,
    pub territory_id: DbId,
    pub geometry: serde_json::Value,
    pub address: Option<String>,
    pub osm_id: Option<String>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PutObjectGeometry {
    pub territory_id: DbId,
    pub geometry: serde_json::Value,
    pub address: Option<String>,
    pub osm_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatchObjectGeometry {
    pub territory_id: Option<DbId>,
    pub geometry: Option<serde_json::Value>,
    pub address: Option<String>,
    pub osm_id: Option<String>,
}
