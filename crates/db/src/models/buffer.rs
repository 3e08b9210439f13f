//! Buffer models and DTOs for scenario overlays.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use urban_core::overlay::OverlayCandidate;
use urban_core::types::DbId;

use super::source_of;

/// One buffer attached to a scenario link: a public buffer of the link's
/// public urban object, or a scenario buffer keyed by the link.
#[derive(Debug, Clone, FromRow)]
pub struct BufferCandidate {
    pub is_scenario_object: bool,
    pub id: DbId,
    pub buffer_type_id: DbId,
    pub buffer_type_name: String,
    pub urban_object_id: DbId,
    pub geometry: serde_json::Value,
    pub is_custom: bool,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BufferView {
    pub buffer_id: DbId,
    pub buffer_type_id: DbId,
    pub buffer_type_name: String,
    /// Scenario link id.
    pub urban_object_id: DbId,
    pub is_custom: bool,
}

impl BufferCandidate {
    pub fn into_candidate(self) -> OverlayCandidate<BufferView> {
        OverlayCandidate {
            source: source_of(self.is_scenario_object),
            id: self.id,
            geometry: Some(self.geometry),
            is_deleted: self.is_deleted,
            item: BufferView {
                buffer_id: self.id,
                buffer_type_id: self.buffer_type_id,
                buffer_type_name: self.buffer_type_name,
                urban_object_id: self.urban_object_id,
                is_custom: self.is_custom,
            },
        }
    }
}

/// Overlay filters. `physical_object_type_id` and `service_type_id` are
/// mutually exclusive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BufferFilter {
    pub buffer_type_id: Option<DbId>,
    pub physical_object_type_id: Option<DbId>,
    pub service_type_id: Option<DbId>,
}

/// A row from `scenario_buffers`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScenarioBuffer {
    pub id: DbId,
    pub buffer_type_id: DbId,
    pub scenario_urban_object_id: DbId,
    pub public_buffer_id: Option<DbId>,
    pub geometry: serde_json::Value,
    pub is_custom: bool,
    pub is_deleted: bool,
}

/// Body of `PUT /scenarios/{id}/buffers`.
///
/// `urban_object_id` is a scenario link id when `is_scenario_object` is true,
/// otherwise a public urban object id. Without `geometry` the default radius
/// for the buffer type is applied around the object geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct PutScenarioBuffer {
    pub buffer_type_id: DbId,
    pub urban_object_id: DbId,
    pub is_scenario_object: bool,
    pub geometry: Option<serde_json::Value>,
}

/// Query of `DELETE /scenarios/{id}/buffers`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteScenarioBuffer {
    pub buffer_type_id: DbId,
    pub urban_object_id: DbId,
    pub is_scenario_object: bool,
}
