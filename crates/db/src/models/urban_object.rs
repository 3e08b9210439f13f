//! Scenario urban-object link rows.

use serde::Serialize;
use sqlx::FromRow;
use urban_core::error::CoreError;
use urban_core::overlay::{LinkColumns, UrbanObjectLink};
use urban_core::types::DbId;

/// A `scenario_urban_objects` row joined with the back-references of the
/// private rows it points at.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScenarioUrbanObject {
    pub id: DbId,
    pub scenario_id: DbId,
    pub public_urban_object_id: Option<DbId>,
    pub physical_object_id: Option<DbId>,
    pub public_physical_object_id: Option<DbId>,
    pub object_geometry_id: Option<DbId>,
    pub public_object_geometry_id: Option<DbId>,
    pub service_id: Option<DbId>,
    pub public_service_id: Option<DbId>,
    #[serde(skip)]
    pub physical_object_shadows: Option<DbId>,
    #[serde(skip)]
    pub object_geometry_shadows: Option<DbId>,
    #[serde(skip)]
    pub service_shadows: Option<DbId>,
}

impl ScenarioUrbanObject {
    /// Validate the slot columns into a typed link.
    pub fn into_link(self) -> Result<UrbanObjectLink, CoreError> {
        UrbanObjectLink::try_from(LinkColumns {
            id: self.id,
            scenario_id: self.scenario_id,
            public_urban_object_id: self.public_urban_object_id,
            physical_object_id: self.physical_object_id,
            public_physical_object_id: self.public_physical_object_id,
            physical_object_shadows: self.physical_object_shadows,
            object_geometry_id: self.object_geometry_id,
            public_object_geometry_id: self.public_object_geometry_id,
            object_geometry_shadows: self.object_geometry_shadows,
            service_id: self.service_id,
            public_service_id: self.public_service_id,
            service_shadows: self.service_shadows,
        })
    }
}
