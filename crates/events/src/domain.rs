//! Typed project and scenario events.

use serde_json::json;
use urban_core::types::DbId;

use crate::bus::PlatformEvent;

pub const SCENARIO_CREATED: &str = "scenario.created";
pub const SCENARIO_BASE_CREATED: &str = "scenario.base_created";
pub const SCENARIO_OBJECTS_UPDATED: &str = "scenario.objects_updated";
pub const SCENARIO_ZONES_UPDATED: &str = "scenario.zones_updated";
pub const SCENARIO_INDICATORS_UPDATED: &str = "scenario.indicators_updated";
pub const SCENARIO_DELETED: &str = "scenario.deleted";
pub const PROJECT_CREATED: &str = "project.created";
pub const PROJECT_TERRITORY_UPDATED: &str = "project.territory_updated";

/// Something that happened to a project or one of its scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    ScenarioCreated { project_id: DbId, scenario_id: DbId, parent_id: Option<DbId> },
    BaseScenarioCreated { project_id: DbId, base_scenario_id: DbId, regional_scenario_id: DbId },
    ScenarioObjectsUpdated { project_id: DbId, scenario_id: DbId },
    ScenarioZonesUpdated { project_id: DbId, scenario_id: DbId },
    ScenarioIndicatorsUpdated { project_id: DbId, scenario_id: DbId },
    ScenarioDeleted { project_id: DbId, scenario_id: DbId },
    ProjectCreated { project_id: DbId, base_scenario_id: DbId },
    ProjectTerritoryUpdated { project_id: DbId },
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::ScenarioCreated { .. } => SCENARIO_CREATED,
            DomainEvent::BaseScenarioCreated { .. } => SCENARIO_BASE_CREATED,
            DomainEvent::ScenarioObjectsUpdated { .. } => SCENARIO_OBJECTS_UPDATED,
            DomainEvent::ScenarioZonesUpdated { .. } => SCENARIO_ZONES_UPDATED,
            DomainEvent::ScenarioIndicatorsUpdated { .. } => SCENARIO_INDICATORS_UPDATED,
            DomainEvent::ScenarioDeleted { .. } => SCENARIO_DELETED,
            DomainEvent::ProjectCreated { .. } => PROJECT_CREATED,
            DomainEvent::ProjectTerritoryUpdated { .. } => PROJECT_TERRITORY_UPDATED,
        }
    }

    /// Wrap into the bus envelope, attributed to `actor`.
    pub fn into_platform_event(self, actor: Option<DbId>) -> PlatformEvent {
        let event_type = self.event_type();
        let (project_id, scenario_id, payload) = match self {
            DomainEvent::ScenarioCreated { project_id, scenario_id, parent_id } => (
                project_id,
                Some(scenario_id),
                json!({ "project_id": project_id, "scenario_id": scenario_id, "parent_id": parent_id }),
            ),
            DomainEvent::BaseScenarioCreated { project_id, base_scenario_id, regional_scenario_id } => (
                project_id,
                Some(base_scenario_id),
                json!({
                    "project_id": project_id,
                    "base_scenario_id": base_scenario_id,
                    "regional_scenario_id": regional_scenario_id,
                }),
            ),
            DomainEvent::ScenarioObjectsUpdated { project_id, scenario_id }
            | DomainEvent::ScenarioZonesUpdated { project_id, scenario_id }
            | DomainEvent::ScenarioIndicatorsUpdated { project_id, scenario_id }
            | DomainEvent::ScenarioDeleted { project_id, scenario_id } => (
                project_id,
                Some(scenario_id),
                json!({ "project_id": project_id, "scenario_id": scenario_id }),
            ),
            DomainEvent::ProjectCreated { project_id, base_scenario_id } => (
                project_id,
                Some(base_scenario_id),
                json!({ "project_id": project_id, "base_scenario_id": base_scenario_id }),
            ),
            DomainEvent::ProjectTerritoryUpdated { project_id } => {
                (project_id, None, json!({ "project_id": project_id }))
            }
        };

        let mut event = PlatformEvent::new(event_type)
            .with_project(project_id)
            .with_payload(payload);
        if let Some(scenario_id) = scenario_id {
            event = event.with_scenario(scenario_id);
        }
        if let Some(actor) = actor {
            event = event.with_actor(actor);
        }
        event
    }
}
