//! Access and state guard for project- and scenario-scoped handlers.
//!
//! Loads the rows, applies the pure policy from `urban_core::access` and
//! `urban_core::scenario`, and hands back what the resolvers need.

use urban_core::access::{check_project_access, ProjectAccess, Requester};
use urban_core::error::CoreError;
use urban_core::geometry::TerritoryShape;
use urban_core::overlay::ProjectContext;
use urban_core::scenario::KindRequirement;
use urban_core::types::DbId;
use urban_db::models::project::Project;
use urban_db::models::scenario::ScenarioWithProject;
use urban_db::repositories::{ProjectRepo, ScenarioRepo};
use urban_db::DbPool;

use crate::error::{AppError, AppResult};

/// A scenario that passed the guard, with the project context its overlay
/// reads and writes are resolved against.
#[derive(Debug, Clone)]
pub struct ScenarioContext {
    pub scenario: ScenarioWithProject,
    pub project: ProjectContext,
}

impl ScenarioContext {
    pub fn scenario_id(&self) -> DbId {
        self.scenario.scenario.id
    }

    pub fn project_id(&self) -> DbId {
        self.scenario.scenario.project_id
    }
}

fn project_access(project: &Project) -> ProjectAccess {
    ProjectAccess {
        project_id: project.id,
        owner_id: project.user_id,
        is_public: project.is_public,
        is_regional: project.is_regional,
    }
}

/// Load a project and check that `requester` may read it, or edit it with
/// `to_edit`. Regional projects are rejected unless `allow_regional`.
pub async fn check_project(
    pool: &DbPool,
    project_id: DbId,
    requester: Option<&Requester>,
    to_edit: bool,
    allow_regional: bool,
) -> AppResult<Project> {
    let project = ProjectRepo::find_by_id(pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "project",
            id: project_id,
        }))?;

    check_project_access(&project_access(&project), requester, to_edit, allow_regional)?;
    Ok(project)
}

/// Load a scenario through its project, check access and the scenario kind
/// the operation accepts, and build its [`ProjectContext`].
///
/// `entity` names what the operation touches, for kind errors.
pub async fn check_scenario(
    pool: &DbPool,
    scenario_id: DbId,
    requester: Option<&Requester>,
    to_edit: bool,
    kind: KindRequirement,
    entity: &'static str,
) -> AppResult<ScenarioContext> {
    let scenario = ScenarioRepo::find_with_project(pool, scenario_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "scenario",
            id: scenario_id,
        }))?;

    check_project_access(&scenario.access(), requester, to_edit, true)?;
    kind.check(scenario.kind(), entity)?;

    let territory = match ProjectRepo::find_territory(pool, scenario.scenario.project_id).await? {
        Some(row) => Some(TerritoryShape::from_geojson(&row.geometry).map_err(|e| {
            CoreError::Internal(format!(
                "Territory of project {}: {e}",
                scenario.scenario.project_id
            ))
        })?),
        None => None,
    };

    let project = ProjectContext {
        project_id: scenario.scenario.project_id,
        scenario_id,
        territory,
    };
    Ok(ScenarioContext { scenario, project })
}
