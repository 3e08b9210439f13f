//! Handlers for projects: creation with the implicit base scenario, reads,
//! territory replacement, context geometry and base-scenario promotion.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use urban_core::access::require_superuser;
use urban_core::error::CoreError;
use urban_core::geometry::{geometry_from_geojson, geometry_to_geojson, union_polygons, TerritoryShape};
use urban_core::scenario::{
    single_base, validate_promotion, PromotionRequest, DEFAULT_BASE_SCENARIO_NAME,
};
use urban_core::territory::TerritoryTree;
use urban_core::types::DbId;
use urban_db::models::project::{
    CreateProject, ProjectContextResponse, ProjectWithTerritory, UpdateProjectTerritory,
};
use urban_db::models::scenario::Scenario;
use urban_db::repositories::scenario_repo::NewScenario;
use urban_db::repositories::{
    ProjectRepo, ReferenceTable, ScenarioCopyRepo, ScenarioRepo, TerritoryRepo, UrbanObjectRepo,
};
use urban_db::DbPool;
use urban_events::DomainEvent;
use validator::Validate;

use super::{ensure_reference_exists, publish};
use crate::error::{AppError, AppResult};
use crate::guard::check_project;
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::rbac::RequireSuperuser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A freshly created project with its base scenario.
#[derive(Debug, Serialize)]
pub struct CreatedProject {
    #[serde(flatten)]
    pub project: ProjectWithTerritory,
    pub base_scenario: Scenario,
}

/// The based scenario of a project, if it has one.
async fn existing_base(pool: &DbPool, project_id: DbId) -> AppResult<Option<DbId>> {
    let based = ScenarioRepo::list_based(pool, project_id).await?;
    Ok(single_base(project_id, &based)?)
}

/// Find the base scenario a project on `territory_id` inherits from: the
/// regional project closest up the territory hierarchy.
async fn regional_parent(pool: &DbPool, tree: &TerritoryTree, territory_id: DbId) -> AppResult<DbId> {
    let lineage = tree.self_and_ancestors(territory_id);
    let bases = ProjectRepo::find_regional_bases(pool, &lineage).await?;
    lineage
        .iter()
        .find_map(|id| bases.iter().find(|base| base.territory_id == *id))
        .map(|base| base.scenario_id)
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFoundByParams {
                entity: "regional base scenario",
                params: format!("territory_id={territory_id}"),
            })
        })
}

// ---------------------------------------------------------------------------
// POST /projects
// ---------------------------------------------------------------------------

/// Create a project together with its base scenario.
///
/// A regional project gets a root scenario seeded from the public dataset of
/// its territory subtree. Any other project inherits the public links of the
/// nearest regional base scenario that intersect its territory.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateProject>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if input.is_regional {
        require_superuser(&user.requester())?;
    }
    ensure_reference_exists(&state.pool, ReferenceTable::Territory, input.territory_id).await?;

    let territory_geometry = match (&input.territory, input.is_regional) {
        (_, true) => None,
        (Some(geometry), false) => {
            TerritoryShape::from_geojson(geometry)?;
            Some(geometry)
        }
        (None, false) => {
            return Err(AppError::BadRequest(
                "territory geometry is required for a non-regional project".to_string(),
            ));
        }
    };

    let edges: Vec<(DbId, Option<DbId>)> = TerritoryRepo::list_edges(&state.pool)
        .await?
        .into_iter()
        .map(|edge| (edge.id, edge.parent_id))
        .collect();
    let tree = TerritoryTree::from_edges(&edges);
    let parent_id = if input.is_regional {
        None
    } else {
        Some(regional_parent(&state.pool, &tree, input.territory_id).await?)
    };

    let mut tx = state.pool.begin().await?;
    let project = ProjectRepo::create(&mut *tx, &input, user.user_id).await?;
    let territory = match territory_geometry {
        Some(geometry) => Some(ProjectRepo::insert_territory(&mut *tx, project.id, geometry).await?),
        None => None,
    };
    let base_scenario = ScenarioRepo::create(
        &mut *tx,
        &NewScenario {
            project_id: project.id,
            parent_id,
            name: DEFAULT_BASE_SCENARIO_NAME,
            is_based: true,
            functional_zone_type_id: None,
            properties: None,
        },
    )
    .await?;
    let seeded = match parent_id {
        None => {
            let territory_ids = tree.subtree(input.territory_id);
            UrbanObjectRepo::seed_from_public(&mut *tx, base_scenario.id, &territory_ids).await?
        }
        Some(parent_id) => {
            UrbanObjectRepo::seed_from_parent(&mut *tx, base_scenario.id, parent_id, project.id).await?
        }
    };
    tx.commit().await?;

    tracing::info!(
        project_id = project.id,
        base_scenario_id = base_scenario.id,
        is_regional = project.is_regional,
        seeded_links = seeded,
        user_id = user.user_id,
        "Project created"
    );
    publish(
        &state,
        DomainEvent::ProjectCreated { project_id: project.id, base_scenario_id: base_scenario.id },
        user.user_id,
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedProject {
                project: ProjectWithTerritory { project, territory },
                base_scenario,
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /projects/{id}
// ---------------------------------------------------------------------------

pub async fn get_by_id(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let project = check_project(&state.pool, project_id, user.requester().as_ref(), false, true).await?;
    let territory = ProjectRepo::find_territory(&state.pool, project_id).await?;

    Ok(Json(DataResponse { data: ProjectWithTerritory { project, territory } }))
}

// ---------------------------------------------------------------------------
// GET /projects/{id}/scenarios
// ---------------------------------------------------------------------------

/// List a project's scenarios, base first.
pub async fn list_scenarios(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    check_project(&state.pool, project_id, user.requester().as_ref(), false, true).await?;
    existing_base(&state.pool, project_id).await?;
    let scenarios = ScenarioRepo::list_by_project(&state.pool, project_id).await?;

    Ok(Json(DataResponse { data: scenarios }))
}

// ---------------------------------------------------------------------------
// PUT /projects/{id}/territory
// ---------------------------------------------------------------------------

/// Replace the project territory. Inherited objects that no longer meet
/// the new territory become locked; nothing is deleted.
pub async fn put_territory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<DbId>,
    Json(input): Json<UpdateProjectTerritory>,
) -> AppResult<impl IntoResponse> {
    check_project(&state.pool, project_id, Some(&user.requester()), true, false).await?;
    TerritoryShape::from_geojson(&input.geometry)?;

    let territory = ProjectRepo::update_territory(&state.pool, project_id, &input.geometry)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "project territory",
            id: project_id,
        }))?;

    tracing::info!(project_id, user_id = user.user_id, "Project territory replaced");
    publish(&state, DomainEvent::ProjectTerritoryUpdated { project_id }, user.user_id);

    Ok(Json(DataResponse { data: territory }))
}

// ---------------------------------------------------------------------------
// GET /projects/{id}/context
// ---------------------------------------------------------------------------

/// Context territories of a project and their union geometry.
///
/// Uses the ids listed under `properties.context`. Without them, falls back
/// to the territories of the project territory's level lying within the
/// configured distance of the project.
pub async fn get_context(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let project = check_project(&state.pool, project_id, user.requester().as_ref(), false, false).await?;

    let mut ids = project.context_territory_ids();
    if ids.is_empty() {
        let territory = TerritoryRepo::find_by_id(&state.pool, project.territory_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "territory",
                id: project.territory_id,
            }))?;
        ids = TerritoryRepo::ids_near_project(
            &state.pool,
            project_id,
            territory.level,
            state.config.context_buffer_meters,
        )
        .await?;
    }

    let territories = TerritoryRepo::list_by_ids(&state.pool, &ids).await?;
    let geometries = territories
        .iter()
        .map(|territory| geometry_from_geojson(&territory.geometry))
        .collect::<Result<Vec<_>, _>>()?;
    let geometry = union_polygons(geometries.iter())
        .map(|union| geometry_to_geojson(&geo::Geometry::MultiPolygon(union)));

    tracing::debug!(project_id, territories = territories.len(), "Resolved project context");
    Ok(Json(DataResponse {
        data: ProjectContextResponse {
            territories: territories.iter().map(|territory| territory.id).collect(),
            geometry,
        },
    }))
}

// ---------------------------------------------------------------------------
// POST /projects/{project_id}/base_scenario/{scenario_id}
// ---------------------------------------------------------------------------

/// Promote a regional scenario into the base scenario of a project by deep
/// copying it.
pub async fn create_base_scenario(
    State(state): State<AppState>,
    RequireSuperuser(user): RequireSuperuser,
    Path((project_id, scenario_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let project = check_project(&state.pool, project_id, Some(&user.requester()), true, true).await?;
    let source = ScenarioRepo::find_with_project(&state.pool, scenario_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "scenario",
            id: scenario_id,
        }))?;

    validate_promotion(&PromotionRequest {
        project_id,
        project_is_regional: project.is_regional,
        source_scenario_id: scenario_id,
        source_is_regional: source.is_regional,
        existing_base_id: existing_base(&state.pool, project_id).await?,
    })?;

    let mut tx = state.pool.begin().await?;
    let base = ScenarioRepo::create(
        &mut *tx,
        &NewScenario {
            project_id,
            parent_id: Some(scenario_id),
            name: &source.scenario.name,
            is_based: true,
            functional_zone_type_id: source.scenario.functional_zone_type_id,
            properties: Some(&source.scenario.properties),
        },
    )
    .await?;
    let stats = ScenarioCopyRepo::copy_scenario_contents(&mut tx, scenario_id, base.id).await?;
    tx.commit().await?;

    tracing::info!(
        project_id,
        base_scenario_id = base.id,
        regional_scenario_id = scenario_id,
        links = stats.links,
        "Base scenario created"
    );
    publish(
        &state,
        DomainEvent::BaseScenarioCreated {
            project_id,
            base_scenario_id: base.id,
            regional_scenario_id: scenario_id,
        },
        user.user_id,
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: base })))
}
