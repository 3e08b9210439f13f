//! Handlers for scenario lifecycle: read, copy, update and delete.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use urban_core::error::CoreError;
use urban_core::scenario::{
    check_is_based_update, validate_scenario_name, BasedTransition, KindRequirement,
};
use urban_core::types::DbId;
use urban_db::models::scenario::{CreateScenario, PatchScenario, PutScenario};
use urban_db::repositories::scenario_repo::NewScenario;
use urban_db::repositories::{ReferenceTable, ScenarioCopyRepo, ScenarioRepo};
use urban_events::DomainEvent;
use validator::Validate;

use super::{ensure_reference_exists, publish};
use crate::error::{AppError, AppResult};
use crate::guard::check_scenario;
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::response::DataResponse;
use crate::state::AppState;

const ENTITY: &str = "scenarios";

fn scenario_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "scenario", id })
}

// ---------------------------------------------------------------------------
// GET /scenarios/{id}
// ---------------------------------------------------------------------------

pub async fn get_by_id(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    Path(scenario_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let ctx = check_scenario(
        &state.pool,
        scenario_id,
        user.requester().as_ref(),
        false,
        KindRequirement::Any,
        ENTITY,
    )
    .await?;
    Ok(Json(DataResponse { data: ctx.scenario }))
}

// ---------------------------------------------------------------------------
// POST /scenarios/{id}
// ---------------------------------------------------------------------------

/// Copy a scenario into a new child scenario of the same project.
pub async fn copy(
    State(state): State<AppState>,
    user: AuthUser,
    Path(parent_id): Path<DbId>,
    Json(input): Json<CreateScenario>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_scenario_name(&input.name)?;
    if let Some(type_id) = input.functional_zone_type_id {
        ensure_reference_exists(&state.pool, ReferenceTable::FunctionalZoneType, type_id).await?;
    }
    let ctx = check_scenario(
        &state.pool,
        parent_id,
        Some(&user.requester()),
        true,
        KindRequirement::Any,
        ENTITY,
    )
    .await?;
    let project_id = ctx.project_id();

    let mut tx = state.pool.begin().await?;
    let scenario = ScenarioRepo::create(
        &mut *tx,
        &NewScenario {
            project_id,
            parent_id: Some(parent_id),
            name: &input.name,
            is_based: false,
            functional_zone_type_id: input.functional_zone_type_id,
            properties: input.properties.as_ref(),
        },
    )
    .await?;
    let stats = ScenarioCopyRepo::copy_scenario_contents(&mut tx, parent_id, scenario.id).await?;
    tx.commit().await?;

    tracing::info!(
        project_id,
        scenario_id = scenario.id,
        parent_id,
        links = stats.links,
        functional_zones = stats.functional_zones,
        indicator_values = stats.indicator_values,
        user_id = user.user_id,
        "Scenario copied"
    );
    publish(
        &state,
        DomainEvent::ScenarioCreated {
            project_id,
            scenario_id: scenario.id,
            parent_id: Some(parent_id),
        },
        user.user_id,
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: scenario })))
}

// ---------------------------------------------------------------------------
// PUT / PATCH /scenarios/{id}
// ---------------------------------------------------------------------------

async fn update(
    state: AppState,
    user: AuthUser,
    scenario_id: DbId,
    input: PatchScenario,
    replace: bool,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if let Some(name) = &input.name {
        validate_scenario_name(name)?;
    }
    let ctx = check_scenario(
        &state.pool,
        scenario_id,
        Some(&user.requester()),
        true,
        KindRequirement::Any,
        ENTITY,
    )
    .await?;
    if let Some(type_id) = input.functional_zone_type_id {
        ensure_reference_exists(&state.pool, ReferenceTable::FunctionalZoneType, type_id).await?;
    }
    let transition = check_is_based_update(ctx.scenario.scenario.is_based, input.is_based)?;
    let demote = transition == BasedTransition::Demote;

    let scenario = ScenarioRepo::update(&state.pool, scenario_id, &input, replace, demote)
        .await?
        .ok_or_else(|| scenario_not_found(scenario_id))?;

    tracing::info!(scenario_id, replace, demote, user_id = user.user_id, "Scenario updated");
    Ok(Json(DataResponse { data: scenario }))
}

pub async fn put(
    State(state): State<AppState>,
    user: AuthUser,
    Path(scenario_id): Path<DbId>,
    Json(input): Json<PutScenario>,
) -> AppResult<impl IntoResponse> {
    update(state, user, scenario_id, input.into(), true).await
}

pub async fn patch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(scenario_id): Path<DbId>,
    Json(input): Json<PatchScenario>,
) -> AppResult<impl IntoResponse> {
    update(state, user, scenario_id, input, false).await
}

// ---------------------------------------------------------------------------
// DELETE /scenarios/{id}
// ---------------------------------------------------------------------------

/// Delete a scenario with every private row it owns. The base scenario has
/// to be demoted first.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(scenario_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let ctx = check_scenario(
        &state.pool,
        scenario_id,
        Some(&user.requester()),
        true,
        KindRequirement::Any,
        ENTITY,
    )
    .await?;
    if ctx.scenario.scenario.is_based {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Scenario {scenario_id} is the base scenario of project {}; demote it first",
            ctx.project_id()
        ))));
    }

    let mut tx = state.pool.begin().await?;
    if !ScenarioRepo::delete_with_private_rows(&mut tx, scenario_id).await? {
        return Err(scenario_not_found(scenario_id));
    }
    tx.commit().await?;

    tracing::info!(scenario_id, project_id = ctx.project_id(), "Scenario deleted");
    publish(
        &state,
        DomainEvent::ScenarioDeleted { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok(StatusCode::NO_CONTENT)
}
