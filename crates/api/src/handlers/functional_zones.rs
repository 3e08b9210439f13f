//! Handlers for scenario functional zones.
//!
//! Zones belong to the scenario directly. Public zones come from the
//! project's territory subtree; editing one copies it into the scenario.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use urban_core::error::CoreError;
use urban_core::geometry::geometry_from_geojson;
use urban_core::overlay::{check_public_override, resolve_overlay};
use urban_core::scenario::KindRequirement;
use urban_core::types::DbId;
use urban_db::models::functional_zone::{
    CreateScenarioFunctionalZone, FunctionalZoneFilter, PatchFunctionalZone, PutFunctionalZone,
};
use urban_db::repositories::{FunctionalZoneRepo, ReferenceTable, Tx};
use urban_events::DomainEvent;

use super::{ensure_reference_exists, publish, territory_subtree};
use crate::error::{AppError, AppResult};
use crate::guard::{check_scenario, ScenarioContext};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::query::ScenarioObjectParams;
use crate::response::DataResponse;
use crate::state::AppState;

const ENTITY: &str = "functional zones";
const ZONE: &str = "functional zone";

fn zone_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: ZONE, id })
}

async fn editable(state: &AppState, user: &AuthUser, scenario_id: DbId) -> AppResult<ScenarioContext> {
    check_scenario(
        &state.pool,
        scenario_id,
        Some(&user.requester()),
        true,
        KindRequirement::ProjectOnly,
        ENTITY,
    )
    .await
}

/// Resolve the private zone a write goes to, copying a public zone into the
/// scenario when `is_scenario_object` is false.
async fn writable_zone(
    state: &AppState,
    tx: &mut Tx<'_>,
    ctx: &ScenarioContext,
    zone_id: DbId,
    is_scenario_object: bool,
) -> AppResult<DbId> {
    let scenario_id = ctx.scenario_id();
    if is_scenario_object {
        return match FunctionalZoneRepo::find_private(&mut **tx, scenario_id, zone_id).await? {
            Some(zone) if !zone.is_deleted => Ok(zone.id),
            _ => Err(zone_not_found(zone_id)),
        };
    }

    let territory_ids = territory_subtree(&state.pool, ctx.scenario.project_territory_id).await?;
    let geometry = FunctionalZoneRepo::public_geometry(&mut **tx, zone_id, &territory_ids).await?;
    let shadowed = FunctionalZoneRepo::is_shadowed(&mut **tx, scenario_id, zone_id).await?;
    check_public_override(ZONE, zone_id, geometry.is_some(), shadowed)?;
    ctx.project.ensure_not_locked(geometry.as_ref())?;

    let copy = FunctionalZoneRepo::copy_public(&mut **tx, scenario_id, zone_id, false)
        .await?
        .ok_or_else(|| zone_not_found(zone_id))?;
    Ok(copy.id)
}

// ---------------------------------------------------------------------------
// GET /scenarios/{id}/functional_zones
// ---------------------------------------------------------------------------

pub async fn list(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    Path(scenario_id): Path<DbId>,
    Query(filter): Query<FunctionalZoneFilter>,
) -> AppResult<impl IntoResponse> {
    let ctx = check_scenario(
        &state.pool,
        scenario_id,
        user.requester().as_ref(),
        false,
        KindRequirement::ProjectOnly,
        ENTITY,
    )
    .await?;

    let territory_ids = territory_subtree(&state.pool, ctx.scenario.project_territory_id).await?;
    let candidates = FunctionalZoneRepo::candidates(
        &state.pool,
        scenario_id,
        ctx.project_id(),
        &territory_ids,
        &filter,
    )
    .await?
    .into_iter()
    .map(|row| row.into_candidate())
    .collect();
    let zones = resolve_overlay(candidates, &ctx.project)?;

    tracing::debug!(scenario_id, count = zones.len(), "Listed scenario functional zones");
    Ok(Json(DataResponse { data: zones }))
}

// ---------------------------------------------------------------------------
// POST /scenarios/{id}/functional_zones
// ---------------------------------------------------------------------------

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(scenario_id): Path<DbId>,
    Json(input): Json<CreateScenarioFunctionalZone>,
) -> AppResult<impl IntoResponse> {
    let ctx = editable(&state, &user, scenario_id).await?;
    geometry_from_geojson(&input.geometry)?;
    ensure_reference_exists(&state.pool, ReferenceTable::FunctionalZoneType, input.functional_zone_type_id)
        .await?;

    let zone = FunctionalZoneRepo::insert_private(&state.pool, scenario_id, &input).await?;

    tracing::info!(
        scenario_id,
        functional_zone_id = zone.id,
        user_id = user.user_id,
        "Scenario functional zone created"
    );
    publish(
        &state,
        DomainEvent::ScenarioZonesUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: zone })))
}

// ---------------------------------------------------------------------------
// PUT / PATCH /scenarios/{id}/functional_zones/{zone_id}
// ---------------------------------------------------------------------------

async fn update(
    state: AppState,
    user: AuthUser,
    scenario_id: DbId,
    zone_id: DbId,
    is_scenario_object: bool,
    input: PatchFunctionalZone,
    replace: bool,
) -> AppResult<impl IntoResponse> {
    let ctx = editable(&state, &user, scenario_id).await?;
    if let Some(geometry) = &input.geometry {
        geometry_from_geojson(geometry)?;
    }
    if let Some(type_id) = input.functional_zone_type_id {
        ensure_reference_exists(&state.pool, ReferenceTable::FunctionalZoneType, type_id).await?;
    }

    let mut tx = state.pool.begin().await?;
    let private_id = writable_zone(&state, &mut tx, &ctx, zone_id, is_scenario_object).await?;
    let zone = FunctionalZoneRepo::update(&mut *tx, private_id, &input, replace)
        .await?
        .ok_or_else(|| zone_not_found(zone_id))?;
    tx.commit().await?;

    tracing::info!(scenario_id, zone_id, private_id, replace, "Scenario functional zone updated");
    publish(
        &state,
        DomainEvent::ScenarioZonesUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok(Json(DataResponse { data: zone }))
}

pub async fn put(
    State(state): State<AppState>,
    user: AuthUser,
    Path((scenario_id, zone_id)): Path<(DbId, DbId)>,
    Query(params): Query<ScenarioObjectParams>,
    Json(input): Json<PutFunctionalZone>,
) -> AppResult<impl IntoResponse> {
    update(state, user, scenario_id, zone_id, params.is_scenario_object, input.into(), true).await
}

pub async fn patch(
    State(state): State<AppState>,
    user: AuthUser,
    Path((scenario_id, zone_id)): Path<(DbId, DbId)>,
    Query(params): Query<ScenarioObjectParams>,
    Json(input): Json<PatchFunctionalZone>,
) -> AppResult<impl IntoResponse> {
    update(state, user, scenario_id, zone_id, params.is_scenario_object, input, false).await
}

// ---------------------------------------------------------------------------
// DELETE /scenarios/{id}/functional_zones/{zone_id}
// ---------------------------------------------------------------------------

/// Delete a zone. A public zone, or a private copy of one, stays hidden
/// behind a tombstone.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path((scenario_id, zone_id)): Path<(DbId, DbId)>,
    Query(params): Query<ScenarioObjectParams>,
) -> AppResult<StatusCode> {
    let ctx = editable(&state, &user, scenario_id).await?;

    let mut tx = state.pool.begin().await?;
    let public_id = if params.is_scenario_object {
        let zone = FunctionalZoneRepo::find_private(&mut *tx, scenario_id, zone_id)
            .await?
            .filter(|zone| !zone.is_deleted)
            .ok_or_else(|| zone_not_found(zone_id))?;
        FunctionalZoneRepo::delete_private(&mut *tx, zone.id).await?;
        zone.public_functional_zone_id
    } else {
        let territory_ids = territory_subtree(&state.pool, ctx.scenario.project_territory_id).await?;
        let geometry = FunctionalZoneRepo::public_geometry(&mut *tx, zone_id, &territory_ids).await?;
        let shadowed = FunctionalZoneRepo::is_shadowed(&mut *tx, scenario_id, zone_id).await?;
        check_public_override(ZONE, zone_id, geometry.is_some(), shadowed)?;
        ctx.project.ensure_not_locked(geometry.as_ref())?;
        Some(zone_id)
    };
    if let Some(public_id) = public_id {
        FunctionalZoneRepo::copy_public(&mut *tx, scenario_id, public_id, true).await?;
    }
    tx.commit().await?;

    tracing::info!(scenario_id, zone_id, "Scenario functional zone deleted");
    publish(
        &state,
        DomainEvent::ScenarioZonesUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok(StatusCode::NO_CONTENT)
}
