//! Handlers for scenario object geometries.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use urban_core::geometry::geometry_from_geojson;
use urban_core::overlay::{resolve_overlay, ObjectSlot, WriteTarget};
use urban_core::scenario::KindRequirement;
use urban_core::types::DbId;
use urban_db::models::geometry::{PatchObjectGeometry, PutObjectGeometry};
use urban_db::repositories::{GeometryRepo, ReferenceTable, Tx};
use urban_events::DomainEvent;

use super::overlay::{not_found, repoint_links, write_target};
use super::{ensure_reference_exists, publish};
use crate::error::AppResult;
use crate::guard::{check_scenario, ScenarioContext};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::query::ScenarioObjectParams;
use crate::response::DataResponse;
use crate::state::AppState;

const SLOT: ObjectSlot = ObjectSlot::Geometry;
const ENTITY: &str = "object geometries";

async fn private_copy(tx: &mut Tx<'_>, target: WriteTarget) -> AppResult<DbId> {
    match target {
        WriteTarget::Private(id) => Ok(id),
        WriteTarget::CopyOnWrite { public_id, link_ids } => {
            let copy = GeometryRepo::copy_public(&mut **tx, public_id, false)
                .await?
                .ok_or_else(|| not_found(SLOT, public_id))?;
            repoint_links(tx, SLOT, &link_ids, copy.id).await?;
            Ok(copy.id)
        }
    }
}

async fn editable(state: &AppState, user: &AuthUser, scenario_id: DbId) -> AppResult<ScenarioContext> {
    check_scenario(
        &state.pool,
        scenario_id,
        Some(&user.requester()),
        true,
        KindRequirement::Any,
        ENTITY,
    )
    .await
}

// ---------------------------------------------------------------------------
// GET /scenarios/{id}/geometries
// ---------------------------------------------------------------------------

pub async fn list(
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

    let candidates = GeometryRepo::candidates(&state.pool, scenario_id)
        .await?
        .into_iter()
        .map(|row| row.into_candidate())
        .collect();
    let geometries = resolve_overlay(candidates, &ctx.project)?;

    Ok(Json(DataResponse { data: geometries }))
}

// ---------------------------------------------------------------------------
// PUT /scenarios/{id}/geometries/{geometry_id}
// ---------------------------------------------------------------------------

pub async fn put(
    State(state): State<AppState>,
    user: AuthUser,
    Path((scenario_id, geometry_id)): Path<(DbId, DbId)>,
    Query(params): Query<ScenarioObjectParams>,
    Json(input): Json<PutObjectGeometry>,
) -> AppResult<impl IntoResponse> {
    let ctx = editable(&state, &user, scenario_id).await?;
    geometry_from_geojson(&input.geometry)?;
    ensure_reference_exists(&state.pool, ReferenceTable::Territory, input.territory_id).await?;

    let mut tx = state.pool.begin().await?;
    let target = write_target(&mut tx, &ctx, SLOT, geometry_id, params.is_scenario_object).await?;
    let private_id = private_copy(&mut tx, target).await?;
    let geometry = GeometryRepo::replace(&mut *tx, private_id, &input)
        .await?
        .ok_or_else(|| not_found(SLOT, geometry_id))?;
    tx.commit().await?;

    tracing::info!(scenario_id, geometry_id, private_id, "Scenario object geometry replaced");
    publish(
        &state,
        DomainEvent::ScenarioObjectsUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok(Json(DataResponse { data: geometry }))
}

// ---------------------------------------------------------------------------
// PATCH /scenarios/{id}/geometries/{geometry_id}
// ---------------------------------------------------------------------------

pub async fn patch(
    State(state): State<AppState>,
    user: AuthUser,
    Path((scenario_id, geometry_id)): Path<(DbId, DbId)>,
    Query(params): Query<ScenarioObjectParams>,
    Json(input): Json<PatchObjectGeometry>,
) -> AppResult<impl IntoResponse> {
    let ctx = editable(&state, &user, scenario_id).await?;
    if let Some(geometry) = &input.geometry {
        geometry_from_geojson(geometry)?;
    }
    if let Some(territory_id) = input.territory_id {
        ensure_reference_exists(&state.pool, ReferenceTable::Territory, territory_id).await?;
    }

    let mut tx = state.pool.begin().await?;
    let target = write_target(&mut tx, &ctx, SLOT, geometry_id, params.is_scenario_object).await?;
    let private_id = private_copy(&mut tx, target).await?;
    let geometry = GeometryRepo::patch(&mut *tx, private_id, &input)
        .await?
        .ok_or_else(|| not_found(SLOT, geometry_id))?;
    tx.commit().await?;

    tracing::info!(scenario_id, geometry_id, private_id, "Scenario object geometry patched");
    publish(
        &state,
        DomainEvent::ScenarioObjectsUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok(Json(DataResponse { data: geometry }))
}

// ---------------------------------------------------------------------------
// DELETE /scenarios/{id}/geometries/{geometry_id}
// ---------------------------------------------------------------------------

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path((scenario_id, geometry_id)): Path<(DbId, DbId)>,
    Query(params): Query<ScenarioObjectParams>,
) -> AppResult<StatusCode> {
    let ctx = editable(&state, &user, scenario_id).await?;

    let mut tx = state.pool.begin().await?;
    match write_target(&mut tx, &ctx, SLOT, geometry_id, params.is_scenario_object).await? {
        WriteTarget::Private(id) => {
            let live = GeometryRepo::find_private(&mut *tx, id)
                .await?
                .is_some_and(|row| !row.is_deleted);
            if !live || !GeometryRepo::delete_private(&mut tx, id).await? {
                return Err(not_found(SLOT, geometry_id));
            }
        }
        WriteTarget::CopyOnWrite { public_id, link_ids } => {
            let tombstone = GeometryRepo::copy_public(&mut *tx, public_id, true)
                .await?
                .ok_or_else(|| not_found(SLOT, public_id))?;
            repoint_links(&mut tx, SLOT, &link_ids, tombstone.id).await?;
        }
    }
    tx.commit().await?;

    tracing::info!(scenario_id, geometry_id, "Scenario object geometry deleted");
    publish(
        &state,
        DomainEvent::ScenarioObjectsUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok(StatusCode::NO_CONTENT)
}
