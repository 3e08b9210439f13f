//! Handlers for scenario physical objects.
//!
//! Reads merge the scenario's links into the overlay view. Writes against a
//! public object copy it into the scenario first and repoint every link that
//! referenced it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use urban_core::filters;
use urban_core::geometry::geometry_from_geojson;
use urban_core::overlay::{resolve_overlay, ObjectSlot, WriteTarget};
use urban_core::scenario::KindRequirement;
use urban_core::types::DbId;
use urban_db::models::geometry::ScenarioObjectGeometry;
use urban_db::models::physical_object::{
    CreateScenarioPhysicalObject, PatchPhysicalObject, PhysicalObjectFilter, PutPhysicalObject,
    ScenarioPhysicalObject,
};
use urban_db::repositories::{
    GeometryRepo, PhysicalObjectRepo, ReferenceTable, Tx, UrbanObjectRepo,
};
use urban_events::DomainEvent;

use super::overlay::{not_found, repoint_links, write_target};
use super::{ensure_reference_exists, publish};
use crate::error::AppResult;
use crate::guard::{check_scenario, ScenarioContext};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::query::ScenarioObjectParams;
use crate::response::DataResponse;
use crate::state::AppState;

const SLOT: ObjectSlot = ObjectSlot::PhysicalObject;
const ENTITY: &str = "physical objects";

/// A physical object created inside a scenario, with its geometry and link.
#[derive(Debug, Serialize)]
pub struct CreatedPhysicalObject {
    pub urban_object_id: DbId,
    pub physical_object: ScenarioPhysicalObject,
    pub object_geometry: ScenarioObjectGeometry,
}

/// Either a private row of this scenario or a fresh private copy of a
/// public one. Returns the private id the update must go to.
async fn private_copy(tx: &mut Tx<'_>, target: WriteTarget) -> AppResult<DbId> {
    match target {
        WriteTarget::Private(id) => Ok(id),
        WriteTarget::CopyOnWrite { public_id, link_ids } => {
            let copy = PhysicalObjectRepo::copy_public(&mut **tx, public_id, false)
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
// GET /scenarios/{id}/physical_objects
// ---------------------------------------------------------------------------

/// Overlay of the physical objects visible in a scenario.
pub async fn list(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    Path(scenario_id): Path<DbId>,
    Query(filter): Query<PhysicalObjectFilter>,
) -> AppResult<impl IntoResponse> {
    filters::exclusive(
        ("physical_object_type_id", filter.physical_object_type_id),
        ("physical_object_function_id", filter.physical_object_function_id),
    )?;
    let ctx = check_scenario(
        &state.pool,
        scenario_id,
        user.requester().as_ref(),
        false,
        KindRequirement::Any,
        ENTITY,
    )
    .await?;

    let candidates = PhysicalObjectRepo::candidates(&state.pool, scenario_id, &filter)
        .await?
        .into_iter()
        .map(|row| row.into_candidate())
        .collect();
    let objects = resolve_overlay(candidates, &ctx.project)?;

    tracing::debug!(scenario_id, count = objects.len(), "Listed scenario physical objects");
    Ok(Json(DataResponse { data: objects }))
}

// ---------------------------------------------------------------------------
// POST /scenarios/{id}/physical_objects
// ---------------------------------------------------------------------------

/// Create a private physical object together with its geometry and link.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(scenario_id): Path<DbId>,
    Json(input): Json<CreateScenarioPhysicalObject>,
) -> AppResult<impl IntoResponse> {
    let ctx = editable(&state, &user, scenario_id).await?;
    geometry_from_geojson(&input.geometry)?;
    ensure_reference_exists(&state.pool, ReferenceTable::PhysicalObjectType, input.physical_object_type_id)
        .await?;
    ensure_reference_exists(&state.pool, ReferenceTable::Territory, input.territory_id).await?;

    let mut tx = state.pool.begin().await?;
    let object_geometry = GeometryRepo::insert_private(
        &mut *tx,
        input.territory_id,
        &input.geometry,
        input.address.as_deref(),
        input.osm_id.as_deref(),
    )
    .await?;
    let physical_object = PhysicalObjectRepo::insert_private(&mut *tx, &input).await?;
    let urban_object_id =
        UrbanObjectRepo::insert_private(&mut *tx, scenario_id, physical_object.id, object_geometry.id)
            .await?;
    tx.commit().await?;

    tracing::info!(
        scenario_id,
        physical_object_id = physical_object.id,
        urban_object_id,
        user_id = user.user_id,
        "Scenario physical object created"
    );
    publish(
        &state,
        DomainEvent::ScenarioObjectsUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedPhysicalObject { urban_object_id, physical_object, object_geometry },
        }),
    ))
}

// ---------------------------------------------------------------------------
// PUT /scenarios/{id}/physical_objects/{object_id}
// ---------------------------------------------------------------------------

pub async fn put(
    State(state): State<AppState>,
    user: AuthUser,
    Path((scenario_id, object_id)): Path<(DbId, DbId)>,
    Query(params): Query<ScenarioObjectParams>,
    Json(input): Json<PutPhysicalObject>,
) -> AppResult<impl IntoResponse> {
    let ctx = editable(&state, &user, scenario_id).await?;
    ensure_reference_exists(&state.pool, ReferenceTable::PhysicalObjectType, input.physical_object_type_id)
        .await?;

    let mut tx = state.pool.begin().await?;
    let target = write_target(&mut tx, &ctx, SLOT, object_id, params.is_scenario_object).await?;
    let private_id = private_copy(&mut tx, target).await?;
    let object = PhysicalObjectRepo::replace(&mut *tx, private_id, &input)
        .await?
        .ok_or_else(|| not_found(SLOT, object_id))?;
    tx.commit().await?;

    tracing::info!(scenario_id, object_id, private_id, "Scenario physical object replaced");
    publish(
        &state,
        DomainEvent::ScenarioObjectsUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok(Json(DataResponse { data: object }))
}

// ---------------------------------------------------------------------------
// PATCH /scenarios/{id}/physical_objects/{object_id}
// ---------------------------------------------------------------------------

pub async fn patch(
    State(state): State<AppState>,
    user: AuthUser,
    Path((scenario_id, object_id)): Path<(DbId, DbId)>,
    Query(params): Query<ScenarioObjectParams>,
    Json(input): Json<PatchPhysicalObject>,
) -> AppResult<impl IntoResponse> {
    let ctx = editable(&state, &user, scenario_id).await?;
    if let Some(type_id) = input.physical_object_type_id {
        ensure_reference_exists(&state.pool, ReferenceTable::PhysicalObjectType, type_id).await?;
    }

    let mut tx = state.pool.begin().await?;
    let target = write_target(&mut tx, &ctx, SLOT, object_id, params.is_scenario_object).await?;
    let private_id = private_copy(&mut tx, target).await?;
    let object = PhysicalObjectRepo::patch(&mut *tx, private_id, &input)
        .await?
        .ok_or_else(|| not_found(SLOT, object_id))?;
    tx.commit().await?;

    tracing::info!(scenario_id, object_id, private_id, "Scenario physical object patched");
    publish(
        &state,
        DomainEvent::ScenarioObjectsUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok(Json(DataResponse { data: object }))
}

// ---------------------------------------------------------------------------
// DELETE /scenarios/{id}/physical_objects/{object_id}
// ---------------------------------------------------------------------------

/// Delete a physical object from the scenario.
///
/// A private object is removed together with its links. A public object is
/// hidden behind a tombstoned private copy.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path((scenario_id, object_id)): Path<(DbId, DbId)>,
    Query(params): Query<ScenarioObjectParams>,
) -> AppResult<StatusCode> {
    let ctx = editable(&state, &user, scenario_id).await?;

    let mut tx = state.pool.begin().await?;
    match write_target(&mut tx, &ctx, SLOT, object_id, params.is_scenario_object).await? {
        WriteTarget::Private(id) => {
            let live = PhysicalObjectRepo::find_private(&mut *tx, id)
                .await?
                .is_some_and(|row| !row.is_deleted);
            if !live || !PhysicalObjectRepo::delete_private(&mut tx, id).await? {
                return Err(not_found(SLOT, object_id));
            }
        }
        WriteTarget::CopyOnWrite { public_id, link_ids } => {
            let tombstone = PhysicalObjectRepo::copy_public(&mut *tx, public_id, true)
                .await?
                .ok_or_else(|| not_found(SLOT, public_id))?;
            repoint_links(&mut tx, SLOT, &link_ids, tombstone.id).await?;
        }
    }
    tx.commit().await?;

    tracing::info!(
        scenario_id,
        object_id,
        is_scenario_object = params.is_scenario_object,
        "Scenario physical object deleted"
    );
    publish(
        &state,
        DomainEvent::ScenarioObjectsUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok(StatusCode::NO_CONTENT)
}
