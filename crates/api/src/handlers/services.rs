//! Handlers for scenario services.
//!
//! A service hangs off an urban-object link. Creating one attaches it to a
//! link that matches the requested physical object and geometry, or adds a
//! sibling link when every match already carries a service.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use urban_core::error::CoreError;
use urban_core::filters;
use urban_core::overlay::{resolve_overlay, ObjectSlot, SlotRef, WriteTarget};
use urban_core::scenario::KindRequirement;
use urban_core::types::DbId;
use urban_db::models::service::{CreateScenarioService, PatchService, PutService, ServiceFilter};
use urban_db::models::urban_object::ScenarioUrbanObject;
use urban_db::repositories::{ReferenceTable, ServiceRepo, Tx, UrbanObjectRepo};
use urban_events::DomainEvent;

use super::overlay::{not_found, repoint_links, write_target};
use super::{ensure_reference_exists, publish};
use crate::error::{AppError, AppResult};
use crate::guard::{check_scenario, ScenarioContext};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::query::ScenarioObjectParams;
use crate::response::DataResponse;
use crate::state::AppState;

const SLOT: ObjectSlot = ObjectSlot::Service;
const ENTITY: &str = "services";

fn slot_matches(slot: SlotRef, id: DbId, is_private: bool) -> bool {
    slot.id() == id && slot.is_private() == is_private
}

async fn private_copy(tx: &mut Tx<'_>, target: WriteTarget) -> AppResult<DbId> {
    match target {
        WriteTarget::Private(id) => Ok(id),
        WriteTarget::CopyOnWrite { public_id, link_ids } => {
            let copy = ServiceRepo::copy_public(&mut **tx, public_id, false)
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
// GET /scenarios/{id}/services
// ---------------------------------------------------------------------------

pub async fn list(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    Path(scenario_id): Path<DbId>,
    Query(filter): Query<ServiceFilter>,
) -> AppResult<impl IntoResponse> {
    filters::exclusive(
        ("service_type_id", filter.service_type_id),
        ("urban_function_id", filter.urban_function_id),
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

    let candidates = ServiceRepo::candidates(&state.pool, scenario_id, &filter)
        .await?
        .into_iter()
        .map(|row| row.into_candidate())
        .collect();
    let services = resolve_overlay(candidates, &ctx.project)?;

    tracing::debug!(scenario_id, count = services.len(), "Listed scenario services");
    Ok(Json(DataResponse { data: services }))
}

// ---------------------------------------------------------------------------
// POST /scenarios/{id}/services
// ---------------------------------------------------------------------------

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(scenario_id): Path<DbId>,
    Json(input): Json<CreateScenarioService>,
) -> AppResult<impl IntoResponse> {
    let ctx = editable(&state, &user, scenario_id).await?;
    ensure_reference_exists(&state.pool, ReferenceTable::ServiceType, input.service_type_id).await?;

    let mut tx = state.pool.begin().await?;
    let rows = UrbanObjectRepo::list_by_scenario(&mut *tx, scenario_id).await?;
    let mut matching: Vec<(ScenarioUrbanObject, Option<SlotRef>, bool)> = Vec::new();
    for row in rows {
        let link = row.clone().into_link()?;
        if slot_matches(link.physical_object, input.physical_object_id, input.is_scenario_physical_object)
            && slot_matches(link.object_geometry, input.object_geometry_id, input.is_scenario_geometry)
        {
            matching.push((row, link.service, link.object_geometry.is_private()));
        }
    }
    let Some(first) = matching.first() else {
        return Err(AppError::Core(CoreError::NotFoundByParams {
            entity: "urban object",
            params: format!(
                "physical_object_id={}, object_geometry_id={}",
                input.physical_object_id, input.object_geometry_id
            ),
        }));
    };

    if !first.2 {
        let geometry = UrbanObjectRepo::link_geometry(&mut *tx, first.0.id).await?;
        ctx.project.ensure_not_locked(geometry.as_ref())?;
    }

    let service = ServiceRepo::insert_private(&mut *tx, &input).await?;
    let free = matching.iter().find(|(_, service, _)| service.is_none());
    let urban_object_id = match free {
        Some((row, _, _)) if UrbanObjectRepo::set_service(&mut *tx, row.id, service.id).await? => row.id,
        _ => UrbanObjectRepo::insert_with_service(&mut *tx, &first.0, service.id).await?,
    };
    tx.commit().await?;

    tracing::info!(
        scenario_id,
        service_id = service.id,
        urban_object_id,
        user_id = user.user_id,
        "Scenario service created"
    );
    publish(
        &state,
        DomainEvent::ScenarioObjectsUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: service })))
}

// ---------------------------------------------------------------------------
// PUT /scenarios/{id}/services/{service_id}
// ---------------------------------------------------------------------------

pub async fn put(
    State(state): State<AppState>,
    user: AuthUser,
    Path((scenario_id, service_id)): Path<(DbId, DbId)>,
    Query(params): Query<ScenarioObjectParams>,
    Json(input): Json<PutService>,
) -> AppResult<impl IntoResponse> {
    let ctx = editable(&state, &user, scenario_id).await?;
    ensure_reference_exists(&state.pool, ReferenceTable::ServiceType, input.service_type_id).await?;

    let mut tx = state.pool.begin().await?;
    let target = write_target(&mut tx, &ctx, SLOT, service_id, params.is_scenario_object).await?;
    let private_id = private_copy(&mut tx, target).await?;
    let service = ServiceRepo::replace(&mut *tx, private_id, &input)
        .await?
        .ok_or_else(|| not_found(SLOT, service_id))?;
    tx.commit().await?;

    tracing::info!(scenario_id, service_id, private_id, "Scenario service replaced");
    publish(
        &state,
        DomainEvent::ScenarioObjectsUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok(Json(DataResponse { data: service }))
}

// ---------------------------------------------------------------------------
// PATCH /scenarios/{id}/services/{service_id}
// ---------------------------------------------------------------------------

pub async fn patch(
    State(state): State<AppState>,
    user: AuthUser,
    Path((scenario_id, service_id)): Path<(DbId, DbId)>,
    Query(params): Query<ScenarioObjectParams>,
    Json(input): Json<PatchService>,
) -> AppResult<impl IntoResponse> {
    let ctx = editable(&state, &user, scenario_id).await?;
    if let Some(type_id) = input.service_type_id {
        ensure_reference_exists(&state.pool, ReferenceTable::ServiceType, type_id).await?;
    }

    let mut tx = state.pool.begin().await?;
    let target = write_target(&mut tx, &ctx, SLOT, service_id, params.is_scenario_object).await?;
    let private_id = private_copy(&mut tx, target).await?;
    let service = ServiceRepo::patch(&mut *tx, private_id, &input)
        .await?
        .ok_or_else(|| not_found(SLOT, service_id))?;
    tx.commit().await?;

    tracing::info!(scenario_id, service_id, private_id, "Scenario service patched");
    publish(
        &state,
        DomainEvent::ScenarioObjectsUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok(Json(DataResponse { data: service }))
}

// ---------------------------------------------------------------------------
// DELETE /scenarios/{id}/services/{service_id}
// ---------------------------------------------------------------------------

/// Delete a service. The links keep their physical object and geometry.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path((scenario_id, service_id)): Path<(DbId, DbId)>,
    Query(params): Query<ScenarioObjectParams>,
) -> AppResult<StatusCode> {
    let ctx = editable(&state, &user, scenario_id).await?;

    let mut tx = state.pool.begin().await?;
    match write_target(&mut tx, &ctx, SLOT, service_id, params.is_scenario_object).await? {
        WriteTarget::Private(id) => {
            let live = ServiceRepo::find_private(&mut *tx, id)
                .await?
                .is_some_and(|row| !row.is_deleted);
            if !live || !ServiceRepo::delete_private(&mut *tx, id).await? {
                return Err(not_found(SLOT, service_id));
            }
        }
        WriteTarget::CopyOnWrite { public_id, link_ids } => {
            let tombstone = ServiceRepo::copy_public(&mut *tx, public_id, true)
                .await?
                .ok_or_else(|| not_found(SLOT, public_id))?;
            repoint_links(&mut tx, SLOT, &link_ids, tombstone.id).await?;
        }
    }
    tx.commit().await?;

    tracing::info!(scenario_id, service_id, "Scenario service deleted");
    publish(
        &state,
        DomainEvent::ScenarioObjectsUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok(StatusCode::NO_CONTENT)
}
