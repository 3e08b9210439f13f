//! Handlers for scenario buffers.
//!
//! Buffers are keyed by buffer type and urban-object link. Only project
//! scenarios carry them.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use urban_core::error::CoreError;
use urban_core::filters;
use urban_core::geometry::geometry_from_geojson;
use urban_core::overlay::resolve_overlay;
use urban_core::scenario::KindRequirement;
use urban_core::types::DbId;
use urban_db::models::buffer::{BufferFilter, DeleteScenarioBuffer, PutScenarioBuffer};
use urban_db::models::urban_object::ScenarioUrbanObject;
use urban_db::repositories::{BufferRepo, ReferenceTable, Tx, UrbanObjectRepo};
use urban_events::DomainEvent;

use super::{ensure_reference_exists, publish};
use crate::error::{AppError, AppResult};
use crate::guard::{check_scenario, ScenarioContext};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::response::DataResponse;
use crate::state::AppState;

const ENTITY: &str = "buffers";

/// Find the scenario link a buffer request addresses: a link id when
/// `is_scenario_object`, otherwise the link inheriting that public urban
/// object.
async fn find_link(
    tx: &mut Tx<'_>,
    scenario_id: DbId,
    urban_object_id: DbId,
    is_scenario_object: bool,
) -> AppResult<ScenarioUrbanObject> {
    let link = if is_scenario_object {
        UrbanObjectRepo::find_by_id(&mut **tx, scenario_id, urban_object_id).await?
    } else {
        UrbanObjectRepo::list_by_scenario(&mut **tx, scenario_id)
            .await?
            .into_iter()
            .find(|row| row.public_urban_object_id == Some(urban_object_id))
    };
    link.ok_or(AppError::Core(CoreError::NotFound {
        entity: "urban object",
        id: urban_object_id,
    }))
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

// ---------------------------------------------------------------------------
// GET /scenarios/{id}/buffers
// ---------------------------------------------------------------------------

pub async fn list(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    Path(scenario_id): Path<DbId>,
    Query(filter): Query<BufferFilter>,
) -> AppResult<impl IntoResponse> {
    filters::exclusive(
        ("physical_object_type_id", filter.physical_object_type_id),
        ("service_type_id", filter.service_type_id),
    )?;
    let ctx = check_scenario(
        &state.pool,
        scenario_id,
        user.requester().as_ref(),
        false,
        KindRequirement::ProjectOnly,
        ENTITY,
    )
    .await?;

    let candidates = BufferRepo::candidates(&state.pool, scenario_id, &filter)
        .await?
        .into_iter()
        .map(|row| row.into_candidate())
        .collect();
    let buffers = resolve_overlay(candidates, &ctx.project)?;

    Ok(Json(DataResponse { data: buffers }))
}

// ---------------------------------------------------------------------------
// PUT /scenarios/{id}/buffers
// ---------------------------------------------------------------------------

/// Create or replace the scenario buffer of a type on a link.
///
/// Without a geometry the buffer is derived from the link geometry and the
/// default radius of the buffer type.
pub async fn put(
    State(state): State<AppState>,
    user: AuthUser,
    Path(scenario_id): Path<DbId>,
    Json(input): Json<PutScenarioBuffer>,
) -> AppResult<impl IntoResponse> {
    let ctx = editable(&state, &user, scenario_id).await?;
    ensure_reference_exists(&state.pool, ReferenceTable::BufferType, input.buffer_type_id).await?;
    if let Some(geometry) = &input.geometry {
        geometry_from_geojson(geometry)?;
    }

    let mut tx = state.pool.begin().await?;
    let link = find_link(&mut tx, scenario_id, input.urban_object_id, input.is_scenario_object).await?;
    if link.object_geometry_id.is_none() {
        let geometry = UrbanObjectRepo::link_geometry(&mut *tx, link.id).await?;
        ctx.project.ensure_not_locked(geometry.as_ref())?;
    }

    let radius = match input.geometry {
        Some(_) => None,
        None => Some(
            BufferRepo::default_radius(&mut *tx, link.id, input.buffer_type_id)
                .await?
                .ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "No default radius for buffer type {} on urban object {}",
                        input.buffer_type_id, input.urban_object_id
                    ))
                })?,
        ),
    };
    let public_buffer_id =
        BufferRepo::find_public_for_link(&mut *tx, link.id, input.buffer_type_id).await?;
    let buffer = BufferRepo::upsert(
        &mut *tx,
        link.id,
        input.buffer_type_id,
        public_buffer_id,
        input.geometry.as_ref(),
        radius,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        scenario_id,
        buffer_id = buffer.id,
        buffer_type_id = input.buffer_type_id,
        urban_object_id = link.id,
        is_custom = buffer.is_custom,
        "Scenario buffer stored"
    );
    publish(
        &state,
        DomainEvent::ScenarioObjectsUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok(Json(DataResponse { data: buffer }))
}

// ---------------------------------------------------------------------------
// DELETE /scenarios/{id}/buffers
// ---------------------------------------------------------------------------

/// Delete a buffer. An inherited public buffer is hidden with a tombstone.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(scenario_id): Path<DbId>,
    Query(params): Query<DeleteScenarioBuffer>,
) -> AppResult<StatusCode> {
    let ctx = editable(&state, &user, scenario_id).await?;

    let mut tx = state.pool.begin().await?;
    let link = find_link(&mut tx, scenario_id, params.urban_object_id, params.is_scenario_object).await?;
    let not_found = || {
        AppError::Core(CoreError::NotFoundByParams {
            entity: "buffer",
            params: format!(
                "buffer_type_id={}, urban_object_id={}",
                params.buffer_type_id, params.urban_object_id
            ),
        })
    };

    let private = BufferRepo::find_private(&mut *tx, link.id, params.buffer_type_id).await?;
    if private.as_ref().is_some_and(|buffer| buffer.is_deleted) {
        return Err(not_found());
    }
    match BufferRepo::find_public_for_link(&mut *tx, link.id, params.buffer_type_id).await? {
        Some(public_buffer_id) => {
            BufferRepo::tombstone_public(&mut *tx, link.id, public_buffer_id).await?;
        }
        None => {
            if !BufferRepo::delete_private(&mut *tx, link.id, params.buffer_type_id).await? {
                return Err(not_found());
            }
        }
    }
    tx.commit().await?;

    tracing::info!(
        scenario_id,
        buffer_type_id = params.buffer_type_id,
        urban_object_id = link.id,
        "Scenario buffer deleted"
    );
    publish(
        &state,
        DomainEvent::ScenarioObjectsUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok(StatusCode::NO_CONTENT)
}
