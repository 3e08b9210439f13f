//! Handlers for scenario indicator values.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use urban_core::error::CoreError;
use urban_core::overlay::{check_public_override, resolve_overlay};
use urban_core::scenario::KindRequirement;
use urban_core::types::DbId;
use urban_db::models::indicator::{
    CreateScenarioIndicatorValue, IndicatorValueFilter, PutIndicatorValue,
};
use urban_db::repositories::{IndicatorRepo, ReferenceTable};
use urban_events::DomainEvent;

use super::{ensure_reference_exists, publish};
use crate::error::{AppError, AppResult};
use crate::guard::{check_scenario, ScenarioContext};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::query::ScenarioObjectParams;
use crate::response::DataResponse;
use crate::state::AppState;

const ENTITY: &str = "indicator values";
const VALUE: &str = "indicator value";

fn value_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: VALUE, id })
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
// GET /scenarios/{id}/indicators
// ---------------------------------------------------------------------------

pub async fn list(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    Path(scenario_id): Path<DbId>,
    Query(filter): Query<IndicatorValueFilter>,
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

    let candidates = IndicatorRepo::candidates(
        &state.pool,
        scenario_id,
        ctx.scenario.project_territory_id,
        &filter,
    )
    .await?
    .into_iter()
    .map(|row| row.into_candidate())
    .collect();
    let values = resolve_overlay(candidates, &ctx.project)?;

    Ok(Json(DataResponse { data: values }))
}

// ---------------------------------------------------------------------------
// POST /scenarios/{id}/indicators
// ---------------------------------------------------------------------------

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(scenario_id): Path<DbId>,
    Json(input): Json<CreateScenarioIndicatorValue>,
) -> AppResult<impl IntoResponse> {
    let ctx = editable(&state, &user, scenario_id).await?;
    ensure_reference_exists(&state.pool, ReferenceTable::Indicator, input.indicator_id).await?;
    if let Some(territory_id) = input.territory_id {
        ensure_reference_exists(&state.pool, ReferenceTable::Territory, territory_id).await?;
    }

    let value = IndicatorRepo::insert_private(&state.pool, scenario_id, &input).await?;

    tracing::info!(
        scenario_id,
        indicator_value_id = value.id,
        indicator_id = value.indicator_id,
        "Scenario indicator value created"
    );
    publish(
        &state,
        DomainEvent::ScenarioIndicatorsUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: value })))
}

// ---------------------------------------------------------------------------
// PUT /scenarios/{id}/indicators/{value_id}
// ---------------------------------------------------------------------------

pub async fn put(
    State(state): State<AppState>,
    user: AuthUser,
    Path((scenario_id, value_id)): Path<(DbId, DbId)>,
    Query(params): Query<ScenarioObjectParams>,
    Json(input): Json<PutIndicatorValue>,
) -> AppResult<impl IntoResponse> {
    let ctx = editable(&state, &user, scenario_id).await?;

    let mut tx = state.pool.begin().await?;
    let private_id = if params.is_scenario_object {
        IndicatorRepo::find_private(&mut *tx, scenario_id, value_id)
            .await?
            .filter(|value| !value.is_deleted)
            .ok_or_else(|| value_not_found(value_id))?
            .id
    } else {
        let exists =
            IndicatorRepo::public_exists(&mut *tx, value_id, ctx.scenario.project_territory_id).await?;
        let shadowed = IndicatorRepo::is_shadowed(&mut *tx, scenario_id, value_id).await?;
        check_public_override(VALUE, value_id, exists, shadowed)?;
        IndicatorRepo::copy_public(&mut *tx, scenario_id, value_id, false)
            .await?
            .ok_or_else(|| value_not_found(value_id))?
            .id
    };
    let value = IndicatorRepo::replace(&mut *tx, private_id, &input)
        .await?
        .ok_or_else(|| value_not_found(value_id))?;
    tx.commit().await?;

    tracing::info!(scenario_id, value_id, private_id, "Scenario indicator value replaced");
    publish(
        &state,
        DomainEvent::ScenarioIndicatorsUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok(Json(DataResponse { data: value }))
}

// ---------------------------------------------------------------------------
// DELETE /scenarios/{id}/indicators/{value_id}
// ---------------------------------------------------------------------------

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path((scenario_id, value_id)): Path<(DbId, DbId)>,
    Query(params): Query<ScenarioObjectParams>,
) -> AppResult<StatusCode> {
    let ctx = editable(&state, &user, scenario_id).await?;

    let mut tx = state.pool.begin().await?;
    let public_id = if params.is_scenario_object {
        let value = IndicatorRepo::find_private(&mut *tx, scenario_id, value_id)
            .await?
            .filter(|value| !value.is_deleted)
            .ok_or_else(|| value_not_found(value_id))?;
        IndicatorRepo::delete_private(&mut *tx, value.id).await?;
        value.public_indicator_value_id
    } else {
        let exists =
            IndicatorRepo::public_exists(&mut *tx, value_id, ctx.scenario.project_territory_id).await?;
        let shadowed = IndicatorRepo::is_shadowed(&mut *tx, scenario_id, value_id).await?;
        check_public_override(VALUE, value_id, exists, shadowed)?;
        Some(value_id)
    };
    if let Some(public_id) = public_id {
        IndicatorRepo::copy_public(&mut *tx, scenario_id, public_id, true).await?;
    }
    tx.commit().await?;

    tracing::info!(scenario_id, value_id, "Scenario indicator value deleted");
    publish(
        &state,
        DomainEvent::ScenarioIndicatorsUpdated { project_id: ctx.project_id(), scenario_id },
        user.user_id,
    );
    Ok(StatusCode::NO_CONTENT)
}
