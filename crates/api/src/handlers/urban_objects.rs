//! Raw urban-object links of a scenario.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use urban_core::scenario::KindRequirement;
use urban_core::types::DbId;
use urban_db::repositories::UrbanObjectRepo;

use crate::error::{AppError, AppResult};
use crate::guard::check_scenario;
use crate::middleware::auth::MaybeAuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /scenarios/{id}/urban_objects
// ---------------------------------------------------------------------------

/// List the links as stored. Each row is validated before it is returned, so
/// a link with both or neither side of a mandatory slot surfaces as an error.
pub async fn list(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    Path(scenario_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    check_scenario(
        &state.pool,
        scenario_id,
        user.requester().as_ref(),
        false,
        KindRequirement::Any,
        "urban objects",
    )
    .await?;

    let rows = UrbanObjectRepo::list_by_scenario(&state.pool, scenario_id).await?;
    for row in &rows {
        row.clone().into_link().map_err(AppError::from)?;
    }

    Ok(Json(DataResponse { data: rows }))
}
