//! Link-based copy-on-write plumbing shared by the physical object,
//! geometry and service handlers.

use urban_core::error::CoreError;
use urban_core::overlay::{resolve_write_target, ObjectSlot, UrbanObjectLink, WriteTarget};
use urban_core::types::DbId;
use urban_db::repositories::{Tx, UrbanObjectRepo};

use crate::error::{AppError, AppResult};
use crate::guard::ScenarioContext;

/// Every link of a scenario, validated into typed slots.
pub async fn scenario_links(tx: &mut Tx<'_>, scenario_id: DbId) -> AppResult<Vec<UrbanObjectLink>> {
    let rows = UrbanObjectRepo::list_by_scenario(&mut **tx, scenario_id).await?;
    rows.into_iter()
        .map(|row| row.into_link().map_err(AppError::from))
        .collect()
}

/// Decide where a write on `slot` lands, reading the links inside `tx`.
///
/// Public objects whose geometry no longer meets the project territory are
/// locked and refused here.
pub async fn write_target(
    tx: &mut Tx<'_>,
    ctx: &ScenarioContext,
    slot: ObjectSlot,
    object_id: DbId,
    is_scenario_object: bool,
) -> AppResult<WriteTarget> {
    let links = scenario_links(tx, ctx.scenario_id()).await?;
    let target = resolve_write_target(&links, slot, object_id, is_scenario_object)?;

    if let WriteTarget::CopyOnWrite { link_ids, .. } = &target {
        if let Some(&link_id) = link_ids.first() {
            let geometry = UrbanObjectRepo::link_geometry(&mut **tx, link_id).await?;
            ctx.project.ensure_not_locked(geometry.as_ref())?;
        }
    }
    Ok(target)
}

/// Point the listed links at the fresh private copy of a public row.
pub async fn repoint_links(
    tx: &mut Tx<'_>,
    slot: ObjectSlot,
    link_ids: &[DbId],
    private_id: DbId,
) -> AppResult<()> {
    let updated = UrbanObjectRepo::repoint(tx, slot, link_ids, private_id).await?;
    tracing::debug!(
        slot = slot.entity(),
        private_id,
        links = updated,
        "Repointed scenario links to private copy"
    );
    Ok(())
}

pub fn not_found(slot: ObjectSlot, id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: slot.entity(),
        id,
    })
}
