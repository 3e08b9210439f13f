//! Request handlers.
//!
//! Each submodule serves one resource. Handlers run the guard, delegate to
//! the repositories in `urban_db`, commit, and only then publish their
//! domain event.

pub mod buffers;
pub mod functional_zones;
pub mod geometries;
pub mod indicators;
pub mod overlay;
pub mod physical_objects;
pub mod projects;
pub mod scenarios;
pub mod services;
pub mod urban_objects;

use urban_core::error::CoreError;
use urban_core::territory::TerritoryTree;
use urban_core::types::DbId;
use urban_db::repositories::{ReferenceRepo, ReferenceTable, TerritoryRepo};
use urban_db::DbPool;
use urban_events::DomainEvent;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Reject a payload that references a missing dictionary row.
pub(crate) async fn ensure_reference_exists(
    pool: &DbPool,
    table: ReferenceTable,
    id: DbId,
) -> AppResult<()> {
    if ReferenceRepo::exists(pool, table, id).await? {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: table.entity(),
            id,
        }))
    }
}

/// `territory_id` and every territory below it.
pub(crate) async fn territory_subtree(pool: &DbPool, territory_id: DbId) -> AppResult<Vec<DbId>> {
    let edges: Vec<(DbId, Option<DbId>)> = TerritoryRepo::list_edges(pool)
        .await?
        .into_iter()
        .map(|edge| (edge.id, edge.parent_id))
        .collect();
    Ok(TerritoryTree::from_edges(&edges).subtree(territory_id))
}

/// Publish a committed change on the event bus.
pub(crate) fn publish(state: &AppState, event: DomainEvent, actor: DbId) {
    state.event_bus.publish(event.into_platform_event(Some(actor)));
}
