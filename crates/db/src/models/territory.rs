//! Territory model.

use serde::Serialize;
use sqlx::FromRow;
use urban_core::types::DbId;

/// A row from the `territories` table, geometry as GeoJSON.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Territory {
    pub id: DbId,
    pub parent_id: Option<DbId>,
    pub name: String,
    pub level: i32,
    pub is_city: bool,
    pub geometry: serde_json::Value,
}

/// `(id, parent_id)` pair used to build a `TerritoryTree`.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct TerritoryEdge {
    pub id: DbId,
    pub parent_id: Option<DbId>,
}
