//! Repository for the `territories` table.

use sqlx::PgExecutor;
use urban_core::types::DbId;

use crate::models::territory::{Territory, TerritoryEdge};

const COLUMNS: &str =
    "id, parent_id, name, level, is_city, ST_AsGeoJSON(geometry)::jsonb AS geometry";

pub struct TerritoryRepo;

impl TerritoryRepo {
    pub async fn find_by_id(
        db: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Territory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM territories WHERE id = $1");
        sqlx::query_as::<_, Territory>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Every `(id, parent_id)` pair, for building a `TerritoryTree`.
    pub async fn list_edges(db: impl PgExecutor<'_>) -> Result<Vec<TerritoryEdge>, sqlx::Error> {
        sqlx::query_as::<_, TerritoryEdge>("SELECT id, parent_id FROM territories ORDER BY id")
            .fetch_all(db)
            .await
    }

    /// Load the territories with the given ids, ordered by id.
    pub async fn list_by_ids(
        db: impl PgExecutor<'_>,
        ids: &[DbId],
    ) -> Result<Vec<Territory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM territories WHERE id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, Territory>(&query)
            .bind(ids)
            .fetch_all(db)
            .await
    }

    /// Territories of `level` lying within `meters` of a project's territory.
    pub async fn ids_near_project(
        db: impl PgExecutor<'_>,
        project_id: DbId,
        level: i32,
        meters: f64,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT t.id FROM territories t
             JOIN project_territories pt ON pt.project_id = $1
             WHERE t.level = $2
               AND ST_DWithin(t.geometry::geography, pt.geometry::geography, $3)
             ORDER BY t.id",
        )
        .bind(project_id)
        .bind(level)
        .bind(meters)
        .fetch_all(db)
        .await
    }
}
