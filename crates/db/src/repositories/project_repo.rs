//! Repository for the `projects` and `project_territories` tables.

use sqlx::PgExecutor;
use urban_core::types::DbId;

use crate::geom_from_geojson;
use crate::models::project::{CreateProject, Project, ProjectTerritory, RegionalBase};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, name, description, territory_id, is_public, is_regional, \
    is_city, properties, created_at, updated_at";

const TERRITORY_COLUMNS: &str = "project_id, ST_AsGeoJSON(geometry)::jsonb AS geometry, \
    ST_AsGeoJSON(centre_point)::jsonb AS centre_point, updated_at";

/// Provides persistence for projects and their territories.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project owned by `user_id`, returning the created row.
    pub async fn create(
        db: impl PgExecutor<'_>,
        input: &CreateProject,
        user_id: DbId,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects
                (user_id, name, description, territory_id, is_public, is_regional, is_city, properties)
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, '{{}}'::jsonb))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.territory_id)
            .bind(input.is_public)
            .bind(input.is_regional)
            .bind(input.is_city)
            .bind(&input.properties)
            .fetch_one(db)
            .await
    }

    pub async fn find_by_id(db: impl PgExecutor<'_>, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Store the territory polygon of a project; the centre point is derived.
    pub async fn insert_territory(
        db: impl PgExecutor<'_>,
        project_id: DbId,
        geometry: &serde_json::Value,
    ) -> Result<ProjectTerritory, sqlx::Error> {
        let geom = geom_from_geojson(2);
        let query = format!(
            "INSERT INTO project_territories (project_id, geometry, centre_point)
             VALUES ($1, {geom}, ST_PointOnSurface({geom}))
             RETURNING {TERRITORY_COLUMNS}"
        );
        sqlx::query_as::<_, ProjectTerritory>(&query)
            .bind(project_id)
            .bind(geometry.to_string())
            .fetch_one(db)
            .await
    }

    /// Territory of a project. `None` for regional projects.
    pub async fn find_territory(
        db: impl PgExecutor<'_>,
        project_id: DbId,
    ) -> Result<Option<ProjectTerritory>, sqlx::Error> {
        let query =
            format!("SELECT {TERRITORY_COLUMNS} FROM project_territories WHERE project_id = $1");
        sqlx::query_as::<_, ProjectTerritory>(&query)
            .bind(project_id)
            .fetch_optional(db)
            .await
    }

    /// Replace a project's territory polygon.
    ///
    /// Returns `None` if the project has no territory row (regional projects).
    pub async fn update_territory(
        db: impl PgExecutor<'_>,
        project_id: DbId,
        geometry: &serde_json::Value,
    ) -> Result<Option<ProjectTerritory>, sqlx::Error> {
        let geom = geom_from_geojson(2);
        let query = format!(
            "UPDATE project_territories
             SET geometry = {geom}, centre_point = ST_PointOnSurface({geom})
             WHERE project_id = $1
             RETURNING {TERRITORY_COLUMNS}"
        );
        sqlx::query_as::<_, ProjectTerritory>(&query)
            .bind(project_id)
            .bind(geometry.to_string())
            .fetch_optional(db)
            .await
    }

    /// Regional projects on any of `territory_ids` that have a based scenario.
    pub async fn find_regional_bases(
        db: impl PgExecutor<'_>,
        territory_ids: &[DbId],
    ) -> Result<Vec<RegionalBase>, sqlx::Error> {
        sqlx::query_as::<_, RegionalBase>(
            "SELECT p.id AS project_id, p.territory_id, s.id AS scenario_id
             FROM projects p
             JOIN scenarios s ON s.project_id = p.id AND s.is_based
             WHERE p.is_regional AND p.territory_id = ANY($1)
             ORDER BY p.id",
        )
        .bind(territory_ids)
        .fetch_all(db)
        .await
    }
}
