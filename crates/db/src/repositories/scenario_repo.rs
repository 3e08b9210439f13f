//! Repository for the `scenarios` table.

use sqlx::PgExecutor;
use urban_core::types::DbId;

use crate::models::scenario::{PatchScenario, Scenario, ScenarioWithProject};
use crate::repositories::Tx;

/// Column list for scenarios queries.
const COLUMNS: &str = "id, project_id, parent_id, name, is_based, functional_zone_type_id, \
    properties, created_at, updated_at";

/// Provides CRUD operations for scenarios.
pub struct ScenarioRepo;

/// Values for a new scenario row.
#[derive(Debug, Clone)]
pub struct NewScenario<'a> {
    pub project_id: DbId,
    pub parent_id: Option<DbId>,
    pub name: &'a str,
    pub is_based: bool,
    pub functional_zone_type_id: Option<DbId>,
    pub properties: Option<&'a serde_json::Value>,
}

impl ScenarioRepo {
    /// Insert a new scenario, returning the created row.
    pub async fn create(db: impl PgExecutor<'_>, new: &NewScenario<'_>) -> Result<Scenario, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenarios
                (project_id, parent_id, name, is_based, functional_zone_type_id, properties)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, '{{}}'::jsonb))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scenario>(&query)
            .bind(new.project_id)
            .bind(new.parent_id)
            .bind(new.name)
            .bind(new.is_based)
            .bind(new.functional_zone_type_id)
            .bind(new.properties)
            .fetch_one(db)
            .await
    }

    pub async fn find_by_id(db: impl PgExecutor<'_>, id: DbId) -> Result<Option<Scenario>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenarios WHERE id = $1");
        sqlx::query_as::<_, Scenario>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Find a scenario together with the project fields used for access checks.
    pub async fn find_with_project(
        db: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<ScenarioWithProject>, sqlx::Error> {
        sqlx::query_as::<_, ScenarioWithProject>(
            "SELECT s.id, s.project_id, s.parent_id, s.name, s.is_based,
                    s.functional_zone_type_id, s.properties, s.created_at, s.updated_at,
                    p.user_id AS project_user_id, p.name AS project_name,
                    p.territory_id AS project_territory_id,
                    p.is_public AS project_is_public, p.is_regional
             FROM scenarios s
             JOIN projects p ON p.id = s.project_id
             WHERE s.id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// List a project's scenarios, base first, then by id.
    pub async fn list_by_project(
        db: impl PgExecutor<'_>,
        project_id: DbId,
    ) -> Result<Vec<Scenario>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scenarios
             WHERE project_id = $1
             ORDER BY is_based DESC, id ASC"
        );
        sqlx::query_as::<_, Scenario>(&query)
            .bind(project_id)
            .fetch_all(db)
            .await
    }

    /// `(id, is_based)` for every based scenario of a project.
    pub async fn list_based(
        db: impl PgExecutor<'_>,
        project_id: DbId,
    ) -> Result<Vec<(DbId, bool)>, sqlx::Error> {
        sqlx::query_as("SELECT id, is_based FROM scenarios WHERE project_id = $1 AND is_based ORDER BY id")
            .bind(project_id)
            .fetch_all(db)
            .await
    }

    /// Update a scenario. `replace` applies `functional_zone_type_id` even
    /// when it is `None`; `demote` clears `is_based`. The `is_based` field of
    /// `input` is never written here.
    pub async fn update(
        db: impl PgExecutor<'_>,
        id: DbId,
        input: &PatchScenario,
        replace: bool,
        demote: bool,
    ) -> Result<Option<Scenario>, sqlx::Error> {
        let query = format!(
            "UPDATE scenarios SET
                name = COALESCE($2, name),
                functional_zone_type_id = CASE WHEN $5 THEN $3
                                               ELSE COALESCE($3, functional_zone_type_id) END,
                properties = COALESCE($4, properties),
                is_based = CASE WHEN $6 THEN false ELSE is_based END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scenario>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.functional_zone_type_id)
            .bind(&input.properties)
            .bind(replace)
            .bind(demote)
            .fetch_optional(db)
            .await
    }

    /// Delete a scenario and every private row it owns.
    ///
    /// Private physical objects, geometries and services are reachable only
    /// through the scenario's links, so they are collected and removed first.
    /// Buffers, functional zones and indicator values cascade with the row.
    pub async fn delete_with_private_rows(tx: &mut Tx<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let (physical_objects, geometries, services): (Vec<DbId>, Vec<DbId>, Vec<DbId>) =
            sqlx::query_as(
                "SELECT
                    COALESCE(array_agg(DISTINCT physical_object_id)
                        FILTER (WHERE physical_object_id IS NOT NULL), '{}'),
                    COALESCE(array_agg(DISTINCT object_geometry_id)
                        FILTER (WHERE object_geometry_id IS NOT NULL), '{}'),
                    COALESCE(array_agg(DISTINCT service_id)
                        FILTER (WHERE service_id IS NOT NULL), '{}')
                 FROM scenario_urban_objects
                 WHERE scenario_id = $1",
            )
            .bind(id)
            .fetch_one(&mut **tx)
            .await?;

        sqlx::query("DELETE FROM scenario_services WHERE id = ANY($1)")
            .bind(&services)
            .execute(&mut **tx)
            .await?;
        sqlx::query("DELETE FROM scenario_physical_objects WHERE id = ANY($1)")
            .bind(&physical_objects)
            .execute(&mut **tx)
            .await?;
        sqlx::query("DELETE FROM scenario_object_geometries WHERE id = ANY($1)")
            .bind(&geometries)
            .execute(&mut **tx)
            .await?;

        let result = sqlx::query("DELETE FROM scenarios WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        tracing::debug!(
            scenario_id = id,
            physical_objects = physical_objects.len(),
            geometries = geometries.len(),
            services = services.len(),
            "Deleted scenario private rows",
        );
        Ok(result.rows_affected() > 0)
    }
}
