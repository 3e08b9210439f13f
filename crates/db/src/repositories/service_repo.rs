//! Repository for scenario services.

use sqlx::PgExecutor;
use urban_core::types::DbId;

use crate::models::service::{
    CreateScenarioService, PatchService, PutService, ScenarioService, ServiceCandidate,
    ServiceFilter,
};
use crate::repositories::urban_object_repo::{LINK_DELETED, LINK_GEOMETRY, LINK_JOINS};

const COLUMNS: &str =
    "id, public_service_id, service_type_id, name, capacity, is_capacity_real, properties, is_deleted";

pub struct ServiceRepo;

impl ServiceRepo {
    /// Services attached to the scenario's links, in link order.
    pub async fn candidates(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        filter: &ServiceFilter,
    ) -> Result<Vec<ServiceCandidate>, sqlx::Error> {
        let query = format!(
            "SELECT (l.service_id IS NOT NULL) AS is_scenario_object,
                    COALESCE(l.service_id, l.public_service_id) AS id,
                    st.id AS service_type_id,
                    st.name AS service_type_name,
                    st.urban_function_id,
                    CASE WHEN l.service_id IS NOT NULL THEN ss.name ELSE s.name END AS name,
                    CASE WHEN l.service_id IS NOT NULL THEN ss.capacity ELSE s.capacity END AS capacity,
                    COALESCE(ss.is_capacity_real, s.is_capacity_real) AS is_capacity_real,
                    COALESCE(ss.properties, s.properties) AS properties,
                    {LINK_GEOMETRY} AS geometry,
                    ({LINK_DELETED} OR COALESCE(ss.is_deleted, false)) AS is_deleted
             FROM scenario_urban_objects l
             {LINK_JOINS}
             LEFT JOIN services s ON s.id = l.public_service_id
             LEFT JOIN scenario_services ss ON ss.id = l.service_id
             JOIN service_types st ON st.id = COALESCE(ss.service_type_id, s.service_type_id)
             WHERE l.scenario_id = $1
               AND (l.service_id IS NOT NULL OR l.public_service_id IS NOT NULL)
               AND ($2::bigint IS NULL OR st.id = $2)
               AND ($3::bigint IS NULL OR st.urban_function_id = $3)
             ORDER BY l.id"
        );
        sqlx::query_as::<_, ServiceCandidate>(&query)
            .bind(scenario_id)
            .bind(filter.service_type_id)
            .bind(filter.urban_function_id)
            .fetch_all(db)
            .await
    }

    pub async fn find_private(
        db: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<ScenarioService>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenario_services WHERE id = $1");
        sqlx::query_as::<_, ScenarioService>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn insert_private(
        db: impl PgExecutor<'_>,
        input: &CreateScenarioService,
    ) -> Result<ScenarioService, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenario_services
                (service_type_id, name, capacity, is_capacity_real, properties)
             VALUES ($1, $2, $3, $4, COALESCE($5, '{{}}'::jsonb))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioService>(&query)
            .bind(input.service_type_id)
            .bind(&input.name)
            .bind(input.capacity)
            .bind(input.is_capacity_real)
            .bind(&input.properties)
            .fetch_one(db)
            .await
    }

    /// Copy a public service into a private row that shadows it.
    pub async fn copy_public(
        db: impl PgExecutor<'_>,
        public_id: DbId,
        tombstone: bool,
    ) -> Result<Option<ScenarioService>, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenario_services
                (public_service_id, service_type_id, name, capacity, is_capacity_real, properties, is_deleted)
             SELECT id, service_type_id, name, capacity, is_capacity_real, properties, $2
             FROM services WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioService>(&query)
            .bind(public_id)
            .bind(tombstone)
            .fetch_optional(db)
            .await
    }

    pub async fn replace(
        db: impl PgExecutor<'_>,
        id: DbId,
        input: &PutService,
    ) -> Result<Option<ScenarioService>, sqlx::Error> {
        let query = format!(
            "UPDATE scenario_services SET
                service_type_id = $2,
                name = $3,
                capacity = $4,
                is_capacity_real = $5,
                properties = $6
             WHERE id = $1 AND NOT is_deleted
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioService>(&query)
            .bind(id)
            .bind(input.service_type_id)
            .bind(&input.name)
            .bind(input.capacity)
            .bind(input.is_capacity_real)
            .bind(&input.properties)
            .fetch_optional(db)
            .await
    }

    pub async fn patch(
        db: impl PgExecutor<'_>,
        id: DbId,
        input: &PatchService,
    ) -> Result<Option<ScenarioService>, sqlx::Error> {
        let query = format!(
            "UPDATE scenario_services SET
                service_type_id = COALESCE($2, service_type_id),
                name = COALESCE($3, name),
                capacity = COALESCE($4, capacity),
                is_capacity_real = COALESCE($5, is_capacity_real),
                properties = COALESCE($6, properties)
             WHERE id = $1 AND NOT is_deleted
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioService>(&query)
            .bind(id)
            .bind(input.service_type_id)
            .bind(&input.name)
            .bind(input.capacity)
            .bind(input.is_capacity_real)
            .bind(&input.properties)
            .fetch_optional(db)
            .await
    }

    /// Delete a private service. Links keep their object and geometry.
    pub async fn delete_private(db: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM scenario_services WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
