//! Repository for scenario buffers.
//!
//! Public buffers hang off public urban objects; scenario buffers are keyed
//! by `(buffer_type_id, scenario_urban_object_id)` and hide the public buffer
//! of the same type on the same link.

use sqlx::PgExecutor;
use urban_core::types::DbId;

use crate::models::buffer::{BufferCandidate, BufferFilter, ScenarioBuffer};
use crate::repositories::urban_object_repo::{LINK_DELETED, LINK_JOINS};

const COLUMNS: &str = "id, buffer_type_id, scenario_urban_object_id, public_buffer_id, \
    ST_AsGeoJSON(geometry)::jsonb AS geometry, is_custom, is_deleted";

pub struct BufferRepo;

impl BufferRepo {
    /// Public and scenario buffers of the scenario's links.
    pub async fn candidates(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        filter: &BufferFilter,
    ) -> Result<Vec<BufferCandidate>, sqlx::Error> {
        let query = format!(
            "SELECT * FROM (
                SELECT false AS is_scenario_object, b.id, b.buffer_type_id,
                       bt.name AS buffer_type_name, l.id AS urban_object_id,
                       ST_AsGeoJSON(b.geometry)::jsonb AS geometry, b.is_custom,
                       {LINK_DELETED} AS is_deleted,
                       COALESCE(spo.physical_object_type_id, po.physical_object_type_id) AS physical_object_type_id,
                       COALESCE(ss.service_type_id, s.service_type_id) AS service_type_id
                FROM scenario_urban_objects l
                {LINK_JOINS}
                LEFT JOIN services s ON s.id = l.public_service_id
                LEFT JOIN scenario_services ss ON ss.id = l.service_id
                JOIN buffers b ON b.urban_object_id = l.public_urban_object_id
                JOIN buffer_types bt ON bt.id = b.buffer_type_id
                WHERE l.scenario_id = $1
                  AND l.public_object_geometry_id IS NOT NULL
                  AND NOT EXISTS (
                      SELECT 1 FROM scenario_buffers sb
                      WHERE sb.scenario_urban_object_id = l.id
                        AND sb.buffer_type_id = b.buffer_type_id)
                UNION ALL
                SELECT true, sb.id, sb.buffer_type_id, bt.name, l.id,
                       ST_AsGeoJSON(sb.geometry)::jsonb, sb.is_custom,
                       ({LINK_DELETED} OR sb.is_deleted),
                       COALESCE(spo.physical_object_type_id, po.physical_object_type_id),
                       COALESCE(ss.service_type_id, s.service_type_id)
                FROM scenario_urban_objects l
                {LINK_JOINS}
                LEFT JOIN services s ON s.id = l.public_service_id
                LEFT JOIN scenario_services ss ON ss.id = l.service_id
                JOIN scenario_buffers sb ON sb.scenario_urban_object_id = l.id
                JOIN buffer_types bt ON bt.id = sb.buffer_type_id
                WHERE l.scenario_id = $1
             ) AS candidates
             WHERE ($2::bigint IS NULL OR buffer_type_id = $2)
               AND ($3::bigint IS NULL OR physical_object_type_id = $3)
               AND ($4::bigint IS NULL OR service_type_id = $4)
             ORDER BY urban_object_id, buffer_type_id"
        );
        sqlx::query_as::<_, BufferCandidate>(&query)
            .bind(scenario_id)
            .bind(filter.buffer_type_id)
            .bind(filter.physical_object_type_id)
            .bind(filter.service_type_id)
            .fetch_all(db)
            .await
    }

    /// The scenario buffer of a type on a link, tombstones included.
    pub async fn find_private(
        db: impl PgExecutor<'_>,
        link_id: DbId,
        buffer_type_id: DbId,
    ) -> Result<Option<ScenarioBuffer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scenario_buffers
             WHERE scenario_urban_object_id = $1 AND buffer_type_id = $2"
        );
        sqlx::query_as::<_, ScenarioBuffer>(&query)
            .bind(link_id)
            .bind(buffer_type_id)
            .fetch_optional(db)
            .await
    }

    /// Id of the public buffer of a type visible through a link, if any.
    pub async fn find_public_for_link(
        db: impl PgExecutor<'_>,
        link_id: DbId,
        buffer_type_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT b.id FROM scenario_urban_objects l
             JOIN buffers b ON b.urban_object_id = l.public_urban_object_id
             WHERE l.id = $1 AND b.buffer_type_id = $2
               AND l.public_object_geometry_id IS NOT NULL",
        )
        .bind(link_id)
        .bind(buffer_type_id)
        .fetch_optional(db)
        .await
    }

    /// Default radius in meters for a buffer type on a link, matched by the
    /// link's service type first, then its physical object type.
    pub async fn default_radius(
        db: impl PgExecutor<'_>,
        link_id: DbId,
        buffer_type_id: DbId,
    ) -> Result<Option<f64>, sqlx::Error> {
        let query = format!(
            "SELECT dbv.buffer_value
             FROM scenario_urban_objects l
             {LINK_JOINS}
             LEFT JOIN services s ON s.id = l.public_service_id
             LEFT JOIN scenario_services ss ON ss.id = l.service_id
             JOIN default_buffer_values dbv ON dbv.buffer_type_id = $2
              AND (dbv.service_type_id = COALESCE(ss.service_type_id, s.service_type_id)
                   OR dbv.physical_object_type_id =
                      COALESCE(spo.physical_object_type_id, po.physical_object_type_id))
             WHERE l.id = $1
             ORDER BY dbv.service_type_id IS NULL
             LIMIT 1"
        );
        sqlx::query_scalar(&query)
            .bind(link_id)
            .bind(buffer_type_id)
            .fetch_optional(db)
            .await
    }

    /// Create or replace the scenario buffer of a type on a link.
    ///
    /// With `geometry` the buffer is custom; otherwise it is the link geometry
    /// buffered by `radius_meters`.
    pub async fn upsert(
        db: impl PgExecutor<'_>,
        link_id: DbId,
        buffer_type_id: DbId,
        public_buffer_id: Option<DbId>,
        geometry: Option<&serde_json::Value>,
        radius_meters: Option<f64>,
    ) -> Result<ScenarioBuffer, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenario_buffers
                (buffer_type_id, scenario_urban_object_id, public_buffer_id, geometry, is_custom)
             SELECT $2, l.id, $3,
                    CASE WHEN $4::text IS NOT NULL
                         THEN ST_SetSRID(ST_GeomFromGeoJSON($4::text), 4326)
                         ELSE ST_Buffer(COALESCE(sog.geometry, og.geometry)::geography, $5)::geometry
                    END,
                    $4::text IS NOT NULL
             FROM scenario_urban_objects l
             {LINK_JOINS}
             WHERE l.id = $1
             ON CONFLICT (buffer_type_id, scenario_urban_object_id) DO UPDATE SET
                geometry = EXCLUDED.geometry,
                is_custom = EXCLUDED.is_custom,
                is_deleted = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioBuffer>(&query)
            .bind(link_id)
            .bind(buffer_type_id)
            .bind(public_buffer_id)
            .bind(geometry.map(|g| g.to_string()))
            .bind(radius_meters)
            .fetch_one(db)
            .await
    }

    /// Hide a public buffer on a link by storing a tombstoned copy.
    pub async fn tombstone_public(
        db: impl PgExecutor<'_>,
        link_id: DbId,
        public_buffer_id: DbId,
    ) -> Result<ScenarioBuffer, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenario_buffers
                (buffer_type_id, scenario_urban_object_id, public_buffer_id, geometry, is_custom, is_deleted)
             SELECT b.buffer_type_id, $1, b.id, b.geometry, b.is_custom, true
             FROM buffers b WHERE b.id = $2
             ON CONFLICT (buffer_type_id, scenario_urban_object_id) DO UPDATE SET is_deleted = true
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioBuffer>(&query)
            .bind(link_id)
            .bind(public_buffer_id)
            .fetch_one(db)
            .await
    }

    pub async fn delete_private(
        db: impl PgExecutor<'_>,
        link_id: DbId,
        buffer_type_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM scenario_buffers WHERE scenario_urban_object_id = $1 AND buffer_type_id = $2",
        )
        .bind(link_id)
        .bind(buffer_type_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
