//! Repository for `scenario_urban_objects`, the links between a scenario
//! and the objects it sees.

use sqlx::PgExecutor;
use urban_core::overlay::ObjectSlot;
use urban_core::types::DbId;

use crate::models::urban_object::ScenarioUrbanObject;
use crate::repositories::Tx;

/// Joins from a link `l` to the public and private rows of its object and
/// geometry slots. Shared by every link-based overlay query.
pub(crate) const LINK_JOINS: &str = "
    LEFT JOIN physical_objects po ON po.id = l.public_physical_object_id
    LEFT JOIN scenario_physical_objects spo ON spo.id = l.physical_object_id
    LEFT JOIN object_geometries og ON og.id = l.public_object_geometry_id
    LEFT JOIN scenario_object_geometries sog ON sog.id = l.object_geometry_id";

/// A link is hidden when its physical object or geometry is tombstoned.
pub(crate) const LINK_DELETED: &str =
    "(COALESCE(spo.is_deleted, false) OR COALESCE(sog.is_deleted, false))";

/// GeoJSON of the link's current geometry, public or private.
pub(crate) const LINK_GEOMETRY: &str = "ST_AsGeoJSON(COALESCE(sog.geometry, og.geometry))::jsonb";

const COLUMNS: &str = "l.id, l.scenario_id, l.public_urban_object_id,
    l.physical_object_id, l.public_physical_object_id,
    l.object_geometry_id, l.public_object_geometry_id,
    l.service_id, l.public_service_id,
    spo.public_physical_object_id AS physical_object_shadows,
    sog.public_object_geometry_id AS object_geometry_shadows,
    ss.public_service_id AS service_shadows";

pub struct UrbanObjectRepo;

impl UrbanObjectRepo {
    /// All links of a scenario with the back-references of their private rows.
    pub async fn list_by_scenario(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
    ) -> Result<Vec<ScenarioUrbanObject>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS}
             FROM scenario_urban_objects l
             {LINK_JOINS}
             LEFT JOIN scenario_services ss ON ss.id = l.service_id
             WHERE l.scenario_id = $1
             ORDER BY l.id"
        );
        sqlx::query_as::<_, ScenarioUrbanObject>(&query)
            .bind(scenario_id)
            .fetch_all(db)
            .await
    }

    pub async fn find_by_id(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        link_id: DbId,
    ) -> Result<Option<ScenarioUrbanObject>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS}
             FROM scenario_urban_objects l
             {LINK_JOINS}
             LEFT JOIN scenario_services ss ON ss.id = l.service_id
             WHERE l.scenario_id = $1 AND l.id = $2"
        );
        sqlx::query_as::<_, ScenarioUrbanObject>(&query)
            .bind(scenario_id)
            .bind(link_id)
            .fetch_optional(db)
            .await
    }

    /// Current geometry (GeoJSON) of a link.
    pub async fn link_geometry(
        db: impl PgExecutor<'_>,
        link_id: DbId,
    ) -> Result<Option<serde_json::Value>, sqlx::Error> {
        let query = format!(
            "SELECT {LINK_GEOMETRY}
             FROM scenario_urban_objects l
             {LINK_JOINS}
             WHERE l.id = $1"
        );
        sqlx::query_scalar(&query).bind(link_id).fetch_optional(db).await
    }

    /// Seed a root scenario with public links for every public urban object
    /// whose geometry belongs to one of `territory_ids`.
    pub async fn seed_from_public(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        territory_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO scenario_urban_objects
                (scenario_id, public_urban_object_id, public_physical_object_id,
                 public_object_geometry_id, public_service_id)
             SELECT $1, uo.id, uo.physical_object_id, uo.object_geometry_id, uo.service_id
             FROM urban_objects uo
             JOIN object_geometries og ON og.id = uo.object_geometry_id
             WHERE og.territory_id = ANY($2)
             ORDER BY uo.id",
        )
        .bind(scenario_id)
        .bind(territory_ids)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    /// Seed a project base scenario with the fully public links of its parent
    /// whose geometry intersects the project territory.
    pub async fn seed_from_parent(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        parent_scenario_id: DbId,
        project_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO scenario_urban_objects
                (scenario_id, public_urban_object_id, public_physical_object_id,
                 public_object_geometry_id, public_service_id)
             SELECT $1, l.public_urban_object_id, l.public_physical_object_id,
                    l.public_object_geometry_id, l.public_service_id
             FROM scenario_urban_objects l
             JOIN object_geometries og ON og.id = l.public_object_geometry_id
             JOIN project_territories pt ON pt.project_id = $3
             WHERE l.scenario_id = $2
               AND l.physical_object_id IS NULL
               AND l.object_geometry_id IS NULL
               AND l.service_id IS NULL
               AND ST_Intersects(og.geometry, pt.geometry)
             ORDER BY l.id",
        )
        .bind(scenario_id)
        .bind(parent_scenario_id)
        .bind(project_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    /// Insert a link to freshly created private rows.
    pub async fn insert_private(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        physical_object_id: DbId,
        object_geometry_id: DbId,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO scenario_urban_objects (scenario_id, physical_object_id, object_geometry_id)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(scenario_id)
        .bind(physical_object_id)
        .bind(object_geometry_id)
        .fetch_one(db)
        .await
    }

    /// Insert a link that copies the object and geometry slots of `template`
    /// and carries a private service.
    pub async fn insert_with_service(
        db: impl PgExecutor<'_>,
        template: &ScenarioUrbanObject,
        service_id: DbId,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO scenario_urban_objects
                (scenario_id, physical_object_id, public_physical_object_id,
                 object_geometry_id, public_object_geometry_id, service_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(template.scenario_id)
        .bind(template.physical_object_id)
        .bind(template.public_physical_object_id)
        .bind(template.object_geometry_id)
        .bind(template.public_object_geometry_id)
        .bind(service_id)
        .fetch_one(db)
        .await
    }

    /// Attach a private service to a link that has none.
    pub async fn set_service(
        db: impl PgExecutor<'_>,
        link_id: DbId,
        service_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE scenario_urban_objects SET service_id = $2
             WHERE id = $1 AND service_id IS NULL AND public_service_id IS NULL",
        )
        .bind(link_id)
        .bind(service_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Point `slot` of every link in `link_ids` at a private row, dropping
    /// the public reference. This is the copy-on-write step.
    pub async fn repoint(
        tx: &mut Tx<'_>,
        slot: ObjectSlot,
        link_ids: &[DbId],
        private_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let (private_column, public_column) = slot_columns(slot);
        let query = format!(
            "UPDATE scenario_urban_objects
             SET {private_column} = $2, {public_column} = NULL
             WHERE id = ANY($1)"
        );
        let result = sqlx::query(&query)
            .bind(link_ids)
            .bind(private_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete the private row `private_id` of `slot`.
    ///
    /// Physical objects and geometries take their links with them; the other
    /// private rows those links pointed at are removed once no link is left
    /// referencing them.
    pub async fn delete_private_slot(
        tx: &mut Tx<'_>,
        slot: ObjectSlot,
        private_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let (private_column, _) = slot_columns(slot);
        let query = format!(
            "SELECT
                COALESCE(array_agg(DISTINCT physical_object_id)
                    FILTER (WHERE physical_object_id IS NOT NULL), '{{}}'),
                COALESCE(array_agg(DISTINCT object_geometry_id)
                    FILTER (WHERE object_geometry_id IS NOT NULL), '{{}}'),
                COALESCE(array_agg(DISTINCT service_id)
                    FILTER (WHERE service_id IS NOT NULL), '{{}}')
             FROM scenario_urban_objects
             WHERE {private_column} = $1"
        );
        let (physical_objects, geometries, services): (Vec<DbId>, Vec<DbId>, Vec<DbId>) =
            sqlx::query_as(&query)
                .bind(private_id)
                .fetch_one(&mut **tx)
                .await?;

        let query = format!("DELETE FROM {} WHERE id = $1", private_table(slot));
        let deleted = sqlx::query(&query)
            .bind(private_id)
            .execute(&mut **tx)
            .await?
            .rows_affected()
            > 0;

        for (slot, ids) in [
            (ObjectSlot::Service, services),
            (ObjectSlot::PhysicalObject, physical_objects),
            (ObjectSlot::Geometry, geometries),
        ] {
            Self::delete_unlinked(tx, slot, &ids).await?;
        }
        Ok(deleted)
    }

    /// Delete the private rows of `slot` among `ids` that no link references.
    async fn delete_unlinked(tx: &mut Tx<'_>, slot: ObjectSlot, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let (private_column, _) = slot_columns(slot);
        let query = format!(
            "DELETE FROM {table} t
             WHERE t.id = ANY($1)
               AND NOT EXISTS (SELECT 1 FROM scenario_urban_objects l WHERE l.{private_column} = t.id)",
            table = private_table(slot),
        );
        let result = sqlx::query(&query).bind(ids).execute(&mut **tx).await?;
        Ok(result.rows_affected())
    }
}

fn private_table(slot: ObjectSlot) -> &'static str {
    match slot {
        ObjectSlot::PhysicalObject => "scenario_physical_objects",
        ObjectSlot::Geometry => "scenario_object_geometries",
        ObjectSlot::Service => "scenario_services",
    }
}

/// `(private, public)` column names of a slot.
pub(crate) fn slot_columns(slot: ObjectSlot) -> (&'static str, &'static str) {
    match slot {
        ObjectSlot::PhysicalObject => ("physical_object_id", "public_physical_object_id"),
        ObjectSlot::Geometry => ("object_geometry_id", "public_object_geometry_id"),
        ObjectSlot::Service => ("service_id", "public_service_id"),
    }
}
