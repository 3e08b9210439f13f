//! Repository for scenario physical objects: overlay candidates and the
//! `scenario_physical_objects` shadow table.

use sqlx::PgExecutor;
use urban_core::overlay::ObjectSlot;
use urban_core::types::DbId;

use crate::models::physical_object::{
    CreateScenarioPhysicalObject, PatchPhysicalObject, PhysicalObjectCandidate,
    PhysicalObjectFilter, PutPhysicalObject, ScenarioPhysicalObject,
};
use crate::repositories::urban_object_repo::{LINK_DELETED, LINK_GEOMETRY, LINK_JOINS};
use crate::repositories::{Tx, UrbanObjectRepo};

const COLUMNS: &str = "id, public_physical_object_id, physical_object_type_id, name, properties, is_deleted";

pub struct PhysicalObjectRepo;

impl PhysicalObjectRepo {
    /// Physical objects reachable through the scenario's links, in link order.
    pub async fn candidates(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        filter: &PhysicalObjectFilter,
    ) -> Result<Vec<PhysicalObjectCandidate>, sqlx::Error> {
        let query = format!(
            "SELECT (l.physical_object_id IS NOT NULL) AS is_scenario_object,
                    COALESCE(l.physical_object_id, l.public_physical_object_id) AS id,
                    pot.id AS physical_object_type_id,
                    pot.name AS physical_object_type_name,
                    pot.physical_object_function_id,
                    CASE WHEN l.physical_object_id IS NOT NULL THEN spo.name ELSE po.name END AS name,
                    COALESCE(spo.properties, po.properties) AS properties,
                    COALESCE(l.object_geometry_id, l.public_object_geometry_id) AS object_geometry_id,
                    {LINK_GEOMETRY} AS geometry,
                    {LINK_DELETED} AS is_deleted
             FROM scenario_urban_objects l
             {LINK_JOINS}
             JOIN physical_object_types pot
               ON pot.id = COALESCE(spo.physical_object_type_id, po.physical_object_type_id)
             WHERE l.scenario_id = $1
               AND ($2::bigint IS NULL OR pot.id = $2)
               AND ($3::bigint IS NULL OR pot.physical_object_function_id = $3)
             ORDER BY l.id"
        );
        sqlx::query_as::<_, PhysicalObjectCandidate>(&query)
            .bind(scenario_id)
            .bind(filter.physical_object_type_id)
            .bind(filter.physical_object_function_id)
            .fetch_all(db)
            .await
    }

    pub async fn find_private(
        db: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<ScenarioPhysicalObject>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenario_physical_objects WHERE id = $1");
        sqlx::query_as::<_, ScenarioPhysicalObject>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Insert a brand-new private physical object.
    pub async fn insert_private(
        db: impl PgExecutor<'_>,
        input: &CreateScenarioPhysicalObject,
    ) -> Result<ScenarioPhysicalObject, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenario_physical_objects (physical_object_type_id, name, properties)
             VALUES ($1, $2, COALESCE($3, '{{}}'::jsonb))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioPhysicalObject>(&query)
            .bind(input.physical_object_type_id)
            .bind(&input.name)
            .bind(&input.properties)
            .fetch_one(db)
            .await
    }

    /// Copy a public physical object into a private row that shadows it.
    ///
    /// With `tombstone` the copy is created already marked deleted.
    pub async fn copy_public(
        db: impl PgExecutor<'_>,
        public_id: DbId,
        tombstone: bool,
    ) -> Result<Option<ScenarioPhysicalObject>, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenario_physical_objects
                (public_physical_object_id, physical_object_type_id, name, properties, is_deleted)
             SELECT id, physical_object_type_id, name, properties, $2
             FROM physical_objects WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioPhysicalObject>(&query)
            .bind(public_id)
            .bind(tombstone)
            .fetch_optional(db)
            .await
    }

    /// Overwrite every field of a private physical object.
    pub async fn replace(
        db: impl PgExecutor<'_>,
        id: DbId,
        input: &PutPhysicalObject,
    ) -> Result<Option<ScenarioPhysicalObject>, sqlx::Error> {
        let query = format!(
            "UPDATE scenario_physical_objects SET
                physical_object_type_id = $2,
                name = $3,
                properties = $4
             WHERE id = $1 AND NOT is_deleted
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioPhysicalObject>(&query)
            .bind(id)
            .bind(input.physical_object_type_id)
            .bind(&input.name)
            .bind(&input.properties)
            .fetch_optional(db)
            .await
    }

    /// Update the non-`None` fields of a private physical object.
    pub async fn patch(
        db: impl PgExecutor<'_>,
        id: DbId,
        input: &PatchPhysicalObject,
    ) -> Result<Option<ScenarioPhysicalObject>, sqlx::Error> {
        let query = format!(
            "UPDATE scenario_physical_objects SET
                physical_object_type_id = COALESCE($2, physical_object_type_id),
                name = COALESCE($3, name),
                properties = COALESCE($4, properties)
             WHERE id = $1 AND NOT is_deleted
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioPhysicalObject>(&query)
            .bind(id)
            .bind(input.physical_object_type_id)
            .bind(&input.name)
            .bind(&input.properties)
            .fetch_optional(db)
            .await
    }

    /// Delete a private physical object with its links and whatever private rows
    /// only those links kept alive.
    pub async fn delete_private(tx: &mut Tx<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        UrbanObjectRepo::delete_private_slot(tx, ObjectSlot::PhysicalObject, id).await
    }
}
