//! Repository for scenario object geometries.

use sqlx::PgExecutor;
use urban_core::overlay::ObjectSlot;
use urban_core::types::DbId;

use crate::geom_from_geojson;
use crate::models::geometry::{
    ObjectGeometryCandidate, PatchObjectGeometry, PutObjectGeometry, ScenarioObjectGeometry,
};
use crate::repositories::urban_object_repo::{LINK_DELETED, LINK_GEOMETRY, LINK_JOINS};
use crate::repositories::{Tx, UrbanObjectRepo};

const COLUMNS: &str = "id, public_object_geometry_id, territory_id, \
    ST_AsGeoJSON(geometry)::jsonb AS geometry, address, osm_id, is_deleted";

pub struct GeometryRepo;

impl GeometryRepo {
    /// Geometries reachable through the scenario's links, in link order.
    pub async fn candidates(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
    ) -> Result<Vec<ObjectGeometryCandidate>, sqlx::Error> {
        let query = format!(
            "SELECT (l.object_geometry_id IS NOT NULL) AS is_scenario_object,
                    COALESCE(l.object_geometry_id, l.public_object_geometry_id) AS id,
                    COALESCE(sog.territory_id, og.territory_id) AS territory_id,
                    CASE WHEN l.object_geometry_id IS NOT NULL THEN sog.address ELSE og.address END AS address,
                    CASE WHEN l.object_geometry_id IS NOT NULL THEN sog.osm_id ELSE og.osm_id END AS osm_id,
                    {LINK_GEOMETRY} AS geometry,
                    {LINK_DELETED} AS is_deleted
             FROM scenario_urban_objects l
             {LINK_JOINS}
             WHERE l.scenario_id = $1
             ORDER BY l.id"
        );
        sqlx::query_as::<_, ObjectGeometryCandidate>(&query)
            .bind(scenario_id)
            .fetch_all(db)
            .await
    }

    /// GeoJSON of a public object geometry.
    pub async fn public_geometry(
        db: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<serde_json::Value>, sqlx::Error> {
        sqlx::query_scalar("SELECT ST_AsGeoJSON(geometry)::jsonb FROM object_geometries WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_private(
        db: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<ScenarioObjectGeometry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenario_object_geometries WHERE id = $1");
        sqlx::query_as::<_, ScenarioObjectGeometry>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Insert a brand-new private geometry.
    pub async fn insert_private(
        db: impl PgExecutor<'_>,
        territory_id: DbId,
        geometry: &serde_json::Value,
        address: Option<&str>,
        osm_id: Option<&str>,
    ) -> Result<ScenarioObjectGeometry, sqlx::Error> {
        let geom = geom_from_geojson(2);
        let query = format!(
            "INSERT INTO scenario_object_geometries (territory_id, geometry, address, osm_id)
             VALUES ($1, {geom}, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioObjectGeometry>(&query)
            .bind(territory_id)
            .bind(geometry.to_string())
            .bind(address)
            .bind(osm_id)
            .fetch_one(db)
            .await
    }

    /// Copy a public geometry into a private row that shadows it.
    pub async fn copy_public(
        db: impl PgExecutor<'_>,
        public_id: DbId,
        tombstone: bool,
    ) -> Result<Option<ScenarioObjectGeometry>, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenario_object_geometries
                (public_object_geometry_id, territory_id, geometry, address, osm_id, is_deleted)
             SELECT id, territory_id, geometry, address, osm_id, $2
             FROM object_geometries WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioObjectGeometry>(&query)
            .bind(public_id)
            .bind(tombstone)
            .fetch_optional(db)
            .await
    }

    pub async fn replace(
        db: impl PgExecutor<'_>,
        id: DbId,
        input: &PutObjectGeometry,
    ) -> Result<Option<ScenarioObjectGeometry>, sqlx::Error> {
        let geom = geom_from_geojson(3);
        let query = format!(
            "UPDATE scenario_object_geometries SET
                territory_id = $2,
                geometry = {geom},
                address = $4,
                osm_id = $5
             WHERE id = $1 AND NOT is_deleted
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioObjectGeometry>(&query)
            .bind(id)
            .bind(input.territory_id)
            .bind(input.geometry.to_string())
            .bind(&input.address)
            .bind(&input.osm_id)
            .fetch_optional(db)
            .await
    }

    pub async fn patch(
        db: impl PgExecutor<'_>,
        id: DbId,
        input: &PatchObjectGeometry,
    ) -> Result<Option<ScenarioObjectGeometry>, sqlx::Error> {
        let geom = geom_from_geojson(3);
        let query = format!(
            "UPDATE scenario_object_geometries SET
                territory_id = COALESCE($2, territory_id),
                geometry = COALESCE({geom}, geometry),
                address = COALESCE($4, address),
                osm_id = COALESCE($5, osm_id)
             WHERE id = $1 AND NOT is_deleted
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioObjectGeometry>(&query)
            .bind(id)
            .bind(input.territory_id)
            .bind(input.geometry.as_ref().map(|g| g.to_string()))
            .bind(&input.address)
            .bind(&input.osm_id)
            .fetch_optional(db)
            .await
    }

    /// Delete a private geometry with its links and whatever private rows
    /// only those links kept alive.
    pub async fn delete_private(tx: &mut Tx<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        UrbanObjectRepo::delete_private_slot(tx, ObjectSlot::Geometry, id).await
    }
}
