//! Repository for scenario functional zones.
//!
//! Zones are owned directly by a scenario (no links). The public branch is
//! the territory subtree's zones that intersect the project territory and
//! are not shadowed by a scenario zone.

use sqlx::PgExecutor;
use urban_core::types::DbId;

use crate::geom_from_geojson;
use crate::models::functional_zone::{
    CreateScenarioFunctionalZone, FunctionalZoneCandidate, FunctionalZoneFilter,
    PatchFunctionalZone, ScenarioFunctionalZone,
};

const COLUMNS: &str = "id, scenario_id, public_functional_zone_id, functional_zone_type_id, name, \
    ST_AsGeoJSON(geometry)::jsonb AS geometry, year, source, properties, is_deleted";

pub struct FunctionalZoneRepo;

impl FunctionalZoneRepo {
    /// Public zones of `territory_ids` plus the scenario's own zones.
    ///
    /// When the project has a territory, public zones must intersect it.
    pub async fn candidates(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        project_id: DbId,
        territory_ids: &[DbId],
        filter: &FunctionalZoneFilter,
    ) -> Result<Vec<FunctionalZoneCandidate>, sqlx::Error> {
        sqlx::query_as::<_, FunctionalZoneCandidate>(
            "SELECT false AS is_scenario_object, fz.id, fz.functional_zone_type_id,
                    fzt.name AS functional_zone_type_name, fz.name, fz.year, fz.source,
                    fz.properties, ST_AsGeoJSON(fz.geometry)::jsonb AS geometry,
                    false AS is_deleted
             FROM functional_zones fz
             JOIN functional_zone_types fzt ON fzt.id = fz.functional_zone_type_id
             LEFT JOIN project_territories pt ON pt.project_id = $2
             WHERE fz.territory_id = ANY($3)
               AND ($4::bigint IS NULL OR fz.functional_zone_type_id = $4)
               AND (pt.project_id IS NULL OR ST_Intersects(fz.geometry, pt.geometry))
               AND NOT EXISTS (
                   SELECT 1 FROM scenario_functional_zones sfz
                   WHERE sfz.scenario_id = $1 AND sfz.public_functional_zone_id = fz.id)
             UNION ALL
             SELECT true, sfz.id, sfz.functional_zone_type_id, fzt.name, sfz.name, sfz.year,
                    sfz.source, sfz.properties, ST_AsGeoJSON(sfz.geometry)::jsonb, sfz.is_deleted
             FROM scenario_functional_zones sfz
             JOIN functional_zone_types fzt ON fzt.id = sfz.functional_zone_type_id
             WHERE sfz.scenario_id = $1
               AND ($4::bigint IS NULL OR sfz.functional_zone_type_id = $4)
             ORDER BY 2",
        )
        .bind(scenario_id)
        .bind(project_id)
        .bind(territory_ids)
        .bind(filter.functional_zone_type_id)
        .fetch_all(db)
        .await
    }

    /// A scenario zone by id, restricted to its owning scenario.
    pub async fn find_private(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        id: DbId,
    ) -> Result<Option<ScenarioFunctionalZone>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scenario_functional_zones WHERE id = $1 AND scenario_id = $2"
        );
        sqlx::query_as::<_, ScenarioFunctionalZone>(&query)
            .bind(id)
            .bind(scenario_id)
            .fetch_optional(db)
            .await
    }

    /// GeoJSON of a public zone belonging to one of `territory_ids`.
    pub async fn public_geometry(
        db: impl PgExecutor<'_>,
        id: DbId,
        territory_ids: &[DbId],
    ) -> Result<Option<serde_json::Value>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT ST_AsGeoJSON(geometry)::jsonb FROM functional_zones
             WHERE id = $1 AND territory_id = ANY($2)",
        )
        .bind(id)
        .bind(territory_ids)
        .fetch_optional(db)
        .await
    }

    /// True when the scenario already has a row shadowing a public zone.
    pub async fn is_shadowed(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        public_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM scenario_functional_zones
                WHERE scenario_id = $1 AND public_functional_zone_id = $2)",
        )
        .bind(scenario_id)
        .bind(public_id)
        .fetch_one(db)
        .await
    }

    pub async fn insert_private(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        input: &CreateScenarioFunctionalZone,
    ) -> Result<ScenarioFunctionalZone, sqlx::Error> {
        let geom = geom_from_geojson(4);
        let query = format!(
            "INSERT INTO scenario_functional_zones
                (scenario_id, functional_zone_type_id, name, geometry, year, source, properties)
             VALUES ($1, $2, $3, {geom}, $5, $6, COALESCE($7, '{{}}'::jsonb))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioFunctionalZone>(&query)
            .bind(scenario_id)
            .bind(input.functional_zone_type_id)
            .bind(&input.name)
            .bind(input.geometry.to_string())
            .bind(input.year)
            .bind(&input.source)
            .bind(&input.properties)
            .fetch_one(db)
            .await
    }

    /// Copy a public zone into the scenario as a row that shadows it.
    pub async fn copy_public(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        public_id: DbId,
        tombstone: bool,
    ) -> Result<Option<ScenarioFunctionalZone>, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenario_functional_zones
                (scenario_id, public_functional_zone_id, functional_zone_type_id, name,
                 geometry, year, source, properties, is_deleted)
             SELECT $1, id, functional_zone_type_id, name, geometry, year, source, properties, $3
             FROM functional_zones WHERE id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioFunctionalZone>(&query)
            .bind(scenario_id)
            .bind(public_id)
            .bind(tombstone)
            .fetch_optional(db)
            .await
    }

    /// Update a scenario zone. With `replace` a `None` name is written as NULL.
    pub async fn update(
        db: impl PgExecutor<'_>,
        id: DbId,
        input: &PatchFunctionalZone,
        replace: bool,
    ) -> Result<Option<ScenarioFunctionalZone>, sqlx::Error> {
        let geom = geom_from_geojson(4);
        let query = format!(
            "UPDATE scenario_functional_zones SET
                functional_zone_type_id = COALESCE($2, functional_zone_type_id),
                name = CASE WHEN $8 THEN $3 ELSE COALESCE($3, name) END,
                geometry = COALESCE({geom}, geometry),
                year = COALESCE($5, year),
                source = COALESCE($6, source),
                properties = COALESCE($7, properties)
             WHERE id = $1 AND NOT is_deleted
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioFunctionalZone>(&query)
            .bind(id)
            .bind(input.functional_zone_type_id)
            .bind(&input.name)
            .bind(input.geometry.as_ref().map(|g| g.to_string()))
            .bind(input.year)
            .bind(&input.source)
            .bind(&input.properties)
            .bind(replace)
            .fetch_optional(db)
            .await
    }

    pub async fn delete_private(db: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM scenario_functional_zones WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
