//! Deep copy of a scenario's contents into another scenario.
//!
//! Public references are carried over verbatim. Every private row reachable
//! from the source (physical objects, geometries, services through links;
//! buffers through links; zones and indicator values directly) is cloned,
//! and the destination's links point at the clones. The caller owns the
//! transaction.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::FromRow;
use urban_core::types::DbId;

use crate::repositories::Tx;

/// Row counts produced by one copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CopyStats {
    pub links: u64,
    pub physical_objects: u64,
    pub geometries: u64,
    pub services: u64,
    pub buffers: u64,
    pub functional_zones: u64,
    pub indicator_values: u64,
}

#[derive(Debug, FromRow)]
struct LinkRow {
    id: DbId,
    public_urban_object_id: Option<DbId>,
    physical_object_id: Option<DbId>,
    public_physical_object_id: Option<DbId>,
    object_geometry_id: Option<DbId>,
    public_object_geometry_id: Option<DbId>,
    service_id: Option<DbId>,
    public_service_id: Option<DbId>,
}

/// Old id -> new id for one cloned table.
type IdMap = HashMap<DbId, DbId>;

// ---------------------------------------------------------------------------
// Cloned tables
// ---------------------------------------------------------------------------

const PHYSICAL_OBJECT_COLUMNS: &str =
    "public_physical_object_id, physical_object_type_id, name, properties, is_deleted";

const GEOMETRY_COLUMNS: &str =
    "public_object_geometry_id, territory_id, geometry, address, osm_id, is_deleted";

const SERVICE_COLUMNS: &str =
    "public_service_id, service_type_id, name, capacity, is_capacity_real, properties, is_deleted";

pub struct ScenarioCopyRepo;

impl ScenarioCopyRepo {
    /// Copy everything `source` sees into the empty scenario `dest`.
    pub async fn copy_scenario_contents(
        tx: &mut Tx<'_>,
        source: DbId,
        dest: DbId,
    ) -> Result<CopyStats, sqlx::Error> {
        let links = sqlx::query_as::<_, LinkRow>(
            "SELECT id, public_urban_object_id,
                    physical_object_id, public_physical_object_id,
                    object_geometry_id, public_object_geometry_id,
                    service_id, public_service_id
             FROM scenario_urban_objects
             WHERE scenario_id = $1
             ORDER BY id",
        )
        .bind(source)
        .fetch_all(&mut **tx)
        .await?;

        let physical_object_ids = private_ids(&links, |l| l.physical_object_id);
        let geometry_ids = private_ids(&links, |l| l.object_geometry_id);
        let service_ids = private_ids(&links, |l| l.service_id);

        let physical_objects = clone_rows(
            tx,
            "scenario_physical_objects",
            PHYSICAL_OBJECT_COLUMNS,
            &physical_object_ids,
        )
        .await?;
        let geometries =
            clone_rows(tx, "scenario_object_geometries", GEOMETRY_COLUMNS, &geometry_ids).await?;
        let services = clone_rows(tx, "scenario_services", SERVICE_COLUMNS, &service_ids).await?;

        let link_map = insert_links(tx, dest, &links, &physical_objects, &geometries, &services)
            .await?;
        let buffers = clone_buffers(tx, &link_map).await?;

        let functional_zones = sqlx::query(
            "INSERT INTO scenario_functional_zones
                (scenario_id, public_functional_zone_id, functional_zone_type_id, name,
                 geometry, year, source, properties, is_deleted)
             SELECT $2, public_functional_zone_id, functional_zone_type_id, name,
                    geometry, year, source, properties, is_deleted
             FROM scenario_functional_zones
             WHERE scenario_id = $1
             ORDER BY id",
        )
        .bind(source)
        .bind(dest)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        let indicator_values = sqlx::query(
            "INSERT INTO scenario_indicator_values
                (scenario_id, public_indicator_value_id, indicator_id, territory_id, date_value,
                 value, value_type, information_source, is_deleted)
             SELECT $2, public_indicator_value_id, indicator_id, territory_id, date_value,
                    value, value_type, information_source, is_deleted
             FROM scenario_indicator_values
             WHERE scenario_id = $1
             ORDER BY id",
        )
        .bind(source)
        .bind(dest)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        let stats = CopyStats {
            links: link_map.len() as u64,
            physical_objects: physical_objects.len() as u64,
            geometries: geometries.len() as u64,
            services: services.len() as u64,
            buffers,
            functional_zones,
            indicator_values,
        };

        tracing::info!(
            source_scenario_id = source,
            dest_scenario_id = dest,
            links = stats.links,
            physical_objects = stats.physical_objects,
            geometries = stats.geometries,
            services = stats.services,
            buffers = stats.buffers,
            functional_zones = stats.functional_zones,
            indicator_values = stats.indicator_values,
            "Scenario contents copied"
        );

        Ok(stats)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn private_ids(links: &[LinkRow], column: impl Fn(&LinkRow) -> Option<DbId>) -> Vec<DbId> {
    let mut ids: Vec<DbId> = links.iter().filter_map(column).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Reserve `count` ids from a table's serial sequence.
async fn allocate_ids(tx: &mut Tx<'_>, table: &str, count: usize) -> Result<Vec<DbId>, sqlx::Error> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let query =
        format!("SELECT nextval(pg_get_serial_sequence('{table}', 'id')) FROM generate_series(1, $1)");
    sqlx::query_scalar(&query)
        .bind(count as i64)
        .fetch_all(&mut **tx)
        .await
}

/// Clone `ids` of `table` under freshly allocated ids.
async fn clone_rows(
    tx: &mut Tx<'_>,
    table: &str,
    columns: &str,
    ids: &[DbId],
) -> Result<IdMap, sqlx::Error> {
    let new_ids = allocate_ids(tx, table, ids.len()).await?;
    if new_ids.is_empty() {
        return Ok(IdMap::new());
    }

    let query = format!(
        "INSERT INTO {table} (id, {columns})
         SELECT m.new_id, {columns}
         FROM {table} s
         JOIN unnest($1::bigint[], $2::bigint[]) AS m(old_id, new_id) ON s.id = m.old_id"
    );
    // Unqualified column names resolve to `s`; `m` only exposes old_id/new_id.
    sqlx::query(&query)
        .bind(ids)
        .bind(&new_ids)
        .execute(&mut **tx)
        .await?;

    Ok(ids.iter().copied().zip(new_ids).collect())
}

fn remap(map: &IdMap, id: Option<DbId>) -> Result<Option<DbId>, sqlx::Error> {
    match id {
        None => Ok(None),
        Some(old) => map
            .get(&old)
            .copied()
            .map(Some)
            .ok_or_else(|| sqlx::Error::Protocol(format!("row {old} was not cloned"))),
    }
}

async fn insert_links(
    tx: &mut Tx<'_>,
    dest: DbId,
    links: &[LinkRow],
    physical_objects: &IdMap,
    geometries: &IdMap,
    services: &IdMap,
) -> Result<IdMap, sqlx::Error> {
    let new_ids = allocate_ids(tx, "scenario_urban_objects", links.len()).await?;
    if new_ids.is_empty() {
        return Ok(IdMap::new());
    }

    let mut public_urban_object_ids = Vec::with_capacity(links.len());
    let mut physical_object_ids = Vec::with_capacity(links.len());
    let mut public_physical_object_ids = Vec::with_capacity(links.len());
    let mut object_geometry_ids = Vec::with_capacity(links.len());
    let mut public_object_geometry_ids = Vec::with_capacity(links.len());
    let mut service_ids = Vec::with_capacity(links.len());
    let mut public_service_ids = Vec::with_capacity(links.len());

    for link in links {
        public_urban_object_ids.push(link.public_urban_object_id);
        physical_object_ids.push(remap(physical_objects, link.physical_object_id)?);
        public_physical_object_ids.push(link.public_physical_object_id);
        object_geometry_ids.push(remap(geometries, link.object_geometry_id)?);
        public_object_geometry_ids.push(link.public_object_geometry_id);
        service_ids.push(remap(services, link.service_id)?);
        public_service_ids.push(link.public_service_id);
    }

    sqlx::query(
        "INSERT INTO scenario_urban_objects
            (id, scenario_id, public_urban_object_id,
             physical_object_id, public_physical_object_id,
             object_geometry_id, public_object_geometry_id,
             service_id, public_service_id)
         SELECT u.id, $1, u.public_urban_object_id,
                u.physical_object_id, u.public_physical_object_id,
                u.object_geometry_id, u.public_object_geometry_id,
                u.service_id, u.public_service_id
         FROM unnest($2::bigint[], $3::bigint[], $4::bigint[], $5::bigint[],
                     $6::bigint[], $7::bigint[], $8::bigint[], $9::bigint[])
              AS u(id, public_urban_object_id,
                   physical_object_id, public_physical_object_id,
                   object_geometry_id, public_object_geometry_id,
                   service_id, public_service_id)",
    )
    .bind(dest)
    .bind(&new_ids)
    .bind(&public_urban_object_ids)
    .bind(&physical_object_ids)
    .bind(&public_physical_object_ids)
    .bind(&object_geometry_ids)
    .bind(&public_object_geometry_ids)
    .bind(&service_ids)
    .bind(&public_service_ids)
    .execute(&mut **tx)
    .await?;

    Ok(links.iter().map(|l| l.id).zip(new_ids).collect())
}

async fn clone_buffers(tx: &mut Tx<'_>, link_map: &IdMap) -> Result<u64, sqlx::Error> {
    if link_map.is_empty() {
        return Ok(0);
    }
    let (old_ids, new_ids): (Vec<DbId>, Vec<DbId>) = link_map.iter().map(|(o, n)| (*o, *n)).unzip();

    let result = sqlx::query(
        "INSERT INTO scenario_buffers
            (buffer_type_id, scenario_urban_object_id, public_buffer_id, geometry, is_custom, is_deleted)
         SELECT sb.buffer_type_id, m.new_id, sb.public_buffer_id, sb.geometry, sb.is_custom, sb.is_deleted
         FROM scenario_buffers sb
         JOIN unnest($1::bigint[], $2::bigint[]) AS m(old_id, new_id)
           ON sb.scenario_urban_object_id = m.old_id",
    )
    .bind(&old_ids)
    .bind(&new_ids)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: DbId, po: Option<DbId>, geom: Option<DbId>, service: Option<DbId>) -> LinkRow {
        LinkRow {
            id,
            public_urban_object_id: None,
            physical_object_id: po,
            public_physical_object_id: po.is_none().then_some(100),
            object_geometry_id: geom,
            public_object_geometry_id: geom.is_none().then_some(200),
            service_id: service,
            public_service_id: None,
        }
    }

    #[test]
    fn private_ids_are_sorted_and_deduplicated() {
        let links = vec![
            link(1, Some(7), None, None),
            link(2, Some(3), Some(9), Some(4)),
            link(3, Some(7), Some(9), None),
        ];
        assert_eq!(private_ids(&links, |l| l.physical_object_id), vec![3, 7]);
        assert_eq!(private_ids(&links, |l| l.object_geometry_id), vec![9]);
        assert_eq!(private_ids(&links, |l| l.service_id), vec![4]);
    }

    #[test]
    fn remap_keeps_none_and_translates_known_ids() {
        let map: IdMap = [(5, 50)].into_iter().collect();
        assert_eq!(remap(&map, None).unwrap(), None);
        assert_eq!(remap(&map, Some(5)).unwrap(), Some(50));
    }

    #[test]
    fn remap_rejects_unknown_ids() {
        let map = IdMap::new();
        assert!(remap(&map, Some(1)).is_err());
    }
}
