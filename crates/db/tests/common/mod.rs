//! Shared fixtures for repository integration tests.
//!
//! Builds a small public dataset: a region with one district, two public
//! urban objects (one inside the project polygon, one outside) and the
//! dictionary ids the tests need.

#![allow(dead_code)]

use serde_json::{json, Value};
use sqlx::PgPool;
use urban_db::models::project::{CreateProject, Project};
use urban_db::models::scenario::Scenario;
use urban_db::repositories::scenario_repo::NewScenario;
use urban_db::repositories::{ProjectRepo, ScenarioRepo, UrbanObjectRepo};

pub const OWNER: i64 = 1;

/// Axis-aligned GeoJSON polygon.
pub fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]]
    })
}

/// Project polygon used by the non-regional fixtures.
pub fn project_polygon() -> Value {
    square(30.1, 59.1, 30.3, 59.3)
}

pub struct PublicData {
    pub region_id: i64,
    pub district_id: i64,
    pub inside_urban_object_id: i64,
    pub inside_physical_object_id: i64,
    pub inside_geometry_id: i64,
    pub inside_service_id: i64,
    pub outside_urban_object_id: i64,
    pub outside_physical_object_id: i64,
    pub building_type_id: i64,
    pub school_type_id: i64,
    pub sanitary_buffer_type_id: i64,
    pub residential_zone_type_id: i64,
    pub population_indicator_id: i64,
}

async fn id_by_name(pool: &PgPool, table: &str, name: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT id FROM {table} WHERE name = $1"))
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap_or_else(|e| panic!("{table}/{name} lookup failed: {e}"))
}

async fn insert_territory(pool: &PgPool, parent_id: Option<i64>, name: &str, level: i32, geometry: &Value) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO territories (parent_id, name, level, geometry)
         VALUES ($1, $2, $3, ST_SetSRID(ST_GeomFromGeoJSON($4::text), 4326))
         RETURNING id",
    )
    .bind(parent_id)
    .bind(name)
    .bind(level)
    .bind(geometry.to_string())
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Insert a public physical object, its geometry and urban object.
/// Returns `(urban_object_id, physical_object_id, geometry_id)`.
async fn insert_public_object(
    pool: &PgPool,
    territory_id: i64,
    type_id: i64,
    name: &str,
    geometry: &Value,
    service_id: Option<i64>,
) -> (i64, i64, i64) {
    let geometry_id: i64 = sqlx::query_scalar(
        "INSERT INTO object_geometries (territory_id, geometry, address)
         VALUES ($1, ST_SetSRID(ST_GeomFromGeoJSON($2::text), 4326), $3)
         RETURNING id",
    )
    .bind(territory_id)
    .bind(geometry.to_string())
    .bind(format!("{name} street"))
    .fetch_one(pool)
    .await
    .unwrap();

    let physical_object_id: i64 = sqlx::query_scalar(
        "INSERT INTO physical_objects (physical_object_type_id, name) VALUES ($1, $2) RETURNING id",
    )
    .bind(type_id)
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap();

    let urban_object_id: i64 = sqlx::query_scalar(
        "INSERT INTO urban_objects (physical_object_id, object_geometry_id, service_id)
         VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(physical_object_id)
    .bind(geometry_id)
    .bind(service_id)
    .fetch_one(pool)
    .await
    .unwrap();

    (urban_object_id, physical_object_id, geometry_id)
}

/// Seed the public dataset used across tests.
pub async fn seed_public_data(pool: &PgPool) -> PublicData {
    let region_id = insert_territory(pool, None, "Region", 1, &square(30.0, 59.0, 31.0, 60.0)).await;
    let district_id =
        insert_territory(pool, Some(region_id), "District", 2, &square(30.0, 59.0, 30.5, 59.5)).await;

    let building_type_id = id_by_name(pool, "physical_object_types", "Non-residential building").await;
    let school_type_id = id_by_name(pool, "service_types", "School").await;
    let sanitary_buffer_type_id = id_by_name(pool, "buffer_types", "Sanitary protection zone").await;
    let residential_zone_type_id = id_by_name(pool, "functional_zone_types", "residential").await;
    let population_indicator_id = id_by_name(pool, "indicators", "Population").await;

    let inside_service_id: i64 = sqlx::query_scalar(
        "INSERT INTO services (service_type_id, name, capacity) VALUES ($1, 'School 1', 600) RETURNING id",
    )
    .bind(school_type_id)
    .fetch_one(pool)
    .await
    .unwrap();

    let (inside_urban_object_id, inside_physical_object_id, inside_geometry_id) = insert_public_object(
        pool,
        district_id,
        building_type_id,
        "Inside",
        &square(30.19, 59.19, 30.21, 59.21),
        Some(inside_service_id),
    )
    .await;
    let (outside_urban_object_id, outside_physical_object_id, _) = insert_public_object(
        pool,
        district_id,
        building_type_id,
        "Outside",
        &square(30.41, 59.41, 30.42, 59.42),
        None,
    )
    .await;

    PublicData {
        region_id,
        district_id,
        inside_urban_object_id,
        inside_physical_object_id,
        inside_geometry_id,
        inside_service_id,
        outside_urban_object_id,
        outside_physical_object_id,
        building_type_id,
        school_type_id,
        sanitary_buffer_type_id,
        residential_zone_type_id,
        population_indicator_id,
    }
}

pub fn new_project(name: &str, territory_id: i64, is_regional: bool) -> CreateProject {
    CreateProject {
        name: name.to_string(),
        description: None,
        territory_id,
        is_public: false,
        is_regional,
        is_city: false,
        properties: None,
        territory: None,
    }
}

/// A regional project on the region with a seeded based scenario.
pub async fn regional_project(pool: &PgPool, data: &PublicData) -> (Project, Scenario) {
    let project = ProjectRepo::create(pool, &new_project("Region", data.region_id, true), OWNER)
        .await
        .unwrap();
    let scenario = ScenarioRepo::create(
        pool,
        &NewScenario {
            project_id: project.id,
            parent_id: None,
            name: "Regional base",
            is_based: true,
            functional_zone_type_id: None,
            properties: None,
        },
    )
    .await
    .unwrap();
    UrbanObjectRepo::seed_from_public(pool, scenario.id, &[data.region_id, data.district_id])
        .await
        .unwrap();
    (project, scenario)
}

/// A non-regional project on the district with a territory polygon and a
/// base scenario seeded from `regional_scenario_id`.
pub async fn district_project(
    pool: &PgPool,
    data: &PublicData,
    regional_scenario_id: i64,
) -> (Project, Scenario) {
    let project = ProjectRepo::create(pool, &new_project("District", data.district_id, false), OWNER)
        .await
        .unwrap();
    ProjectRepo::insert_territory(pool, project.id, &project_polygon())
        .await
        .unwrap();
    let scenario = ScenarioRepo::create(
        pool,
        &NewScenario {
            project_id: project.id,
            parent_id: Some(regional_scenario_id),
            name: "Base scenario",
            is_based: true,
            functional_zone_type_id: None,
            properties: None,
        },
    )
    .await
    .unwrap();
    UrbanObjectRepo::seed_from_parent(pool, scenario.id, regional_scenario_id, project.id)
        .await
        .unwrap();
    (project, scenario)
}

pub async fn count(pool: &PgPool, sql: &str, id: i64) -> i64 {
    sqlx::query_scalar(sql).bind(id).fetch_one(pool).await.unwrap()
}
