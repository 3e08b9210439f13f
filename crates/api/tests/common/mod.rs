//! Shared helpers for API integration tests.
//!
//! Builds the application router on top of a `sqlx::test` pool, mints
//! bearer tokens and seeds a small public dataset through plain SQL.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;

use urban_api::auth::jwt::{generate_access_token, JwtConfig};
use urban_api::config::ServerConfig;
use urban_api::router::build_app_router;
use urban_api::state::AppState;
use urban_events::EventBus;

pub const OWNER: i64 = 1;
pub const STRANGER: i64 = 2;
pub const ADMIN: i64 = 99;

/// Build a test `ServerConfig` with sensible defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        database_url: String::new(),
        db_max_connections: 5,
        context_buffer_meters: 3000.0,
        jwt: JwtConfig {
            secret: "urban-test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router for a test pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::new(EventBus::default()),
    };
    build_app_router(state, &config)
}

/// A bearer token for `user_id` with `role`.
pub fn token(user_id: i64, role: &str) -> String {
    generate_access_token(user_id, role, &test_config().jwt).unwrap()
}

pub fn owner_token() -> String {
    token(OWNER, "user")
}

pub fn admin_token() -> String {
    token(ADMIN, "superuser")
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(app: Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, token: &str, body: Value) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, token: &str, body: Value) -> Response {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn patch_json(app: Router, uri: &str, token: &str, body: Value) -> Response {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and return the `data` payload.
pub async fn expect_data(response: Response, status: StatusCode) -> Value {
    let actual = response.status();
    let json = body_json(response).await;
    assert_eq!(actual, status, "unexpected status, body: {json}");
    json["data"].clone()
}

/// Assert the status and return the `code` of an error body.
pub async fn expect_error(response: Response, status: StatusCode) -> String {
    let actual = response.status();
    let json = body_json(response).await;
    assert_eq!(actual, status, "unexpected status, body: {json}");
    json["code"].as_str().unwrap_or_default().to_string()
}

// ---------------------------------------------------------------------------
// Public dataset
// ---------------------------------------------------------------------------

/// Axis-aligned GeoJSON polygon.
pub fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]]
    })
}

/// Territory polygon used by the district projects.
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
    pub outside_physical_object_id: i64,
    pub zone_id: i64,
    pub indicator_value_id: i64,
    pub building_type_id: i64,
    pub school_type_id: i64,
    pub sanitary_buffer_type_id: i64,
    pub residential_zone_type_id: i64,
    pub population_indicator_id: i64,
}

pub async fn id_by_name(pool: &PgPool, table: &str, name: &str) -> i64 {
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

/// Insert a public physical object with its geometry and link.
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

/// Seed a region with one district, a school building inside the district
/// project polygon, a plain building outside it, one public functional zone
/// and one indicator value on the district.
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
    let (_, outside_physical_object_id, _) = insert_public_object(
        pool,
        district_id,
        building_type_id,
        "Outside",
        &square(30.41, 59.41, 30.42, 59.42),
        None,
    )
    .await;

    let zone_id: i64 = sqlx::query_scalar(
        "INSERT INTO functional_zones (territory_id, functional_zone_type_id, name, geometry, year, source)
         VALUES ($1, $2, 'Quarter', ST_SetSRID(ST_GeomFromGeoJSON($3::text), 4326), 2024, 'PZZ')
         RETURNING id",
    )
    .bind(district_id)
    .bind(residential_zone_type_id)
    .bind(square(30.15, 59.15, 30.25, 59.25).to_string())
    .fetch_one(pool)
    .await
    .unwrap();

    let indicator_value_id: i64 = sqlx::query_scalar(
        "INSERT INTO territory_indicator_values (indicator_id, territory_id, date_value, value, value_type)
         VALUES ($1, $2, DATE '2024-01-01', 12000, 'real')
         RETURNING id",
    )
    .bind(population_indicator_id)
    .bind(district_id)
    .fetch_one(pool)
    .await
    .unwrap();

    PublicData {
        region_id,
        district_id,
        inside_urban_object_id,
        inside_physical_object_id,
        inside_geometry_id,
        inside_service_id,
        outside_physical_object_id,
        zone_id,
        indicator_value_id,
        building_type_id,
        school_type_id,
        sanitary_buffer_type_id,
        residential_zone_type_id,
        population_indicator_id,
    }
}

// ---------------------------------------------------------------------------
// Projects through the API
// ---------------------------------------------------------------------------

/// Create the regional project as superuser. Returns `(project_id, base_scenario_id)`.
pub async fn create_regional_project(pool: &PgPool, data: &PublicData) -> (i64, i64) {
    let app = build_test_app(pool.clone());
    let body = json!({
        "name": "Region",
        "territory_id": data.region_id,
        "is_regional": true,
        "is_public": true,
    });
    let project = expect_data(post_json(app, "/api/v1/projects", &admin_token(), body).await, StatusCode::CREATED).await;
    (
        project["id"].as_i64().unwrap(),
        project["base_scenario"]["id"].as_i64().unwrap(),
    )
}

/// Create a district project owned by [`OWNER`]. Returns `(project_id, base_scenario_id)`.
pub async fn create_district_project(pool: &PgPool, data: &PublicData) -> (i64, i64) {
    let app = build_test_app(pool.clone());
    let body = json!({
        "name": "District",
        "territory_id": data.district_id,
        "territory": project_polygon(),
    });
    let project = expect_data(post_json(app, "/api/v1/projects", &owner_token(), body).await, StatusCode::CREATED).await;
    (
        project["id"].as_i64().unwrap(),
        project["base_scenario"]["id"].as_i64().unwrap(),
    )
}

pub async fn count(pool: &PgPool, sql: &str, id: i64) -> i64 {
    sqlx::query_scalar(sql).bind(id).fetch_one(pool).await.unwrap()
}
