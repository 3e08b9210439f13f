//! Integration tests for the overlay endpoints of a project scenario:
//! reads, copy-on-write of public rows, locking and tombstones.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};
use sqlx::PgPool;

use common::*;

async fn list(pool: &PgPool, uri: &str) -> Vec<Value> {
    let app = build_test_app(pool.clone());
    let data = expect_data(get_auth(app, uri, &owner_token()).await, StatusCode::OK).await;
    data.as_array().unwrap().clone()
}

async fn setup(pool: &PgPool) -> (PublicData, i64, i64, i64) {
    let data = seed_public_data(pool).await;
    let (_, regional_base) = create_regional_project(pool, &data).await;
    let (project_id, base_id) = create_district_project(pool, &data).await;
    (data, regional_base, project_id, base_id)
}

// ---------------------------------------------------------------------------
// Physical objects
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_base_scenario_shows_public_objects(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;

    let objects = list(&pool, &format!("/api/v1/scenarios/{base_id}/physical_objects")).await;

    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0]["physical_object_id"], data.inside_physical_object_id);
    assert_eq!(objects[0]["is_scenario_object"], false);
    assert_eq!(objects[0]["is_locked"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_exclusive_filters_are_rejected(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;
    let app = build_test_app(pool);

    expect_error(
        get_auth(
            app,
            &format!(
                "/api/v1/scenarios/{base_id}/physical_objects?physical_object_type_id={}&physical_object_function_id=1",
                data.building_type_id
            ),
            &owner_token(),
        )
        .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_editing_public_object_copies_it(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;
    let public_id = data.inside_physical_object_id;

    let app = build_test_app(pool.clone());
    let edited = expect_data(
        patch_json(
            app,
            &format!("/api/v1/scenarios/{base_id}/physical_objects/{public_id}?is_scenario_object=false"),
            &owner_token(),
            json!({ "name": "Renovated" }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(edited["public_physical_object_id"], public_id);
    assert_eq!(edited["name"], "Renovated");
    let private_id = edited["id"].as_i64().unwrap();

    let objects = list(&pool, &format!("/api/v1/scenarios/{base_id}/physical_objects")).await;
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0]["physical_object_id"], private_id);
    assert_eq!(objects[0]["is_scenario_object"], true);
    assert_eq!(objects[0]["name"], "Renovated");

    // The public row is untouched.
    let public_name: Option<String> = sqlx::query_scalar("SELECT name FROM physical_objects WHERE id = $1")
        .bind(public_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(public_name.as_deref(), Some("Inside"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_public_override_conflicts(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;
    let uri = format!(
        "/api/v1/scenarios/{base_id}/physical_objects/{}?is_scenario_object=false",
        data.inside_physical_object_id
    );
    let body = json!({ "physical_object_type_id": data.building_type_id, "name": "First", "properties": {} });

    let app = build_test_app(pool.clone());
    expect_data(put_json(app, &uri, &owner_token(), body.clone()).await, StatusCode::OK).await;

    let app = build_test_app(pool);
    let code = expect_error(put_json(app, &uri, &owner_token(), body).await, StatusCode::CONFLICT).await;
    assert_eq!(code, "CONFLICT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleting_public_object_hides_it(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;
    let uri = format!(
        "/api/v1/scenarios/{base_id}/physical_objects/{}?is_scenario_object=false",
        data.inside_physical_object_id
    );

    let app = build_test_app(pool.clone());
    let response = delete(app, &uri, &owner_token()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let objects = list(&pool, &format!("/api/v1/scenarios/{base_id}/physical_objects")).await;
    assert!(objects.is_empty());

    let app = build_test_app(pool);
    expect_error(delete(app, &uri, &owner_token()).await, StatusCode::CONFLICT).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_and_delete_private_object(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;

    let app = build_test_app(pool.clone());
    let created = expect_data(
        post_json(
            app,
            &format!("/api/v1/scenarios/{base_id}/physical_objects"),
            &owner_token(),
            json!({
                "physical_object_type_id": data.building_type_id,
                "name": "New block",
                "territory_id": data.district_id,
                "geometry": square(30.22, 59.22, 30.23, 59.23),
            }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let private_id = created["physical_object"]["id"].as_i64().unwrap();
    let geometry_id = created["object_geometry"]["id"].as_i64().unwrap();
    assert!(created["physical_object"]["public_physical_object_id"].is_null());
    assert!(created["urban_object_id"].is_i64());

    let objects = list(&pool, &format!("/api/v1/scenarios/{base_id}/physical_objects")).await;
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[1]["physical_object_id"], private_id);
    assert_eq!(objects[1]["is_scenario_object"], true);

    let uri = format!("/api/v1/scenarios/{base_id}/physical_objects/{private_id}?is_scenario_object=true");
    let app = build_test_app(pool.clone());
    assert_eq!(delete(app, &uri, &owner_token()).await.status(), StatusCode::NO_CONTENT);

    let app = build_test_app(pool.clone());
    expect_error(delete(app, &uri, &owner_token()).await, StatusCode::NOT_FOUND).await;

    let objects = list(&pool, &format!("/api/v1/scenarios/{base_id}/physical_objects")).await;
    assert_eq!(objects.len(), 1);

    // The geometry only the deleted link referenced goes with it.
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM scenario_object_geometries WHERE id = $1", geometry_id).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deleting_private_geometry_removes_its_object(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;

    let app = build_test_app(pool.clone());
    let created = expect_data(
        post_json(
            app,
            &format!("/api/v1/scenarios/{base_id}/physical_objects"),
            &owner_token(),
            json!({
                "physical_object_type_id": data.building_type_id,
                "name": "Kiosk",
                "territory_id": data.district_id,
                "geometry": square(30.22, 59.22, 30.23, 59.23),
            }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let private_id = created["physical_object"]["id"].as_i64().unwrap();
    let geometry_id = created["object_geometry"]["id"].as_i64().unwrap();

    let app = build_test_app(pool.clone());
    let response = delete(
        app,
        &format!("/api/v1/scenarios/{base_id}/geometries/{geometry_id}?is_scenario_object=true"),
        &owner_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM scenario_physical_objects WHERE id = $1", private_id).await, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM scenario_urban_objects WHERE scenario_id = $1", base_id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_public_object_is_not_found(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;
    let app = build_test_app(pool);

    // Public but outside the project: never inherited by the scenario.
    expect_error(
        patch_json(
            app,
            &format!(
                "/api/v1/scenarios/{base_id}/physical_objects/{}?is_scenario_object=false",
                data.outside_physical_object_id
            ),
            &owner_token(),
            json!({ "name": "Nope" }),
        )
        .await,
        StatusCode::NOT_FOUND,
    )
    .await;
}

// ---------------------------------------------------------------------------
// Locking
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_objects_outside_new_territory_are_locked(pool: PgPool) {
    let (data, _, project_id, base_id) = setup(&pool).await;

    let app = build_test_app(pool.clone());
    expect_data(
        put_json(
            app,
            &format!("/api/v1/projects/{project_id}/territory"),
            &owner_token(),
            json!({ "geometry": square(30.3, 59.3, 30.4, 59.4) }),
        )
        .await,
        StatusCode::OK,
    )
    .await;

    let objects = list(&pool, &format!("/api/v1/scenarios/{base_id}/physical_objects")).await;
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0]["physical_object_id"], data.inside_physical_object_id);
    assert_eq!(objects[0]["is_locked"], true);

    let app = build_test_app(pool);
    let code = expect_error(
        patch_json(
            app,
            &format!(
                "/api/v1/scenarios/{base_id}/physical_objects/{}?is_scenario_object=false",
                data.inside_physical_object_id
            ),
            &owner_token(),
            json!({ "name": "Too far" }),
        )
        .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(code, "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Geometries and services
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_editing_public_geometry(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;

    let geometries = list(&pool, &format!("/api/v1/scenarios/{base_id}/geometries")).await;
    assert_eq!(geometries.len(), 1);
    assert_eq!(geometries[0]["object_geometry_id"], data.inside_geometry_id);
    assert!(geometries[0]["geometry"].is_object());

    let app = build_test_app(pool.clone());
    expect_data(
        patch_json(
            app,
            &format!(
                "/api/v1/scenarios/{base_id}/geometries/{}?is_scenario_object=false",
                data.inside_geometry_id
            ),
            &owner_token(),
            json!({ "address": "1 Main street" }),
        )
        .await,
        StatusCode::OK,
    )
    .await;

    let geometries = list(&pool, &format!("/api/v1/scenarios/{base_id}/geometries")).await;
    assert_eq!(geometries.len(), 1);
    assert_eq!(geometries[0]["is_scenario_object"], true);
    assert_eq!(geometries[0]["address"], "1 Main street");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_services_overlay_and_create(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;

    let services = list(&pool, &format!("/api/v1/scenarios/{base_id}/services")).await;
    assert_eq!(services.len(), 1);
    assert_eq!(services[0]["service_id"], data.inside_service_id);

    let kindergarten = id_by_name(&pool, "service_types", "Kindergarten").await;
    let app = build_test_app(pool.clone());
    let created = expect_data(
        post_json(
            app,
            &format!("/api/v1/scenarios/{base_id}/services"),
            &owner_token(),
            json!({
                "service_type_id": kindergarten,
                "name": "Kindergarten 7",
                "capacity": 120,
                "physical_object_id": data.inside_physical_object_id,
                "is_scenario_physical_object": false,
                "object_geometry_id": data.inside_geometry_id,
                "is_scenario_geometry": false,
            }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(created["service_type_id"], kindergarten);

    let services = list(&pool, &format!("/api/v1/scenarios/{base_id}/services")).await;
    assert_eq!(services.len(), 2);
    assert!(services.iter().any(|s| s["service_id"] == created["id"] && s["is_scenario_object"] == true));

    // The building already carried a service, so a second link was added.
    let links = count(&pool, "SELECT COUNT(*) FROM scenario_urban_objects WHERE scenario_id = $1", base_id).await;
    assert_eq!(links, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_service_on_unknown_object_is_not_found(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;
    let app = build_test_app(pool);

    expect_error(
        post_json(
            app,
            &format!("/api/v1/scenarios/{base_id}/services"),
            &owner_token(),
            json!({
                "service_type_id": data.school_type_id,
                "physical_object_id": data.outside_physical_object_id,
                "is_scenario_physical_object": false,
                "object_geometry_id": data.inside_geometry_id,
                "is_scenario_geometry": false,
            }),
        )
        .await,
        StatusCode::NOT_FOUND,
    )
    .await;
}

// ---------------------------------------------------------------------------
// Buffers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_buffer_from_default_radius(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;
    assert!(list(&pool, &format!("/api/v1/scenarios/{base_id}/buffers")).await.is_empty());

    let app = build_test_app(pool.clone());
    let buffer = expect_data(
        put_json(
            app,
            &format!("/api/v1/scenarios/{base_id}/buffers"),
            &owner_token(),
            json!({
                "buffer_type_id": data.sanitary_buffer_type_id,
                "urban_object_id": data.inside_urban_object_id,
                "is_scenario_object": false,
            }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(buffer["is_custom"], false);
    assert_eq!(buffer["geometry"]["type"], "Polygon");

    let buffers = list(&pool, &format!("/api/v1/scenarios/{base_id}/buffers")).await;
    assert_eq!(buffers.len(), 1);
    assert_eq!(buffers[0]["is_scenario_object"], true);

    let uri = format!(
        "/api/v1/scenarios/{base_id}/buffers?buffer_type_id={}&urban_object_id={}&is_scenario_object=false",
        data.sanitary_buffer_type_id, data.inside_urban_object_id
    );
    let app = build_test_app(pool.clone());
    assert_eq!(delete(app, &uri, &owner_token()).await.status(), StatusCode::NO_CONTENT);

    let app = build_test_app(pool.clone());
    expect_error(delete(app, &uri, &owner_token()).await, StatusCode::NOT_FOUND).await;
    assert!(list(&pool, &format!("/api/v1/scenarios/{base_id}/buffers")).await.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_custom_buffer_geometry(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;
    let app = build_test_app(pool);

    let buffer = expect_data(
        put_json(
            app,
            &format!("/api/v1/scenarios/{base_id}/buffers"),
            &owner_token(),
            json!({
                "buffer_type_id": data.sanitary_buffer_type_id,
                "urban_object_id": data.inside_urban_object_id,
                "is_scenario_object": false,
                "geometry": square(30.18, 59.18, 30.22, 59.22),
            }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(buffer["is_custom"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_buffer_without_default_radius(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;
    let accessibility = id_by_name(&pool, "buffer_types", "Service accessibility").await;
    let park = id_by_name(&pool, "physical_object_types", "Park").await;

    // A park carries no service and has no default radius of any type.
    let app = build_test_app(pool.clone());
    let created = expect_data(
        post_json(
            app,
            &format!("/api/v1/scenarios/{base_id}/physical_objects"),
            &owner_token(),
            json!({
                "physical_object_type_id": park,
                "territory_id": data.district_id,
                "geometry": square(30.22, 59.22, 30.23, 59.23),
            }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;

    let app = build_test_app(pool);
    expect_error(
        put_json(
            app,
            &format!("/api/v1/scenarios/{base_id}/buffers"),
            &owner_token(),
            json!({
                "buffer_type_id": accessibility,
                "urban_object_id": created["urban_object_id"],
                "is_scenario_object": true,
            }),
        )
        .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_buffers_rejected_in_regional_scenario(pool: PgPool) {
    let (_, regional_base, _, _) = setup(&pool).await;
    let app = build_test_app(pool);

    expect_error(
        get_auth(app, &format!("/api/v1/scenarios/{regional_base}/buffers"), &admin_token()).await,
        StatusCode::BAD_REQUEST,
    )
    .await;
}

// ---------------------------------------------------------------------------
// Functional zones
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_zone_override_and_delete(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;
    let zones_uri = format!("/api/v1/scenarios/{base_id}/functional_zones");

    let zones = list(&pool, &zones_uri).await;
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0]["functional_zone_id"], data.zone_id);
    assert_eq!(zones[0]["is_scenario_object"], false);

    let business = id_by_name(&pool, "functional_zone_types", "business").await;
    let app = build_test_app(pool.clone());
    let edited = expect_data(
        patch_json(
            app,
            &format!("{zones_uri}/{}?is_scenario_object=false", data.zone_id),
            &owner_token(),
            json!({ "functional_zone_type_id": business }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let private_id = edited["id"].as_i64().unwrap();
    assert_eq!(edited["functional_zone_type_id"], business);

    let zones = list(&pool, &zones_uri).await;
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0]["functional_zone_id"], private_id);
    assert_eq!(zones[0]["is_scenario_object"], true);

    let app = build_test_app(pool.clone());
    let response = delete(app, &format!("{zones_uri}/{private_id}?is_scenario_object=true"), &owner_token()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The public zone stays hidden after its private copy is gone.
    assert!(list(&pool, &zones_uri).await.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_zone(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;
    let zones_uri = format!("/api/v1/scenarios/{base_id}/functional_zones");

    let app = build_test_app(pool.clone());
    expect_data(
        post_json(
            app,
            &zones_uri,
            &owner_token(),
            json!({
                "functional_zone_type_id": data.residential_zone_type_id,
                "name": "New quarter",
                "geometry": square(30.12, 59.12, 30.14, 59.14),
                "year": 2025,
                "source": "User",
            }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;

    let zones = list(&pool, &zones_uri).await;
    assert_eq!(zones.len(), 2);
    assert_eq!(zones[1]["is_scenario_object"], true);
    assert_eq!(zones[1]["name"], "New quarter");
}

// ---------------------------------------------------------------------------
// Indicator values
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_indicator_override(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;
    let uri = format!("/api/v1/scenarios/{base_id}/indicators");

    let values = list(&pool, &uri).await;
    assert_eq!(values.len(), 1);
    assert_eq!(values[0]["indicator_value_id"], data.indicator_value_id);
    assert_eq!(values[0]["value"], 12000.0);

    let body = json!({ "date_value": "2024-01-01", "value": 15000.0, "value_type": "real" });
    let public_uri = format!("{uri}/{}?is_scenario_object=false", data.indicator_value_id);

    let app = build_test_app(pool.clone());
    let replaced = expect_data(put_json(app, &public_uri, &owner_token(), body.clone()).await, StatusCode::OK).await;
    assert_eq!(replaced["value"], 15000.0);

    let app = build_test_app(pool.clone());
    expect_error(put_json(app, &public_uri, &owner_token(), body).await, StatusCode::CONFLICT).await;

    let values = list(&pool, &uri).await;
    assert_eq!(values.len(), 1);
    assert_eq!(values[0]["is_scenario_object"], true);
    assert_eq!(values[0]["value"], 15000.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_indicator_create_and_delete(pool: PgPool) {
    let (data, _, _, base_id) = setup(&pool).await;
    let uri = format!("/api/v1/scenarios/{base_id}/indicators");

    let app = build_test_app(pool.clone());
    let created = expect_data(
        post_json(
            app,
            &uri,
            &owner_token(),
            json!({
                "indicator_id": data.population_indicator_id,
                "date_value": "2030-01-01",
                "value": 20000.0,
                "value_type": "forecast",
            }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let created_id = created["id"].as_i64().unwrap();
    assert_eq!(list(&pool, &uri).await.len(), 2);

    let app = build_test_app(pool.clone());
    let response = delete(app, &format!("{uri}/{created_id}?is_scenario_object=true"), &owner_token()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = build_test_app(pool.clone());
    let response = delete(
        app,
        &format!("{uri}/{}?is_scenario_object=false", data.indicator_value_id),
        &owner_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(list(&pool, &uri).await.is_empty());
}
