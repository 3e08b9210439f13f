//! Integration tests for the scenario lifecycle: copy, update, delete, and
//! the full branch / edit / lock / promote walkthrough.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};
use sqlx::PgPool;

use common::*;

async fn physical_objects(pool: &PgPool, scenario_id: i64) -> Vec<Value> {
    let app = build_test_app(pool.clone());
    let data = expect_data(
        get_auth(app, &format!("/api/v1/scenarios/{scenario_id}/physical_objects"), &owner_token()).await,
        StatusCode::OK,
    )
    .await;
    data.as_array().unwrap().clone()
}

async fn copy_scenario(pool: &PgPool, scenario_id: i64, name: &str) -> Value {
    let app = build_test_app(pool.clone());
    expect_data(
        post_json(
            app,
            &format!("/api/v1/scenarios/{scenario_id}"),
            &owner_token(),
            json!({ "name": name }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await
}

async fn rename_object(pool: &PgPool, scenario_id: i64, object_id: i64, name: &str) -> Value {
    let app = build_test_app(pool.clone());
    expect_data(
        patch_json(
            app,
            &format!("/api/v1/scenarios/{scenario_id}/physical_objects/{object_id}?is_scenario_object=false"),
            &owner_token(),
            json!({ "name": name }),
        )
        .await,
        StatusCode::OK,
    )
    .await
}

// ---------------------------------------------------------------------------
// Read and update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_scenario(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    create_regional_project(&pool, &data).await;
    let (project_id, base_id) = create_district_project(&pool, &data).await;
    let app = build_test_app(pool);

    let scenario = expect_data(
        get_auth(app, &format!("/api/v1/scenarios/{base_id}"), &owner_token()).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(scenario["id"], base_id);
    assert_eq!(scenario["project_id"], project_id);
    assert_eq!(scenario["is_based"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_scenario_returns_404(pool: PgPool) {
    let app = build_test_app(pool);

    expect_error(
        get_auth(app, "/api/v1/scenarios/987654", &owner_token()).await,
        StatusCode::NOT_FOUND,
    )
    .await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_put_replaces_scenario_fields(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    create_regional_project(&pool, &data).await;
    let (_, base_id) = create_district_project(&pool, &data).await;
    let app = build_test_app(pool);

    let scenario = expect_data(
        put_json(
            app,
            &format!("/api/v1/scenarios/{base_id}"),
            &owner_token(),
            json!({
                "name": "Master plan",
                "is_based": true,
                "functional_zone_type_id": data.residential_zone_type_id,
                "properties": { "author": "planning office" },
            }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(scenario["name"], "Master plan");
    assert_eq!(scenario["is_based"], true);
    assert_eq!(scenario["functional_zone_type_id"], data.residential_zone_type_id);
    assert_eq!(scenario["properties"]["author"], "planning office");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_is_based_cannot_be_set_by_update(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    create_regional_project(&pool, &data).await;
    let (_, base_id) = create_district_project(&pool, &data).await;
    let child = copy_scenario(&pool, base_id, "Branch").await;
    let app = build_test_app(pool);

    let code = expect_error(
        patch_json(
            app,
            &format!("/api/v1/scenarios/{}", child["id"]),
            &owner_token(),
            json!({ "is_based": true }),
        )
        .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(code, "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_blank_name_is_rejected(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    create_regional_project(&pool, &data).await;
    let (_, base_id) = create_district_project(&pool, &data).await;
    let app = build_test_app(pool);

    expect_error(
        post_json(app, &format!("/api/v1/scenarios/{base_id}"), &owner_token(), json!({ "name": "" })).await,
        StatusCode::BAD_REQUEST,
    )
    .await;
}

// ---------------------------------------------------------------------------
// Copy
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_copy_creates_child_with_same_objects(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    create_regional_project(&pool, &data).await;
    let (project_id, base_id) = create_district_project(&pool, &data).await;

    let child = copy_scenario(&pool, base_id, "Branch").await;
    assert_eq!(child["parent_id"], base_id);
    assert_eq!(child["project_id"], project_id);
    assert_eq!(child["is_based"], false);

    let child_id = child["id"].as_i64().unwrap();
    let objects = physical_objects(&pool, child_id).await;
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0]["physical_object_id"], data.inside_physical_object_id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_copy_duplicates_private_rows(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    create_regional_project(&pool, &data).await;
    let (_, base_id) = create_district_project(&pool, &data).await;

    let edited = rename_object(&pool, base_id, data.inside_physical_object_id, "Edited in base").await;
    let child = copy_scenario(&pool, base_id, "Branch").await;
    let child_id = child["id"].as_i64().unwrap();

    let objects = physical_objects(&pool, child_id).await;
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0]["is_scenario_object"], true);
    assert_eq!(objects[0]["name"], "Edited in base");
    // The child owns its own private row.
    assert_ne!(objects[0]["physical_object_id"], edited["id"]);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_base_scenario_cannot_be_deleted(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    create_regional_project(&pool, &data).await;
    let (_, base_id) = create_district_project(&pool, &data).await;
    let app = build_test_app(pool);

    expect_error(
        delete(app, &format!("/api/v1/scenarios/{base_id}"), &owner_token()).await,
        StatusCode::CONFLICT,
    )
    .await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_removes_scenario_and_private_rows(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    create_regional_project(&pool, &data).await;
    let (_, base_id) = create_district_project(&pool, &data).await;
    let child = copy_scenario(&pool, base_id, "Branch").await;
    let child_id = child["id"].as_i64().unwrap();
    let private = rename_object(&pool, child_id, data.inside_physical_object_id, "Doomed").await;
    let private_id = private["id"].as_i64().unwrap();

    let app = build_test_app(pool.clone());
    let response = delete(app, &format!("/api/v1/scenarios/{child_id}"), &owner_token()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = build_test_app(pool.clone());
    expect_error(
        get_auth(app, &format!("/api/v1/scenarios/{child_id}"), &owner_token()).await,
        StatusCode::NOT_FOUND,
    )
    .await;

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM scenario_physical_objects WHERE id = $1", private_id).await, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM scenario_urban_objects WHERE scenario_id = $1", child_id).await, 0);
    // The base is unaffected.
    assert_eq!(physical_objects(&pool, base_id).await.len(), 1);
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

/// Base scenario mirrors the public dataset, a branch edits an object
/// privately, shrinking the territory locks the public object, and a
/// promotion deep-copies the regional base.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_branch_edit_lock_promote(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    let (_, regional_base) = create_regional_project(&pool, &data).await;
    let (project_id, s1) = create_district_project(&pool, &data).await;

    // S1 equals the public objects inside T.
    let s1_objects = physical_objects(&pool, s1).await;
    assert_eq!(s1_objects.len(), 1);
    assert_eq!(s1_objects[0]["physical_object_id"], data.inside_physical_object_id);
    assert_eq!(s1_objects[0]["is_scenario_object"], false);

    // S2 branches off S1 and edits O through its public id.
    let s2 = copy_scenario(&pool, s1, "S2").await["id"].as_i64().unwrap();
    rename_object(&pool, s2, data.inside_physical_object_id, "O in S2").await;

    let s2_objects = physical_objects(&pool, s2).await;
    assert_eq!(s2_objects.len(), 1);
    assert_eq!(s2_objects[0]["is_scenario_object"], true);
    assert_eq!(s2_objects[0]["name"], "O in S2");

    let s1_objects = physical_objects(&pool, s1).await;
    assert_eq!(s1_objects[0]["is_scenario_object"], false);
    assert_eq!(s1_objects[0]["name"], "Inside");

    // Shrink T so that O falls outside it.
    let app = build_test_app(pool.clone());
    expect_data(
        put_json(
            app,
            &format!("/api/v1/projects/{project_id}/territory"),
            &owner_token(),
            json!({ "geometry": square(30.25, 59.25, 30.3, 59.3) }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let s1_objects = physical_objects(&pool, s1).await;
    assert_eq!(s1_objects.len(), 1);
    assert_eq!(s1_objects[0]["is_locked"], true);

    // Promote the regional base: demote S1 first, then S3 is a deep copy.
    let app = build_test_app(pool.clone());
    expect_data(
        patch_json(app, &format!("/api/v1/scenarios/{s1}"), &owner_token(), json!({ "is_based": false })).await,
        StatusCode::OK,
    )
    .await;
    let app = build_test_app(pool.clone());
    let s3 = expect_data(
        post_json(
            app,
            &format!("/api/v1/projects/{project_id}/base_scenario/{regional_base}"),
            &admin_token(),
            json!({}),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(s3["is_based"], true);
    let s3 = s3["id"].as_i64().unwrap();

    let regional_links: Vec<(Option<i64>, Option<i64>)> = sqlx::query_as(
        "SELECT public_physical_object_id, public_object_geometry_id FROM scenario_urban_objects
         WHERE scenario_id = $1 ORDER BY public_urban_object_id",
    )
    .bind(regional_base)
    .fetch_all(&pool)
    .await
    .unwrap();
    let s3_links: Vec<(Option<i64>, Option<i64>)> = sqlx::query_as(
        "SELECT public_physical_object_id, public_object_geometry_id FROM scenario_urban_objects
         WHERE scenario_id = $1 ORDER BY public_urban_object_id",
    )
    .bind(s3)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(s3_links, regional_links);
    assert_eq!(s3_links.len(), 2);
}
