//! Integration tests for projects, scenarios and the event log.

mod common;

use assert_matches::assert_matches;
use serde_json::json;
use sqlx::PgPool;
use urban_db::models::event::NewEvent;
use urban_db::models::scenario::PatchScenario;
use urban_db::repositories::scenario_repo::NewScenario;
use urban_db::repositories::{EventRepo, ProjectRepo, ScenarioRepo, TerritoryRepo};
use uuid::Uuid;

use common::{district_project, new_project, project_polygon, regional_project, seed_public_data, OWNER};

fn scenario<'a>(project_id: i64, name: &'a str, is_based: bool) -> NewScenario<'a> {
    NewScenario {
        project_id,
        parent_id: None,
        name,
        is_based,
        functional_zone_type_id: None,
        properties: None,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_project_territory_round_trip(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    let project = ProjectRepo::create(&pool, &new_project("P", data.district_id, false), OWNER)
        .await
        .unwrap();
    assert_eq!(project.user_id, OWNER);
    assert!(!project.is_regional);

    let territory = ProjectRepo::insert_territory(&pool, project.id, &project_polygon())
        .await
        .unwrap();
    assert_eq!(territory.geometry["type"], "Polygon");
    assert_eq!(territory.centre_point["type"], "Point");

    let found = ProjectRepo::find_territory(&pool, project.id).await.unwrap();
    assert!(found.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_regional_project_has_no_territory(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    let (project, _) = regional_project(&pool, &data).await;

    assert!(ProjectRepo::find_territory(&pool, project.id).await.unwrap().is_none());
    let updated = ProjectRepo::update_territory(&pool, project.id, &project_polygon())
        .await
        .unwrap();
    assert!(updated.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_regional_bases_by_ancestor(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    let (project, scenario) = regional_project(&pool, &data).await;

    let bases = ProjectRepo::find_regional_bases(&pool, &[data.district_id, data.region_id])
        .await
        .unwrap();
    assert_eq!(bases.len(), 1);
    assert_eq!(bases[0].project_id, project.id);
    assert_eq!(bases[0].scenario_id, scenario.id);

    let none = ProjectRepo::find_regional_bases(&pool, &[data.district_id]).await.unwrap();
    assert!(none.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_based_scenario_rejected(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    let (project, _) = regional_project(&pool, &data).await;

    let err = ScenarioRepo::create(&pool, &scenario(project.id, "Another base", true))
        .await
        .unwrap_err();
    assert_matches!(
        err.as_database_error().and_then(|e| e.constraint()),
        Some("uq_scenarios_based_per_project")
    );

    let plain = ScenarioRepo::create(&pool, &scenario(project.id, "Variant", false))
        .await
        .unwrap();
    assert!(!plain.is_based);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_by_project_puts_base_first(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    let (project, base) = regional_project(&pool, &data).await;
    ScenarioRepo::create(&pool, &scenario(project.id, "B", false)).await.unwrap();

    let listed = ScenarioRepo::list_by_project(&pool, project.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, base.id);

    let based = ScenarioRepo::list_based(&pool, project.id).await.unwrap();
    assert_eq!(based, vec![(base.id, true)]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_demotes_and_keeps_unset_fields(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    let (project, base) = regional_project(&pool, &data).await;

    let patch = PatchScenario {
        properties: Some(json!({"note": "draft"})),
        ..Default::default()
    };
    let updated = ScenarioRepo::update(&pool, base.id, &patch, false, false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, base.name);
    assert!(updated.is_based);
    assert_eq!(updated.properties["note"], "draft");

    let demoted = ScenarioRepo::update(&pool, base.id, &PatchScenario::default(), false, true)
        .await
        .unwrap()
        .unwrap();
    assert!(!demoted.is_based);

    // With the old base demoted a new one can be created.
    ScenarioRepo::create(&pool, &scenario(project.id, "New base", true))
        .await
        .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_with_project_carries_access_fields(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    let (_, regional) = regional_project(&pool, &data).await;
    let (project, base) = district_project(&pool, &data, regional.id).await;

    let found = ScenarioRepo::find_with_project(&pool, base.id).await.unwrap().unwrap();
    assert_eq!(found.scenario.id, base.id);
    assert_eq!(found.scenario.parent_id, Some(regional.id));
    assert_eq!(found.project_user_id, OWNER);
    assert_eq!(found.project_territory_id, project.territory_id);
    assert!(!found.is_regional);

    assert!(ScenarioRepo::find_with_project(&pool, 999_999).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_territory_edges_and_nearby(pool: PgPool) {
    let data = seed_public_data(&pool).await;
    let (_, regional) = regional_project(&pool, &data).await;
    let (project, _) = district_project(&pool, &data, regional.id).await;

    let edges = TerritoryRepo::list_edges(&pool).await.unwrap();
    assert!(edges
        .iter()
        .any(|e| e.id == data.district_id && e.parent_id == Some(data.region_id)));

    let near = TerritoryRepo::ids_near_project(&pool, project.id, 2, 3000.0).await.unwrap();
    assert_eq!(near, vec![data.district_id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_event_insert_is_idempotent(pool: PgPool) {
    let payload = json!({"scenario_id": 7});
    let event = NewEvent {
        event_id: Uuid::new_v4(),
        event_type: "scenario.objects_updated",
        project_id: Some(3),
        scenario_id: Some(7),
        actor_user_id: Some(OWNER),
        payload: &payload,
    };

    assert!(EventRepo::insert(&pool, &event).await.unwrap());
    assert!(!EventRepo::insert(&pool, &event).await.unwrap());

    let stored = EventRepo::find_by_event_id(&pool, event.event_id).await.unwrap().unwrap();
    assert_eq!(stored.event_type, "scenario.objects_updated");
    assert_eq!(stored.payload, payload);

    let recent = EventRepo::list_recent(&pool, 10, 0).await.unwrap();
    assert_eq!(recent.len(), 1);
}
