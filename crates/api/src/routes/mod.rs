pub mod health;
pub mod projects;
pub mod scenarios;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /health                                          service health
///
/// /projects                                        create
/// /projects/{id}                                   get
/// /projects/{id}/scenarios                         list scenarios
/// /projects/{id}/territory                         replace territory (PUT)
/// /projects/{id}/context                           context territories
/// /projects/{project_id}/base_scenario/{id}        promote (superuser)
///
/// /scenarios/{id}                                  get, copy, put, patch, delete
/// /scenarios/{id}/urban_objects                    raw links
/// /scenarios/{id}/physical_objects[/{object_id}]   overlay + writes
/// /scenarios/{id}/geometries[/{geometry_id}]       overlay + writes
/// /scenarios/{id}/services[/{service_id}]          overlay + writes
/// /scenarios/{id}/buffers                          overlay, upsert, delete
/// /scenarios/{id}/functional_zones[/{zone_id}]     overlay + writes
/// /scenarios/{id}/indicators[/{value_id}]          overlay + writes
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/projects", projects::router())
        .nest("/scenarios", scenarios::router())
}
