//! Route definitions for projects.
//!
//! ```text
//! POST /                                          create (project + base scenario)
//! GET  /{id}                                      get_by_id
//! GET  /{id}/scenarios                            list_scenarios
//! PUT  /{id}/territory                            put_territory
//! GET  /{id}/context                              get_context
//! POST /{project_id}/base_scenario/{scenario_id}  create_base_scenario (superuser)
//! ```

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::projects;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(projects::create))
        .route("/{id}", get(projects::get_by_id))
        .route("/{id}/scenarios", get(projects::list_scenarios))
        .route("/{id}/territory", put(projects::put_territory))
        .route("/{id}/context", get(projects::get_context))
        .route(
            "/{project_id}/base_scenario/{scenario_id}",
            post(projects::create_base_scenario),
        )
}
