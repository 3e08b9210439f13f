//! Route definitions for scenarios and their overlay resources.
//!
//! ```text
//! GET    /{id}                                    get_by_id
//! POST   /{id}                                    copy
//! PUT    /{id}                                    put
//! PATCH  /{id}                                    patch
//! DELETE /{id}                                    delete
//!
//! GET    /{id}/urban_objects                      raw links
//!
//! GET    /{id}/physical_objects                   overlay
//! POST   /{id}/physical_objects                   create
//! PUT|PATCH|DELETE /{id}/physical_objects/{object_id}     ?is_scenario_object=
//!
//! GET    /{id}/geometries                         overlay
//! PUT|PATCH|DELETE /{id}/geometries/{geometry_id}         ?is_scenario_object=
//!
//! GET    /{id}/services                           overlay
//! POST   /{id}/services                           create
//! PUT|PATCH|DELETE /{id}/services/{service_id}            ?is_scenario_object=
//!
//! GET    /{id}/buffers                            overlay
//! PUT    /{id}/buffers                            upsert
//! DELETE /{id}/buffers                            ?buffer_type_id=&urban_object_id=&is_scenario_object=
//!
//! GET    /{id}/functional_zones                   overlay
//! POST   /{id}/functional_zones                   create
//! PUT|PATCH|DELETE /{id}/functional_zones/{zone_id}       ?is_scenario_object=
//!
//! GET    /{id}/indicators                         overlay
//! POST   /{id}/indicators                         create
//! PUT|DELETE /{id}/indicators/{value_id}                  ?is_scenario_object=
//! ```

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{
    buffers, functional_zones, geometries, indicators, physical_objects, scenarios, services,
    urban_objects,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(scenarios::get_by_id)
                .post(scenarios::copy)
                .put(scenarios::put)
                .patch(scenarios::patch)
                .delete(scenarios::delete),
        )
        .route("/{id}/urban_objects", get(urban_objects::list))
        // Physical objects
        .route(
            "/{id}/physical_objects",
            get(physical_objects::list).post(physical_objects::create),
        )
        .route(
            "/{id}/physical_objects/{object_id}",
            put(physical_objects::put)
                .patch(physical_objects::patch)
                .delete(physical_objects::delete),
        )
        // Geometries
        .route("/{id}/geometries", get(geometries::list))
        .route(
            "/{id}/geometries/{geometry_id}",
            put(geometries::put)
                .patch(geometries::patch)
                .delete(geometries::delete),
        )
        // Services
        .route("/{id}/services", get(services::list).post(services::create))
        .route(
            "/{id}/services/{service_id}",
            put(services::put).patch(services::patch).delete(services::delete),
        )
        // Buffers
        .route(
            "/{id}/buffers",
            get(buffers::list).put(buffers::put).delete(buffers::delete),
        )
        // Functional zones
        .route(
            "/{id}/functional_zones",
            get(functional_zones::list).post(functional_zones::create),
        )
        .route(
            "/{id}/functional_zones/{zone_id}",
            put(functional_zones::put)
                .patch(functional_zones::patch)
                .delete(functional_zones::delete),
        )
        // Indicator values
        .route("/{id}/indicators", get(indicators::list).post(indicators::create))
        .route(
            "/{id}/indicators/{value_id}",
            put(indicators::put).delete(indicators::delete),
        )
}
