use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the pool is reference counted and everything else sits
/// behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: urban_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Scenario events are published here after their transaction commits.
    pub event_bus: Arc<urban_events::EventBus>,
}
