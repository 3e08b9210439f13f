//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// `?is_scenario_object=` on overlay writes.
///
/// `true` addresses a scenario-private row by its own id, `false` a public
/// row seen through the scenario.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScenarioObjectParams {
    pub is_scenario_object: bool,
}
