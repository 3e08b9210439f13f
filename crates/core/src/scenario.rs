//! Scenario hierarchy rules.
//!
//! A project owns at most one based scenario. Regional projects own the root
//! scenarios that project scenarios inherit from; base scenarios of ordinary
//! projects are only ever created through promotion of a regional scenario.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

/// Maximum allowed length for a scenario name.
pub const MAX_SCENARIO_NAME_LENGTH: usize = 200;

/// Name given to the base scenario created together with a project.
pub const DEFAULT_BASE_SCENARIO_NAME: &str = "Base scenario";

// ---------------------------------------------------------------------------
// Scenario kind
// ---------------------------------------------------------------------------

/// Whether a scenario belongs to a regional project or an ordinary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Regional,
    Project,
}

impl ScenarioKind {
    pub fn of_project(is_regional: bool) -> Self {
        if is_regional {
            ScenarioKind::Regional
        } else {
            ScenarioKind::Project
        }
    }
}

/// Which scenario kinds an operation accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindRequirement {
    Any,
    ProjectOnly,
    RegionalOnly,
}

impl KindRequirement {
    /// Reject `kind` if the operation does not accept it.
    pub fn check(self, kind: ScenarioKind, entity: &'static str) -> Result<(), CoreError> {
        match (self, kind) {
            (KindRequirement::ProjectOnly, ScenarioKind::Regional) => {
                Err(CoreError::NotAllowedInRegionalScenario { entity })
            }
            (KindRequirement::RegionalOnly, ScenarioKind::Project) => {
                Err(CoreError::NotAllowedInProjectScenario { entity })
            }
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a scenario name: non-empty, trimmed, within
/// [`MAX_SCENARIO_NAME_LENGTH`].
pub fn validate_scenario_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Scenario name must not be empty".to_string(),
        ));
    }
    if trimmed.len() != name.len() {
        return Err(CoreError::Validation(
            "Scenario name must not have leading or trailing whitespace".to_string(),
        ));
    }
    if name.chars().count() > MAX_SCENARIO_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Scenario name must not exceed {MAX_SCENARIO_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// What a generic update does to the `is_based` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasedTransition {
    Unchanged,
    Demote,
}

/// Decide whether a generic (PUT/PATCH) update may set `is_based`.
///
/// Promotion only happens through `create_base_scenario`, so `true` is
/// accepted only when the scenario is already the base. `false` on the
/// current base demotes it.
pub fn check_is_based_update(
    currently_based: bool,
    requested: Option<bool>,
) -> Result<BasedTransition, CoreError> {
    match (currently_based, requested) {
        (_, None) => Ok(BasedTransition::Unchanged),
        (true, Some(true)) | (false, Some(false)) => Ok(BasedTransition::Unchanged),
        (true, Some(false)) => Ok(BasedTransition::Demote),
        (false, Some(true)) => Err(CoreError::Validation(
            "is_based cannot be set to true through a scenario update; \
             use the base scenario promotion endpoint"
                .to_string(),
        )),
    }
}

/// The facts `create_base_scenario` needs to decide whether a promotion is legal.
#[derive(Debug, Clone, Copy)]
pub struct PromotionRequest {
    pub project_id: DbId,
    pub project_is_regional: bool,
    pub source_scenario_id: DbId,
    pub source_is_regional: bool,
    pub existing_base_id: Option<DbId>,
}

/// Validate a base-scenario promotion.
///
/// Order matters: kind errors are reported before the duplicate-base conflict.
pub fn validate_promotion(req: &PromotionRequest) -> Result<(), CoreError> {
    if req.project_is_regional {
        return Err(CoreError::BadRequest(format!(
            "Project {} is regional: base regional scenarios are created with the project",
            req.project_id
        )));
    }
    if !req.source_is_regional {
        return Err(CoreError::BadRequest(format!(
            "Scenario {} is a PROJECT scenario: promote the parent REGIONAL scenario instead",
            req.source_scenario_id
        )));
    }
    if let Some(existing) = req.existing_base_id {
        return Err(CoreError::Conflict(format!(
            "Project {} already has a base scenario (id {existing})",
            req.project_id
        )));
    }
    Ok(())
}

/// Return the single based scenario among `scenarios` (`(id, is_based)` pairs).
///
/// Two based scenarios in one project is a broken invariant, reported as an
/// internal error rather than silently picking one.
pub fn single_base(project_id: DbId, scenarios: &[(DbId, bool)]) -> Result<Option<DbId>, CoreError> {
    let mut based = scenarios.iter().filter(|(_, is_based)| *is_based).map(|(id, _)| *id);
    let first = based.next();
    if let Some(second) = based.next() {
        return Err(CoreError::Internal(format!(
            "Project {project_id} has more than one base scenario ({} and {second})",
            first.unwrap_or_default()
        )));
    }
    Ok(first)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
