//! Scenario models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use urban_core::access::ProjectAccess;
use urban_core::scenario::ScenarioKind;
use urban_core::types::{DbId, Timestamp};
use validator::Validate;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `scenarios` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Scenario {
    pub id: DbId,
    pub project_id: DbId,
    pub parent_id: Option<DbId>,
    pub name: String,
    pub is_based: bool,
    pub functional_zone_type_id: Option<DbId>,
    pub properties: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A scenario joined with the project fields the access guard needs.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScenarioWithProject {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub scenario: Scenario,
    pub project_user_id: DbId,
    pub project_name: String,
    pub project_territory_id: DbId,
    pub project_is_public: bool,
    pub is_regional: bool,
}

impl ScenarioWithProject {
    pub fn kind(&self) -> ScenarioKind {
        ScenarioKind::of_project(self.is_regional)
    }

    pub fn access(&self) -> ProjectAccess {
        ProjectAccess {
            project_id: self.scenario.project_id,
            owner_id: self.project_user_id,
            is_public: self.project_is_public,
            is_regional: self.is_regional,
        }
    }
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Body of `POST /scenarios/{id}`: the new child scenario.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateScenario {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub functional_zone_type_id: Option<DbId>,
    pub properties: Option<serde_json::Value>,
}

/// Body of `PUT /scenarios/{id}`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PutScenario {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub is_based: bool,
    pub functional_zone_type_id: Option<DbId>,
    pub properties: serde_json::Value,
}

/// Body of `PATCH /scenarios/{id}`. All fields optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PatchScenario {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub is_based: Option<bool>,
    pub functional_zone_type_id: Option<DbId>,
    pub properties: Option<serde_json::Value>,
}

impl From<PutScenario> for PatchScenario {
    fn from(put: PutScenario) -> Self {
        Self {
            name: Some(put.name),
            is_based: Some(put.is_based),
            functional_zone_type_id: put.functional_zone_type_id,
            properties: Some(put.properties),
        }
    }
}
