//! Project entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use urban_core::types::{DbId, Timestamp};
use validator::Validate;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub territory_id: DbId,
    pub is_public: bool,
    pub is_regional: bool,
    pub is_city: bool,
    pub properties: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    /// Territory ids listed under `properties.context`.
    pub fn context_territory_ids(&self) -> Vec<DbId> {
        self.properties
            .get("context")
            .and_then(|v| v.as_array())
            .map(|ids| ids.iter().filter_map(|id| id.as_i64()).collect())
            .unwrap_or_default()
    }
}

/// A row from `project_territories`, geometry as GeoJSON.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectTerritory {
    pub project_id: DbId,
    pub geometry: serde_json::Value,
    pub centre_point: serde_json::Value,
    pub updated_at: Timestamp,
}

/// DTO for creating a project together with its base scenario.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProject {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    pub territory_id: DbId,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_regional: bool,
    #[serde(default)]
    pub is_city: bool,
    pub properties: Option<serde_json::Value>,
    /// GeoJSON polygon. Required unless the project is regional.
    pub territory: Option<serde_json::Value>,
}

/// DTO for replacing a project's territory geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProjectTerritory {
    pub geometry: serde_json::Value,
}

/// Project with its territory, as returned by `GET /projects/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithTerritory {
    #[serde(flatten)]
    pub project: Project,
    pub territory: Option<ProjectTerritory>,
}

/// Context territories of a project and their union.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectContextResponse {
    pub territories: Vec<DbId>,
    pub geometry: Option<serde_json::Value>,
}

/// A regional project that can serve as the parent of a new project.
#[derive(Debug, Clone, FromRow)]
pub struct RegionalBase {
    pub project_id: DbId,
    pub territory_id: DbId,
    pub scenario_id: DbId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project(properties: serde_json::Value) -> Project {
        Project {
            id: 1,
            user_id: 1,
            name: "p".into(),
            description: None,
            territory_id: 1,
            is_public: false,
            is_regional: false,
            is_city: false,
            properties,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn context_ids_are_read_from_properties() {
        assert_eq!(project(json!({"context": [3, 4, "x"]})).context_territory_ids(), vec![3, 4]);
        assert!(project(json!({})).context_territory_ids().is_empty());
    }

    #[test]
    fn create_project_name_is_validated() {
        let dto: CreateProject = serde_json::from_value(json!({
            "name": "",
            "territory_id": 1
        }))
        .unwrap();
        assert!(dto.validate().is_err());
        assert!(!dto.is_regional);
    }
}
