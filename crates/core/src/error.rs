use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Entity not found: {entity} with {params}")]
    NotFoundByParams { entity: &'static str, params: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{entity} cannot be accessed in a REGIONAL scenario. Pass the identifier of a PROJECT scenario.")]
    NotAllowedInRegionalScenario { entity: &'static str },

    #[error("{entity} cannot be accessed in a PROJECT scenario. Pass the identifier of a REGIONAL scenario.")]
    NotAllowedInProjectScenario { entity: &'static str },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for the "already edited or deleted" override conflict.
    pub fn already_edited(entity: &str, id: DbId) -> Self {
        CoreError::Conflict(format!(
            "{entity} with id {id} has already been edited or deleted for the scenario"
        ))
    }
}
