//! Event log model.

use serde::Serialize;
use sqlx::FromRow;
use urban_core::types::{DbId, Timestamp};
use uuid::Uuid;

/// A row from the `events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub event_id: Uuid,
    pub event_type: String,
    pub project_id: Option<DbId>,
    pub scenario_id: Option<DbId>,
    pub actor_user_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}

/// Insert payload for the `events` table.
#[derive(Debug, Clone)]
pub struct NewEvent<'a> {
    pub event_id: Uuid,
    pub event_type: &'a str,
    pub project_id: Option<DbId>,
    pub scenario_id: Option<DbId>,
    pub actor_user_id: Option<DbId>,
    pub payload: &'a serde_json::Value,
}
