//! Repository for the `events` table.

use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::event::{Event, NewEvent};

/// Column list for `events` queries.
const COLUMNS: &str =
    "id, event_id, event_type, project_id, scenario_id, actor_user_id, payload, created_at";

/// Provides read/write operations for the durable event log.
pub struct EventRepo;

impl EventRepo {
    /// Insert an event. Re-delivering the same `event_id` is a no-op, so
    /// the return value is `false` for duplicates.
    pub async fn insert(db: impl PgExecutor<'_>, event: &NewEvent<'_>) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO events
                (event_id, event_type, project_id, scenario_id, actor_user_id, payload)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (event_id) DO NOTHING",
        )
        .bind(event.event_id)
        .bind(event.event_type)
        .bind(event.project_id)
        .bind(event.scenario_id)
        .bind(event.actor_user_id)
        .bind(event.payload)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_event_id(
        db: impl PgExecutor<'_>,
        event_id: Uuid,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE event_id = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(event_id)
            .fetch_optional(db)
            .await
    }

    /// List recent events ordered newest-first.
    pub async fn list_recent(
        db: impl PgExecutor<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await
    }
}
