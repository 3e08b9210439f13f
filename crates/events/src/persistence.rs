//! Durable event persistence service.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and writes every received [`PlatformEvent`] to the `events` table. It runs
//! as a long-lived background task and stops when the bus is dropped.

use tokio::sync::broadcast;
use urban_db::models::event::NewEvent;
use urban_db::repositories::EventRepo;
use urban_db::DbPool;

use crate::bus::PlatformEvent;

/// Background service that persists platform events to the database.
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop until the channel closes.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => match Self::persist(&pool, &event).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!(event_id = %event.event_id, "Duplicate event ignored");
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            event_id = %event.event_id,
                            event_type = %event.event_type,
                            "Failed to persist event"
                        );
                    }
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Event persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Write one event. Returns `false` when `event_id` was already stored.
    pub async fn persist(pool: &DbPool, event: &PlatformEvent) -> Result<bool, sqlx::Error> {
        EventRepo::insert(
            pool,
            &NewEvent {
                event_id: event.event_id,
                event_type: &event.event_type,
                project_id: event.project_id,
                scenario_id: event.scenario_id,
                actor_user_id: event.actor_user_id,
                payload: &event.payload,
            },
        )
        .await
    }
}
