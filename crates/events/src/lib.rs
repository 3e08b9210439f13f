//! Urban platform event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the event envelope, carrying a UUID `event_id` so
//!   downstream consumers can deduplicate at-least-once deliveries.
//! - [`DomainEvent`]: the typed project and scenario events handlers emit.
//! - [`EventPersistence`]: background service writing every event to the
//!   `events` table.

pub mod bus;
pub mod domain;
pub mod persistence;

pub use bus::{EventBus, PlatformEvent};
pub use domain::DomainEvent;
pub use persistence::EventPersistence;
