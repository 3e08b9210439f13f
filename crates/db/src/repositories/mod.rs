//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Single
//! statements accept any `PgExecutor` so they run against the pool or inside
//! a transaction; multi-statement helpers take the caller's transaction.

pub mod buffer_repo;
pub mod event_repo;
pub mod functional_zone_repo;
pub mod geometry_repo;
pub mod indicator_repo;
pub mod physical_object_repo;
pub mod project_repo;
pub mod reference_repo;
pub mod scenario_copy_repo;
pub mod scenario_repo;
pub mod service_repo;
pub mod territory_repo;
pub mod urban_object_repo;

pub use buffer_repo::BufferRepo;
pub use event_repo::EventRepo;
pub use functional_zone_repo::FunctionalZoneRepo;
pub use geometry_repo::GeometryRepo;
pub use indicator_repo::IndicatorRepo;
pub use physical_object_repo::PhysicalObjectRepo;
pub use project_repo::ProjectRepo;
pub use reference_repo::{ReferenceRepo, ReferenceTable};
pub use scenario_copy_repo::{CopyStats, ScenarioCopyRepo};
pub use scenario_repo::ScenarioRepo;
pub use service_repo::ServiceRepo;
pub use territory_repo::TerritoryRepo;
pub use urban_object_repo::UrbanObjectRepo;

/// Shorthand for the transaction type every write path runs in.
pub type Tx<'a> = sqlx::Transaction<'a, sqlx::Postgres>;
