//! Existence checks against the reference dictionaries.

use sqlx::PgExecutor;
use urban_core::types::DbId;

/// Dictionaries referenced by scenario payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceTable {
    Territory,
    PhysicalObjectType,
    ServiceType,
    BufferType,
    FunctionalZoneType,
    Indicator,
}

impl ReferenceTable {
    fn table(self) -> &'static str {
        match self {
            ReferenceTable::Territory => "territories",
            ReferenceTable::PhysicalObjectType => "physical_object_types",
            ReferenceTable::ServiceType => "service_types",
            ReferenceTable::BufferType => "buffer_types",
            ReferenceTable::FunctionalZoneType => "functional_zone_types",
            ReferenceTable::Indicator => "indicators",
        }
    }

    /// Entity name used in not-found errors.
    pub fn entity(self) -> &'static str {
        match self {
            ReferenceTable::Territory => "territory",
            ReferenceTable::PhysicalObjectType => "physical object type",
            ReferenceTable::ServiceType => "service type",
            ReferenceTable::BufferType => "buffer type",
            ReferenceTable::FunctionalZoneType => "functional zone type",
            ReferenceTable::Indicator => "indicator",
        }
    }
}

pub struct ReferenceRepo;

impl ReferenceRepo {
    /// Check whether a dictionary row with the given id exists.
    pub async fn exists(
        db: impl PgExecutor<'_>,
        table: ReferenceTable,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let query = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", table.table());
        sqlx::query_scalar(&query).bind(id).fetch_one(db).await
    }
}
