//! PostgreSQL/PostGIS persistence for the urban scenario platform.
//!
//! Geometry columns never cross the sqlx boundary as PostGIS values: reads
//! select `ST_AsGeoJSON(geometry)::jsonb` and writes bind GeoJSON text into
//! `ST_GeomFromGeoJSON`.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

/// SQL fragment turning a bound GeoJSON text parameter into a 4326 geometry.
pub(crate) fn geom_from_geojson(param: usize) -> String {
    format!("ST_SetSRID(ST_GeomFromGeoJSON(${param}::text), 4326)")
}
