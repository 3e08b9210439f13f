//! Repository for scenario indicator values.

use sqlx::PgExecutor;
use urban_core::types::DbId;

use crate::models::indicator::{
    CreateScenarioIndicatorValue, IndicatorValueCandidate, IndicatorValueFilter, PutIndicatorValue,
    ScenarioIndicatorValue,
};

const COLUMNS: &str = "id, scenario_id, public_indicator_value_id, indicator_id, territory_id, \
    date_value, value, value_type, information_source, is_deleted";

pub struct IndicatorRepo;

impl IndicatorRepo {
    /// Public values of the project territory plus the scenario's own values.
    ///
    /// A public value is hidden when a scenario value references it or has
    /// the same indicator, territory, date and value type. A scenario value
    /// without a territory counts as the project territory.
    pub async fn candidates(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        territory_id: DbId,
        filter: &IndicatorValueFilter,
    ) -> Result<Vec<IndicatorValueCandidate>, sqlx::Error> {
        sqlx::query_as::<_, IndicatorValueCandidate>(
            "SELECT false AS is_scenario_object, tiv.id, tiv.indicator_id,
                    i.name AS indicator_name, i.measurement_unit, tiv.territory_id,
                    tiv.date_value, tiv.value, tiv.value_type, tiv.information_source,
                    false AS is_deleted
             FROM territory_indicator_values tiv
             JOIN indicators i ON i.id = tiv.indicator_id
             WHERE tiv.territory_id = $2
               AND ($3::bigint IS NULL OR tiv.indicator_id = $3)
               AND NOT EXISTS (
                   SELECT 1 FROM scenario_indicator_values siv
                   WHERE siv.scenario_id = $1
                     AND (siv.public_indicator_value_id = tiv.id
                          OR (siv.indicator_id = tiv.indicator_id
                              AND COALESCE(siv.territory_id, $2) = tiv.territory_id
                              AND siv.date_value = tiv.date_value
                              AND siv.value_type = tiv.value_type)))
             UNION ALL
             SELECT true, siv.id, siv.indicator_id, i.name, i.measurement_unit, siv.territory_id,
                    siv.date_value, siv.value, siv.value_type, siv.information_source, siv.is_deleted
             FROM scenario_indicator_values siv
             JOIN indicators i ON i.id = siv.indicator_id
             WHERE siv.scenario_id = $1
               AND ($3::bigint IS NULL OR siv.indicator_id = $3)
             ORDER BY 2",
        )
        .bind(scenario_id)
        .bind(territory_id)
        .bind(filter.indicator_id)
        .fetch_all(db)
        .await
    }

    pub async fn find_private(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        id: DbId,
    ) -> Result<Option<ScenarioIndicatorValue>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scenario_indicator_values WHERE id = $1 AND scenario_id = $2"
        );
        sqlx::query_as::<_, ScenarioIndicatorValue>(&query)
            .bind(id)
            .bind(scenario_id)
            .fetch_optional(db)
            .await
    }

    /// True when a public value exists for the given territory.
    pub async fn public_exists(
        db: impl PgExecutor<'_>,
        id: DbId,
        territory_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM territory_indicator_values WHERE id = $1 AND territory_id = $2)",
        )
        .bind(id)
        .bind(territory_id)
        .fetch_one(db)
        .await
    }

    /// True when the scenario already has a value shadowing the public one.
    pub async fn is_shadowed(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        public_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM scenario_indicator_values
                WHERE scenario_id = $1 AND public_indicator_value_id = $2)",
        )
        .bind(scenario_id)
        .bind(public_id)
        .fetch_one(db)
        .await
    }

    pub async fn insert_private(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        input: &CreateScenarioIndicatorValue,
    ) -> Result<ScenarioIndicatorValue, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenario_indicator_values
                (scenario_id, indicator_id, territory_id, date_value, value, value_type, information_source)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioIndicatorValue>(&query)
            .bind(scenario_id)
            .bind(input.indicator_id)
            .bind(input.territory_id)
            .bind(input.date_value)
            .bind(input.value)
            .bind(&input.value_type)
            .bind(&input.information_source)
            .fetch_one(db)
            .await
    }

    /// Copy a public value into the scenario as a row that shadows it.
    pub async fn copy_public(
        db: impl PgExecutor<'_>,
        scenario_id: DbId,
        public_id: DbId,
        tombstone: bool,
    ) -> Result<Option<ScenarioIndicatorValue>, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenario_indicator_values
                (scenario_id, public_indicator_value_id, indicator_id, territory_id, date_value,
                 value, value_type, information_source, is_deleted)
             SELECT $1, id, indicator_id, territory_id, date_value, value, value_type,
                    information_source, $3
             FROM territory_indicator_values WHERE id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioIndicatorValue>(&query)
            .bind(scenario_id)
            .bind(public_id)
            .bind(tombstone)
            .fetch_optional(db)
            .await
    }

    pub async fn replace(
        db: impl PgExecutor<'_>,
        id: DbId,
        input: &PutIndicatorValue,
    ) -> Result<Option<ScenarioIndicatorValue>, sqlx::Error> {
        let query = format!(
            "UPDATE scenario_indicator_values SET
                date_value = $2,
                value = $3,
                value_type = $4,
                information_source = $5
             WHERE id = $1 AND NOT is_deleted
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScenarioIndicatorValue>(&query)
            .bind(id)
            .bind(input.date_value)
            .bind(input.value)
            .bind(&input.value_type)
            .bind(&input.information_source)
            .fetch_optional(db)
            .await
    }

    pub async fn delete_private(db: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM scenario_indicator_values WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
