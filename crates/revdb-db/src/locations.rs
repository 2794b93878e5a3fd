//! Per-location configuration lookups used to establish location ownership.

use revdb_core::LocationConfig;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `location_configs` table joined to its client.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LocationConfigRow {
    pub client_id: i64,
    pub location_name: String,
    pub postal_code: String,
    pub time_zone: Option<String>,
    pub report_enabled: bool,
    pub monthly_analysis_enabled: bool,
}

impl From<LocationConfigRow> for LocationConfig {
    fn from(row: LocationConfigRow) -> Self {
        Self {
            client_id: row.client_id,
            location_name: row.location_name,
            postal_code: row.postal_code,
            time_zone: row.time_zone,
            report_enabled: row.report_enabled,
            monthly_analysis_enabled: row.monthly_analysis_enabled,
        }
    }
}

/// Finds the analysis-enabled config for a listing title and postal code.
///
/// The name comparison ignores surrounding whitespace and the postal code
/// comparison ignores spaces anywhere (`SW1A 1AA` matches `SW1A1AA`). Only
/// enabled configs belonging to enabled clients are considered.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn find_location_config(
    pool: &PgPool,
    location_name: &str,
    postal_code: &str,
) -> Result<Option<LocationConfig>, DbError> {
    let row = sqlx::query_as::<_, LocationConfigRow>(
        "SELECT lc.client_id, lc.location_name, lc.postal_code, lc.time_zone, \
                lc.report_enabled, lc.monthly_analysis_enabled \
         FROM location_configs lc \
         JOIN clients c ON c.id = lc.client_id \
         WHERE lc.enabled = TRUE \
           AND c.enabled = TRUE \
           AND lc.monthly_analysis_enabled = TRUE \
           AND TRIM(lc.location_name) = TRIM($1) \
           AND REPLACE(lc.postal_code, ' ', '') = REPLACE($2, ' ', '') \
         ORDER BY lc.id \
         LIMIT 1",
    )
    .bind(location_name)
    .bind(postal_code)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(LocationConfig::from))
}
