//! Database operations for `client_reports`, one row per (client, month).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `client_reports` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClientReportRow {
    pub report_id: i64,
    pub client_id: i64,
    pub report_period_start: NaiveDate,
    /// Exclusive: the first day of the following month.
    pub report_period_end: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub locations: serde_json::Value,
}

/// Returns the stored report for a client and period, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn get_report_by_client_and_period(
    pool: &PgPool,
    client_id: i64,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<Option<ClientReportRow>, DbError> {
    let row = sqlx::query_as::<_, ClientReportRow>(
        "SELECT report_id, client_id, report_period_start, report_period_end, \
                generated_at, locations \
         FROM client_reports \
         WHERE client_id = $1 \
           AND report_period_start = $2 \
           AND report_period_end = $3",
    )
    .bind(client_id)
    .bind(period_start)
    .bind(period_end)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Deletes a report by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row had that id, or [`DbError::Sqlx`]
/// on query failure.
pub async fn delete_report(pool: &PgPool, report_id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM client_reports WHERE report_id = $1")
        .bind(report_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Inserts a report and returns its id.
///
/// `locations` must be a JSON array of per-location reports.
///
/// # Errors
///
/// Returns [`DbError::DuplicateReport`] when a report for the same client and
/// period already exists, or [`DbError::Sqlx`] on other failures.
pub async fn save_report(
    pool: &PgPool,
    client_id: i64,
    period_start: NaiveDate,
    period_end: NaiveDate,
    locations: &serde_json::Value,
) -> Result<i64, DbError> {
    let report_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO client_reports \
             (client_id, report_period_start, report_period_end, generated_at, locations) \
         VALUES ($1, $2, $3, NOW(), $4) \
         ON CONFLICT (client_id, report_period_start, report_period_end) DO NOTHING \
         RETURNING report_id",
    )
    .bind(client_id)
    .bind(period_start)
    .bind(period_end)
    .bind(locations)
    .fetch_optional(pool)
    .await?;

    report_id.ok_or(DbError::DuplicateReport {
        client_id,
        period_start,
    })
}
