//! Read access to the `clients` table.

use revdb_core::Client;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `clients` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClientRow {
    pub id: i64,
    pub name: String,
    pub enabled: bool,
    pub monthly_analysis_enabled: bool,
    /// Nullable in the schema; `NULL` means no monthly PDF is emailed.
    pub report_email_address: Option<String>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            enabled: row.enabled,
            monthly_analysis_enabled: row.monthly_analysis_enabled,
            report_email: row.report_email_address,
        }
    }
}

/// Returns enabled clients with monthly analysis switched on and at least one
/// enabled location configured for analysis, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_clients_with_monthly_analysis(pool: &PgPool) -> Result<Vec<Client>, DbError> {
    let rows = sqlx::query_as::<_, ClientRow>(
        "SELECT c.id, c.name, c.enabled, c.monthly_analysis_enabled, c.report_email_address \
         FROM clients c \
         WHERE c.enabled = TRUE \
           AND c.monthly_analysis_enabled = TRUE \
           AND EXISTS ( \
               SELECT 1 FROM location_configs lc \
               WHERE lc.client_id = c.id \
                 AND lc.enabled = TRUE \
                 AND lc.monthly_analysis_enabled = TRUE \
           ) \
         ORDER BY c.name, c.id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Client::from).collect())
}
