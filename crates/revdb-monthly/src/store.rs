//! Postgres-backed [`ReportStore`] and [`LocationDirectory`].

use async_trait::async_trait;
use revdb_core::{LocationConfig, MonthPeriod};
use revdb_db::DbError;
use sqlx::PgPool;

use crate::{LocationDirectory, ReportStore, StoredReport};

/// Wraps a pool; cheap to clone.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for PgStore {
    async fn find_report(
        &self,
        client_id: i64,
        period: &MonthPeriod,
    ) -> Result<Option<StoredReport>, DbError> {
        let row = revdb_db::get_report_by_client_and_period(
            &self.pool,
            client_id,
            period.start_date(),
            period.end_date(),
        )
        .await?;
        Ok(row.map(|r| StoredReport {
            report_id: r.report_id,
            generated_at: r.generated_at,
        }))
    }

    async fn delete_report(&self, report_id: i64) -> Result<(), DbError> {
        revdb_db::delete_report(&self.pool, report_id).await
    }

    async fn save_report(
        &self,
        client_id: i64,
        period: &MonthPeriod,
        locations: &serde_json::Value,
    ) -> Result<i64, DbError> {
        revdb_db::save_report(
            &self.pool,
            client_id,
            period.start_date(),
            period.end_date(),
            locations,
        )
        .await
    }
}

#[async_trait]
impl LocationDirectory for PgStore {
    async fn find_location_config(
        &self,
        location_name: &str,
        postal_code: &str,
    ) -> Result<Option<LocationConfig>, DbError> {
        revdb_db::find_location_config(&self.pool, location_name, postal_code).await
    }
}
