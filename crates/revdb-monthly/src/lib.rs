//! Monthly per-client review reports.
//!
//! [`MonthlyOrchestrator`] drives one run over a list of clients;
//! [`RetryTracker`] carries failure counts between runs. The storage,
//! rendering and delivery collaborators are traits so the run can be driven
//! entirely in memory.

pub mod delivery;
pub mod error;
pub mod orchestrator;
pub mod render;
pub mod report;
pub mod retry;
pub mod store;
pub mod summary;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use revdb_core::{LocationConfig, MonthPeriod};
use revdb_db::DbError;

pub use delivery::{attachment_filename, HttpPdfRenderer, SendGridMailer, SendGridSettings};
pub use error::{DeliveryError, MonthlyError};
pub use orchestrator::{ClientOutcome, MonthlyOrchestrator};
pub use render::{escape_html, render_report_html};
pub use report::{ClientReport, LocationReport};
pub use retry::{select_retry_clients, RetryEntry, RetrySelection, RetryTracker, RetryTracking};
pub use store::PgStore;
pub use summary::{FailedClientInfo, ProcessingSummary};

/// Identity of a report already saved for a client and period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReport {
    pub report_id: i64,
    pub generated_at: DateTime<Utc>,
}

/// One saved report per client and month.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn find_report(
        &self,
        client_id: i64,
        period: &MonthPeriod,
    ) -> Result<Option<StoredReport>, DbError>;

    async fn delete_report(&self, report_id: i64) -> Result<(), DbError>;

    /// Returns the new report id.
    async fn save_report(
        &self,
        client_id: i64,
        period: &MonthPeriod,
        locations: &serde_json::Value,
    ) -> Result<i64, DbError>;
}

/// Persisted per-location settings, matched by listing title and postal code.
#[async_trait]
pub trait LocationDirectory: Send + Sync {
    async fn find_location_config(
        &self,
        location_name: &str,
        postal_code: &str,
    ) -> Result<Option<LocationConfig>, DbError>;
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, DeliveryError>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends the monthly PDF. `month_label` reads like `March 2025`.
    async fn send_monthly_report(
        &self,
        client_name: &str,
        recipient: &str,
        month_label: &str,
        pdf: &[u8],
    ) -> Result<(), DeliveryError>;

    async fn send_plain_text(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), DeliveryError>;
}
