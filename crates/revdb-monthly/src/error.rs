use revdb_db::DbError;
use revdb_listing::ListingError;
use thiserror::Error;

/// Why a single client failed its monthly run. Each variant isolates one
/// client; the run moves on to the next.
#[derive(Debug, Error)]
pub enum MonthlyError {
    #[error("failed to check for existing report: {0}")]
    ReportLookup(#[source] DbError),

    #[error("failed to delete existing report {report_id}: {source}")]
    ReportDelete {
        report_id: i64,
        #[source]
        source: DbError,
    },

    #[error("failed to list accounts: {0}")]
    Accounts(#[source] ListingError),

    #[error("no accounts found")]
    NoAccounts,

    #[error("no locations found for client {client_id}")]
    NoOwnedLocations { client_id: i64 },

    #[error("no reviews found for any location")]
    NoReviews,

    #[error("failed to encode report: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to save report: {0}")]
    ReportSave(#[source] DbError),
}

/// PDF rendering and email delivery failures. Never fatal to a client.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {service}: {body}")]
    UnexpectedStatus {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("PDF content too small: {0} bytes")]
    PdfTooSmall(usize),

    #[error("{0} cannot be empty")]
    EmptyInput(&'static str),
}
