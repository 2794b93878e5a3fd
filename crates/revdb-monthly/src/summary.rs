//! Run-level accounting.

use std::fmt::Write as _;
use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedClientInfo {
    pub client_id: i64,
    pub client_name: String,
    pub error: String,
}

/// Totals for one monthly run across every client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingSummary {
    /// `YYYY-MM`.
    pub target_month: String,
    pub clients_processed: usize,
    pub clients_succeeded: usize,
    pub clients_failed: usize,
    pub clients_skipped: usize,
    pub total_locations: usize,
    /// Every review fetched, with or without text.
    pub total_reviews: usize,
    /// Reviews in batches the analyzer actually ran on.
    pub total_reviews_analyzed: usize,
    pub pdfs_generated: usize,
    pub emails_sent: usize,
    pub elapsed: Duration,
    pub failed_clients: Vec<FailedClientInfo>,
}

impl ProcessingSummary {
    #[must_use]
    pub fn new(target_month: impl Into<String>) -> Self {
        Self {
            target_month: target_month.into(),
            ..Self::default()
        }
    }

    pub fn record_failure(&mut self, client_id: i64, client_name: &str, error: String) {
        self.clients_failed += 1;
        self.failed_clients.push(FailedClientInfo {
            client_id,
            client_name: client_name.to_owned(),
            error,
        });
    }

    /// Plain-text body for the optional run summary email.
    #[must_use]
    pub fn email_body(&self) -> String {
        let mut body = format!(
            "Monthly Review Analysis Summary for {month}\n\n\
             Processing Results:\n\
             - Clients processed: {processed}\n\
             - Clients succeeded: {succeeded}\n\
             - Clients failed: {failed}\n\
             - Clients skipped: {skipped}\n\
             - Total locations: {locations}\n\
             - Total reviews: {reviews}\n\
             - Total reviews analyzed: {analyzed}\n\
             - PDFs generated: {pdfs}\n\
             - Emails sent: {emails}\n\
             - Processing time: {elapsed:.1?}\n",
            month = self.target_month,
            processed = self.clients_processed,
            succeeded = self.clients_succeeded,
            failed = self.clients_failed,
            skipped = self.clients_skipped,
            locations = self.total_locations,
            reviews = self.total_reviews,
            analyzed = self.total_reviews_analyzed,
            pdfs = self.pdfs_generated,
            emails = self.emails_sent,
            elapsed = self.elapsed,
        );

        if !self.failed_clients.is_empty() {
            body.push_str("\nFailed Clients:\n");
            for failed in &self.failed_clients {
                let _ = writeln!(
                    body,
                    "- Client {} ({}): {}",
                    failed.client_id, failed.client_name, failed.error
                );
            }
        }
        body
    }

    #[must_use]
    pub fn email_subject(&self) -> String {
        format!("Monthly Review Analysis Summary - {}", self.target_month)
    }
}
