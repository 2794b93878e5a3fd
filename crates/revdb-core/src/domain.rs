//! Tenant and location records shared by the database, listing and
//! orchestration crates. All of these are owned by the persistence store and
//! only read by the monthly pipeline.

use serde::{Deserialize, Serialize};

/// A tenant whose locations are analysed each month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub enabled: bool,
    pub monthly_analysis_enabled: bool,
    /// Where the monthly PDF goes. `None` suppresses delivery, not generation.
    pub report_email: Option<String>,
}

impl Client {
    /// Returns the notification address when one is configured and non-blank.
    #[must_use]
    pub fn notification_email(&self) -> Option<&str> {
        self.report_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

/// Persisted per-location settings, keyed by the listing title and postal code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub client_id: i64,
    pub location_name: String,
    pub postal_code: String,
    /// IANA zone name. Unknown or missing values fall back to the configured default.
    pub time_zone: Option<String>,
    pub report_enabled: bool,
    pub monthly_analysis_enabled: bool,
}
