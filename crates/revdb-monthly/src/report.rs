//! Persisted per-location report entries and the per-client report used for
//! rendering.

use chrono::Utc;
use revdb_analysis::{Analysis, AnalysisMetadata, AnalysisResult, ReviewBatch};
use revdb_core::{Client, MonthPeriod};
use serde::{Deserialize, Serialize};

/// One location's entry in the stored report document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationReport {
    #[serde(rename = "locationID")]
    pub location_id: String,
    #[serde(rename = "locationName")]
    pub location_name: String,
    /// Postal code.
    #[serde(rename = "locationAddress")]
    pub location_address: String,
    #[serde(rename = "reviewCount")]
    pub review_count: u32,
    pub analysis: Analysis,
    pub metadata: AnalysisMetadata,
}

impl LocationReport {
    /// Entry for an analysed batch. A blank analysed location name is
    /// replaced with the batch's.
    #[must_use]
    pub fn analysed(batch: &ReviewBatch, mut result: AnalysisResult) -> Self {
        if result.metadata.location_name.trim().is_empty() {
            result.metadata.location_name.clone_from(&batch.location_name);
        }
        Self {
            location_id: batch.location_id.clone(),
            location_name: batch.location_name.clone(),
            location_address: batch.postal_code.clone(),
            review_count: u32::try_from(batch.reviews.len()).unwrap_or(u32::MAX),
            analysis: result.analysis,
            metadata: result.metadata,
        }
    }

    /// Entry for a location with no reviews in the month: zero counts and
    /// identity metadata only.
    #[must_use]
    pub fn empty(batch: &ReviewBatch) -> Self {
        Self {
            location_id: batch.location_id.clone(),
            location_name: batch.location_name.clone(),
            location_address: batch.postal_code.clone(),
            review_count: 0,
            analysis: Analysis::default(),
            metadata: AnalysisMetadata {
                generated_at: Utc::now(),
                location_id: batch.location_id.clone(),
                location_name: batch.location_name.clone(),
                business_name: batch.business_name.clone(),
                report_period: batch.report_period.clone(),
                client_id: batch.client_id,
                ..AnalysisMetadata::default()
            },
        }
    }
}

/// Everything needed to render one client's monthly report.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientReport {
    pub client: Client,
    pub period: MonthPeriod,
    pub locations: Vec<LocationReport>,
}
