//! Grouping of canonical reviews into one analysis input per location and month.

use revdb_core::{Client, MonthPeriod};
use revdb_listing::{Location, Review};

use crate::types::ReportPeriod;

/// All reviews for one location and month, with the identity the prompt and
/// metadata need.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewBatch {
    /// Every review, including those without text.
    pub reviews: Vec<Review>,
    pub location_name: String,
    pub location_id: String,
    pub business_name: String,
    pub client_id: i64,
    pub postal_code: String,
    pub report_period: ReportPeriod,
}

impl ReviewBatch {
    /// Ratings of every review, used for all aggregate statistics.
    #[must_use]
    pub fn ratings(&self) -> Vec<u8> {
        self.reviews.iter().map(|r| r.rating).collect()
    }

    /// Reviews that carry text, the only ones shown to the model.
    #[must_use]
    pub fn text_reviews(&self) -> Vec<&Review> {
        self.reviews.iter().filter(|r| r.has_text()).collect()
    }
}

/// Builds the batch for `location` and `period`. Pure; keeps every review.
///
/// A blank location name is replaced with `Location <last path segment>`.
/// The displayed end date is the last day of the month.
#[must_use]
pub fn prepare_batch(
    reviews: Vec<Review>,
    location: &Location,
    client: &Client,
    period: &MonthPeriod,
) -> ReviewBatch {
    let location_name = if location.name.trim().is_empty() {
        tracing::warn!(
            location_id = %location.path,
            "location has no name; using path suffix"
        );
        format!("Location {}", location.path_suffix())
    } else {
        location.name.clone()
    };

    let with_text = reviews.iter().filter(|r| r.has_text()).count();
    tracing::debug!(
        location = %location_name,
        total = reviews.len(),
        with_text,
        "review batch prepared"
    );

    ReviewBatch {
        reviews,
        location_name,
        location_id: location.path.clone(),
        business_name: client.name.clone(),
        client_id: client.id,
        postal_code: location.postal_code.clone(),
        report_period: ReportPeriod {
            start_date: period.start_date().format("%Y-%m-%d").to_string(),
            end_date: period.display_end().format("%Y-%m-%d").to_string(),
        },
    }
}
