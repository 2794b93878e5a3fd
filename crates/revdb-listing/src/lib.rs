//! Business listing API access and review normalization.
//!
//! [`BusinessProfileClient`] talks to the remote APIs; [`fetch_reviews`] and
//! [`fetch_reviews_for_month`] page through reviews for a location and
//! convert each raw record into a canonical [`Review`].

pub mod client;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod types;

use async_trait::async_trait;

pub use client::{BusinessProfileClient, ListingEndpoints, MAX_PAGES};
pub use error::ListingError;
pub use fetch::{
    fetch_reviews, fetch_reviews_for_month, fetch_reviews_for_month_at, fetch_reviews_since,
    lookback_days, MonthReviews, MAX_LOOKBACK_DAYS,
};
pub use normalize::{extract_rating, extract_text, normalize_review};
pub use types::{Location, LocationPage, RawReview, Review, ReviewPage};

/// The paged listing operations the review pipeline depends on.
#[async_trait]
pub trait ListingApi: Send + Sync {
    /// Account resource names visible to the current credentials.
    async fn list_accounts(&self) -> Result<Vec<String>, ListingError>;

    /// Every location under `account` that has a postal code.
    async fn list_locations(&self, account: &str) -> Result<Vec<Location>, ListingError>;

    /// One page of raw reviews, newest first.
    async fn list_reviews(
        &self,
        location_path: &str,
        page_token: Option<&str>,
    ) -> Result<ReviewPage, ListingError>;
}
