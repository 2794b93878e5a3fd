//! Paged review fetch with a time cutoff, and the month-scoped variant used
//! by the monthly pipeline.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use revdb_core::MonthPeriod;

use crate::error::ListingError;
use crate::normalize::normalize_review;
use crate::types::{Location, Review};
use crate::{ListingApi, MAX_PAGES};

/// Longest lookback a month-scoped fetch will request.
pub const MAX_LOOKBACK_DAYS: i64 = 365 * 2;

/// Reviews for one location and month, with the period instants that were
/// used for filtering.
#[derive(Debug, Clone)]
pub struct MonthReviews {
    pub reviews: Vec<Review>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

/// Fetches reviews for `location` updated within the last `since_days` days.
///
/// # Errors
///
/// See [`fetch_reviews_since`].
pub async fn fetch_reviews<A>(
    api: &A,
    location: &Location,
    since_days: u32,
) -> Result<Vec<Review>, ListingError>
where
    A: ListingApi + ?Sized,
{
    let cutoff = Utc::now() - Duration::days(i64::from(since_days));
    fetch_reviews_since(api, location, cutoff).await
}

/// Fetches reviews newer than `cutoff`, following page tokens.
///
/// Pages are assumed to be ordered newest first. The first review whose
/// check time (`updateTime`, else `createTime`) is older than `cutoff` ends
/// the scan: no later review on that page is kept and no further page is
/// requested. Reviews whose check time cannot be parsed are skipped.
///
/// # Errors
///
/// Propagates the first page error unchanged; reviews gathered from earlier
/// pages are discarded. Returns [`ListingError::PaginationLimit`] after
/// [`MAX_PAGES`] pages.
pub async fn fetch_reviews_since<A>(
    api: &A,
    location: &Location,
    cutoff: DateTime<Utc>,
) -> Result<Vec<Review>, ListingError>
where
    A: ListingApi + ?Sized,
{
    let mut reviews = Vec::new();
    let mut token: Option<String> = None;
    let mut page_count = 0usize;

    'pages: loop {
        page_count += 1;
        if page_count > MAX_PAGES {
            return Err(ListingError::PaginationLimit {
                resource: format!("{}/reviews", location.path),
                max_pages: MAX_PAGES,
            });
        }

        let page = api.list_reviews(&location.path, token.as_deref()).await?;

        for raw in &page.reviews {
            let Some(check_time) = raw.check_time() else {
                tracing::warn!(
                    location = %location.name,
                    check_time = ?raw.check_time_raw(),
                    "skipping review with unparseable timestamp"
                );
                continue;
            };

            if check_time < cutoff {
                break 'pages;
            }

            reviews.push(normalize_review(raw));
        }

        token = page.next_page_token;
        if token.is_none() {
            break;
        }
    }

    Ok(reviews)
}

/// Fetches the reviews created within `period`, measured in `tz`.
///
/// The lookback window runs from now back to the period start. A period that
/// starts in the future yields no reviews without any request; a period more
/// than [`MAX_LOOKBACK_DAYS`] in the past is searched only that far back.
///
/// # Errors
///
/// See [`fetch_reviews_since`].
pub async fn fetch_reviews_for_month<A>(
    api: &A,
    location: &Location,
    period: &MonthPeriod,
    tz: Tz,
) -> Result<MonthReviews, ListingError>
where
    A: ListingApi + ?Sized,
{
    fetch_reviews_for_month_at(api, location, period, tz, Utc::now()).await
}

/// [`fetch_reviews_for_month`] with an explicit "now".
///
/// # Errors
///
/// See [`fetch_reviews_since`].
pub async fn fetch_reviews_for_month_at<A>(
    api: &A,
    location: &Location,
    period: &MonthPeriod,
    tz: Tz,
    now: DateTime<Utc>,
) -> Result<MonthReviews, ListingError>
where
    A: ListingApi + ?Sized,
{
    let (period_start, period_end) = period.bounds_in(tz);

    let Some(days) = lookback_days(now, period_start) else {
        tracing::warn!(
            location = %location.name,
            month = %period,
            "target month is in the future"
        );
        return Ok(MonthReviews {
            reviews: Vec::new(),
            period_start,
            period_end,
        });
    };

    let cutoff = now - Duration::days(days);
    let fetched = fetch_reviews_since(api, location, cutoff).await?;
    let fetched_count = fetched.len();

    let reviews: Vec<Review> = fetched
        .into_iter()
        .filter(|review| {
            review
                .date
                .is_some_and(|created| created >= period_start && created < period_end)
        })
        .collect();

    tracing::info!(
        location = %location.name,
        month = %period,
        fetched = fetched_count,
        kept = reviews.len(),
        "reviews filtered to month"
    );

    Ok(MonthReviews {
        reviews,
        period_start,
        period_end,
    })
}

/// Whole days from `period_start` to `now`, plus one, capped at
/// [`MAX_LOOKBACK_DAYS`]. `None` when `period_start` is in the future.
#[must_use]
pub fn lookback_days(now: DateTime<Utc>, period_start: DateTime<Utc>) -> Option<i64> {
    if period_start > now {
        return None;
    }
    let days = (now - period_start).num_days() + 1;
    Some(days.min(MAX_LOOKBACK_DAYS))
}
