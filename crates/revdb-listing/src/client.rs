//! HTTP client for the Business Profile account, location and review APIs.
//!
//! The three APIs live on different hosts, so each has its own base URL.
//! Use [`BusinessProfileClient::new`] for production or
//! [`BusinessProfileClient::with_base_urls`] to point every endpoint at a
//! mock server in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::ListingError;
use crate::normalize::{next_page_token, normalize_location, records};
use crate::types::{Location, LocationPage, RawReview, ReviewPage};
use crate::ListingApi;

/// Hard ceiling on pages followed for a single location listing.
pub const MAX_PAGES: usize = 500;

const LOCATION_READ_MASK: &str = "name,title,storefrontAddress";

/// Endpoint roots for the three listing APIs.
#[derive(Debug, Clone)]
pub struct ListingEndpoints {
    pub accounts_url: String,
    pub locations_url: String,
    pub reviews_url: String,
}

pub struct BusinessProfileClient {
    client: Client,
    access_token: Option<String>,
    accounts_url: Url,
    locations_url: Url,
    reviews_url: Url,
}

impl BusinessProfileClient {
    /// Creates a client for the given endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ListingError::InvalidUrl`] if an endpoint
    /// is not a valid URL.
    pub fn new(
        endpoints: &ListingEndpoints,
        access_token: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, ListingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("revdb/0.1 (monthly-review-analysis)")
            .build()?;

        Ok(Self {
            client,
            access_token: access_token.map(str::to_owned),
            accounts_url: parse_base(&endpoints.accounts_url)?,
            locations_url: parse_base(&endpoints.locations_url)?,
            reviews_url: parse_base(&endpoints.reviews_url)?,
        })
    }

    /// Creates a client with every endpoint rooted at `base_url` (for wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn with_base_urls(
        base_url: &str,
        access_token: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, ListingError> {
        let endpoints = ListingEndpoints {
            accounts_url: base_url.to_owned(),
            locations_url: base_url.to_owned(),
            reviews_url: base_url.to_owned(),
        };
        Self::new(&endpoints, access_token, timeout_secs)
    }

    /// Lists account resource names (`accounts/123`).
    ///
    /// # Errors
    ///
    /// - [`ListingError::Http`] on network failure.
    /// - [`ListingError::UnexpectedStatus`] on a non-2xx response.
    /// - [`ListingError::Deserialize`] if the body is not JSON.
    pub async fn fetch_accounts(&self) -> Result<Vec<String>, ListingError> {
        let url = join(&self.accounts_url, "accounts")?;
        let body = self.request_json(url).await?;

        Ok(records(&body, "accounts")
            .into_iter()
            .filter_map(|rec| rec.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    /// Fetches one page of locations for `account`.
    ///
    /// Locations without a postal code are dropped.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch_accounts`].
    pub async fn fetch_locations_page(
        &self,
        account: &str,
        page_token: Option<&str>,
    ) -> Result<LocationPage, ListingError> {
        let mut url = join(&self.locations_url, &format!("{account}/locations"))?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(token) = page_token {
                pairs.append_pair("pageToken", token);
            }
            pairs.append_pair("readMask", LOCATION_READ_MASK);
        }

        let body = self.request_json(url).await?;
        let locations = records(&body, "locations")
            .into_iter()
            .filter_map(|rec| {
                let location = normalize_location(account, rec);
                if location.is_none() {
                    tracing::debug!(account, record = %rec, "skipping location without name or postal code");
                }
                location
            })
            .collect();

        Ok(LocationPage {
            locations,
            next_page_token: next_page_token(&body),
        })
    }

    /// Fetches every page of locations for `account`.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_locations_page`].
    /// Returns [`ListingError::PaginationLimit`] if the number of pages
    /// exceeds [`MAX_PAGES`].
    pub async fn fetch_all_locations(&self, account: &str) -> Result<Vec<Location>, ListingError> {
        let mut all = Vec::new();
        let mut token: Option<String> = None;
        let mut page_count = 0usize;

        loop {
            page_count += 1;
            if page_count > MAX_PAGES {
                return Err(ListingError::PaginationLimit {
                    resource: format!("{account}/locations"),
                    max_pages: MAX_PAGES,
                });
            }

            let page = self.fetch_locations_page(account, token.as_deref()).await?;
            all.extend(page.locations);

            token = page.next_page_token;
            if token.is_none() {
                break;
            }
        }

        Ok(all)
    }

    /// Fetches one page of raw reviews for a location path.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch_accounts`].
    pub async fn fetch_reviews_page(
        &self,
        location_path: &str,
        page_token: Option<&str>,
    ) -> Result<ReviewPage, ListingError> {
        let mut url = join(&self.reviews_url, &format!("{location_path}/reviews"))?;
        if let Some(token) = page_token.map(str::trim).filter(|t| !t.is_empty()) {
            url.query_pairs_mut().append_pair("pageToken", token);
        }

        let body = self.request_json(url).await?;
        let reviews = records(&body, "reviews")
            .into_iter()
            .cloned()
            .map(RawReview)
            .collect();

        Ok(ReviewPage {
            reviews,
            next_page_token: next_page_token(&body),
        })
    }

    /// Sends a GET request, checks for a 2xx status, and parses the body as JSON.
    async fn request_json(&self, url: Url) -> Result<Value, ListingError> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ListingError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ListingError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl ListingApi for BusinessProfileClient {
    async fn list_accounts(&self) -> Result<Vec<String>, ListingError> {
        self.fetch_accounts().await
    }

    async fn list_locations(&self, account: &str) -> Result<Vec<Location>, ListingError> {
        self.fetch_all_locations(account).await
    }

    async fn list_reviews(
        &self,
        location_path: &str,
        page_token: Option<&str>,
    ) -> Result<ReviewPage, ListingError> {
        self.fetch_reviews_page(location_path, page_token).await
    }
}

/// Parses an endpoint root, normalising it to end with exactly one slash so
/// that relative joins append rather than replace the last path segment.
fn parse_base(raw: &str) -> Result<Url, ListingError> {
    let normalised = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| ListingError::InvalidUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })
}

fn join(base: &Url, path: &str) -> Result<Url, ListingError> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| ListingError::InvalidUrl {
            url: format!("{base}{path}"),
            reason: e.to_string(),
        })
}
