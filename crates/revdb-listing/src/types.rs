use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A review as returned by the listing API, kept as an untyped document
/// because its field encodings are not stable across API versions.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReview(pub serde_json::Value);

/// A normalized review independent of upstream encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    /// Empty when the reviewer left only a star rating.
    pub text: String,
    /// 1 to 5, or 0 when no encoding could be recognised.
    pub rating: u8,
    /// Creation time; `None` when absent or unparseable.
    pub date: Option<DateTime<Utc>>,
}

impl Review {
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// A location listed under an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Full resource path, `accounts/<id>/locations/<id>`.
    pub path: String,
    pub name: String,
    pub postal_code: String,
    /// Owning client, once ownership has been established.
    pub client_id: Option<i64>,
    pub time_zone: Option<String>,
}

impl Location {
    /// Last segment of the resource path.
    #[must_use]
    pub fn path_suffix(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// One page of raw reviews plus the continuation token, if any.
#[derive(Debug, Clone, Default)]
pub struct ReviewPage {
    pub reviews: Vec<RawReview>,
    pub next_page_token: Option<String>,
}

/// One page of listed locations plus the continuation token, if any.
#[derive(Debug, Clone, Default)]
pub struct LocationPage {
    pub locations: Vec<Location>,
    pub next_page_token: Option<String>,
}
