//! Conversion of raw listing payloads into canonical records.
//!
//! Star ratings have been observed in four encodings:
//!
//! ```text
//! "starRating": "FOUR"
//! "starRating": { "count": 4 }
//! "starRating": { "name": "starRatings/FOUR" }
//! "starRating": { "value": 4 }  or  { "enum": "STAR_RATING_FOUR" }
//! ```
//!
//! Each encoding has its own extractor; they are tried in order and the first
//! non-zero rating wins. A review whose rating cannot be recovered is still
//! kept, with a rating of 0.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::{Location, RawReview, Review};

type RatingExtractor = fn(&Value) -> Option<u8>;

const RATING_EXTRACTORS: [(&str, RatingExtractor); 4] = [
    ("flat_enum", rating_from_flat_enum),
    ("nested_count", rating_from_nested_count),
    ("nested_name", rating_from_nested_name),
    ("nested_value", rating_from_nested_value),
];

/// Maps a star-rating enum string onto 0..=5.
///
/// Accepts both bare (`FOUR`) and prefixed (`STAR_RATING_FOUR`) forms.
/// `STAR_RATING_UNSPECIFIED` maps to `Some(0)`; unknown strings to `None`.
#[must_use]
pub fn star_enum_value(raw: &str) -> Option<u8> {
    let trimmed = raw.trim();
    if trimmed == "STAR_RATING_UNSPECIFIED" {
        return Some(0);
    }
    match trimmed.strip_prefix("STAR_RATING_").unwrap_or(trimmed) {
        "ONE" => Some(1),
        "TWO" => Some(2),
        "THREE" => Some(3),
        "FOUR" => Some(4),
        "FIVE" => Some(5),
        _ => None,
    }
}

fn rating_from_flat_enum(star: &Value) -> Option<u8> {
    star.as_str().and_then(star_enum_value)
}

fn rating_from_nested_count(star: &Value) -> Option<u8> {
    star.get("count").and_then(numeric_rating)
}

fn rating_from_nested_name(star: &Value) -> Option<u8> {
    let name = star.get("name")?.as_str()?;
    let last = name.rsplit('/').next()?;
    star_enum_value(last)
}

fn rating_from_nested_value(star: &Value) -> Option<u8> {
    star.get("value")
        .and_then(numeric_rating)
        .filter(|r| *r > 0)
        .or_else(|| star.get("enum")?.as_str().and_then(star_enum_value))
}

// Whole numbers in 0..=5 only; a fractional count falls through to the next extractor.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn numeric_rating(value: &Value) -> Option<u8> {
    let n = value.as_f64()?;
    if (0.0..=5.0).contains(&n) && n.fract() == 0.0 {
        Some(n as u8)
    } else {
        None
    }
}

/// Extracts the star rating from a raw review, or 0 if no encoding matched.
#[must_use]
pub fn extract_rating(raw: &Value) -> u8 {
    let Some(star) = raw.get("starRating") else {
        return 0;
    };
    RATING_EXTRACTORS
        .iter()
        .find_map(|(encoding, extract)| {
            let rating = extract(star).filter(|r| *r > 0)?;
            tracing::trace!(encoding = *encoding, rating, "star rating decoded");
            Some(rating)
        })
        .unwrap_or(0)
}

/// Extracts the review text: `comment.text`, else a bare string `comment`,
/// else an empty string.
#[must_use]
pub fn extract_text(raw: &Value) -> String {
    match raw.get("comment") {
        Some(Value::Object(comment)) => comment
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Some(Value::String(text)) => text.clone(),
        _ => String::new(),
    }
}

/// Parses an RFC 3339 timestamp field.
#[must_use]
pub fn parse_timestamp(raw: &Value, field: &str) -> Option<DateTime<Utc>> {
    let text = raw.get(field)?.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl RawReview {
    #[must_use]
    pub fn create_time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.0, "createTime")
    }

    /// The raw timestamp string used for the paging cutoff: `updateTime`
    /// when present, else `createTime`.
    #[must_use]
    pub fn check_time_raw(&self) -> Option<&str> {
        self.0
            .get("updateTime")
            .or_else(|| self.0.get("createTime"))
            .and_then(Value::as_str)
    }

    /// The paging cutoff instant, see [`Self::check_time_raw`].
    #[must_use]
    pub fn check_time(&self) -> Option<DateTime<Utc>> {
        let text = self.check_time_raw()?;
        DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Converts a raw review into its canonical form. Never fails.
#[must_use]
pub fn normalize_review(raw: &RawReview) -> Review {
    let doc = &raw.0;
    let id = doc
        .get("name")
        .or_else(|| doc.get("reviewId"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Review {
        id,
        text: extract_text(doc),
        rating: extract_rating(doc),
        date: raw.create_time(),
    }
}

/// Returns the records under `key`, treating a single object as a
/// one-element array.
#[must_use]
pub fn records<'a>(doc: &'a Value, key: &str) -> Vec<&'a Value> {
    match doc.get(key) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(obj @ Value::Object(_)) => vec![obj],
        _ => Vec::new(),
    }
}

/// Reads the `nextPageToken` field, treating blank tokens as absent.
#[must_use]
pub fn next_page_token(doc: &Value) -> Option<String> {
    doc.get("nextPageToken")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Converts a raw location record listed under `account`.
///
/// Returns `None` when the record has no resource name or no postal code;
/// such locations cannot be matched to a configuration.
#[must_use]
pub fn normalize_location(account: &str, rec: &Value) -> Option<Location> {
    let name = rec.get("name").and_then(Value::as_str)?.trim();
    if name.is_empty() {
        return None;
    }

    let postal_code = rec
        .get("storefrontAddress")
        .and_then(|a| a.get("postalCode"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|p| !p.is_empty())?
        .to_string();

    let path = format!("{}/{}", account.trim_end_matches('/'), name);
    let title = rec
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != "null");
    let display_name = title.map_or_else(
        || format!("Location {}", name.rsplit('/').next().unwrap_or(name)),
        str::to_string,
    );

    Some(Location {
        path,
        name: display_name,
        postal_code,
        client_id: None,
        time_zone: None,
    })
}
