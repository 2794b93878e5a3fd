//! Calendar month arithmetic for report periods.
//!
//! A [`MonthPeriod`] is the half-open interval `[first day, first day of next
//! month)`. Persistence keys use the calendar dates directly; review filtering
//! projects the same dates onto a location's time zone.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, LocalResult, Months, NaiveDate, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl MonthPeriod {
    /// Returns `None` when `month` is outside `1..=12` or the year is out of range.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = start.checked_add_months(Months::new(1))?;
        Some(Self { start, end })
    }

    /// The month that contains `date`.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Option<Self> {
        Self::new(date.year(), date.month())
    }

    /// First calendar day of the month (inclusive).
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    /// First calendar day of the following month (exclusive).
    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        self.end
    }

    /// Last calendar day of the month, used wherever the period is shown to people.
    #[must_use]
    pub fn display_end(&self) -> NaiveDate {
        self.end.pred_opt().unwrap_or(self.end)
    }

    #[must_use]
    pub fn previous(&self) -> Option<Self> {
        let start = self.start.checked_sub_months(Months::new(1))?;
        Some(Self {
            start,
            end: self.start,
        })
    }

    /// Start and end instants of the month measured in `tz`, converted to UTC.
    #[must_use]
    pub fn bounds_in(&self, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        (local_midnight(tz, self.start), local_midnight(tz, self.end))
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start.format("%Y-%m"))
    }
}

impl FromStr for MonthPeriod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_month(s)
    }
}

/// Parse a `YYYY-MM` month string.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidMonth`] when the input is not a valid month.
pub fn parse_month(raw: &str) -> Result<MonthPeriod, ConfigError> {
    let trimmed = raw.trim();
    let invalid = || ConfigError::InvalidMonth(raw.to_string());

    let (year, month) = trimmed.split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;

    MonthPeriod::new(year, month).ok_or_else(invalid)
}

/// `YYYY-MM`, the key format used by the retry file and log fields.
#[must_use]
pub fn format_month(period: &MonthPeriod) -> String {
    period.to_string()
}

/// Human month label such as `March 2025`.
#[must_use]
pub fn month_label(period: &MonthPeriod) -> String {
    period.start_date().format("%B %Y").to_string()
}

/// The calendar month before the one containing `today`.
#[must_use]
pub fn previous_month(today: NaiveDate) -> Option<MonthPeriod> {
    MonthPeriod::containing(today)?.previous()
}

/// Resolve an IANA zone name, falling back when it is blank or unknown.
#[must_use]
pub fn resolve_timezone(name: Option<&str>, fallback: Tz) -> Tz {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .and_then(|n| n.parse::<Tz>().ok())
        .unwrap_or(fallback)
}

fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        // Midnight falls inside a DST gap; the day starts at the first valid instant.
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map_or_else(
                || Utc.from_utc_datetime(&naive),
                |dt| dt.with_timezone(&Utc),
            ),
    }
}
