use chrono::{DateTime, NaiveDate};

/// Parses either a plain `YYYY-MM-DD` date or an RFC 3339 timestamp.
///
/// Timestamps keep the calendar date of their own offset, so
/// `2025-03-01T23:30:00-05:00` is the 1st of March, not the 2nd.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
  let value = value.trim();
  NaiveDate::parse_from_str(value, "%Y-%m-%d")
    .ok()
    .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}
