//! Date-range rules for trips.
//!
//! A trip covers the closed interval `[start, end]` of calendar days. A range is
//! acceptable when it ends on or after its start, spans at most
//! [`MAX_TRIP_DAYS`] days, and shares no day with another trip of the same user.

use std::fmt;

use chrono::NaiveDate;

pub const MAX_TRIP_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
  pub start: NaiveDate,
  pub end: NaiveDate,
}

impl DateRange {
  pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
    Self { start, end }
  }

  /// `end - start` in days. Negative when the range is inverted.
  pub fn span_days(&self) -> i64 {
    (self.end - self.start).num_days()
  }

  pub fn overlaps(&self, other: &DateRange) -> bool {
    overlaps(self, other)
  }
}

impl fmt::Display for DateRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} to {}", self.start, self.end)
  }
}

pub trait HasDateRange {
  fn date_range(&self) -> DateRange;
}

impl HasDateRange for DateRange {
  fn date_range(&self) -> DateRange {
    *self
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripRejection {
  EndBeforeStart,
  TooLong { days: i64 },
  Overlaps { existing: DateRange },
}

impl std::error::Error for TripRejection {}

impl fmt::Display for TripRejection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TripRejection::EndBeforeStart => write!(f, "End date cannot be before start date"),
      TripRejection::TooLong { days } => write!(
        f,
        "Trips cannot be longer than {} days (requested {} days)",
        MAX_TRIP_DAYS, days
      ),
      TripRejection::Overlaps { existing } => {
        write!(f, "Trip dates overlap an existing trip ({})", existing)
      }
    }
  }
}

pub fn check_range(range: &DateRange) -> Result<(), TripRejection> {
  if range.end < range.start {
    return Err(TripRejection::EndBeforeStart);
  }

  let days = range.span_days();
  if days > MAX_TRIP_DAYS {
    return Err(TripRejection::TooLong { days });
  }

  Ok(())
}

/// Closed-interval intersection: ranges touching on a single day overlap.
pub fn overlaps(a: &DateRange, b: &DateRange) -> bool {
  a.start <= b.end && a.end >= b.start
}

pub fn find_overlap<'a, T: HasDateRange>(existing: &'a [T], candidate: &DateRange) -> Option<&'a T> {
  existing
    .iter()
    .find(|item| overlaps(&item.date_range(), candidate))
}

/// Range rules plus overlap against `existing`. The trips table query in
/// `Trip::find_overlapping` is the SQL form of the same predicate.
pub fn validate<T: HasDateRange>(candidate: &DateRange, existing: &[T]) -> Result<(), TripRejection> {
  check_range(candidate)?;

  match find_overlap(existing, candidate) {
    Some(item) => Err(TripRejection::Overlaps {
      existing: item.date_range(),
    }),
    None => Ok(()),
  }
}
