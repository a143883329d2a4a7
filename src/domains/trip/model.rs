use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

use super::validation::{DateRange, HasDateRange};

#[derive(Debug, Clone, PartialEq, FromRow, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
  pub id: i32,
  pub user_id: i32,
  pub location: String,
  pub start_date: NaiveDate,
  pub end_date: NaiveDate,
  pub weather_summary: String,
  pub created_at: DateTime<Utc>,
}

impl HasDateRange for Trip {
  fn date_range(&self) -> DateRange {
    DateRange::new(self.start_date, self.end_date)
  }
}

/// Body of `POST /trips`. Dates are kept as strings so that missing or malformed
/// values produce a readable 400 instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
  pub location: Option<String>,
  pub start_date: Option<String>,
  pub end_date: Option<String>,
  pub weather_summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTrip {
  pub location: String,
  pub range: DateRange,
  pub weather_summary: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TripSortKey {
  #[default]
  StartDate,
  EndDate,
  Location,
  CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  #[default]
  Asc,
  Desc,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct TripListQuery {
  pub sort: Option<TripSortKey>,
  pub order: Option<SortOrder>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TripsResponse {
  pub trips: Vec<Trip>,
}

pub fn sort_trips(trips: &mut [Trip], key: TripSortKey, order: SortOrder) {
  trips.sort_by(|a, b| {
    let ordering = match key {
      TripSortKey::StartDate => a.start_date.cmp(&b.start_date),
      TripSortKey::EndDate => a.end_date.cmp(&b.end_date),
      TripSortKey::Location => a.location.to_lowercase().cmp(&b.location.to_lowercase()),
      TripSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
    }
    .then_with(|| a.id.cmp(&b.id));

    match order {
      SortOrder::Asc => ordering,
      SortOrder::Desc => ordering.reverse(),
    }
  });
}

const TRIP_COLUMNS: &str = "id, user_id, location, start_date, end_date, weather_summary, created_at";

impl Trip {
  pub async fn insert<'e, E>(executor: E, user_id: i32, trip: &NewTrip) -> Result<Trip, sqlx::Error>
  where
    E: PgExecutor<'e>,
  {
    let query = format!(
      "INSERT INTO trips (user_id, location, start_date, end_date, weather_summary) \
       VALUES ($1, $2, $3, $4, $5) RETURNING {}",
      TRIP_COLUMNS
    );

    sqlx::query_as::<_, Trip>(&query)
      .bind(user_id)
      .bind(&trip.location)
      .bind(trip.range.start)
      .bind(trip.range.end)
      .bind(&trip.weather_summary)
      .fetch_one(executor)
      .await
  }

  /// First trip of the user whose closed interval intersects `range`.
  pub async fn find_overlapping<'e, E>(
    executor: E,
    user_id: i32,
    range: &DateRange,
  ) -> Result<Option<Trip>, sqlx::Error>
  where
    E: PgExecutor<'e>,
  {
    let query = format!(
      "SELECT {} FROM trips WHERE user_id = $1 AND start_date <= $3 AND end_date >= $2 \
       ORDER BY start_date LIMIT 1",
      TRIP_COLUMNS
    );

    sqlx::query_as::<_, Trip>(&query)
      .bind(user_id)
      .bind(range.start)
      .bind(range.end)
      .fetch_optional(executor)
      .await
  }

  pub async fn find_by_user<'e, E>(executor: E, user_id: i32) -> Result<Vec<Trip>, sqlx::Error>
  where
    E: PgExecutor<'e>,
  {
    let query = format!(
      "SELECT {} FROM trips WHERE user_id = $1 ORDER BY start_date, id",
      TRIP_COLUMNS
    );

    sqlx::query_as::<_, Trip>(&query).bind(user_id).fetch_all(executor).await
  }

  pub async fn find_by_id_for_user<'e, E>(executor: E, id: i32, user_id: i32) -> Result<Option<Trip>, sqlx::Error>
  where
    E: PgExecutor<'e>,
  {
    let query = format!("SELECT {} FROM trips WHERE id = $1 AND user_id = $2", TRIP_COLUMNS);

    sqlx::query_as::<_, Trip>(&query)
      .bind(id)
      .bind(user_id)
      .fetch_optional(executor)
      .await
  }

  pub async fn delete_for_user<'e, E>(executor: E, id: i32, user_id: i32) -> Result<bool, sqlx::Error>
  where
    E: PgExecutor<'e>,
  {
    let result = sqlx::query("DELETE FROM trips WHERE id = $1 AND user_id = $2")
      .bind(id)
      .bind(user_id)
      .execute(executor)
      .await?;

    Ok(result.rows_affected() == 1)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn trip(id: i32, location: &str, start: (i32, u32, u32), created_hour: u32) -> Trip {
    let start = NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap();
    Trip {
      id,
      user_id: 1,
      location: location.to_string(),
      start_date: start,
      end_date: start + chrono::Duration::days(2),
      weather_summary: "20°C".to_string(),
      created_at: Utc.with_ymd_and_hms(2025, 1, 1, created_hour, 0, 0).unwrap(),
    }
  }

  fn ids(trips: &[Trip]) -> Vec<i32> {
    trips.iter().map(|t| t.id).collect()
  }

  #[test]
  fn test_sort_by_start_date() {
    let mut trips = vec![trip(1, "Peru", (2025, 5, 1), 1), trip(2, "Chile", (2025, 3, 1), 2)];
    sort_trips(&mut trips, TripSortKey::StartDate, SortOrder::Asc);
    assert_eq!(ids(&trips), vec![2, 1]);
    sort_trips(&mut trips, TripSortKey::StartDate, SortOrder::Desc);
    assert_eq!(ids(&trips), vec![1, 2]);
  }

  #[test]
  fn test_sort_by_location_ignores_case() {
    let mut trips = vec![
      trip(1, "peru", (2025, 5, 1), 1),
      trip(2, "Chile", (2025, 3, 1), 2),
      trip(3, "Argentina", (2025, 7, 1), 3),
    ];
    sort_trips(&mut trips, TripSortKey::Location, SortOrder::Asc);
    assert_eq!(ids(&trips), vec![3, 2, 1]);
  }

  #[test]
  fn test_sort_by_created_at() {
    let mut trips = vec![trip(1, "Peru", (2025, 5, 1), 9), trip(2, "Chile", (2025, 3, 1), 3)];
    sort_trips(&mut trips, TripSortKey::CreatedAt, SortOrder::Asc);
    assert_eq!(ids(&trips), vec![2, 1]);
  }

  #[test]
  fn test_trip_serializes_camel_case() {
    let value = serde_json::to_value(trip(7, "Japan", (2025, 4, 1), 0)).unwrap();
    assert_eq!(value["userId"], 1);
    assert_eq!(value["startDate"], "2025-04-01");
    assert_eq!(value["endDate"], "2025-04-03");
    assert_eq!(value["weatherSummary"], "20°C");
    assert!(value.get("createdAt").is_some());
  }

  #[test]
  fn test_list_query_parses_camel_case_keys() {
    let query: TripListQuery = serde_json::from_str(r#"{"sort":"createdAt","order":"desc"}"#).unwrap();
    assert_eq!(query.sort, Some(TripSortKey::CreatedAt));
    assert_eq!(query.order, Some(SortOrder::Desc));
  }
}
