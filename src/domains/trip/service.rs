use std::{error::Error, sync::Arc};

use async_trait::async_trait;

use super::{
  model::{sort_trips, CreateTripRequest, NewTrip, Trip, TripListQuery, TripsResponse},
  repository::{CreateOutcome, TripRepository},
  validation::{check_range, validate, DateRange, TripRejection},
};
use crate::{
  domains::destination::client::{weather_snapshot, DestinationService},
  impl_service_error_conversions,
  utils::date::parse_date,
};

const MAX_LOCATION_LENGTH: usize = 255;

#[derive(Debug)]
pub enum TripServiceError {
  ValidationError(String),
  Overlap(String),
  NotFound(String),
  InternalServerError(String),
}

impl Error for TripServiceError {}

impl std::fmt::Display for TripServiceError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      TripServiceError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
      TripServiceError::Overlap(msg) => write!(f, "Overlap: {}", msg),
      TripServiceError::NotFound(msg) => write!(f, "Not Found: {}", msg),
      TripServiceError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
    }
  }
}

impl From<TripRejection> for TripServiceError {
  fn from(rejection: TripRejection) -> Self {
    match rejection {
      TripRejection::Overlaps { .. } => TripServiceError::Overlap(rejection.to_string()),
      _ => TripServiceError::ValidationError(rejection.to_string()),
    }
  }
}

impl_service_error_conversions!(TripServiceError, InternalServerError, NotFound, Overlap);

#[async_trait]
pub trait TripService: Send + Sync {
  async fn create_trip(&self, user_id: i32, req: CreateTripRequest) -> Result<Trip, TripServiceError>;
  async fn list_trips(&self, user_id: i32, query: TripListQuery) -> Result<TripsResponse, TripServiceError>;
  async fn get_trip(&self, user_id: i32, trip_id: i32) -> Result<Trip, TripServiceError>;
  async fn delete_trip(&self, user_id: i32, trip_id: i32) -> Result<(), TripServiceError>;
}

pub struct TripServiceImpl<R> {
  trip_repository: R,
  destinations: Arc<dyn DestinationService>,
}

impl<R> TripServiceImpl<R>
where
  R: TripRepository,
{
  pub fn new(trip_repository: R, destinations: Arc<dyn DestinationService>) -> Self {
    Self {
      trip_repository,
      destinations,
    }
  }
}

/// Validates the request body and turns it into a trip ready for insertion.
/// The weather summary is left empty when the client did not provide one.
pub fn parse_new_trip(req: CreateTripRequest) -> Result<NewTrip, TripServiceError> {
  let location = req.location.as_deref().map(str::trim).unwrap_or_default();
  let (Some(start_raw), Some(end_raw)) = (req.start_date.as_deref(), req.end_date.as_deref()) else {
    return Err(TripServiceError::ValidationError("Missing required fields".to_string()));
  };
  if location.is_empty() {
    return Err(TripServiceError::ValidationError("Missing required fields".to_string()));
  }
  if location.chars().count() > MAX_LOCATION_LENGTH {
    return Err(TripServiceError::ValidationError(format!(
      "Location must be at most {} characters",
      MAX_LOCATION_LENGTH
    )));
  }

  let start = parse_date(start_raw)
    .ok_or_else(|| TripServiceError::ValidationError(format!("Invalid start date: {}", start_raw)))?;
  let end =
    parse_date(end_raw).ok_or_else(|| TripServiceError::ValidationError(format!("Invalid end date: {}", end_raw)))?;

  let range = DateRange::new(start, end);
  check_range(&range)?;

  Ok(NewTrip {
    location: location.to_string(),
    range,
    weather_summary: req
      .weather_summary
      .map(|summary| summary.trim().to_string())
      .unwrap_or_default(),
  })
}

#[async_trait]
impl<R> TripService for TripServiceImpl<R>
where
  R: TripRepository,
{
  async fn create_trip(&self, user_id: i32, req: CreateTripRequest) -> Result<Trip, TripServiceError> {
    let mut new_trip = parse_new_trip(req)?;

    if new_trip.weather_summary.is_empty() {
      // Rejects known overlaps before spending outbound calls. The locked create below still decides.
      let existing = self.trip_repository.find_by_user(user_id).await?;
      validate(&new_trip.range, &existing)?;
      new_trip.weather_summary = weather_snapshot(self.destinations.as_ref(), &new_trip.location).await;
    }

    match self.trip_repository.create_unless_overlapping(user_id, &new_trip).await? {
      CreateOutcome::Created(trip) => {
        tracing::info!(user_id, trip_id = trip.id, "Trip created");
        Ok(trip)
      }
      CreateOutcome::Rejected(rejection) => {
        tracing::debug!(user_id, %rejection, "Trip rejected");
        Err(rejection.into())
      }
    }
  }

  async fn list_trips(&self, user_id: i32, query: TripListQuery) -> Result<TripsResponse, TripServiceError> {
    let mut trips = self.trip_repository.find_by_user(user_id).await?;
    sort_trips(&mut trips, query.sort.unwrap_or_default(), query.order.unwrap_or_default());
    Ok(TripsResponse { trips })
  }

  async fn get_trip(&self, user_id: i32, trip_id: i32) -> Result<Trip, TripServiceError> {
    self
      .trip_repository
      .find_by_id_for_user(trip_id, user_id)
      .await?
      .ok_or_else(|| TripServiceError::NotFound("Trip not found".to_string()))
  }

  async fn delete_trip(&self, user_id: i32, trip_id: i32) -> Result<(), TripServiceError> {
    if self.trip_repository.delete_for_user(trip_id, user_id).await? {
      tracing::info!(user_id, trip_id, "Trip deleted");
      Ok(())
    } else {
      Err(TripServiceError::NotFound("Trip not found".to_string()))
    }
  }
}
