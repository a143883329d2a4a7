use axum::{
  extract::State,
  http::{HeaderMap, StatusCode},
  response::Json as JsonResponse,
  routing::get,
  Router,
};

use super::model::{CreateTripRequest, Trip, TripListQuery, TripsResponse};
use crate::{
  middleware::auth::auth_middleware,
  state::{AppState, SharedAppState},
  utils::extract::{Json, Path, Query},
  AppError,
};

pub fn trip_routes() -> Router<SharedAppState> {
  Router::new()
    .route("/trips", get(list_trips_handler).post(create_trip_handler))
    .route("/trips/{trip_id}", get(get_trip_handler).delete(delete_trip_handler))
}

pub async fn list_trips_handler(
  State(state): State<SharedAppState>,
  headers: HeaderMap,
  Query(query): Query<TripListQuery>,
) -> Result<JsonResponse<TripsResponse>, AppError> {
  let claims = auth_middleware(&state, &headers)?;

  state
    .list_trips(claims.user_id, query)
    .await
    .map(JsonResponse)
    .map_err(Into::into)
}

pub async fn create_trip_handler(
  State(state): State<SharedAppState>,
  headers: HeaderMap,
  Json(payload): Json<CreateTripRequest>,
) -> Result<(StatusCode, JsonResponse<Trip>), AppError> {
  let claims = auth_middleware(&state, &headers)?;

  let trip = state.create_trip(claims.user_id, payload).await?;
  Ok((StatusCode::CREATED, JsonResponse(trip)))
}

pub async fn get_trip_handler(
  State(state): State<SharedAppState>,
  headers: HeaderMap,
  Path(trip_id): Path<i32>,
) -> Result<JsonResponse<Trip>, AppError> {
  let claims = auth_middleware(&state, &headers)?;

  state
    .get_trip(claims.user_id, trip_id)
    .await
    .map(JsonResponse)
    .map_err(Into::into)
}

pub async fn delete_trip_handler(
  State(state): State<SharedAppState>,
  headers: HeaderMap,
  Path(trip_id): Path<i32>,
) -> Result<StatusCode, AppError> {
  let claims = auth_middleware(&state, &headers)?;

  state.delete_trip(claims.user_id, trip_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
