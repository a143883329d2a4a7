use axum::{
  extract::State,
  http::HeaderMap,
  response::Json as JsonResponse,
  routing::get,
  Router,
};

use super::model::{DestinationOverview, GeocodeQuery, GeocodedLocation};
use crate::{
  middleware::auth::auth_middleware,
  state::{AppState, SharedAppState},
  utils::extract::{Path, Query},
  AppError,
};

pub fn destination_routes() -> Router<SharedAppState> {
  Router::new()
    .route("/destinations/{name}", get(get_destination_handler))
    .route("/geocode", get(geocode_handler))
}

pub async fn get_destination_handler(
  State(state): State<SharedAppState>,
  headers: HeaderMap,
  Path(name): Path<String>,
) -> Result<JsonResponse<DestinationOverview>, AppError> {
  auth_middleware(&state, &headers)?;

  state
    .destination_overview(&name)
    .await
    .map(JsonResponse)
    .map_err(Into::into)
}

pub async fn geocode_handler(
  State(state): State<SharedAppState>,
  headers: HeaderMap,
  Query(query): Query<GeocodeQuery>,
) -> Result<JsonResponse<GeocodedLocation>, AppError> {
  auth_middleware(&state, &headers)?;

  if query.q.trim().is_empty() {
    return Err(AppError::bad_request("Query parameter q must not be empty"));
  }

  state.geocode(&query.q).await.map(JsonResponse).map_err(Into::into)
}
