use axum::{
  extract::{
    multipart::MultipartError,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;

use crate::domains::{
  destination::client::DestinationError, trip::service::TripServiceError, user::service::UserServiceError,
};

#[derive(Debug)]
pub struct AppError {
  pub status_code: StatusCode,
  pub message: String,
}

impl AppError {
  pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
    Self {
      status_code,
      message: message.into(),
    }
  }

  pub fn bad_request(message: impl Into<String>) -> Self {
    Self::new(StatusCode::BAD_REQUEST, message)
  }

  pub fn unauthorized(message: impl Into<String>) -> Self {
    Self::new(StatusCode::UNAUTHORIZED, message)
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    Self::new(StatusCode::NOT_FOUND, message)
  }

  pub fn conflict(message: impl Into<String>) -> Self {
    Self::new(StatusCode::CONFLICT, message)
  }

  pub fn bad_gateway(message: impl Into<String>) -> Self {
    Self::new(StatusCode::BAD_GATEWAY, message)
  }

  pub fn internal_server_error(message: impl Into<String>) -> Self {
    Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let body = Json(json!({
      "error": self.message,
      "status_code": self.status_code.as_u16(),
    }));

    (self.status_code, body).into_response()
  }
}

impl From<AppError> for StatusCode {
  fn from(err: AppError) -> Self {
    err.status_code
  }
}

impl From<sqlx::Error> for AppError {
  fn from(error: sqlx::Error) -> Self {
    tracing::error!("Database error: {:?}", error);
    AppError::internal_server_error("Internal server error occurred")
  }
}

impl From<MultipartError> for AppError {
  fn from(error: MultipartError) -> Self {
    tracing::warn!("Multipart error: {:?}", error);
    AppError::new(error.status(), format!("Invalid multipart body: {}", error.body_text()))
  }
}

impl From<JsonRejection> for AppError {
  fn from(rejection: JsonRejection) -> Self {
    tracing::debug!("JSON body rejected: {:?}", rejection);
    match rejection {
      JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
        AppError::bad_request(rejection.body_text())
      }
      // content type and body size keep their own status
      other => AppError::new(other.status(), other.body_text()),
    }
  }
}

impl From<PathRejection> for AppError {
  fn from(rejection: PathRejection) -> Self {
    tracing::debug!("Path rejected: {:?}", rejection);
    AppError::bad_request(rejection.body_text())
  }
}

impl From<QueryRejection> for AppError {
  fn from(rejection: QueryRejection) -> Self {
    tracing::debug!("Query string rejected: {:?}", rejection);
    AppError::bad_request(rejection.body_text())
  }
}

impl From<UserServiceError> for AppError {
  fn from(error: UserServiceError) -> Self {
    match error {
      UserServiceError::ValidationError(msg) => AppError::bad_request(msg),
      UserServiceError::Unauthorized(msg) => AppError::unauthorized(msg),
      UserServiceError::UserNotFound(msg) => AppError::not_found(msg),
      UserServiceError::InternalServerError(msg) => {
        tracing::error!("User service error: {}", msg);
        AppError::internal_server_error("Internal server error occurred")
      }
    }
  }
}

impl From<TripServiceError> for AppError {
  fn from(error: TripServiceError) -> Self {
    match error {
      TripServiceError::ValidationError(msg) => AppError::bad_request(msg),
      TripServiceError::Overlap(msg) => AppError::conflict(msg),
      TripServiceError::NotFound(msg) => AppError::not_found(msg),
      TripServiceError::InternalServerError(msg) => {
        tracing::error!("Trip service error: {}", msg);
        AppError::internal_server_error("Failed to process trip")
      }
    }
  }
}

impl From<DestinationError> for AppError {
  fn from(error: DestinationError) -> Self {
    match error {
      DestinationError::NotFound(msg) => AppError::not_found(msg),
      DestinationError::Upstream(msg) => {
        tracing::error!("Upstream API error: {}", msg);
        AppError::bad_gateway("Upstream service unavailable")
      }
    }
  }
}
