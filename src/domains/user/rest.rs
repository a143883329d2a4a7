use axum::{
  extract::{Multipart, State},
  http::{HeaderMap, StatusCode},
  response::Json as JsonResponse,
  routing::{get, post},
  Router,
};

use super::model::{
  AvatarUpload, LoginRequest, LoginResponse, RegisterUserRequest, UpdateProfileRequest, UserProfile, UserWithTrips,
};
use crate::{
  middleware::auth::auth_middleware,
  state::{AppState, SharedAppState},
  utils::extract::Json,
  AppError,
};

pub fn user_routes() -> Router<SharedAppState> {
  Router::new()
    .route("/register", post(register_handler))
    .route("/login", post(login_handler))
    .route("/user", get(get_user_handler).patch(update_user_handler))
    .route("/user/avatar", post(replace_avatar_handler))
}

/// Reads a file part. Browsers send an empty part when no file was picked; that counts as absent.
async fn read_avatar(field: axum::extract::multipart::Field<'_>) -> Result<Option<AvatarUpload>, AppError> {
  let file_name = field.file_name().unwrap_or("avatar").to_string();
  let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
  let data = field.bytes().await?;

  if data.is_empty() {
    return Ok(None);
  }

  Ok(Some(AvatarUpload {
    file_name,
    content_type,
    data: data.to_vec(),
  }))
}

async fn read_register_form(mut multipart: Multipart) -> Result<RegisterUserRequest, AppError> {
  let mut req = RegisterUserRequest::default();

  while let Some(field) = multipart.next_field().await? {
    let name = field.name().unwrap_or_default().to_string();
    match name.as_str() {
      "avatar" => req.avatar = read_avatar(field).await?,
      "email" => req.email = field.text().await?,
      "fullname" => req.fullname = field.text().await?,
      "password" => req.password = field.text().await?,
      "sex" => req.sex = Some(field.text().await?),
      "country" => req.country = Some(field.text().await?),
      other => tracing::debug!(field = other, "Ignoring unknown register field"),
    }
  }

  Ok(req)
}

pub async fn register_handler(
  State(state): State<SharedAppState>,
  multipart: Multipart,
) -> Result<(StatusCode, JsonResponse<UserProfile>), AppError> {
  let req = read_register_form(multipart).await?;

  let profile = state.register(req).await?;
  Ok((StatusCode::CREATED, JsonResponse(profile)))
}

pub async fn login_handler(
  State(state): State<SharedAppState>,
  Json(payload): Json<LoginRequest>,
) -> Result<JsonResponse<LoginResponse>, AppError> {
  state.login(payload).await.map(JsonResponse).map_err(Into::into)
}

pub async fn get_user_handler(
  State(state): State<SharedAppState>,
  headers: HeaderMap,
) -> Result<JsonResponse<UserWithTrips>, AppError> {
  let claims = auth_middleware(&state, &headers)?;

  state.get_user_with_trips(claims.user_id).await.map(JsonResponse)
}

pub async fn update_user_handler(
  State(state): State<SharedAppState>,
  headers: HeaderMap,
  Json(payload): Json<UpdateProfileRequest>,
) -> Result<JsonResponse<UserProfile>, AppError> {
  let claims = auth_middleware(&state, &headers)?;

  state
    .update_profile(claims.user_id, payload)
    .await
    .map(JsonResponse)
    .map_err(Into::into)
}

pub async fn replace_avatar_handler(
  State(state): State<SharedAppState>,
  headers: HeaderMap,
  mut multipart: Multipart,
) -> Result<JsonResponse<UserProfile>, AppError> {
  let claims = auth_middleware(&state, &headers)?;

  let mut upload = None;
  while let Some(field) = multipart.next_field().await? {
    if field.name() == Some("avatar") {
      upload = read_avatar(field).await?;
    }
  }
  let upload = upload.ok_or_else(|| AppError::bad_request("Avatar file is required"))?;

  state
    .replace_avatar(claims.user_id, upload)
    .await
    .map(JsonResponse)
    .map_err(Into::into)
}
