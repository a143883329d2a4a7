use axum::http::HeaderMap;

use crate::{
  state::AppState,
  utils::{
    error::AppError,
    jwt::{decode_jwt, Claims},
  },
};

/// Resolves the caller from a `Bearer` token. The token's `user_id` is the only source of identity.
pub fn auth_middleware<S: AppState>(state: &S, headers: &HeaderMap) -> Result<Claims, AppError> {
  let auth_header = headers
    .get(axum::http::header::AUTHORIZATION)
    .ok_or_else(|| AppError::unauthorized("Authorization header missing"))?
    .to_str()
    .map_err(|_| AppError::unauthorized("Invalid authorization header"))?;

  let token = auth_header
    .strip_prefix("Bearer ")
    .ok_or_else(|| AppError::unauthorized("Invalid authorization format"))?;

  let claims = decode_jwt(token, state.jwt_secret()).map_err(|e| {
    tracing::debug!("Rejected token: {}", e);
    AppError::unauthorized("Invalid token")
  })?;

  Ok(claims)
}
