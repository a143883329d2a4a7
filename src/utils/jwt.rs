use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  pub sub: String,
  pub exp: usize,
  pub user_id: i32,
}

pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
  let token_data = decode::<Claims>(
    token,
    &DecodingKey::from_secret(secret.as_ref()),
    &Validation::default(),
  )?;

  Ok(token_data.claims)
}

pub fn encode_jwt(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
  encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_ref()))
}

/// Signs a token for the user that expires `ttl_hours` from now.
pub fn issue_token(user_id: i32, email: &str, config: &JwtConfig) -> Result<String, jsonwebtoken::errors::Error> {
  let expiration = (Utc::now() + Duration::hours(config.ttl_hours)).timestamp().max(0) as usize;

  let claims = Claims {
    sub: email.to_string(),
    exp: expiration,
    user_id,
  };

  encode_jwt(&claims, &config.secret)
}
