use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use validator::Validate;

use crate::domains::trip::model::Trip;

pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, FromRow)]
pub struct User {
  pub id: i32,
  pub email: String,
  pub password: String,
  pub fullname: String,
  pub sex: Option<String>,
  pub country: Option<String>,
  pub avatar: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub id: i32,
  pub email: String,
  pub fullname: String,
  pub sex: Option<String>,
  pub country: Option<String>,
  pub avatar: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
  fn from(user: User) -> Self {
    Self {
      id: user.id,
      email: user.email,
      fullname: user.fullname,
      sex: user.sex,
      country: user.country,
      avatar: user.avatar,
      created_at: user.created_at,
    }
  }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserWithTrips {
  #[serde(flatten)]
  pub user: UserProfile,
  pub trips: Vec<Trip>,
}

#[derive(Clone)]
pub struct AvatarUpload {
  pub file_name: String,
  pub content_type: String,
  pub data: Vec<u8>,
}

impl std::fmt::Debug for AvatarUpload {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AvatarUpload")
      .field("file_name", &self.file_name)
      .field("content_type", &self.content_type)
      .field("bytes", &self.data.len())
      .finish()
  }
}

impl AvatarUpload {
  pub fn validate(&self) -> Result<(), String> {
    if !self.content_type.starts_with("image/") {
      return Err("Avatar must be an image".to_string());
    }
    if self.data.is_empty() {
      return Err("Avatar file is empty".to_string());
    }
    if self.data.len() > MAX_AVATAR_BYTES {
      return Err(format!("Avatar must be at most {} MB", MAX_AVATAR_BYTES / (1024 * 1024)));
    }
    Ok(())
  }

  /// Lower-cased extension from the file name, `jpg` when there is none.
  pub fn extension(&self) -> String {
    self
      .file_name
      .rsplit_once('.')
      .map(|(_, ext)| ext.to_ascii_lowercase())
      .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
      .unwrap_or_else(|| "jpg".to_string())
  }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct RegisterUserRequest {
  #[validate(email(message = "Must be a valid email"))]
  pub email: String,
  #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
  pub fullname: String,
  #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
  pub password: String,
  pub sex: Option<String>,
  pub country: Option<String>,
  pub avatar: Option<AvatarUpload>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub email: String,
  pub password_hash: String,
  pub fullname: String,
  pub sex: Option<String>,
  pub country: Option<String>,
  pub avatar: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
  pub email: String,
  pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
  pub token: String,
  pub user_id: i32,
  pub email: String,
  pub fullname: String,
}

/// `PATCH /user` body. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate)]
pub struct UpdateProfileRequest {
  #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
  pub fullname: Option<String>,
  pub sex: Option<String>,
  pub country: Option<String>,
  #[validate(url(message = "Avatar must be a valid URL"))]
  pub avatar: Option<String>,
}

const USER_COLUMNS: &str = "id, email, password, fullname, sex, country, avatar, created_at";

impl User {
  pub async fn create<'e, E>(executor: E, new_user: &NewUser) -> Result<User, sqlx::Error>
  where
    E: PgExecutor<'e>,
  {
    let query = format!(
      "INSERT INTO users (email, password, fullname, sex, country, avatar) \
       VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
      USER_COLUMNS
    );

    sqlx::query_as::<_, User>(&query)
      .bind(&new_user.email)
      .bind(&new_user.password_hash)
      .bind(&new_user.fullname)
      .bind(&new_user.sex)
      .bind(&new_user.country)
      .bind(&new_user.avatar)
      .fetch_one(executor)
      .await
  }

  pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, sqlx::Error>
  where
    E: PgExecutor<'e>,
  {
    let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

    sqlx::query_as::<_, User>(&query).bind(email).fetch_optional(executor).await
  }

  pub async fn find_by_id<'e, E>(executor: E, id: i32) -> Result<Option<User>, sqlx::Error>
  where
    E: PgExecutor<'e>,
  {
    let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

    sqlx::query_as::<_, User>(&query).bind(id).fetch_optional(executor).await
  }

  pub async fn update_profile<'e, E>(
    executor: E,
    id: i32,
    changes: &UpdateProfileRequest,
  ) -> Result<Option<User>, sqlx::Error>
  where
    E: PgExecutor<'e>,
  {
    let query = format!(
      "UPDATE users SET \
         fullname = COALESCE($2, fullname), \
         sex = COALESCE($3, sex), \
         country = COALESCE($4, country), \
         avatar = COALESCE($5, avatar) \
       WHERE id = $1 RETURNING {}",
      USER_COLUMNS
    );

    sqlx::query_as::<_, User>(&query)
      .bind(id)
      .bind(&changes.fullname)
      .bind(&changes.sex)
      .bind(&changes.country)
      .bind(&changes.avatar)
      .fetch_optional(executor)
      .await
  }

  pub async fn set_avatar<'e, E>(executor: E, id: i32, avatar_url: &str) -> Result<Option<User>, sqlx::Error>
  where
    E: PgExecutor<'e>,
  {
    let query = format!("UPDATE users SET avatar = $2 WHERE id = $1 RETURNING {}", USER_COLUMNS);

    sqlx::query_as::<_, User>(&query)
      .bind(id)
      .bind(avatar_url)
      .fetch_optional(executor)
      .await
  }
}
