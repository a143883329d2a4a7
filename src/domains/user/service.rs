use std::{error::Error, sync::Arc};

use async_trait::async_trait;
use uuid::Uuid;
use validator::Validate;

use super::{
  model::{AvatarUpload, LoginRequest, LoginResponse, NewUser, RegisterUserRequest, UpdateProfileRequest, UserProfile},
  repository::UserRepository,
};
use crate::{
  config::JwtConfig,
  db::RepositoryError,
  impl_service_error_conversions,
  storage::ObjectStorage,
  utils::{
    dummy_verify, first_validation_message, hash_password, is_valid_email_format, jwt::issue_token, verify_password,
  },
};

const EMAIL_TAKEN: &str = "Email already registered";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug)]
pub enum UserServiceError {
  Unauthorized(String),
  ValidationError(String),
  UserNotFound(String),
  InternalServerError(String),
}

impl Error for UserServiceError {}

impl std::fmt::Display for UserServiceError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      UserServiceError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
      UserServiceError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
      UserServiceError::UserNotFound(msg) => write!(f, "User Not Found: {}", msg),
      UserServiceError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
    }
  }
}

// A unique-constraint conflict on users can only mean a taken email, which is a 400 here.
impl_service_error_conversions!(UserServiceError, InternalServerError, UserNotFound, ValidationError);

#[async_trait]
pub trait UserService: Send + Sync {
  async fn register(&self, req: RegisterUserRequest) -> Result<UserProfile, UserServiceError>;
  async fn login(&self, req: LoginRequest) -> Result<LoginResponse, UserServiceError>;
  async fn get_profile(&self, user_id: i32) -> Result<UserProfile, UserServiceError>;
  async fn update_profile(&self, user_id: i32, req: UpdateProfileRequest) -> Result<UserProfile, UserServiceError>;
  async fn replace_avatar(&self, user_id: i32, upload: AvatarUpload) -> Result<UserProfile, UserServiceError>;
}

pub struct UserServiceImpl<U> {
  user_repository: U,
  storage: Option<Arc<dyn ObjectStorage>>,
  jwt: JwtConfig,
}

impl<U> UserServiceImpl<U>
where
  U: UserRepository,
{
  pub fn new(user_repository: U, storage: Option<Arc<dyn ObjectStorage>>, jwt: JwtConfig) -> Self {
    Self {
      user_repository,
      storage,
      jwt,
    }
  }

  async fn upload_avatar(&self, upload: AvatarUpload) -> Result<String, UserServiceError> {
    upload.validate().map_err(UserServiceError::ValidationError)?;

    let storage = self
      .storage
      .as_ref()
      .ok_or_else(|| UserServiceError::ValidationError("Avatar uploads are not enabled".to_string()))?;

    let key = format!("avatars/{}.{}", Uuid::new_v4(), upload.extension());
    storage
      .upload_file(&key, upload.data, &upload.content_type)
      .await
      .map_err(|e| UserServiceError::InternalServerError(format!("Failed to upload avatar: {}", e)))
  }

  /// Removes an avatar we stored earlier. URLs pointing elsewhere are left alone.
  async fn discard_avatar(&self, url: &str) {
    let Some(storage) = self.storage.as_ref() else {
      return;
    };
    let Some(key) = storage.extract_key_from_url(url) else {
      return;
    };

    if let Err(e) = storage.delete_file(&key).await {
      tracing::warn!(%key, "Failed to delete avatar: {}", e);
    }
  }
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[async_trait]
impl<U> UserService for UserServiceImpl<U>
where
  U: UserRepository,
{
  async fn register(&self, req: RegisterUserRequest) -> Result<UserProfile, UserServiceError> {
    let req = RegisterUserRequest {
      email: req.email.trim().to_lowercase(),
      fullname: req.fullname.trim().to_string(),
      sex: non_blank(req.sex),
      country: non_blank(req.country),
      ..req
    };

    req
      .validate()
      .map_err(|e| UserServiceError::ValidationError(first_validation_message(&e)))?;

    if self.user_repository.find_by_email(&req.email).await?.is_some() {
      return Err(UserServiceError::ValidationError(EMAIL_TAKEN.to_string()));
    }

    let avatar = match req.avatar {
      Some(upload) => Some(self.upload_avatar(upload).await?),
      None => None,
    };

    let password_hash = hash_password(&req.password)
      .map_err(|e| UserServiceError::InternalServerError(format!("Failed to hash password: {}", e)))?;

    let new_user = NewUser {
      email: req.email,
      password_hash,
      fullname: req.fullname,
      sex: req.sex,
      country: req.country,
      avatar,
    };

    match self.user_repository.create(&new_user).await {
      Ok(user) => {
        tracing::info!(user_id = user.id, "User registered");
        Ok(user.into())
      }
      Err(err) => {
        if let Some(url) = new_user.avatar.as_deref() {
          self.discard_avatar(url).await;
        }
        match err {
          RepositoryError::Conflict(_) => Err(UserServiceError::ValidationError(EMAIL_TAKEN.to_string())),
          other => Err(other.into()),
        }
      }
    }
  }

  async fn login(&self, req: LoginRequest) -> Result<LoginResponse, UserServiceError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() {
      return Err(UserServiceError::ValidationError("Missing email or password".to_string()));
    }
    if !is_valid_email_format(&email) {
      return Err(UserServiceError::ValidationError("Invalid email format".to_string()));
    }

    let user = match self.user_repository.find_by_email(&email).await? {
      Some(user) => user,
      None => {
        dummy_verify(&req.password);
        return Err(UserServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
      }
    };

    if !verify_password(&req.password, &user.password) {
      tracing::info!(user_id = user.id, "Login failed: wrong password");
      return Err(UserServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = issue_token(user.id, &user.email, &self.jwt)
      .map_err(|e| UserServiceError::InternalServerError(format!("JWT encoding failed: {}", e)))?;

    Ok(LoginResponse {
      token,
      user_id: user.id,
      email: user.email,
      fullname: user.fullname,
    })
  }

  async fn get_profile(&self, user_id: i32) -> Result<UserProfile, UserServiceError> {
    self
      .user_repository
      .find_by_id(user_id)
      .await?
      .map(UserProfile::from)
      .ok_or_else(|| UserServiceError::UserNotFound("User not found".to_string()))
  }

  async fn update_profile(&self, user_id: i32, req: UpdateProfileRequest) -> Result<UserProfile, UserServiceError> {
    let changes = UpdateProfileRequest {
      fullname: req.fullname.map(|name| name.trim().to_string()),
      sex: non_blank(req.sex),
      country: non_blank(req.country),
      avatar: non_blank(req.avatar),
    };

    changes
      .validate()
      .map_err(|e| UserServiceError::ValidationError(first_validation_message(&e)))?;

    self
      .user_repository
      .update_profile(user_id, &changes)
      .await?
      .map(UserProfile::from)
      .ok_or_else(|| UserServiceError::UserNotFound("User not found".to_string()))
  }

  async fn replace_avatar(&self, user_id: i32, upload: AvatarUpload) -> Result<UserProfile, UserServiceError> {
    let previous = self
      .user_repository
      .find_by_id(user_id)
      .await?
      .ok_or_else(|| UserServiceError::UserNotFound("User not found".to_string()))?
      .avatar;

    let url = self.upload_avatar(upload).await?;

    let user = match self.user_repository.set_avatar(user_id, &url).await {
      Ok(Some(user)) => user,
      Ok(None) => {
        self.discard_avatar(&url).await;
        return Err(UserServiceError::UserNotFound("User not found".to_string()));
      }
      Err(err) => {
        self.discard_avatar(&url).await;
        return Err(err.into());
      }
    };

    if let Some(previous) = previous.as_deref() {
      self.discard_avatar(previous).await;
    }

    Ok(user.into())
  }
}
