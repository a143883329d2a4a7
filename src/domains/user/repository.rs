use async_trait::async_trait;
use sqlx::PgPool;

use super::model::{NewUser, UpdateProfileRequest, User};
use crate::db::{is_unique_violation, RepositoryError};

#[async_trait]
pub trait UserRepository: Send + Sync {
  /// Fails with `RepositoryError::Conflict` when the email is already taken.
  async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError>;
  async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
  async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepositoryError>;
  async fn update_profile(&self, id: i32, changes: &UpdateProfileRequest) -> Result<Option<User>, RepositoryError>;
  async fn set_avatar(&self, id: i32, avatar_url: &str) -> Result<Option<User>, RepositoryError>;
}

pub struct SqlxUserRepository {
  pub pool: PgPool,
}

impl SqlxUserRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
  async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
    User::create(&self.pool, new_user).await.map_err(|err| {
      if is_unique_violation(&err) {
        RepositoryError::Conflict("Email already registered".to_string())
      } else {
        RepositoryError::DatabaseError(err)
      }
    })
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
    Ok(User::find_by_email(&self.pool, email).await?)
  }

  async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepositoryError> {
    Ok(User::find_by_id(&self.pool, id).await?)
  }

  async fn update_profile(&self, id: i32, changes: &UpdateProfileRequest) -> Result<Option<User>, RepositoryError> {
    Ok(User::update_profile(&self.pool, id, changes).await?)
  }

  async fn set_avatar(&self, id: i32, avatar_url: &str) -> Result<Option<User>, RepositoryError> {
    Ok(User::set_avatar(&self.pool, id, avatar_url).await?)
  }
}
