use async_trait::async_trait;
use sqlx::PgPool;

use super::{
  model::{NewTrip, Trip},
  validation::{HasDateRange, TripRejection},
};
use crate::db::RepositoryError;

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
  Created(Trip),
  Rejected(TripRejection),
}

#[async_trait]
pub trait TripRepository: Send + Sync {
  /// Inserts the trip unless it overlaps another trip of the same user.
  /// The overlap check and the insert happen atomically.
  async fn create_unless_overlapping(&self, user_id: i32, trip: &NewTrip) -> Result<CreateOutcome, RepositoryError>;
  async fn find_by_user(&self, user_id: i32) -> Result<Vec<Trip>, RepositoryError>;
  async fn find_by_id_for_user(&self, trip_id: i32, user_id: i32) -> Result<Option<Trip>, RepositoryError>;
  async fn delete_for_user(&self, trip_id: i32, user_id: i32) -> Result<bool, RepositoryError>;
}

pub struct SqlxTripRepository {
  pub pool: PgPool,
}

impl SqlxTripRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl TripRepository for SqlxTripRepository {
  async fn create_unless_overlapping(&self, user_id: i32, trip: &NewTrip) -> Result<CreateOutcome, RepositoryError> {
    let mut tx = self.pool.begin().await?;

    // Serializes concurrent creates of the same user on the owner's row.
    let owner: Option<i32> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
      .bind(user_id)
      .fetch_optional(&mut *tx)
      .await?;

    if owner.is_none() {
      return Err(RepositoryError::NotFound("User not found".to_string()));
    }

    if let Some(existing) = Trip::find_overlapping(&mut *tx, user_id, &trip.range).await? {
      tx.rollback().await?;
      return Ok(CreateOutcome::Rejected(TripRejection::Overlaps {
        existing: existing.date_range(),
      }));
    }

    let created = Trip::insert(&mut *tx, user_id, trip).await?;
    tx.commit().await?;

    Ok(CreateOutcome::Created(created))
  }

  async fn find_by_user(&self, user_id: i32) -> Result<Vec<Trip>, RepositoryError> {
    Ok(Trip::find_by_user(&self.pool, user_id).await?)
  }

  async fn find_by_id_for_user(&self, trip_id: i32, user_id: i32) -> Result<Option<Trip>, RepositoryError> {
    Ok(Trip::find_by_id_for_user(&self.pool, trip_id, user_id).await?)
  }

  async fn delete_for_user(&self, trip_id: i32, user_id: i32) -> Result<bool, RepositoryError> {
    Ok(Trip::delete_for_user(&self.pool, trip_id, user_id).await?)
  }
}
