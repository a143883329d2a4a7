pub mod pool;

use std::error::Error;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug)]
pub enum RepositoryError {
  DatabaseError(sqlx::Error),
  NotFound(String),
  Conflict(String),
}

impl Error for RepositoryError {}

impl std::fmt::Display for RepositoryError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      RepositoryError::DatabaseError(err) => write!(f, "Database error: {}", err),
      RepositoryError::NotFound(msg) => write!(f, "Not found: {}", msg),
      RepositoryError::Conflict(msg) => write!(f, "Conflict: {}", msg),
    }
  }
}

impl From<sqlx::Error> for RepositoryError {
  fn from(err: sqlx::Error) -> Self {
    RepositoryError::DatabaseError(err)
  }
}

/// Returns true when the error is a PostgreSQL unique constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
  err
    .as_database_error()
    .and_then(|db_err| db_err.code())
    .is_some_and(|code| code == UNIQUE_VIOLATION)
}
