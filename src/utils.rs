use std::sync::LazyLock;

use argon2::Argon2;
use password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use regex::Regex;
use validator::ValidationErrors;

pub mod date;
pub mod error;
pub mod extract;
pub mod jwt;

static EMAIL_REGEX: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

/// Hash computed once and verified against when the account does not exist, so that
/// a failed login takes the same time whether or not the email is registered.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| hash_password("dummy-never-matches").ok());

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
  Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
  match PasswordHash::new(stored_hash) {
    Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
    Err(e) => {
      tracing::error!("Stored password hash could not be parsed: {}", e);
      false
    }
  }
}

pub fn dummy_verify(password: &str) {
  if let Some(hash) = DUMMY_HASH.as_deref() {
    let _ = verify_password(password, hash);
  }
}

pub fn is_valid_email_format(email: &str) -> bool {
  EMAIL_REGEX.is_match(email)
}

/// Picks a single human readable message out of a validation failure.
pub fn first_validation_message(errors: &ValidationErrors) -> String {
  let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
  fields.sort_by(|a, b| a.0.cmp(&b.0));

  fields
    .into_iter()
    .flat_map(|(field, errs)| errs.iter().map(move |err| (field.clone(), err)))
    .map(|(field, err)| match &err.message {
      Some(message) => message.to_string(),
      None => format!("Invalid value for {}", field),
    })
    .next()
    .unwrap_or_else(|| "Invalid input".to_string())
}
