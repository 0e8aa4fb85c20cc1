//! Error types for `sprout-core`.
//!
//! These cover domain validation only. Storage failures live in the backend
//! crates; "not found" outcomes are expressed as `Option` returns on the
//! [`AssessmentStore`](crate::store::AssessmentStore) trait.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid role: {0:?}")]
  InvalidRole(String),

  #[error("invalid email address: {0:?}")]
  InvalidEmail(String),

  #[error("password must be at least {0} characters")]
  PasswordTooShort(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
