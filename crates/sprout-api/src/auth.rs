//! Token-based authentication: password hashing, token issuance, and the
//! [`CurrentAccount`] extractor.
//!
//! Tokens are 32 random bytes, hex-encoded, handed to the client exactly
//! once. Only the SHA-256 of a token is persisted; a presented token is
//! re-hashed and looked up. Header form: `Authorization: Token <hex>`.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use sprout_core::{account::Account, store::AssessmentStore};

use crate::{AppState, error::ApiError};

/// The scheme prefix expected in the `Authorization` header.
pub const TOKEN_SCHEME: &str = "Token ";

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash a plaintext password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// Verify a plaintext password against a stored PHC string. Any parse or
/// verification failure counts as a mismatch.
pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// Generate a fresh opaque token.
pub fn generate_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// The at-rest form of a token.
pub fn token_hash(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The authenticated caller, resolved from the `Authorization` header.
/// Present in a handler signature means the request carried a valid token
/// for an active account.
pub struct CurrentAccount(pub Account);

impl<S> FromRequestParts<AppState<S>> for CurrentAccount
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let header_val = parts
      .headers
      .get(axum::http::header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;

    let token = header_val
      .strip_prefix(TOKEN_SCHEME)
      .ok_or(ApiError::Unauthorized)?;

    let account = state
      .store
      .account_by_token_hash(token_hash(token))
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;

    Ok(CurrentAccount(account))
  }
}

/// Reject callers whose account is not flagged staff.
pub fn require_staff(account: &Account) -> Result<(), ApiError> {
  if account.is_staff {
    Ok(())
  } else {
    Err(ApiError::Forbidden)
  }
}
