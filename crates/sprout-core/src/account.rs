//! Account — the authenticated identity of a caregiver or professional.
//!
//! Accounts are identified by a case-normalized email address. The credential
//! is stored only as an argon2 PHC hash; plaintext never reaches this crate.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 5;

// ─── Role ────────────────────────────────────────────────────────────────────

/// Coarse permission/identity tag on an account.
///
/// The role is fixed at registration. Update payloads carrying a `role` field
/// are accepted but the field is dropped before it reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
  Tester,
  Parent,
  Staff,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Tester => "Tester",
      Role::Parent => "Parent",
      Role::Staff => "Staff",
    }
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "Tester" => Ok(Role::Tester),
      "Parent" => Ok(Role::Parent),
      "Staff" => Ok(Role::Staff),
      other => Err(Error::InvalidRole(other.to_string())),
    }
  }
}

// ─── Account ─────────────────────────────────────────────────────────────────

/// A persisted account row. Holds the credential hash, so it is never
/// serialized to the transport directly — see [`ProfileView`].
#[derive(Debug, Clone)]
pub struct Account {
  pub account_id:    i64,
  pub email:         String,
  pub name:          String,
  pub password_hash: String,
  pub role:          Role,
  pub is_active:     bool,
  pub is_staff:      bool,
  pub created_at:    DateTime<Utc>,
}

impl Account {
  /// The transport representation of an account: everything except the
  /// credential and the internal flags.
  pub fn profile(&self) -> ProfileView {
    ProfileView {
      email: self.email.clone(),
      name:  self.name.clone(),
      role:  self.role,
    }
  }
}

/// Fields for a new account. Assembled by the API layer after validation and
/// password hashing. `is_staff` is always false for self-registration; only
/// the server's staff-bootstrap path sets it.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub email:         String,
  pub name:          String,
  pub password_hash: String,
  pub role:          Role,
  pub is_staff:      bool,
}

/// Partial profile update. Role is deliberately absent: it cannot change
/// after registration.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
  pub email:         Option<String>,
  pub name:          Option<String>,
  pub password_hash: Option<String>,
}

/// What an account sees of itself over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
  pub email: String,
  pub name:  String,
  pub role:  Role,
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Normalize an email address: trim whitespace and lowercase.
///
/// Rejects the empty string and anything without an `@`.
pub fn normalize_email(raw: &str) -> Result<String> {
  let trimmed = raw.trim();
  if trimmed.is_empty() || !trimmed.contains('@') {
    return Err(Error::InvalidEmail(raw.to_string()));
  }
  Ok(trimmed.to_lowercase())
}

/// Enforce the minimum-length password policy.
pub fn check_password_policy(password: &str) -> Result<()> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::PasswordTooShort(MIN_PASSWORD_LEN));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_parses_exact_tags_only() {
    assert_eq!("Tester".parse::<Role>().unwrap(), Role::Tester);
    assert_eq!("Parent".parse::<Role>().unwrap(), Role::Parent);
    assert_eq!("Staff".parse::<Role>().unwrap(), Role::Staff);
    assert!("SuperAd".parse::<Role>().is_err());
    assert!("".parse::<Role>().is_err());
    assert!("staff".parse::<Role>().is_err());
  }

  #[test]
  fn email_is_trimmed_and_lowercased() {
    assert_eq!(
      normalize_email("  Alice@Example.COM ").unwrap(),
      "alice@example.com"
    );
    assert!(normalize_email("").is_err());
    assert!(normalize_email("not-an-email").is_err());
  }

  #[test]
  fn password_policy_rejects_short_passwords() {
    assert!(check_password_policy("pwd").is_err());
    assert!(check_password_policy("12345").is_ok());
  }
}
