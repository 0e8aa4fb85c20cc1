//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, dates as ISO 8601 (`%Y-%m-%d`),
//! UUIDs as hyphenated lowercase strings, roles as their exact tag.

use chrono::{DateTime, NaiveDate, Utc};
use sprout_core::{
  account::{Account, Role},
  child::{Child, Comment},
  progress::ProgressRecord,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str { r.as_str() }

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse().map_err(|_| Error::UnknownRole(s.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:    i64,
  pub email:         String,
  pub name:          String,
  pub password_hash: String,
  pub role:          String,
  pub is_active:     bool,
  pub is_staff:      bool,
  pub created_at:    String,
}

impl RawAccount {
  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id:    self.account_id,
      email:         self.email,
      name:          self.name,
      password_hash: self.password_hash,
      role:          decode_role(&self.role)?,
      is_active:     self.is_active,
      is_staff:      self.is_staff,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `children` row.
pub struct RawChild {
  pub child_id: i64,
  pub slug:     String,
  pub name:     String,
  pub birthday: String,
}

impl RawChild {
  pub fn into_child(self) -> Result<Child> {
    Ok(Child {
      child_id: self.child_id,
      slug:     decode_uuid(&self.slug)?,
      name:     self.name,
      birthday: decode_date(&self.birthday)?,
    })
  }
}

/// Raw strings read directly from a `comments` row.
pub struct RawComment {
  pub comment_id: i64,
  pub child_id:   i64,
  pub comment:    String,
  pub created:    String,
}

impl RawComment {
  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: self.comment_id,
      child_id:   self.child_id,
      comment:    self.comment,
      created:    decode_dt(&self.created)?,
    })
  }
}

/// Raw strings read directly from a `progress_records` row.
pub struct RawRecord {
  pub record_id:     i64,
  pub child_id:      i64,
  pub item_id:       i64,
  pub is_complete:   bool,
  pub last_checkout: String,
}

impl RawRecord {
  pub fn into_record(self) -> Result<ProgressRecord> {
    Ok(ProgressRecord {
      record_id:     self.record_id,
      child_id:      self.child_id,
      item_id:       self.item_id,
      is_complete:   self.is_complete,
      last_checkout: decode_dt(&self.last_checkout)?,
    })
  }
}
