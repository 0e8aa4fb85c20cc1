//! Child records and the age-in-months computation.
//!
//! A child may be linked to any number of accounts (parents and testers can
//! share one). The link set also acts as the access-control boundary: an
//! account that is not linked to a child cannot see it at all.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Child ───────────────────────────────────────────────────────────────────

/// A persisted child row. The `slug` is a stable, human-unreadable identifier
/// safe to expose in documents and exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
  pub child_id: i64,
  pub slug:     Uuid,
  pub name:     String,
  pub birthday: NaiveDate,
}

impl Child {
  /// Assemble the transport representation for a given reference date.
  pub fn view(&self, on: NaiveDate) -> ChildView {
    ChildView {
      child_id:      self.child_id,
      slug:          self.slug,
      name:          self.name.clone(),
      birthday:      self.birthday,
      age_in_months: age_in_months(self.birthday, on),
    }
  }
}

/// Fields for a new child.
#[derive(Debug, Clone, Deserialize)]
pub struct NewChild {
  pub name:     String,
  pub birthday: NaiveDate,
}

/// Partial child update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChildUpdate {
  pub name:     Option<String>,
  pub birthday: Option<NaiveDate>,
}

/// A child as seen over the wire, with the derived age attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildView {
  pub child_id:      i64,
  pub slug:          Uuid,
  pub name:          String,
  pub birthday:      NaiveDate,
  pub age_in_months: i64,
}

/// Age in months: elapsed days divided by 30, rounded to nearest.
///
/// A birthday exactly 360 days before `on` evaluates to 12.
pub fn age_in_months(birthday: NaiveDate, on: NaiveDate) -> i64 {
  let days = (on - birthday).num_days();
  (days as f64 / 30.0).round() as i64
}

// ─── Comment ─────────────────────────────────────────────────────────────────

/// A free-text note on a child. The creation timestamp is set once by the
/// store and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: i64,
  pub child_id:   i64,
  pub comment:    String,
  pub created:    DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Days;

  #[test]
  fn age_in_months_360_days_is_twelve() {
    let on = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let birthday = on.checked_sub_days(Days::new(360)).unwrap();
    assert_eq!(age_in_months(birthday, on), 12);
  }

  #[test]
  fn age_in_months_rounds_to_nearest() {
    let on = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    // 44 days -> 1.47 months -> 1; 46 days -> 1.53 months -> 2.
    let b44 = on.checked_sub_days(Days::new(44)).unwrap();
    let b46 = on.checked_sub_days(Days::new(46)).unwrap();
    assert_eq!(age_in_months(b44, on), 1);
    assert_eq!(age_in_months(b46, on), 2);
  }

  #[test]
  fn age_in_months_newborn_is_zero() {
    let on = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    assert_eq!(age_in_months(on, on), 0);
  }
}
