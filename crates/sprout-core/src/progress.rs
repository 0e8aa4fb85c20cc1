//! The progress ledger: per-child, per-item completion records.
//!
//! Records are created in bulk, one per item of a test, at the moment the
//! test is assigned to a child — never one at a time. A (child, item) pair
//! holds at most one record; assigning the same test twice is rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One child's completion state for one catalog item. `last_checkout` is set
/// once at creation and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
  pub record_id:     i64,
  pub child_id:      i64,
  pub item_id:       i64,
  pub is_complete:   bool,
  pub last_checkout: DateTime<Utc>,
}

/// Outcome of assigning a test to a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
  /// One fresh, incomplete record per item of the test.
  Assigned(Vec<ProgressRecord>),
  /// The child already holds records for this test.
  AlreadyAssigned,
  /// No such test.
  NoSuchTest,
}
