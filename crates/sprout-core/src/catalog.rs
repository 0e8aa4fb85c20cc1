//! The assessment catalog: Test → Category → Item.
//!
//! Read-mostly reference data. Categories belong to exactly one test and
//! items to exactly one (test, category) pair; deletes cascade downward.
//! Each item may carry a percentile-by-month lookup table built from its
//! percentile entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ─── Rows ────────────────────────────────────────────────────────────────────

/// A named assessment instrument (e.g. "Denver II").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Test {
  pub test_id: i64,
  pub name:    String,
}

/// A named grouping of items within a test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub category_id: i64,
  pub test_id:     i64,
  pub name:        String,
}

/// A single scored item. `step` orders items within their category; the
/// canonical listing order is (test, category, step) ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
  pub item_id:     i64,
  pub test_id:     i64,
  pub category_id: i64,
  pub step:        i64,
  pub is_verbal:   bool,
  pub instruction: String,
  pub description: String,
  pub document:    Option<String>,
}

/// Fields for a new item.
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
  pub test_id:     i64,
  pub category_id: i64,
  pub step:        i64,
  #[serde(default)]
  pub is_verbal:   bool,
  pub instruction: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub document:    Option<String>,
}

// ─── Percentiles ─────────────────────────────────────────────────────────────

/// One (item, month, percent) row: the population percentile of children who
/// have completed the item by the given age in months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentileEntry {
  pub item_id: i64,
  pub month:   i64,
  pub percent: i64,
}

/// The assembled month → percent lookup for one item. Absent months simply
/// aren't keys. An item with no entries at all yields `None` from the store,
/// never an empty map.
pub type PercentileTable = BTreeMap<i64, i64>;

// ─── Nested read views ───────────────────────────────────────────────────────

/// A test with its categories and their items, as returned by the detail
/// endpoint. Items are ordered by (category, step) ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDetail {
  pub test_id:    i64,
  pub name:       String,
  pub categories: Vec<CategoryDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDetail {
  pub category_id: i64,
  pub name:        String,
  pub items:       Vec<ItemSummary>,
}

/// The slice of an item exposed in the nested catalog view. Linkage ids are
/// not re-exposed here; they are implied by the nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
  pub step:        i64,
  pub instruction: String,
  pub description: String,
}
