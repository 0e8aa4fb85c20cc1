//! The `AssessmentStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `sprout-store-sqlite`).
//! The API layer depends on this abstraction, not on any concrete backend.
//!
//! Domain outcomes are expressed in the types: "not found" is `Option::None`,
//! assignment results are an [`AssignOutcome`]. The associated `Error` is
//! reserved for storage failures, which the transport layer converts to a
//! generic server error.

use std::future::Future;

use crate::{
  account::{Account, NewAccount, ProfileUpdate},
  catalog::{Category, Item, NewItem, PercentileTable, Test, TestDetail},
  child::{Child, ChildUpdate, Comment, NewChild},
  progress::{AssignOutcome, ProgressRecord},
};

/// Abstraction over a Sprout storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait AssessmentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Persist a new account. The caller has already validated the fields and
  /// hashed the credential. Email uniqueness is also enforced by the backend
  /// as a final backstop.
  fn create_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  fn account_by_id(
    &self,
    account_id: i64,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Look up an account by its normalized email.
  fn account_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Apply a partial profile update. The role never changes here — the
  /// update type has no role field. Returns `None` if the account is gone.
  fn update_profile(
    &self,
    account_id: i64,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  // ── Auth tokens ───────────────────────────────────────────────────────

  /// Store the hash of a freshly issued token for `account_id`.
  fn insert_token(
    &self,
    account_id: i64,
    token_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Resolve a presented token (by its hash) to an active account.
  fn account_by_token_hash(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  // ── Children ──────────────────────────────────────────────────────────

  /// Create a child and link it to the creating account.
  fn create_child(
    &self,
    owner_id: i64,
    input: NewChild,
  ) -> impl Future<Output = Result<Child, Self::Error>> + Send + '_;

  fn get_child(
    &self,
    child_id: i64,
  ) -> impl Future<Output = Result<Option<Child>, Self::Error>> + Send + '_;

  fn update_child(
    &self,
    child_id: i64,
    update: ChildUpdate,
  ) -> impl Future<Output = Result<Option<Child>, Self::Error>> + Send + '_;

  /// Delete a child and, via cascade, its comments and progress records.
  /// Returns `false` if there was nothing to delete.
  fn delete_child(
    &self,
    child_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Whether `child_id` is linked to `account_id`. The access-control layer
  /// treats an unlinked child as fully private.
  fn child_linked(
    &self,
    account_id: i64,
    child_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn add_comment(
    &self,
    child_id: i64,
    comment: String,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Comments for a child, oldest first.
  fn comments_for_child(
    &self,
    child_id: i64,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  // ── Catalog ───────────────────────────────────────────────────────────

  fn create_test(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Test, Self::Error>> + Send + '_;

  /// All tests, in storage order.
  fn list_tests(
    &self,
  ) -> impl Future<Output = Result<Vec<Test>, Self::Error>> + Send + '_;

  /// The nested detail view: categories with their items ordered by
  /// (category, step) ascending.
  fn test_detail(
    &self,
    test_id: i64,
  ) -> impl Future<Output = Result<Option<TestDetail>, Self::Error>> + Send + '_;

  fn rename_test(
    &self,
    test_id: i64,
    name: String,
  ) -> impl Future<Output = Result<Option<Test>, Self::Error>> + Send + '_;

  /// Delete a test and, via cascade, its categories, items, percentile
  /// entries and progress records.
  fn delete_test(
    &self,
    test_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Create a category under `test_id`. Returns `None` if the test is gone.
  fn create_category(
    &self,
    test_id: i64,
    name: String,
  ) -> impl Future<Output = Result<Option<Category>, Self::Error>> + Send + '_;

  /// Create an item. Returns `None` if the category does not exist or does
  /// not belong to the named test.
  fn create_item(
    &self,
    input: NewItem,
  ) -> impl Future<Output = Result<Option<Item>, Self::Error>> + Send + '_;

  fn get_item(
    &self,
    item_id: i64,
  ) -> impl Future<Output = Result<Option<Item>, Self::Error>> + Send + '_;

  /// Record one (month, percent) entry for an item. Returns `false` if the
  /// item does not exist.
  fn add_percentile(
    &self,
    item_id: i64,
    month: i64,
    percent: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// The month → percent lookup table for an item, or `None` when the item
  /// has no entries at all.
  fn item_percentiles(
    &self,
    item_id: i64,
  ) -> impl Future<Output = Result<Option<PercentileTable>, Self::Error>> + Send + '_;

  // ── Progress ledger ───────────────────────────────────────────────────

  /// Assign a test to a child: create one incomplete record per item of the
  /// test. Rejected when the child already holds a record for any item of
  /// the test.
  fn assign_test(
    &self,
    child_id: i64,
    test_id: i64,
  ) -> impl Future<Output = Result<AssignOutcome, Self::Error>> + Send + '_;

  /// All records for a child, ordered by item.
  fn records_for_child(
    &self,
    child_id: i64,
  ) -> impl Future<Output = Result<Vec<ProgressRecord>, Self::Error>> + Send + '_;

  /// Flip the completion flag on one of `child_id`'s records. Returns `None`
  /// if the record does not exist or belongs to another child.
  fn set_record_complete(
    &self,
    child_id: i64,
    record_id: i64,
    is_complete: bool,
  ) -> impl Future<Output = Result<Option<ProgressRecord>, Self::Error>> + Send + '_;
}
