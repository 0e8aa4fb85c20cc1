//! [`SqliteStore`] — the SQLite implementation of [`AssessmentStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use sprout_core::{
  account::{Account, NewAccount, ProfileUpdate},
  catalog::{Category, Item, NewItem, PercentileTable, Test, TestDetail},
  catalog::{CategoryDetail, ItemSummary},
  child::{Child, ChildUpdate, Comment, NewChild},
  progress::{AssignOutcome, ProgressRecord},
  store::AssessmentStore,
};

use crate::{
  encode::{
    RawAccount, RawChild, RawComment, RawRecord, encode_date, encode_dt,
    encode_role, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Row mappers ─────────────────────────────────────────────────────────────

const ACCOUNT_COLUMNS: &str =
  "account_id, email, name, password_hash, role, is_active, is_staff, created_at";

fn account_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawAccount> {
  Ok(RawAccount {
    account_id:    row.get(0)?,
    email:         row.get(1)?,
    name:          row.get(2)?,
    password_hash: row.get(3)?,
    role:          row.get(4)?,
    is_active:     row.get(5)?,
    is_staff:      row.get(6)?,
    created_at:    row.get(7)?,
  })
}

fn child_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawChild> {
  Ok(RawChild {
    child_id: row.get(0)?,
    slug:     row.get(1)?,
    name:     row.get(2)?,
    birthday: row.get(3)?,
  })
}

fn record_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawRecord> {
  Ok(RawRecord {
    record_id:     row.get(0)?,
    child_id:      row.get(1)?,
    item_id:       row.get(2)?,
    is_complete:   row.get(3)?,
    last_checkout: row.get(4)?,
  })
}

/// Intermediate result of the assign fan-out, before timestamp decoding.
enum RawAssign {
  Assigned(Vec<RawRecord>),
  AlreadyAssigned,
  NoSuchTest,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Sprout assessment store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch one account by an arbitrary WHERE clause with a single parameter.
  async fn account_where<P>(
    &self,
    where_clause: &'static str,
    param: P,
  ) -> Result<Option<Account>>
  where
    P: rusqlite::ToSql + Send + 'static,
  {
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {where_clause}"),
              rusqlite::params![param],
              account_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }
}

// ─── AssessmentStore impl ────────────────────────────────────────────────────

impl AssessmentStore for SqliteStore {
  type Error = Error;

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn create_account(&self, input: NewAccount) -> Result<Account> {
    let created_at = Utc::now();
    let at_str     = encode_dt(created_at);
    let role_str   = encode_role(input.role).to_owned();
    let email      = input.email.clone();
    let name       = input.name.clone();
    let hash       = input.password_hash.clone();

    let is_staff = input.is_staff;

    let account_id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO accounts (email, name, password_hash, role, is_active, is_staff, created_at)
           VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)",
          rusqlite::params![email, name, hash, role_str, is_staff, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Account {
      account_id,
      email: input.email,
      name: input.name,
      password_hash: input.password_hash,
      role: input.role,
      is_active: true,
      is_staff,
      created_at,
    })
  }

  async fn account_by_id(&self, account_id: i64) -> Result<Option<Account>> {
    self.account_where("account_id = ?1", account_id).await
  }

  async fn account_by_email(&self, email: String) -> Result<Option<Account>> {
    self.account_where("email = ?1", email).await
  }

  async fn update_profile(
    &self,
    account_id: i64,
    update: ProfileUpdate,
  ) -> Result<Option<Account>> {
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        let existing = conn
          .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?1"),
            rusqlite::params![account_id],
            account_from_row,
          )
          .optional()?;

        let Some(mut raw) = existing else {
          return Ok(None);
        };

        if let Some(email) = update.email {
          raw.email = email;
        }
        if let Some(name) = update.name {
          raw.name = name;
        }
        if let Some(hash) = update.password_hash {
          raw.password_hash = hash;
        }

        conn.execute(
          "UPDATE accounts SET email = ?1, name = ?2, password_hash = ?3
           WHERE account_id = ?4",
          rusqlite::params![raw.email, raw.name, raw.password_hash, account_id],
        )?;

        Ok(Some(raw))
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  // ── Auth tokens ───────────────────────────────────────────────────────────

  async fn insert_token(&self, account_id: i64, token_hash: String) -> Result<()> {
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO auth_tokens (token_hash, account_id, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![token_hash, account_id, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn account_by_token_hash(&self, token_hash: String) -> Result<Option<Account>> {
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ACCOUNT_COLUMNS} FROM accounts
                 WHERE account_id = (SELECT account_id FROM auth_tokens WHERE token_hash = ?1)
                   AND is_active = 1"
              ),
              rusqlite::params![token_hash],
              account_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  // ── Children ──────────────────────────────────────────────────────────────

  async fn create_child(&self, owner_id: i64, input: NewChild) -> Result<Child> {
    let slug     = Uuid::new_v4();
    let slug_str = encode_uuid(slug);
    let name     = input.name.clone();
    let birthday = encode_date(input.birthday);

    let child_id: i64 = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO children (slug, name, birthday) VALUES (?1, ?2, ?3)",
          rusqlite::params![slug_str, name, birthday],
        )?;
        let child_id = tx.last_insert_rowid();
        tx.execute(
          "INSERT INTO account_children (account_id, child_id) VALUES (?1, ?2)",
          rusqlite::params![owner_id, child_id],
        )?;
        tx.commit()?;
        Ok(child_id)
      })
      .await?;

    Ok(Child {
      child_id,
      slug,
      name: input.name,
      birthday: input.birthday,
    })
  }

  async fn get_child(&self, child_id: i64) -> Result<Option<Child>> {
    let raw: Option<RawChild> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT child_id, slug, name, birthday FROM children WHERE child_id = ?1",
              rusqlite::params![child_id],
              child_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawChild::into_child).transpose()
  }

  async fn update_child(
    &self,
    child_id: i64,
    update: ChildUpdate,
  ) -> Result<Option<Child>> {
    let birthday_str = update.birthday.map(encode_date);

    let raw: Option<RawChild> = self
      .conn
      .call(move |conn| {
        let existing = conn
          .query_row(
            "SELECT child_id, slug, name, birthday FROM children WHERE child_id = ?1",
            rusqlite::params![child_id],
            child_from_row,
          )
          .optional()?;

        let Some(mut raw) = existing else {
          return Ok(None);
        };

        if let Some(name) = update.name {
          raw.name = name;
        }
        if let Some(birthday) = birthday_str {
          raw.birthday = birthday;
        }

        conn.execute(
          "UPDATE children SET name = ?1, birthday = ?2 WHERE child_id = ?3",
          rusqlite::params![raw.name, raw.birthday, child_id],
        )?;

        Ok(Some(raw))
      })
      .await?;

    raw.map(RawChild::into_child).transpose()
  }

  async fn delete_child(&self, child_id: i64) -> Result<bool> {
    let deleted: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM children WHERE child_id = ?1",
          rusqlite::params![child_id],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn child_linked(&self, account_id: i64, child_id: i64) -> Result<bool> {
    let linked: bool = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM account_children WHERE account_id = ?1 AND child_id = ?2",
              rusqlite::params![account_id, child_id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(linked)
  }

  async fn add_comment(&self, child_id: i64, comment: String) -> Result<Comment> {
    let created = Utc::now();
    let at_str  = encode_dt(created);
    let text    = comment.clone();

    let comment_id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (child_id, comment, created) VALUES (?1, ?2, ?3)",
          rusqlite::params![child_id, text, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Comment { comment_id, child_id, comment, created })
  }

  async fn comments_for_child(&self, child_id: i64) -> Result<Vec<Comment>> {
    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT comment_id, child_id, comment, created FROM comments
           WHERE child_id = ?1 ORDER BY comment_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![child_id], |row| {
            Ok(RawComment {
              comment_id: row.get(0)?,
              child_id:   row.get(1)?,
              comment:    row.get(2)?,
              created:    row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn create_test(&self, name: String) -> Result<Test> {
    let name_param = name.clone();
    let test_id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tests (name) VALUES (?1)",
          rusqlite::params![name_param],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Test { test_id, name })
  }

  async fn list_tests(&self) -> Result<Vec<Test>> {
    let tests: Vec<Test> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT test_id, name FROM tests")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Test { test_id: row.get(0)?, name: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(tests)
  }

  async fn test_detail(&self, test_id: i64) -> Result<Option<TestDetail>> {
    let detail: Option<TestDetail> = self
      .conn
      .call(move |conn| {
        let test = conn
          .query_row(
            "SELECT test_id, name FROM tests WHERE test_id = ?1",
            rusqlite::params![test_id],
            |row| Ok(Test { test_id: row.get(0)?, name: row.get(1)? }),
          )
          .optional()?;

        let Some(test) = test else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT category_id, name FROM categories
           WHERE test_id = ?1 ORDER BY category_id",
        )?;
        let mut categories = stmt
          .query_map(rusqlite::params![test_id], |row| {
            Ok(CategoryDetail {
              category_id: row.get(0)?,
              name:        row.get(1)?,
              items:       Vec::new(),
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        // Items arrive pre-sorted by (category, step); distribute them over
        // the category list in one pass.
        let mut stmt = conn.prepare(
          "SELECT category_id, step, instruction, description FROM items
           WHERE test_id = ?1 ORDER BY category_id, step",
        )?;
        let items = stmt
          .query_map(rusqlite::params![test_id], |row| {
            let category_id: i64 = row.get(0)?;
            Ok((
              category_id,
              ItemSummary {
                step:        row.get(1)?,
                instruction: row.get(2)?,
                description: row.get(3)?,
              },
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        for (category_id, item) in items {
          if let Some(cat) =
            categories.iter_mut().find(|c| c.category_id == category_id)
          {
            cat.items.push(item);
          }
        }

        Ok(Some(TestDetail {
          test_id: test.test_id,
          name:    test.name,
          categories,
        }))
      })
      .await?;

    Ok(detail)
  }

  async fn rename_test(&self, test_id: i64, name: String) -> Result<Option<Test>> {
    let name_param = name.clone();
    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE tests SET name = ?1 WHERE test_id = ?2",
          rusqlite::params![name_param, test_id],
        )?)
      })
      .await?;

    Ok((changed > 0).then_some(Test { test_id, name }))
  }

  async fn delete_test(&self, test_id: i64) -> Result<bool> {
    let deleted: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM tests WHERE test_id = ?1",
          rusqlite::params![test_id],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn create_category(
    &self,
    test_id: i64,
    name: String,
  ) -> Result<Option<Category>> {
    let name_param = name.clone();
    let category_id: Option<i64> = self
      .conn
      .call(move |conn| {
        let exists: bool = conn
          .query_row(
            "SELECT 1 FROM tests WHERE test_id = ?1",
            rusqlite::params![test_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !exists {
          return Ok(None);
        }

        conn.execute(
          "INSERT INTO categories (test_id, name) VALUES (?1, ?2)",
          rusqlite::params![test_id, name_param],
        )?;
        Ok(Some(conn.last_insert_rowid()))
      })
      .await?;

    Ok(category_id.map(|category_id| Category { category_id, test_id, name }))
  }

  async fn create_item(&self, input: NewItem) -> Result<Option<Item>> {
    let NewItem {
      test_id,
      category_id,
      step,
      is_verbal,
      instruction,
      description,
      document,
    } = input;

    let instruction_param = instruction.clone();
    let description_param = description.clone();
    let document_param    = document.clone();

    let item_id: Option<i64> = self
      .conn
      .call(move |conn| {
        // The category must exist and belong to the named test.
        let owner: Option<i64> = conn
          .query_row(
            "SELECT test_id FROM categories WHERE category_id = ?1",
            rusqlite::params![category_id],
            |row| row.get(0),
          )
          .optional()?;

        if owner != Some(test_id) {
          return Ok(None);
        }

        conn.execute(
          "INSERT INTO items (test_id, category_id, step, is_verbal, instruction, description, document)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            test_id,
            category_id,
            step,
            is_verbal,
            instruction_param,
            description_param,
            document_param,
          ],
        )?;
        Ok(Some(conn.last_insert_rowid()))
      })
      .await?;

    Ok(item_id.map(|item_id| Item {
      item_id,
      test_id,
      category_id,
      step,
      is_verbal,
      instruction,
      description,
      document,
    }))
  }

  async fn get_item(&self, item_id: i64) -> Result<Option<Item>> {
    let item: Option<Item> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT item_id, test_id, category_id, step, is_verbal,
                      instruction, description, document
               FROM items WHERE item_id = ?1",
              rusqlite::params![item_id],
              |row| {
                Ok(Item {
                  item_id:     row.get(0)?,
                  test_id:     row.get(1)?,
                  category_id: row.get(2)?,
                  step:        row.get(3)?,
                  is_verbal:   row.get(4)?,
                  instruction: row.get(5)?,
                  description: row.get(6)?,
                  document:    row.get(7)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(item)
  }

  async fn add_percentile(&self, item_id: i64, month: i64, percent: i64) -> Result<bool> {
    let inserted: bool = self
      .conn
      .call(move |conn| {
        let exists: bool = conn
          .query_row(
            "SELECT 1 FROM items WHERE item_id = ?1",
            rusqlite::params![item_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !exists {
          return Ok(false);
        }

        // One entry per (item, month); a repeated month replaces the percent.
        conn.execute(
          "INSERT INTO percentiles (item_id, month, percent) VALUES (?1, ?2, ?3)
           ON CONFLICT (item_id, month) DO UPDATE SET percent = excluded.percent",
          rusqlite::params![item_id, month, percent],
        )?;
        Ok(true)
      })
      .await?;
    Ok(inserted)
  }

  async fn item_percentiles(&self, item_id: i64) -> Result<Option<PercentileTable>> {
    let pairs: Vec<(i64, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT month, percent FROM percentiles WHERE item_id = ?1 ORDER BY month",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![item_id], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // "No data" is an explicit sentinel, never an empty map.
    if pairs.is_empty() {
      return Ok(None);
    }
    Ok(Some(pairs.into_iter().collect()))
  }

  // ── Progress ledger ───────────────────────────────────────────────────────

  async fn assign_test(&self, child_id: i64, test_id: i64) -> Result<AssignOutcome> {
    let at_str = encode_dt(Utc::now());

    let raw: RawAssign = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let test_exists: bool = tx
          .query_row(
            "SELECT 1 FROM tests WHERE test_id = ?1",
            rusqlite::params![test_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if !test_exists {
          return Ok(RawAssign::NoSuchTest);
        }

        // Any existing record for an item of this test means the test was
        // already assigned to this child.
        let already: bool = tx
          .query_row(
            "SELECT 1 FROM progress_records pr
             JOIN items i ON i.item_id = pr.item_id
             WHERE pr.child_id = ?1 AND i.test_id = ?2
             LIMIT 1",
            rusqlite::params![child_id, test_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if already {
          return Ok(RawAssign::AlreadyAssigned);
        }

        let item_ids: Vec<i64> = {
          let mut stmt = tx.prepare(
            "SELECT item_id FROM items WHERE test_id = ?1
             ORDER BY category_id, step",
          )?;
          stmt
            .query_map(rusqlite::params![test_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut records = Vec::with_capacity(item_ids.len());
        for item_id in item_ids {
          tx.execute(
            "INSERT INTO progress_records (child_id, item_id, is_complete, last_checkout)
             VALUES (?1, ?2, 0, ?3)",
            rusqlite::params![child_id, item_id, at_str],
          )?;
          records.push(RawRecord {
            record_id:     tx.last_insert_rowid(),
            child_id,
            item_id,
            is_complete:   false,
            last_checkout: at_str.clone(),
          });
        }

        tx.commit()?;
        Ok(RawAssign::Assigned(records))
      })
      .await?;

    match raw {
      RawAssign::NoSuchTest => Ok(AssignOutcome::NoSuchTest),
      RawAssign::AlreadyAssigned => Ok(AssignOutcome::AlreadyAssigned),
      RawAssign::Assigned(raws) => {
        let records = raws
          .into_iter()
          .map(RawRecord::into_record)
          .collect::<Result<Vec<_>>>()?;
        Ok(AssignOutcome::Assigned(records))
      }
    }
  }

  async fn records_for_child(&self, child_id: i64) -> Result<Vec<ProgressRecord>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT record_id, child_id, item_id, is_complete, last_checkout
           FROM progress_records WHERE child_id = ?1 ORDER BY item_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![child_id], record_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn set_record_complete(
    &self,
    child_id: i64,
    record_id: i64,
    is_complete: bool,
  ) -> Result<Option<ProgressRecord>> {
    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE progress_records SET is_complete = ?1
           WHERE record_id = ?2 AND child_id = ?3",
          rusqlite::params![is_complete, record_id, child_id],
        )?;

        if changed == 0 {
          return Ok(None);
        }

        Ok(
          conn
            .query_row(
              "SELECT record_id, child_id, item_id, is_complete, last_checkout
               FROM progress_records WHERE record_id = ?1",
              rusqlite::params![record_id],
              record_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }
}
