//! SQL schema for the Sprout SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    account_id    INTEGER PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,   -- normalized: trimmed, lowercased
    name          TEXT NOT NULL,
    password_hash TEXT NOT NULL,          -- argon2 PHC string
    role          TEXT NOT NULL,          -- 'Tester' | 'Parent' | 'Staff'
    is_active     INTEGER NOT NULL DEFAULT 1,
    is_staff      INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

-- Opaque auth tokens, stored hashed. The plaintext token is returned to the
-- client exactly once and never persisted.
CREATE TABLE IF NOT EXISTS auth_tokens (
    token_hash  TEXT PRIMARY KEY,
    account_id  INTEGER NOT NULL REFERENCES accounts(account_id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS children (
    child_id  INTEGER PRIMARY KEY,
    slug      TEXT NOT NULL,              -- stable human-unreadable UUID
    name      TEXT NOT NULL,
    birthday  TEXT NOT NULL               -- ISO 8601 date
);

-- Many-to-many account <-> child links. Shared, non-exclusive: several
-- accounts may reference the same child.
CREATE TABLE IF NOT EXISTS account_children (
    account_id  INTEGER NOT NULL REFERENCES accounts(account_id) ON DELETE CASCADE,
    child_id    INTEGER NOT NULL REFERENCES children(child_id)   ON DELETE CASCADE,
    PRIMARY KEY (account_id, child_id)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id  INTEGER PRIMARY KEY,
    child_id    INTEGER NOT NULL REFERENCES children(child_id) ON DELETE CASCADE,
    comment     TEXT NOT NULL,
    created     TEXT NOT NULL             -- set once, never mutated
);

CREATE TABLE IF NOT EXISTS tests (
    test_id  INTEGER PRIMARY KEY,
    name     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    category_id  INTEGER PRIMARY KEY,
    test_id      INTEGER NOT NULL REFERENCES tests(test_id) ON DELETE CASCADE,
    name         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS items (
    item_id      INTEGER PRIMARY KEY,
    test_id      INTEGER NOT NULL REFERENCES tests(test_id)           ON DELETE CASCADE,
    category_id  INTEGER NOT NULL REFERENCES categories(category_id)  ON DELETE CASCADE,
    step         INTEGER NOT NULL,        -- ordering key within the category
    is_verbal    INTEGER NOT NULL DEFAULT 0,
    instruction  TEXT NOT NULL,
    description  TEXT NOT NULL DEFAULT '',
    document     TEXT
);

CREATE TABLE IF NOT EXISTS percentiles (
    percentile_id  INTEGER PRIMARY KEY,
    item_id        INTEGER NOT NULL REFERENCES items(item_id) ON DELETE CASCADE,
    month          INTEGER NOT NULL,
    percent        INTEGER NOT NULL,
    UNIQUE (item_id, month)
);

CREATE TABLE IF NOT EXISTS progress_records (
    record_id      INTEGER PRIMARY KEY,
    child_id       INTEGER NOT NULL REFERENCES children(child_id) ON DELETE CASCADE,
    item_id        INTEGER NOT NULL REFERENCES items(item_id)     ON DELETE CASCADE,
    is_complete    INTEGER NOT NULL DEFAULT 0,
    last_checkout  TEXT NOT NULL,         -- set once at creation
    UNIQUE (child_id, item_id)
);

CREATE INDEX IF NOT EXISTS items_order_idx     ON items(test_id, category_id, step);
CREATE INDEX IF NOT EXISTS percentiles_item_idx ON percentiles(item_id);
CREATE INDEX IF NOT EXISTS records_child_idx   ON progress_records(child_id);
CREATE INDEX IF NOT EXISTS comments_child_idx  ON comments(child_id);

PRAGMA user_version = 1;
";
