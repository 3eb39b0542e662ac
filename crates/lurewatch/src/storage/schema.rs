//! `SQLite` schema definitions for the notification log.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the scan runs table.
pub const CREATE_RUNS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    domains_scanned INTEGER NOT NULL DEFAULT 0,
    lures INTEGER NOT NULL DEFAULT 0,
    notifications INTEGER NOT NULL DEFAULT 0
)
";

/// SQL statement to create the notifications table.
///
/// One row per (domain, user). `dedup_hash` is the BLAKE3 hash of the pair.
pub const CREATE_NOTIFICATIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS notifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    domain TEXT NOT NULL,
    user_id TEXT NOT NULL,
    terms TEXT NOT NULL,
    dedup_hash TEXT NOT NULL UNIQUE,
    notified_at TEXT NOT NULL
)
";

/// SQL statement to create an index on `user_id` for per-user lookups.
pub const CREATE_USER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id)
";

/// SQL statement to create an index on `domain` for per-domain lookups.
pub const CREATE_DOMAIN_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_notifications_domain ON notifications(domain)
";

/// SQL statement to create an index on `notified_at` for recency queries and pruning.
pub const CREATE_NOTIFIED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_notifications_notified_at ON notifications(notified_at DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_RUNS_TABLE,
    CREATE_NOTIFICATIONS_TABLE,
    CREATE_USER_INDEX,
    CREATE_DOMAIN_INDEX,
    CREATE_NOTIFIED_AT_INDEX,
    CREATE_METADATA_TABLE,
];
