//! Notification log.
//!
//! This module provides `SQLite`-based persistent storage for delivered
//! notifications, so they can be looked up later by user or by domain and
//! so a user is never alerted twice about the same domain.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::notify::Notification;

/// Storage engine for notifications.
#[derive(Debug)]
pub struct NotificationLog {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

/// A notification row as stored in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNotification {
    /// Row id.
    pub id: i64,
    /// The scan run that produced this notification.
    pub run_id: i64,
    /// The lure domain.
    pub domain: String,
    /// The notified user.
    pub user_id: String,
    /// Terms that flagged the domain.
    pub terms: Vec<String>,
    /// When the notification was recorded.
    pub notified_at: DateTime<Utc>,
}

/// Counters written when a scan run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Domains read.
    pub domains_scanned: usize,
    /// Lures identified.
    pub lures: usize,
    /// Notifications planned.
    pub notifications: usize,
}

/// Statistics about the notification log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogStats {
    /// Total notification rows.
    pub total_notifications: i64,
    /// Number of recorded scan runs.
    pub total_runs: i64,
    /// Distinct notified users.
    pub distinct_users: i64,
    /// Distinct lure domains.
    pub distinct_domains: i64,
    /// Timestamp of the newest notification.
    pub newest_notification: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// Stable dedup key for a (domain, user) pair.
#[must_use]
pub fn dedup_hash(domain: &str, user: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain.to_lowercase().as_bytes());
    hasher.update(&[0]);
    hasher.update(user.as_bytes());
    hasher.finalize().to_hex().to_string()
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl NotificationLog {
    /// Open or create a notification log at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening notification log at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Notification log opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory log for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start a scan run and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn begin_run(&self) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO runs (started_at) VALUES (?1)",
            [Utc::now().to_rfc3339()],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(run_id = id, "Started scan run");
        Ok(id)
    }

    /// Close a scan run with its counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn finish_run(&self, run_id: i64, summary: RunSummary) -> Result<()> {
        self.conn.execute(
            r"
            UPDATE runs
            SET finished_at = ?1, domains_scanned = ?2, lures = ?3, notifications = ?4
            WHERE id = ?5
            ",
            params![
                Utc::now().to_rfc3339(),
                to_i64(summary.domains_scanned),
                to_i64(summary.lures),
                to_i64(summary.notifications),
                run_id,
            ],
        )?;
        Ok(())
    }

    /// Record a notification, one row per user.
    ///
    /// Users already notified about the domain are skipped. The rows are
    /// written in one transaction. Returns the number of new rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn record(&self, run_id: i64, notification: &Notification) -> Result<usize> {
        let terms = serde_json::to_string(&notification.terms)?;
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.unchecked_transaction()?;
        let mut stmt = tx.prepare_cached(
            r"
            INSERT OR IGNORE INTO notifications
                (run_id, domain, user_id, terms, dedup_hash, notified_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )?;

        let mut inserted = 0;
        for user in &notification.users {
            let hash = dedup_hash(&notification.domain, user);
            inserted += stmt.execute(params![
                run_id,
                notification.domain,
                user,
                terms,
                hash,
                now
            ])?;
        }
        drop(stmt);
        tx.commit()?;

        if inserted < notification.users.len() {
            debug!(
                domain = %notification.domain,
                skipped = notification.users.len() - inserted,
                "Skipped users already notified"
            );
        }
        Ok(inserted)
    }

    /// Notifications sent to `user`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn for_user(&self, user: &str, limit: usize) -> Result<Vec<StoredNotification>> {
        self.query(
            r"
            SELECT id, run_id, domain, user_id, terms, notified_at
            FROM notifications WHERE user_id = ?1
            ORDER BY notified_at DESC, id DESC LIMIT ?2
            ",
            params![user, to_i64(limit)],
        )
    }

    /// Notifications about `domain` (case-insensitive), newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn for_domain(&self, domain: &str, limit: usize) -> Result<Vec<StoredNotification>> {
        self.query(
            r"
            SELECT id, run_id, domain, user_id, terms, notified_at
            FROM notifications WHERE domain = ?1 COLLATE NOCASE
            ORDER BY notified_at DESC, id DESC LIMIT ?2
            ",
            params![domain, to_i64(limit)],
        )
    }

    /// The most recent notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredNotification>> {
        self.query(
            r"
            SELECT id, run_id, domain, user_id, terms, notified_at
            FROM notifications ORDER BY notified_at DESC, id DESC LIMIT ?1
            ",
            params![to_i64(limit)],
        )
    }

    fn query(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<StoredNotification>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, Self::row_to_notification)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Count notification rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notifications", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete notifications older than `max_age`. Returns the number removed.
    ///
    /// A `max_age` reaching past the earliest representable time prunes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn prune_older_than(&self, max_age: Duration) -> Result<usize> {
        let Some(cutoff) = Utc::now().checked_sub_signed(max_age) else {
            debug!("Retention window predates the calendar, nothing to prune");
            return Ok(0);
        };
        let cutoff = cutoff.to_rfc3339();
        let affected = self
            .conn
            .execute("DELETE FROM notifications WHERE notified_at < ?1", [cutoff])?;

        if affected > 0 {
            info!("Pruned {} old notifications", affected);
        }
        Ok(affected)
    }

    /// Get log statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<LogStats> {
        let (total_notifications, distinct_users, distinct_domains): (i64, i64, i64) =
            self.conn.query_row(
                r"
                SELECT COUNT(*), COUNT(DISTINCT user_id), COUNT(DISTINCT lower(domain))
                FROM notifications
                ",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        let total_runs: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;

        let newest: Option<String> = self
            .conn
            .query_row(
                "SELECT notified_at FROM notifications ORDER BY notified_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let newest_notification = newest
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(LogStats {
            total_notifications,
            total_runs,
            distinct_users,
            distinct_domains,
            newest_notification,
            db_size_bytes,
        })
    }

    fn row_to_notification(row: &rusqlite::Row) -> rusqlite::Result<StoredNotification> {
        let terms_json: String = row.get(4)?;
        let notified_at: String = row.get(5)?;

        let terms = serde_json::from_str(&terms_json).unwrap_or_else(|e| {
            warn!(error = %e, "Unreadable terms column, treating as empty");
            Vec::new()
        });
        let notified_at = DateTime::parse_from_rfc3339(&notified_at)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

        Ok(StoredNotification {
            id: row.get(0)?,
            run_id: row.get(1)?,
            domain: row.get(2)?,
            user_id: row.get(3)?,
            terms,
            notified_at,
        })
    }
}
