//! Output rendering for CLI commands.

use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::lures::Lure;
use crate::notify::Notification;
use crate::storage::{LogStats, StoredNotification};
use crate::terms::TermMatcher;

use super::OutputFormat;

/// Render identified lures.
///
/// # Errors
///
/// Returns an error if writing or JSON encoding fails.
pub fn lures(out: &mut impl Write, lures: &[Lure], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(lures)?)?,
        OutputFormat::Plain => {
            for lure in lures {
                writeln!(out, "{lure}")?;
            }
        }
        OutputFormat::Table => {
            let width = column_width(lures.iter().map(|l| l.domain.as_str()), "DOMAIN");
            writeln!(out, "{:<width$}  TERMS", "DOMAIN")?;
            for lure in lures {
                writeln!(out, "{:<width$}  {}", lure.domain, lure.matched_terms.join(", "))?;
            }
            writeln!(out, "\n{} lure(s)", lures.len())?;
        }
    }
    Ok(())
}

/// Render planned notifications.
///
/// # Errors
///
/// Returns an error if writing or JSON encoding fails.
pub fn notifications(
    out: &mut impl Write,
    notifications: &[Notification],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(notifications)?)?;
        }
        OutputFormat::Plain => {
            for n in notifications {
                writeln!(out, "{} -> {}", n.domain, users_or_none(&n.users))?;
            }
        }
        OutputFormat::Table => {
            let width = column_width(notifications.iter().map(|n| n.domain.as_str()), "DOMAIN");
            writeln!(out, "{:<width$}  USERS", "DOMAIN")?;
            for n in notifications {
                writeln!(out, "{:<width$}  {}", n.domain, users_or_none(&n.users))?;
            }
            writeln!(out, "\n{} notification(s)", notifications.len())?;
        }
    }
    Ok(())
}

/// Render notifications read back from the log.
///
/// # Errors
///
/// Returns an error if writing or JSON encoding fails.
pub fn stored(
    out: &mut impl Write,
    rows: &[StoredNotification],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(rows)?)?,
        OutputFormat::Plain => {
            for row in rows {
                writeln!(
                    out,
                    "{} {} {} [{}]",
                    row.notified_at.to_rfc3339(),
                    row.user_id,
                    row.domain,
                    row.terms.join(", ")
                )?;
            }
        }
        OutputFormat::Table => {
            let user_width = column_width(rows.iter().map(|r| r.user_id.as_str()), "USER");
            let domain_width = column_width(rows.iter().map(|r| r.domain.as_str()), "DOMAIN");
            writeln!(
                out,
                "{:<20}  {:<user_width$}  {:<domain_width$}  TERMS",
                "NOTIFIED", "USER", "DOMAIN"
            )?;
            for row in rows {
                writeln!(
                    out,
                    "{:<20}  {:<user_width$}  {:<domain_width$}  {}",
                    row.notified_at.format("%Y-%m-%d %H:%M:%S"),
                    row.user_id,
                    row.domain,
                    row.terms.join(", ")
                )?;
            }
            writeln!(out, "\n{} result(s)", rows.len())?;
        }
    }
    Ok(())
}

/// Render the active term list.
///
/// # Errors
///
/// Returns an error if writing or JSON encoding fails.
pub fn terms(out: &mut impl Write, matcher: &TermMatcher, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "terms": matcher.terms(),
            "min_matches": matcher.min_matches(),
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        writeln!(out, "Terms ({}):", matcher.terms().len())?;
        for term in matcher.terms() {
            writeln!(out, "  {term}")?;
        }
        writeln!(out, "A domain is a lure at {} or more matches.", matcher.min_matches())?;
    }
    Ok(())
}

/// Render notification log statistics.
///
/// # Errors
///
/// Returns an error if writing or JSON encoding fails.
pub fn status(out: &mut impl Write, stats: &LogStats, path: &Path, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "database_path": path,
            "stats": stats,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        writeln!(out, "lurewatch status")?;
        writeln!(out, "----------------")?;
        writeln!(out, "Database:        {}", path.display())?;
        writeln!(out, "Size:            {} bytes", stats.db_size_bytes)?;
        writeln!(out, "Scan runs:       {}", stats.total_runs)?;
        writeln!(out, "Notifications:   {}", stats.total_notifications)?;
        writeln!(out, "Users notified:  {}", stats.distinct_users)?;
        writeln!(out, "Lure domains:    {}", stats.distinct_domains)?;
        match stats.newest_notification {
            Some(ts) => writeln!(out, "Last notified:   {}", ts.to_rfc3339())?,
            None => writeln!(out, "Last notified:   never")?,
        }
    }
    Ok(())
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values.map(str::len).max().unwrap_or(0).max(header.len())
}

fn users_or_none(users: &[String]) -> String {
    if users.is_empty() {
        "(no subscribers)".to_string()
    } else {
        users.join(", ")
    }
}
