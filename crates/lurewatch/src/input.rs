//! Input file loaders.
//!
//! Domains come as plain text, one per line. Subscriptions and the reporting
//! graph come as JSON lines:
//!
//! ```text
//! {"id": "B", "term": "login"}
//! {"id": "A", "reports_to": "C"}
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::hierarchy::TeamHierarchy;
use crate::subscriptions::Subscriptions;

/// One line of the subscriptions file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// The subscribing user.
    pub id: String,
    /// The term they want alerts for.
    pub term: String,
}

/// One line of the reporting graph file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportsToRecord {
    /// The reporting user.
    pub id: String,
    /// Their manager; absent or `null` at the top of the organization.
    #[serde(default)]
    pub reports_to: Option<String>,
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::InputRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse every non-blank line of `path` as a JSON record.
fn read_json_lines<T>(path: &Path) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    read_to_string(path)?
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line.trim()).map_err(|source| Error::InputParse {
                path: path.to_path_buf(),
                line: i + 1,
                source,
            })
        })
        .collect()
}

/// Read candidate domains, one per line. Blank lines are skipped.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_domains(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let domains: Vec<String> = read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    info!(count = domains.len(), path = %path.display(), "Loaded domains");
    Ok(domains)
}

/// Load user subscriptions from a JSON lines file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line is malformed.
pub fn load_subscriptions(path: impl AsRef<Path>) -> Result<Subscriptions> {
    let path = path.as_ref();
    let records: Vec<SubscriptionRecord> = read_json_lines(path)?;
    let count = records.len();
    let subscriptions: Subscriptions = records.into_iter().map(|r| (r.id, r.term)).collect();

    info!(
        records = count,
        users = subscriptions.len(),
        path = %path.display(),
        "Loaded subscriptions"
    );
    Ok(subscriptions)
}

/// Load the reporting graph from a JSON lines file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line is malformed.
pub fn load_hierarchy(path: impl AsRef<Path>) -> Result<TeamHierarchy> {
    let path = path.as_ref();
    let records: Vec<ReportsToRecord> = read_json_lines(path)?;
    let hierarchy = TeamHierarchy::from_pairs(records.into_iter().map(|r| (r.id, r.reports_to)));

    info!(users = hierarchy.len(), path = %path.display(), "Loaded team hierarchy");
    Ok(hierarchy)
}
