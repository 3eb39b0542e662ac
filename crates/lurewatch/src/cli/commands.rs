//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Subcommand, ValueEnum};

/// Scan command arguments.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Candidate domains, one per line (defaults to inputs.domains)
    #[arg(short, long, value_name = "FILE")]
    pub domains: Option<PathBuf>,

    /// Subscriptions as JSON lines (defaults to inputs.subscriptions)
    #[arg(short, long, value_name = "FILE")]
    pub subscriptions: Option<PathBuf>,

    /// Reporting graph as JSON lines (defaults to inputs.graph)
    #[arg(short, long, value_name = "FILE")]
    pub graph: Option<PathBuf>,

    /// Also write notifications to the notification log
    #[arg(short, long)]
    pub record: bool,

    /// Print each notification as a JSON line as soon as it is planned
    #[arg(long, conflicts_with = "format")]
    pub stream: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Lures command arguments.
#[derive(Debug, Args)]
pub struct LuresCommand {
    /// Candidate domains, one per line (defaults to inputs.domains)
    #[arg(short, long, value_name = "FILE")]
    pub domains: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Notifications command arguments.
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("target").required(true).args(["user", "domain"])))]
pub struct NotificationsCommand {
    /// Show notifications sent to this user
    #[arg(short, long)]
    pub user: Option<String>,

    /// Show notifications about this domain
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Maximum number of results
    #[arg(short, long, default_value = "50")]
    pub limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Terms command arguments.
#[derive(Debug, Args)]
pub struct TermsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_scan_command_debug() {
        let cmd = ScanCommand {
            domains: Some(PathBuf::from("domains.txt")),
            subscriptions: None,
            graph: None,
            record: true,
            stream: false,
            format: OutputFormat::Json,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("domains.txt"));
        assert!(debug_str.contains("record: true"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        assert!(format!("{cmd:?}").contains("Show"));
    }
}
