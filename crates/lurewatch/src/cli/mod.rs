//! Command-line interface for lurewatch.
//!
//! This module provides the CLI structure and output rendering for the
//! `lurewatch` binary.

mod commands;
pub mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::{Config, InputsConfig};
use crate::error::{Error, Result};
use crate::notify::LureNotifier;
use crate::pipeline::{NotificationSink, Pipeline};

pub use commands::{
    ConfigCommand, LuresCommand, NotificationsCommand, OutputFormat, ScanCommand, StatusCommand,
    TermsCommand,
};

/// lurewatch - Flag phishing-lure domains and alert the right people
///
/// Scans candidate domains for suspicious terms and notifies every user
/// subscribed to a matched term, along with everyone who reports to them.
#[derive(Debug, Parser)]
#[command(name = "lurewatch")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Identify lures and notify subscribers
    Scan(ScanCommand),

    /// Identify lures only
    Lures(LuresCommand),

    /// Look up recorded notifications by user or domain
    Notifications(NotificationsCommand),

    /// Show the active term list
    Terms(TermsCommand),

    /// Show notification log status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}

/// Input files for a scan, after falling back to `[inputs]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanInputs {
    /// Candidate domains.
    pub domains: PathBuf,
    /// Subscriptions.
    pub subscriptions: PathBuf,
    /// Reporting graph.
    pub graph: PathBuf,
}

impl ScanCommand {
    /// Resolve the scan's input files against the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingInput`] for the first input named in neither place.
    pub fn inputs(&self, configured: &InputsConfig) -> Result<ScanInputs> {
        Ok(ScanInputs {
            domains: resolve_input(self.domains.as_ref(), configured.domains.as_ref(), "domains")?,
            subscriptions: resolve_input(
                self.subscriptions.as_ref(),
                configured.subscriptions.as_ref(),
                "subscriptions",
            )?,
            graph: resolve_input(self.graph.as_ref(), configured.graph.as_ref(), "graph")?,
        })
    }

    /// Build the scan pipeline. `stream` receives each notification as it is
    /// planned and is only attached when `--stream` was given.
    #[must_use]
    pub fn pipeline(
        &self,
        notifier: Arc<LureNotifier>,
        config: &Config,
        stream: impl FnOnce() -> Arc<dyn NotificationSink>,
    ) -> Pipeline {
        let pipeline = Pipeline::new(notifier).with_capacity(config.pipeline.channel_capacity);
        if self.stream {
            pipeline.with_sink(stream())
        } else {
            pipeline
        }
    }
}

/// Pick the command-line path, else the configured one.
///
/// # Errors
///
/// Returns [`Error::MissingInput`] when neither is set.
pub fn resolve_input(
    arg: Option<&PathBuf>,
    configured: Option<&PathBuf>,
    kind: &'static str,
) -> Result<PathBuf> {
    arg.or(configured)
        .cloned()
        .ok_or(Error::MissingInput { kind })
}

/// Load and validate the configuration file at `path`.
///
/// Unlike [`Config::load_from`], a missing file is an error here.
///
/// # Errors
///
/// Returns an error if the file is missing, unparsable or invalid.
pub fn validate_config_file(path: &Path) -> Result<Config> {
    if !path.is_file() {
        return Err(Error::ConfigValidation {
            message: format!("{} does not exist", path.display()),
        });
    }
    Config::load_from(Some(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Verbosity;
    use clap::CommandFactory;

    fn status_cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "lurewatch");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(status_cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(status_cli(3, true).verbosity(), Verbosity::Quiet);
        assert_eq!(status_cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(status_cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(status_cli(2, false).verbosity(), Verbosity::Debug);
        assert_eq!(status_cli(5, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_scan() {
        let cli = Cli::try_parse_from([
            "lurewatch",
            "scan",
            "-d",
            "domains.txt",
            "-s",
            "subs.jsonlines",
            "-g",
            "graph.jsonlines",
            "--record",
            "--format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Command::Scan(cmd) => {
                assert_eq!(cmd.domains, Some(PathBuf::from("domains.txt")));
                assert_eq!(cmd.graph, Some(PathBuf::from("graph.jsonlines")));
                assert!(cmd.record);
                assert_eq!(cmd.format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_scan_defaults_to_config_inputs() {
        let cli = Cli::try_parse_from(["lurewatch", "scan"]).unwrap();
        match cli.command {
            Command::Scan(cmd) => {
                assert!(cmd.domains.is_none());
                assert!(!cmd.record);
                assert_eq!(cmd.format, OutputFormat::Plain);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_scan_stream_conflicts_with_format() {
        assert!(Cli::try_parse_from(["lurewatch", "scan", "--stream"]).is_ok());
        assert!(
            Cli::try_parse_from(["lurewatch", "scan", "--stream", "--format", "json"]).is_err()
        );
    }

    #[test]
    fn test_parse_notifications_requires_target() {
        assert!(Cli::try_parse_from(["lurewatch", "notifications"]).is_err());
        assert!(Cli::try_parse_from(["lurewatch", "notifications", "--user", "B"]).is_ok());
        assert!(
            Cli::try_parse_from(["lurewatch", "notifications", "--domain", "ciscomail.com"])
                .is_ok()
        );
    }

    #[test]
    fn test_parse_notifications_rejects_both_targets() {
        let result = Cli::try_parse_from([
            "lurewatch",
            "notifications",
            "--user",
            "B",
            "--domain",
            "ciscomail.com",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_with_config() {
        let cli = Cli::try_parse_from(["lurewatch", "-c", "/custom/config.toml", "terms"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert!(matches!(cli.command, Command::Terms(_)));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["lurewatch", "status", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_config_validate() {
        let cli =
            Cli::try_parse_from(["lurewatch", "config", "validate", "--file", "x.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }

    fn scan_cmd(args: &[&str]) -> ScanCommand {
        let mut argv = vec!["lurewatch", "scan"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Scan(cmd) => cmd,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    fn configured_inputs() -> InputsConfig {
        InputsConfig {
            domains: Some(PathBuf::from("/cfg/domains.txt")),
            subscriptions: Some(PathBuf::from("/cfg/subs.jsonlines")),
            graph: None,
        }
    }

    #[test]
    fn test_resolve_input_prefers_command_line() {
        let arg = PathBuf::from("cli.txt");
        let configured = PathBuf::from("cfg.txt");
        let path = resolve_input(Some(&arg), Some(&configured), "domains").unwrap();
        assert_eq!(path, arg);
    }

    #[test]
    fn test_resolve_input_falls_back_to_config() {
        let configured = PathBuf::from("cfg.txt");
        let path = resolve_input(None, Some(&configured), "domains").unwrap();
        assert_eq!(path, configured);
    }

    #[test]
    fn test_resolve_input_missing() {
        let err = resolve_input(None, None, "graph").unwrap_err();
        assert!(matches!(err, Error::MissingInput { kind: "graph" }));
    }

    #[test]
    fn test_scan_inputs_mix_cli_and_config() {
        let cmd = scan_cmd(&["-d", "today.txt", "-g", "graph.jsonlines"]);
        let inputs = cmd.inputs(&configured_inputs()).unwrap();

        assert_eq!(inputs.domains, PathBuf::from("today.txt"));
        assert_eq!(inputs.subscriptions, PathBuf::from("/cfg/subs.jsonlines"));
        assert_eq!(inputs.graph, PathBuf::from("graph.jsonlines"));
    }

    #[test]
    fn test_scan_inputs_missing_graph() {
        let err = scan_cmd(&[]).inputs(&configured_inputs()).unwrap_err();
        assert!(matches!(err, Error::MissingInput { kind: "graph" }));
    }

    fn sample_notifier() -> Arc<LureNotifier> {
        use crate::hierarchy::TeamHierarchy;
        use crate::subscriptions::Subscriptions;
        use crate::terms::TermMatcher;

        let subscriptions: Subscriptions = [("C", "cisco")].into_iter().collect();
        let hierarchy = TeamHierarchy::from_pairs([("K", Some("C"))]);
        Arc::new(LureNotifier::new(TermMatcher::default(), &subscriptions, &hierarchy).unwrap())
    }

    #[tokio::test]
    async fn test_stream_flag_attaches_stream_sink() {
        use crate::notify::Notification;
        use crate::pipeline::JsonLinesSink;

        let buffer = Arc::new(JsonLinesSink::new("buffer", Vec::<u8>::new()));
        let stream = Arc::clone(&buffer);
        let pipeline = scan_cmd(&["--stream"]).pipeline(sample_notifier(), &Config::default(), move || {
            stream as Arc<dyn NotificationSink>
        });

        let report = pipeline
            .run(vec!["ciscomail.com".to_string(), "apple.com".to_string()])
            .await
            .unwrap();
        assert_eq!(report.deliveries, 1);
        drop(pipeline);

        let buffer = Arc::try_unwrap(buffer).expect("sink still shared");
        let output = String::from_utf8(buffer.into_inner().unwrap()).unwrap();
        let streamed: Notification = serde_json::from_str(output.trim_end()).unwrap();
        assert_eq!(streamed.domain, "ciscomail.com");
        assert_eq!(streamed.users, vec!["C", "K"]);
    }

    #[tokio::test]
    async fn test_without_stream_flag_nothing_is_streamed() {
        let pipeline = scan_cmd(&[]).pipeline(sample_notifier(), &Config::default(), || {
            panic!("stream sink built without --stream")
        });

        let report = pipeline.run(vec!["ciscomail.com".to_string()]).await.unwrap();
        assert_eq!(report.notifications.len(), 1);
        assert_eq!(report.deliveries, 0);
    }

    #[test]
    fn test_validate_config_file_accepts_valid_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[matching]\nmin_matches = 3").unwrap();

        let config = validate_config_file(file.path()).unwrap();
        assert_eq!(config.matching.min_matches, 3);
    }

    #[test]
    fn test_validate_config_file_rejects_invalid_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[matching]\nterms = [\"paypal\", \"PayPal\"]\nmin_matches = 2").unwrap();

        let err = validate_config_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_validate_config_file_rejects_missing_file() {
        let err = validate_config_file(Path::new("/nonexistent/lurewatch.toml")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
