//! `lurewatch` - CLI for phishing-lure detection and notification
//!
//! This binary loads domains, subscriptions and the reporting graph, flags
//! lure domains, and reports who needs to be notified.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing::{info, warn};

use lurewatch::cli::{
    render, resolve_input, validate_config_file, Cli, Command, ConfigCommand, LuresCommand,
    NotificationsCommand, ScanCommand,
};
use lurewatch::pipeline::{LogSink, StdoutSink};
use lurewatch::{
    init_logging, input, Config, Error, LureNotifier, NotificationLog, NotificationSink,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // `config` subcommands load the file themselves, so a broken config can
    // still be located and validated.
    let load = || Config::load_from(cli.config.clone());

    match cli.command {
        Command::Scan(scan_cmd) => handle_scan(&load()?, &scan_cmd),
        Command::Lures(lures_cmd) => handle_lures(&load()?, &lures_cmd),
        Command::Notifications(cmd) => handle_notifications(&load()?, &cmd),
        Command::Terms(terms_cmd) => {
            let matcher = load()?.term_matcher()?;
            render::terms(&mut std::io::stdout().lock(), &matcher, terms_cmd.json)?;
            Ok(())
        }
        Command::Status(status_cmd) => handle_status(&load()?, status_cmd.json),
        Command::Config(config_cmd) => handle_config(cli.config.clone(), config_cmd),
    }
}

fn handle_scan(config: &Config, cmd: &ScanCommand) -> Result<(), Box<dyn std::error::Error>> {
    let inputs = cmd.inputs(&config.inputs)?;

    let domains = input::read_domains(&inputs.domains)?;
    let subscriptions = input::load_subscriptions(&inputs.subscriptions)?;
    let hierarchy = input::load_hierarchy(&inputs.graph)?;

    let notifier = Arc::new(LureNotifier::new(
        config.term_matcher()?,
        &subscriptions,
        &hierarchy,
    )?);

    let mut pipeline = cmd.pipeline(notifier, config, || {
        Arc::new(StdoutSink::stdout()) as Arc<dyn NotificationSink>
    });

    let log_sink = if cmd.record {
        let log = Arc::new(Mutex::new(NotificationLog::open(config.database_path())?));
        let sink = Arc::new(LogSink::begin(Arc::clone(&log))?);
        pipeline = pipeline.with_sink(sink.clone());
        Some((log, sink))
    } else {
        None
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(pipeline.run(domains))?;

    if let Some((log, sink)) = log_sink {
        sink.finish(&report)?;
        info!(run_id = sink.run_id(), recorded = sink.recorded(), "Recorded notifications");

        if let Some(retention) = config.retention() {
            let log = log
                .lock()
                .map_err(|_| Error::internal("notification log lock poisoned"))?;
            log.prune_older_than(retention)?;
        }
    }

    if report.failed_deliveries > 0 {
        warn!(failed = report.failed_deliveries, "Some notifications were not delivered");
    }

    if !cmd.stream {
        render::notifications(
            &mut std::io::stdout().lock(),
            &report.notifications,
            cmd.format,
        )?;
    }
    Ok(())
}

fn handle_lures(config: &Config, cmd: &LuresCommand) -> Result<(), Box<dyn std::error::Error>> {
    let domains_path = resolve_input(cmd.domains.as_ref(), config.inputs.domains.as_ref(), "domains")?;
    let domains = input::read_domains(&domains_path)?;

    let matcher = config.term_matcher()?;
    let lures = lurewatch::identify_lures(&matcher, &domains);

    render::lures(&mut std::io::stdout().lock(), &lures, cmd.format)?;
    Ok(())
}

fn handle_notifications(
    config: &Config,
    cmd: &NotificationsCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let log = open_existing_log(&config.database_path())?;

    let rows = match (&cmd.user, &cmd.domain) {
        (Some(user), _) => log.for_user(user, cmd.limit)?,
        (None, Some(domain)) => log.for_domain(domain, cmd.limit)?,
        (None, None) => log.recent(cmd.limit)?,
    };

    render::stored(&mut std::io::stdout().lock(), &rows, cmd.format)?;
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = config.database_path();
    let log = open_existing_log(&path)?;
    let stats = log.stats()?;

    render::status(&mut std::io::stdout().lock(), &stats, &path, json)?;
    Ok(())
}

/// Open the log, or an empty in-memory one if nothing has been recorded yet.
fn open_existing_log(path: &Path) -> Result<NotificationLog, Error> {
    if path.exists() {
        NotificationLog::open(path)
    } else {
        info!("No notification log at {} yet", path.display());
        NotificationLog::open_in_memory()
    }
}

fn handle_config(
    config_path: Option<PathBuf>,
    cmd: ConfigCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Matching]");
                println!("  Terms:              {}", config.matching.terms.join(", "));
                println!("  Min matches:        {}", config.matching.min_matches);
                println!();
                println!("[Inputs]");
                println!("  Domains:            {}", display_opt(config.inputs.domains.as_deref()));
                println!(
                    "  Subscriptions:      {}",
                    display_opt(config.inputs.subscriptions.as_deref())
                );
                println!("  Graph:              {}", display_opt(config.inputs.graph.as_deref()));
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Retention (days):   {}", config.storage.retention_days);
                println!();
                println!("[Pipeline]");
                println!("  Channel capacity:   {}", config.pipeline.channel_capacity);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            info!("Validating configuration: {}", path.display());
            validate_config_file(&path)?;
            println!("{}: configuration is valid.", path.display());
        }
    }
    Ok(())
}

fn display_opt(path: Option<&Path>) -> String {
    path.map_or_else(|| "(not set)".to_string(), |p| p.display().to_string())
}
