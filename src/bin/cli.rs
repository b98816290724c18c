//! Planviewer announcement monitor CLI
//!
//! Runs the configured monitors in the foreground until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures::future::join_all;
use planviewer::{
    error::{AppError, Result},
    models::{Config, RefreshConfig},
    pipeline::MonitorSet,
    sensors,
    services::{AnnouncementSource, PlanviewerClient},
    storage::SnapshotReader,
};

/// Planviewer - Municipality Announcement Monitor
#[derive(Parser, Debug)]
#[command(
    name = "planviewer",
    version,
    about = "Monitors Planviewer municipality announcements"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "planviewer.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Monitor all configured instances until interrupted
    Run,

    /// Fetch one municipality page once and print its announcements
    Once {
        /// Municipality path segment (e.g. "utrecht")
        #[arg(short, long)]
        municipality: String,
    },

    /// Print the sensors of every instance after one refresh
    Sensors,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on config and verbosity flag.
fn init_logging(level: &str, verbose: bool) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config);
    init_logging(&config.logging.level, cli.verbose);

    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run => {
            config.validate()?;
            let source = build_source(&config)?;
            let monitors = MonitorSet::start_all(source, &config.instances).await?;

            let watchers: Vec<_> = monitors
                .readers()
                .into_iter()
                .map(|(key, reader)| {
                    report(&key.to_string(), &reader);
                    tokio::spawn(watch_instance(key.to_string(), reader))
                })
                .collect();

            log::info!("Monitoring {} instance(s). Press Ctrl-C to stop.", monitors.len());
            tokio::signal::ctrl_c().await?;

            log::info!("Shutting down...");
            monitors.shutdown().await;
            join_all(watchers).await;
        }

        Command::Once { municipality } => {
            // Validates the municipality; the interval is unused for a single fetch.
            let refresh = RefreshConfig::with_default_interval(municipality)?;
            let client = PlanviewerClient::new(&config.client)?;

            let records = client.fetch(refresh.municipality_id()).await?;
            log::info!(
                "Fetched {} announcement(s) for {}",
                records.len(),
                refresh.municipality_id()
            );
            println!("{}", serde_json::to_string_pretty(&records)?);
        }

        Command::Sensors => {
            config.validate()?;
            let source = build_source(&config)?;
            let monitors = MonitorSet::start_all(source, &config.instances).await?;

            let all: Vec<_> = monitors
                .readers()
                .into_iter()
                .flat_map(|(key, reader)| sensors::sensors_for(&key, &reader.snapshot()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&all)?);

            monitors.shutdown().await;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
            log::info!("    base_url: {}", config.client.base_url);
            log::info!("    timeout: {}s", config.client.timeout_secs);
            for instance in &config.instances {
                log::info!(
                    "    {}: every {}s",
                    instance.key(),
                    instance.interval_secs
                );
            }
        }
    }

    log::info!("Done!");

    Ok(())
}

fn build_source(config: &Config) -> Result<Arc<dyn AnnouncementSource>> {
    let client = PlanviewerClient::new(&config.client)
        .map_err(|e| AppError::config(format!("cannot create HTTP client: {e}")))?;
    Ok(Arc::new(client))
}

/// Log every snapshot change of one instance until its monitor stops.
async fn watch_instance(label: String, mut reader: SnapshotReader) {
    while reader.changed().await {
        report(&label, &reader);
    }
}

fn report(label: &str, reader: &SnapshotReader) {
    let health = reader.health();
    let last_success = health
        .last_success_at
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());

    log::info!(
        "{}: status={} last_success={} consecutive_errors={}",
        label,
        health.status,
        last_success,
        health.consecutive_error_count
    );
    if let Some(error) = &health.last_error {
        log::info!("    last error: {}", error);
    }
    for record in reader.current_records() {
        log::info!("    {}", record.format("{title} ({start_date} - {end_date}) {link}"));
    }
}
