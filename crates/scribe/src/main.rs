//! Scribe - Chat history exporter
//!
//! # Usage
//!
//! ```bash
//! # Export the configured chats (default)
//! scribe
//! scribe --config scribe.toml
//!
//! # Keep watching for new messages after the backfill
//! scribe export --watch
//!
//! # List channels to find query names
//! scribe channels
//! ```

mod cmd;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scribe_config::{Config, LogConfig, LogFormat, LogLevel, LogOutput};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Configuration file used when `--config` is not given
const DEFAULT_CONFIG: &str = "scribe.toml";

/// Scribe - Export chat history with edits and deletes resolved
#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export the configured chats
    Export(cmd::export::ExportArgs),

    /// List channels visible to the transport
    Channels,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = Config::from_file(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()));

    let log = config
        .as_ref()
        .map(|c| c.log.clone())
        .unwrap_or_default();
    if let Err(e) = init_logging(&log, cli.log_level.as_deref()) {
        eprintln!("scribe: {e:#}");
        return ExitCode::FAILURE;
    }

    let result = match config {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(fatal = true, error = %format!("{e:#}"), "scribe stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Option<Command>, config: Config) -> Result<()> {
    match command {
        Some(Command::Export(args)) => cmd::export::run(args, config).await,
        Some(Command::Channels) => cmd::channels::run(config).await,
        // No subcommand = export
        None => cmd::export::run(cmd::export::ExportArgs::default(), config).await,
    }
}

/// Resolve log level: CLI flag > config file
fn resolve_log_level(cli_level: Option<&str>, log: &LogConfig) -> Result<LogLevel> {
    match cli_level {
        Some(level) => LogLevel::from_str(level).map_err(|e| anyhow::anyhow!(e)),
        None => Ok(log.level),
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(log: &LogConfig, cli_level: Option<&str>) -> Result<()> {
    let level = resolve_log_level(cli_level, log)?;
    let filter = EnvFilter::try_new(level.as_str())
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let (writer, ansi) = match &log.output {
        LogOutput::Stderr => (BoxMakeWriter::new(std::io::stderr), true),
        LogOutput::Stdout => (BoxMakeWriter::new(std::io::stdout), true),
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {path}"))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match log.format {
        LogFormat::Console => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
    };
    installed.context("failed to install log subscriber")
}
