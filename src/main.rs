//! Inventory Sync - bulk host and group management
//!
//! Reads CSV files and drives them through the monitoring platform's RPC API:
//! host import and update with automatic group creation, host export, and bulk
//! group creation.

mod cli;

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use cli::{Cli, Commands};
use config::LogFormat;
use inventory_sync::services::csv_io;
use inventory_sync::{config, AppConfig, AppError, Session};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Load configuration first (before logging, so we know log format)
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(1);
        }
    };

    // The guard must be kept alive for the duration of the program
    let _guard = init_logging(&config, cli.debug);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {:#}", e);
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }

    info!("Starting Inventory Sync v{}", env!("CARGO_PKG_VERSION"));

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = exit_code(&e);
            error!(exit_code = code, "{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(code)
        }
    }
}

/// Configuration file and environment, then command line flags on top
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(company) = &cli.company {
        config.api.company = company.clone();
    }
    if let Some(user) = &cli.user {
        config.api.user = user.clone();
    }
    if let Some(password) = &cli.password {
        config.api.password = password.clone();
    }

    Ok(config)
}

/// Exit code of the first [`AppError`] in the error chain, 1 otherwise
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<AppError>())
        .map(AppError::exit_code)
        .unwrap_or(1)
}

async fn run(command: Commands, config: AppConfig) -> Result<()> {
    let session = Session::new(config)?;

    match command {
        Commands::Import { file } => {
            let records = csv_io::read_import_records(open_input(&file)?)?;
            let summary = session.import_hosts(&records).await?;
            print!("{}", summary);
        }
        Commands::Update { file } => {
            let records = csv_io::read_import_records(open_input(&file)?)?;
            let summary = session.update_hosts(&records).await?;
            print!("{}", summary);
        }
        Commands::ImportGroups { file } => {
            let definitions = csv_io::read_group_definitions(open_input(&file)?)?;
            let summary = session.import_groups(&definitions).await?;
            print!("{}", summary);
        }
        Commands::Export { file } => {
            let report = session.export_hosts().await?;
            match &file {
                Some(path) => {
                    let out = File::create(path)
                        .with_context(|| format!("Failed to create output file: {:?}", path))?;
                    csv_io::write_export_records(&report.records, BufWriter::new(out))?;
                    println!("Exported {} hosts to {}", report.records.len(), path.display());
                }
                None => csv_io::write_export_records(&report.records, io::stdout().lock())?,
            }
            if !report.failed.is_empty() {
                warn!(hosts = ?report.failed, "Some hosts were not exported");
                eprintln!(
                    "Could not read properties of {} host(s): {}",
                    report.failed.len(),
                    report.failed.join(", ")
                );
            }
        }
    }

    Ok(())
}

fn open_input(path: &Path) -> Result<BufReader<File>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open input file: {:?}", path))?;
    Ok(BufReader::new(file))
}

/// Initialize the logging/tracing infrastructure
fn init_logging(
    config: &AppConfig,
    debug: bool,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use config::LogTarget;
    use tracing_subscriber::{prelude::*, EnvFilter};

    let env_filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    let log_config = &config.logging;

    match &log_config.target {
        LogTarget::Console => {
            let subscriber = tracing_subscriber::registry().with(env_filter);
            init_console_logging(subscriber, &log_config.format);
            None
        }
        LogTarget::File => {
            let (writer, guard) = create_file_writer(log_config);
            let subscriber = tracing_subscriber::registry().with(env_filter);
            init_file_logging(subscriber, &log_config.format, writer);
            Some(guard)
        }
        LogTarget::Both => {
            let (writer, guard) = create_file_writer(log_config);
            let subscriber = tracing_subscriber::registry().with(env_filter);
            init_both_logging(subscriber, &log_config.format, writer);
            Some(guard)
        }
    }
}

/// Create a file writer with optional daily rotation
fn create_file_writer(
    log_config: &config::LoggingConfig,
) -> (
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
) {
    if let Err(e) = std::fs::create_dir_all(&log_config.log_dir) {
        eprintln!(
            "Warning: Failed to create log directory {:?}: {}",
            log_config.log_dir, e
        );
    }

    let file_appender = if log_config.daily_rotation {
        tracing_appender::rolling::daily(&log_config.log_dir, &log_config.log_prefix)
    } else {
        tracing_appender::rolling::never(&log_config.log_dir, &log_config.log_prefix)
    };

    tracing_appender::non_blocking(file_appender)
}

/// Console logging goes to stderr so stdout carries only reports and CSV
fn init_console_logging<S>(subscriber: S, format: &LogFormat)
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync,
{
    use tracing_subscriber::{fmt, prelude::*};

    match format {
        LogFormat::Json => {
            subscriber
                .with(fmt::layer().json().with_target(true).with_writer(io::stderr))
                .init();
        }
        LogFormat::Compact => {
            subscriber
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_writer(io::stderr),
                )
                .init();
        }
        LogFormat::Pretty => {
            subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_file(false)
                        .with_line_number(false)
                        .with_writer(io::stderr),
                )
                .init();
        }
    }
}

/// Initialize file-only logging
fn init_file_logging<S>(
    subscriber: S,
    format: &LogFormat,
    writer: tracing_appender::non_blocking::NonBlocking,
) where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync,
{
    use tracing_subscriber::{fmt, prelude::*};

    match format {
        LogFormat::Json => {
            subscriber
                .with(fmt::layer().json().with_target(true).with_writer(writer))
                .init();
        }
        LogFormat::Compact => {
            subscriber
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
        }
        LogFormat::Pretty => {
            subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
        }
    }
}

/// Initialize both console and file logging
fn init_both_logging<S>(
    subscriber: S,
    format: &LogFormat,
    writer: tracing_appender::non_blocking::NonBlocking,
) where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync,
{
    use tracing_subscriber::{fmt, prelude::*};

    match format {
        LogFormat::Json => {
            subscriber
                .with(fmt::layer().json().with_target(true).with_writer(io::stderr))
                .with(fmt::layer().json().with_target(true).with_writer(writer))
                .init();
        }
        LogFormat::Compact => {
            subscriber
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_writer(io::stderr),
                )
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
        }
        LogFormat::Pretty => {
            subscriber
                .with(fmt::layer().with_target(true).with_writer(io::stderr))
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
        }
    }
}
