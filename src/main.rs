use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tagscout::check::{Checker, summarize};
use tagscout::config::{CheckerConfig, db_path, load_config};
use tagscout::container::DockerEngine;
use tagscout::logging::{self, LogFormat, LogLevel};
use tagscout::output::{OutputFormat, create_sink};
use tagscout::version::resolver::create_default_registries;

#[derive(Parser)]
#[command(name = "tagscout")]
#[command(version, about = "Check running containers for newer image version tags")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    options: GlobalOptions,
}

#[derive(Subcommand)]
enum Command {
    /// Check running containers once and print the report (default)
    Check,
}

#[derive(Args)]
struct GlobalOptions {
    /// Report format
    #[arg(long, short, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Log level, overridden by RUST_LOG
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// State database path (reserved, currently unused)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Containers checked in parallel, overrides the configuration file
    #[arg(long, global = true)]
    concurrency: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(cli.options.log_level, cli.options.log_format)?;

    match cli.command.unwrap_or(Command::Check) {
        Command::Check => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(run_check(cli.options)),
    }
}

async fn run_check(options: GlobalOptions) -> anyhow::Result<()> {
    let mut config = match &options.config {
        Some(path) => load_config(path)?,
        None => CheckerConfig::default(),
    };
    if let Some(concurrency) = options.concurrency {
        anyhow::ensure!(concurrency > 0, "--concurrency must be at least 1");
        config.concurrency = concurrency;
    }

    let db_path = options.db_path.unwrap_or_else(db_path);
    debug!("State database path {} (unused)", db_path.display());

    let registries = create_default_registries(&config.registries)
        .context("Failed to create registry clients")?;
    let checker = Checker::new(Arc::new(registries), &config);
    let engine = DockerEngine::connect()?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling pending registry lookups");
            ctrl_c.cancel();
        }
    });

    let report = checker.check(&engine, &cancel).await?;

    let summary = summarize(&report);
    info!(
        "{} containers: {} updates, {} up to date, {} skipped, {} failed",
        summary.total, summary.updates, summary.up_to_date, summary.skipped, summary.failed
    );

    let mut sink = create_sink(options.output, Box::new(std::io::stdout()), &config)?;
    sink.submit(&report).await
}
