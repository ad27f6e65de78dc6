// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! trib - Tributary stream pipelines

mod commands;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use commands::{produce, run, table, topic};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use trib_adapters::{FileBroker, TracedBroker};
use trib_core::{BrokerAddress, PipelineConfig};

#[derive(Parser)]
#[command(
    name = "trib",
    version,
    about = "trib runs stream pipelines over a file-backed log"
)]
struct Cli {
    /// Pipeline configuration file
    #[arg(long, global = true, default_value = "trib.toml")]
    config: PathBuf,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline
    Run(run::RunArgs),
    /// Query the transformed_stations table
    Table(table::TableArgs),
    /// Publish stdin lines to a topic
    Produce(produce::ProduceArgs),
    /// Topic management
    Topic(topic::TopicArgs),
}

/// Loaded configuration and the broker it points at
pub struct Context {
    pub config: PipelineConfig,
    pub broker: TracedBroker<FileBroker>,
}

impl Context {
    fn load(path: &Path) -> Result<Self> {
        let base = path.parent().unwrap_or(Path::new("."));
        let config = PipelineConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?
            .rebase(base);
        let BrokerAddress::File(root) = config.broker()?;
        tracing::debug!(broker = %root.display(), "using file broker");
        Ok(Self {
            broker: TracedBroker::new(FileBroker::new(root)),
            config,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = setup_logging(cli.log_file.as_deref())?;
    let ctx = Context::load(&cli.config)?;

    match cli.command {
        Commands::Run(args) => run::handle(args, ctx).await,
        Commands::Table(args) => table::handle(args, ctx).await,
        Commands::Produce(args) => produce::handle(args, ctx).await,
        Commands::Topic(args) => topic::handle(args, ctx).await,
    }
}

fn setup_logging(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let file_name = path
        .file_name()
        .with_context(|| format!("log file has no name: {}", path.display()))?;

    let (non_blocking, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    Ok(Some(guard))
}
