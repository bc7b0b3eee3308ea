use crate::{
    config::MigrationConfig,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use commands::Commands;
use connectors::{file::LocalChunkStore, sql::postgres::PgSource, target::HttpTarget};
use engine_processing::MigrationContext;
use engine_runtime::{MigrationError, MigrationScheduler};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "blaze-migrate",
    version,
    about = "Migrates relational tables into an analytical database"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Initialize logger
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let shutdown = ShutdownCoordinator::new();

    let code = match run(cli.command, &shutdown).await {
        Ok(()) => ExitCode::Success,
        Err(CliError::ShutdownRequested) | Err(CliError::Runner(MigrationError::Cancelled)) => {
            info!("Migration stopped on request");
            ExitCode::ShutdownRequested
        }
        Err(err) => {
            error!(error = %err, "Migration failed");
            if shutdown.is_shutdown_requested() {
                ExitCode::ShutdownRequested
            } else {
                ExitCode::GeneralError
            }
        }
    };

    std::process::exit(code.as_i32());
}

async fn run(command: Commands, shutdown: &ShutdownCoordinator) -> Result<(), CliError> {
    match command {
        Commands::Migrate {
            config,
            json,
            output,
        } => {
            let scheduler = build_scheduler(&config).await?;
            shutdown.listen(scheduler.context().settings.shutdown_grace);
            let report = scheduler.run(shutdown.run_token()).await?;

            output::log_summary(&report);
            match output {
                Some(path) => output::write_report(&report, &path).await?,
                None if json => output::print_report(&report)?,
                None => {}
            }

            if shutdown.is_shutdown_requested() {
                return Err(CliError::ShutdownRequested);
            }
            if !report.failed.is_empty() {
                return Err(CliError::TablesFailed(report.failed.len()));
            }
        }
        Commands::Tables { config } => {
            let scheduler = build_scheduler(&config).await?;
            for table in scheduler.selected_tables().await? {
                println!("{table}");
            }
        }
    }

    Ok(())
}

async fn build_scheduler(path: &str) -> Result<MigrationScheduler, CliError> {
    let config = MigrationConfig::load(path).await?;
    let settings = config.import.validate()?;

    info!(schema = %config.source.schema, "Connecting to source");
    let source = PgSource::connect(&config.source.url, config.source.schema.clone()).await?;
    let target = HttpTarget::new(config.target.url.clone(), config.target.token.clone());

    let ctx = MigrationContext::new(
        Arc::new(source),
        Arc::new(target),
        Arc::new(LocalChunkStore),
        settings,
    );
    Ok(MigrationScheduler::new(ctx))
}
