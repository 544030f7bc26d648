use anyhow::Result;
use clap::{Parser, Subcommand};
use core_types::Symbol;
use engine::Engine;
use events::EngineEvent;
use execution::PaperExecutor;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

mod data;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "A Supertrend trend-following trading engine.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the engine over a bar feed loaded from a CSV file.
    Run {
        /// Path to the bar CSV (timestamp, open, high, low, close, volume).
        #[arg(short, long)]
        data: PathBuf,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let settings = app_config::load_settings()?;

    // RUST_LOG wins over the configured log level when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.app.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    tracing::info!(environment = %settings.app.environment, "Starting trading engine.");

    match cli.command {
        Commands::Run { data } => {
            run_feed(settings, &data).await?;
        }
    }

    tracing::info!("Trading engine has finished successfully.");
    Ok(())
}

// --- "Run" Subcommand Logic ---

/// Builds the engine from the loaded settings and drives the CSV feed
/// through it.
async fn run_feed(settings: app_config::Settings, data: &Path) -> Result<()> {
    let bars = data::load_bars(data)?;
    if bars.is_empty() {
        anyhow::bail!("the bar feed at {} is empty", data.display());
    }

    let (event_tx, event_rx) = broadcast::channel::<EngineEvent>(1024);

    // Drain engine events to stdout as JSON lines for downstream tooling.
    let reporter = tokio::spawn(report_events(event_rx));

    let executor = PaperExecutor::new(settings.execution, settings.instrument.initial_cash);
    let mut engine = Engine::new(
        Symbol(settings.instrument.symbol.clone()),
        settings.indicator,
        settings.sizing,
        settings.controller,
        executor,
        event_tx.clone(),
    )?;

    let summary = engine.run(&bars).await;

    // Dropping the last sender ends the reporter task.
    drop(event_tx);
    drop(engine);
    reporter.await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Forwards engine events to stdout until every sender is gone.
async fn report_events(mut rx: broadcast::Receiver<EngineEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(error) => tracing::error!(%error, "Failed to serialize engine event."),
            },
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "Event reporter fell behind, events dropped.");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
