use std::{
    fs::File,
    io::{self, BufReader, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use booking_core::{BookingFlowController, Catalog};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod presenter;
mod screens;
mod session;
mod settings;

use presenter::{CelebrationObserver, NarrationObserver};
use settings::{OutputFormat, Settings};

#[derive(Parser, Debug)]
#[command(name = "booking-cli", about = "Walk through the travel package booking flow")]
struct Cli {
    /// Settings file; defaults to ./booking.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Catalog TOML replacing the built-in packages, hotels and promos.
    #[arg(long)]
    catalog: Option<PathBuf>,
    #[arg(long, value_enum)]
    output: Option<OutputFormat>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the reference premium booking and print every screen.
    Demo,
    /// Apply JSON intents, one per line, from a file or `-` for stdin.
    Replay { input: PathBuf },
    /// Print the effective catalog as JSON.
    Catalog,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = settings::load_settings(cli.config.as_deref())?;
    if let Some(output) = cli.output {
        settings.output = output;
    }
    if cli.catalog.is_some() {
        settings.catalog_path = cli.catalog.clone();
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let catalog = Arc::new(settings::load_catalog(settings.catalog_path.as_deref())?);
    tracing::info!(
        packages = catalog.packages.len(),
        hotels = catalog.hotels.len(),
        add_ons = catalog.add_ons.len(),
        "catalog loaded"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Catalog => {
            serde_json::to_writer_pretty(&mut out, catalog.as_ref())
                .context("failed to encode catalog")?;
            writeln!(out)?;
        }
        Command::Demo => {
            let mut flow = build_flow(&settings, catalog);
            let summary = session::run_demo(&mut flow, &mut out, settings.output)?;
            tracing::info!(applied = summary.applied, rejected = summary.rejected, "demo finished");
        }
        Command::Replay { input } => {
            let mut flow = build_flow(&settings, catalog);
            let summary = if input.as_os_str() == "-" {
                session::replay(&mut flow, io::stdin().lock(), &mut out, settings.output)?
            } else {
                let file = File::open(&input)
                    .with_context(|| format!("failed to open intents '{}'", input.display()))?;
                session::replay(&mut flow, BufReader::new(file), &mut out, settings.output)?
            };
            tracing::info!(applied = summary.applied, rejected = summary.rejected, "replay finished");
        }
    }

    Ok(())
}

fn build_flow(settings: &Settings, catalog: Arc<Catalog>) -> BookingFlowController {
    let mut flow = BookingFlowController::new(catalog.clone(), settings.issuer())
        .with_observer(NarrationObserver::new(catalog.clone()))
        .with_observer(CelebrationObserver::new(catalog));
    flow.start();
    flow
}
