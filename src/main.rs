//! Checks every comic in a library for updates.
//!
//! Every immediate subdirectory of the given path is treated as one comic's
//! folder. The source URL for each comes from its `info.json` record, or is
//! inferred from the most recently modified archive in the folder; new
//! volumes are then downloaded with the external fetch tool.

mod console;

use crate::console::ConsoleReporter;
use clap::Parser;
use miette::{Result, miette};
use std::path::PathBuf;
use tankobon_config::Settings;
use tankobon_fetch::Fetcher;
use tankobon_library::Library;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "tankobon", version, about = "Check all comics in a library for updates")]
struct Cli {
    /// Library directory containing one folder per title.
    #[arg(default_value = ".")]
    path: PathBuf,
    /// Settings file (TOML or YAML) overriding the platform default.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;
    if !cli.path.is_dir() {
        return Err(miette!("library path does not exist or is not a directory: {}", cli.path.display()));
    }

    let settings = match cli.config {
        Some(file) => Settings::load_from(Some(file)),
        None => Settings::load(),
    }
    .map_err(|err| miette!("{err:?}"))?;
    tracing::debug!(?settings, "Settings resolved");

    let fetcher = Fetcher::new(&settings.fetcher).map_err(|err| miette!("{err:?}"))?;
    let mut reporter = ConsoleReporter::new();
    let mut library = Library::discover(std::slice::from_ref(&cli.path), &mut reporter)
        .map_err(|err| miette!("{err:?}"))?;
    library.update(&fetcher, &settings.library, &mut reporter);
    Ok(())
}

fn init_logging() -> Result<()> {
    // Diagnostics go to stderr; stdout carries only the run narrative.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("TANKOBON_LOG")
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|err| miette!("failed to initialise logging: {err}"))
}
