#![allow(clippy::module_name_repetitions)]

//! `steelclock` daemon.
//!
//! Loads the JSON configuration, starts the engine and runs until `SIGINT`
//! or `SIGTERM`. `SIGHUP` reloads the configuration in place.
//!
//! ```text
//! steelclock --config config.json --output /run/steelclock/frame.pbm
//! steelclock --config config.json --output /run/steelclock/frame.bin --format raw
//! steelclock --config config.json --check
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use steelclock::app::{EngineOptions, supervise};
use steelclock::config::AppConfig;
use steelclock::transport::{NullTransport, PbmTransport, RawTransport, Transport};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// File layout of `--output`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Binary PBM image, viewable with any image tool
    Pbm,
    /// Packed 1 bpp device bitmap, rows MSB first
    Raw,
}

#[derive(Parser, Debug)]
#[command(name = "steelclock", version, about = "Widget compositor for monochrome OLED displays")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Write every frame to this file instead of discarding it
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Layout of the output file
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pbm)]
    format: OutputFormat,

    /// Log level used when RUST_LOG is not set
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_thread_names(true).init();
}

fn build_transport(cli: &Cli, config: &AppConfig) -> Box<dyn Transport> {
    let (width, height) = (config.display.width, config.display.height);
    match (&cli.output, cli.format) {
        (Some(path), OutputFormat::Pbm) => {
            info!(path = %path.display(), "writing frames to PBM file");
            Box::new(PbmTransport::new(path).with_dimensions(width, height))
        }
        (Some(path), OutputFormat::Raw) => {
            info!(path = %path.display(), "writing frames as packed 1 bpp bitmaps");
            Box::new(RawTransport::new(path).with_dimensions(width, height))
        }
        (None, _) => {
            info!("no output configured, frames are discarded");
            Box::new(NullTransport::new())
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    if cli.check {
        let placed = config.placed_widgets().context("layout resolution failed")?;
        println!(
            "{}: ok, {} of {} widgets placed on a {}x{} display",
            cli.config.display(),
            placed.len(),
            config.widgets.len(),
            config.display.width,
            config.display.height
        );
        return Ok(());
    }

    let (events_tx, events_rx) = mpsc::channel();
    #[cfg(unix)]
    let _signals = steelclock::shutdown::SignalGuard::new(events_tx).context("failed to install signal handlers")?;
    #[cfg(not(unix))]
    let _events_tx = events_tx;

    let options = EngineOptions::new(build_transport(cli, &config));
    supervise(&cli.config, &config, options, &events_rx).context("engine failed")?;

    info!("shutdown complete");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
