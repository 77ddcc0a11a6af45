//! Desktop simulator for the steelclock engine.
//!
//! Runs the real engine against host system probes and shows every frame in
//! an SDL window instead of sending it to a device.
//!
//! Keys: `R` reloads the configuration, `Esc` or closing the window quits.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

mod window;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::sdl2::Keycode;
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window};
use steelclock::app::{EngineOptions, supervise};
use steelclock::config::AppConfig;
use steelclock::shutdown::ControlEvent;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::window::{WindowTransport, latest_frame, paint};

/// UI loop period (~50 FPS); the engine itself runs at its configured rate.
const FRAME_TIME: Duration = Duration::from_millis(20);

#[derive(Parser, Debug)]
#[command(name = "simulator", version, about = "Show steelclock frames in a desktop window")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Window pixels per display pixel
    #[arg(short, long, default_value_t = 4)]
    scale: u32,
}

fn run(cli: &Cli) -> Result<()> {
    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    let (width, height) = (config.display.width, config.display.height);

    let (frames_tx, frames_rx) = mpsc::channel();
    let (events_tx, events_rx) = mpsc::channel();
    let options = EngineOptions::new(Box::new(WindowTransport::new(frames_tx, width, height)));
    let config_path = cli.config.clone();
    let engine = thread::Builder::new()
        .name(String::from("supervisor"))
        .spawn(move || supervise(&config_path, &config, options, &events_rx))?;

    let mut display: SimulatorDisplay<Gray8> = SimulatorDisplay::new(Size::new(width, height));
    let output_settings = OutputSettingsBuilder::new().scale(cli.scale.max(1)).pixel_spacing(1).build();
    let mut window = Window::new("SteelClock", &output_settings);

    display.clear(Gray8::BLACK).ok();
    window.update(&display);

    'ui: loop {
        let frame_start = Instant::now();

        for ev in window.events() {
            match ev {
                SimulatorEvent::Quit => break 'ui,
                SimulatorEvent::KeyDown { keycode, repeat, .. } => {
                    if repeat {
                        continue;
                    }
                    match keycode {
                        Keycode::Escape => break 'ui,
                        Keycode::R => {
                            info!("reload requested from the window");
                            events_tx.send(ControlEvent::Reload).ok();
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        match latest_frame(&frames_rx) {
            Ok(Some(frame)) => paint(&mut display, &frame),
            Ok(None) => {}
            Err(_) => break 'ui,
        }
        window.update(&display);

        if let Some(remaining) = FRAME_TIME.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    events_tx.send(ControlEvent::Shutdown).ok();
    drop(frames_rx);
    engine
        .join()
        .map_err(|_| anyhow!("supervisor thread panicked"))?
        .context("engine failed")
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_thread_names(true).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
