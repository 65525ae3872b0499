//! # Animatronic Eyes
//!
//! Runs the eye mechanism control loop.
//!
//! The servo shield and Nunchuck are reached through simulated backends, so
//! the binary performs a dry run: every pulse the mechanism commands is logged
//! at debug level (`RUST_LOG=debug`).

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;

use animatronic_eyes::config::Config;
use animatronic_eyes::eyes::EyeMechanism;
use animatronic_eyes::hardware::{CenteredJoystick, LoggingServoDriver};

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Number of ticks between status log messages
const LOG_INTERVAL_TICKS: u64 = 250;

/// Main entry point for the eye mechanism
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration from the first argument, `config/default.toml`,
///      or the built-in reference calibration
///    - Build the mechanism against the simulated backends
///
/// 2. **Main Loop**
///    - Run one control tick every `update_interval_ms`
///    - Log status every 250 ticks (5 seconds at the default 20ms)
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if the configuration cannot be read or is invalid.
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Animatronic Eyes v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_config(std::env::args().nth(1))?;
    let period_ms = config.hardware.update_interval_ms;

    let driver = LoggingServoDriver::new(config.hardware.servo_shield_address);
    let joystick = CenteredJoystick::default();
    let started = Instant::now();
    let mut eyes = EyeMechanism::new(&config, driver, joystick, StdRng::from_entropy(), 0)
        .context("Failed to initialize eye mechanism")?;

    let mut tick_interval = interval(Duration::from_millis(period_ms));
    tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Starting control loop every {}ms", period_ms);
    info!("Press Ctrl+C to exit");

    let mut last_log_tick: u64 = 0;
    let mut write_failures: u64 = 0;

    // Main control loop
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                let now_ms = started.elapsed().as_millis() as u64;
                let report = eyes.tick(now_ms);
                write_failures += report.write_failures as u64;

                if eyes.ticks() - last_log_tick >= LOG_INTERVAL_TICKS {
                    info!(
                        "Tick {}: {:?} via {:?}, pulses {:?}, {} servo writes, {} write failures",
                        eyes.ticks(),
                        report.state,
                        report.source,
                        report.pulses,
                        eyes.driver().writes(),
                        write_failures
                    );
                    last_log_tick = eyes.ticks();
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total ticks: {}", eyes.ticks());
                break;
            }
        }
    }

    Ok(())
}

/// Loads the configuration from `path`, the default file, or built-in defaults.
fn load_config(path: Option<String>) -> Result<Config> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path);
            Config::load(&path)
                .with_context(|| format!("Failed to load configuration from {}", path))
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            info!("Loading configuration from {}", DEFAULT_CONFIG_PATH);
            Config::load(DEFAULT_CONFIG_PATH).with_context(|| {
                format!("Failed to load configuration from {}", DEFAULT_CONFIG_PATH)
            })
        }
        None => {
            info!("No configuration file, using reference calibration");
            Ok(Config::default())
        }
    }
}
