//! torus-countdown executable
//!
//! `--mode scene` (default) opens the 3D window; `--mode text` prints the
//! countdown to stdout once per second.

use anyhow::{Context, Result};
use clap::Parser;

use torus_countdown::app::{self, text_mode};
use torus_countdown::config::{Cli, Mode};
use torus_countdown::panic_handler::install_panic_handler;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    install_panic_handler("logs".into());

    let cli = Cli::parse();
    let config = cli.resolve().context("Failed to resolve configuration")?;
    log::info!(
        "[main] Mode {:?}, deadline {}, past deadline {:?}",
        config.mode,
        config.deadline,
        config.past_deadline
    );

    match config.mode {
        Mode::Text => {
            let countdown = config.countdown().context("Invalid deadline")?;
            text_mode::run(&countdown, cli.ticks).context("Text countdown failed")?;
        }
        Mode::Scene => {
            app::run_scene(&config).context("Scene window failed")?;
        }
    }

    Ok(())
}
