mod bench;
mod cli;
mod format;
mod watch;

use std::time::Duration;

use clap::Parser;

use enginekeep_core::settings::{EngineSettings, load_settings, load_settings_from};

use crate::bench::run_benchmark;
use crate::cli::Cli;
use crate::watch::run_watch;

fn resolve_settings(cli: &Cli) -> anyhow::Result<EngineSettings> {
    if let Some(path) = &cli.settings {
        return load_settings_from(path)?
            .ok_or_else(|| anyhow::anyhow!("settings file not found: {}", path.display()));
    }

    match load_settings() {
        Ok(settings) => Ok(settings),
        Err(err) => {
            eprintln!("warning: failed to read settings (using defaults): {err:#}");
            Ok(EngineSettings::default())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;

    println!("enginekeep {}", env!("CARGO_PKG_VERSION"));

    if cli.bench {
        run_benchmark(&settings, cli.parallel as usize, cli.increments)?;
        return Ok(());
    }

    let tick = cli
        .tick
        .unwrap_or(Duration::from_millis(settings.epoch_tick_ms));
    run_watch(&settings, cli.timeout, tick).await
}
