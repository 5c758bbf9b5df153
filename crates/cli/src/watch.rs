use std::time::{Duration, Instant};

use anyhow::Context;

use enginekeep_core::settings::EngineSettings;
use enginekeep_native::Engine;
use enginekeep_runtime::{EpochDeadline, EpochTicker, deadline_ticks};

use crate::format::{format_duration, format_number};

/// Tick the epoch until a deadline `timeout` away is reached, or CTRL+C.
pub async fn run_watch(
    settings: &EngineSettings,
    timeout: Duration,
    tick: Duration,
) -> anyhow::Result<()> {
    let config = settings.to_config().context("allocate engine config")?;
    let engine = Engine::with_config(&config).context("create engine from settings")?;
    if !engine.epoch_interruption()? {
        eprintln!("warning: epoch interruption is disabled; stores will not observe this deadline");
    }

    let tick = tick.max(EpochTicker::MIN_PERIOD);
    let ticks = deadline_ticks(timeout, tick);
    let deadline = EpochDeadline::after(&engine, ticks)?;
    println!(
        "Waiting for epoch {} ({} ticks of {})",
        format_number(deadline.target()),
        format_number(ticks),
        format_duration(tick)
    );

    let started_at = Instant::now();
    let ticker = EpochTicker::spawn(engine.clone(), tick);
    let mut ticks_rx = ticker.subscribe();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let reached = loop {
        tokio::select! {
            changed = ticks_rx.changed() => {
                if changed.is_err() {
                    break false;
                }
                if deadline.is_reached(&engine)? {
                    break true;
                }
            }
            _ = &mut ctrl_c => {
                eprintln!("Stop requested.");
                break false;
            }
        }
    };

    let total = ticker.stop().await?;
    let elapsed = started_at.elapsed();
    let remaining = deadline.remaining(&engine)?;
    engine.release();

    println!("{}", watch_summary(reached, elapsed, total, remaining));
    Ok(())
}

fn watch_summary(reached: bool, elapsed: Duration, total: u64, remaining: u64) -> String {
    if reached {
        format!(
            "Deadline reached after {} ({} ticks).",
            format_duration(elapsed),
            format_number(total)
        )
    } else {
        format!(
            "Stopped after {} ({} ticks), {} short of the deadline.",
            format_duration(elapsed),
            format_number(total),
            format_number(remaining)
        )
    }
}
