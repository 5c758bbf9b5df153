use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use std::time::Instant;

use anyhow::Context;

use enginekeep_core::settings::EngineSettings;
use enginekeep_native::Engine;

use crate::format::{format_duration, format_number};

pub fn run_benchmark(
    settings: &EngineSettings,
    parallel: usize,
    increments: u64,
) -> anyhow::Result<()> {
    let parallel = parallel.max(1);
    let total = (parallel as u64)
        .checked_mul(increments)
        .ok_or_else(|| anyhow::anyhow!("benchmark increment count overflow"))?;

    let config = settings.to_config().context("allocate engine config")?;
    let engine = Engine::with_config(&config).context("create engine from settings")?;
    let start_epoch = engine.current_epoch()?;

    println!("Parallel threads: {}", format_number(parallel as u64));
    println!("Increments per thread: {}", format_number(increments));
    println!("Total increments: {}", format_number(total));

    let barrier = Arc::new(Barrier::new(parallel + 1));
    let mut handles = Vec::with_capacity(parallel);
    for _worker in 0..parallel {
        let engine = engine.clone();
        let barrier = barrier.clone();

        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..increments {
                engine.increment_epoch();
            }
        }));
    }

    barrier.wait();
    let started_at = Instant::now();
    for handle in handles {
        if handle.join().is_err() {
            anyhow::bail!("benchmark worker thread panicked");
        }
    }
    let duration = started_at.elapsed();

    let advanced = engine.current_epoch()? - start_epoch;
    validate_epoch(advanced, total)?;

    let per_sec = (total as f64) / duration.as_secs_f64().max(f64::EPSILON);
    println!("Duration: {}", format_duration(duration));
    println!("Throughput: {:.2} increments/s", per_sec);

    if !engine.release() {
        anyhow::bail!("engine was released before the benchmark finished");
    }
    if engine.release() {
        anyhow::bail!("engine released twice");
    }
    println!("Engine released.");
    Ok(())
}

fn validate_epoch(advanced: u64, expected: u64) -> anyhow::Result<()> {
    if advanced != expected {
        anyhow::bail!("epoch advanced by {advanced}, expected {expected}");
    }
    Ok(())
}
