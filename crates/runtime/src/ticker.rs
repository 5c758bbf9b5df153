//! Background epoch ticker.

use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use enginekeep_native::Engine;

/// Tokio task that increments an engine's epoch on a fixed period.
///
/// The ticker ends when [`EpochTicker::stop`] is called, when the ticker is
/// dropped, or by itself once the engine is released.
#[derive(Debug)]
pub struct EpochTicker {
    stop_tx: watch::Sender<bool>,
    ticks_rx: watch::Receiver<u64>,
    join: JoinHandle<u64>,
}

impl EpochTicker {
    /// Smallest accepted period; shorter periods are rounded up.
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    /// Spawn a ticker on the current tokio runtime.
    ///
    /// The first increment happens one `period` after spawning.
    pub fn spawn(engine: Engine, period: Duration) -> Self {
        let period = period.max(Self::MIN_PERIOD);
        let (stop_tx, stop_rx) = watch::channel(false);
        let (ticks_tx, ticks_rx) = watch::channel(0);
        let join = tokio::spawn(run_ticker(engine, period, stop_rx, ticks_tx));
        Self {
            stop_tx,
            ticks_rx,
            join,
        }
    }

    /// Number of increments performed so far, updated on every tick.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.ticks_rx.clone()
    }

    /// Ask the task to stop without waiting for it.
    pub fn request_stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Whether the task has ended.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Stop the task and return the number of increments it performed.
    pub async fn stop(self) -> anyhow::Result<u64> {
        self.request_stop();
        self.join.await.context("epoch ticker task failed")
    }
}

async fn run_ticker(
    engine: Engine,
    period: Duration,
    mut stop_rx: watch::Receiver<bool>,
    ticks_tx: watch::Sender<u64>,
) -> u64 {
    // Burst (the default) catches up missed ticks so the epoch tracks wall time.
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

    let mut ticks = 0u64;
    loop {
        tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            _ = interval.tick() => {
                if let Err(err) = engine.try_increment_epoch() {
                    tracing::warn!(%err, ticks, "epoch ticker stopping");
                    break;
                }
                ticks += 1;
                ticks_tx.send_replace(ticks);
            }
        }
    }
    tracing::debug!(ticks, "epoch ticker finished");
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn wait_for_ticks(rx: &mut watch::Receiver<u64>, at_least: u64) {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|t| *t >= at_least))
            .await
            .expect("ticker too slow")
            .expect("ticker ended early");
    }

    #[tokio::test]
    async fn ticks_advance_the_epoch() {
        let engine = Engine::new().unwrap();
        let ticker = EpochTicker::spawn(engine.clone(), Duration::from_millis(2));
        let mut ticks = ticker.subscribe();

        wait_for_ticks(&mut ticks, 3).await;
        let total = ticker.stop().await.unwrap();

        assert!(total >= 3);
        assert_eq!(engine.current_epoch(), Ok(total));
    }

    #[tokio::test]
    async fn ticker_ends_when_engine_is_released() {
        let engine = Engine::new().unwrap();
        let ticker = EpochTicker::spawn(engine.clone(), Duration::from_millis(1));
        let mut ticks = ticker.subscribe();

        wait_for_ticks(&mut ticks, 1).await;
        assert!(engine.release());

        // The task notices the release on its next tick.
        tokio::time::timeout(Duration::from_secs(5), async {
            while !ticker.is_finished() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("ticker did not stop after release");

        assert!(ticker.stop().await.unwrap() >= 1);
    }

    #[tokio::test]
    async fn zero_period_is_rounded_up() {
        let engine = Engine::new().unwrap();
        let ticker = EpochTicker::spawn(engine.clone(), Duration::ZERO);
        let mut ticks = ticker.subscribe();

        wait_for_ticks(&mut ticks, 2).await;
        let total = ticker.stop().await.unwrap();
        assert_eq!(engine.current_epoch(), Ok(total));
    }
}
