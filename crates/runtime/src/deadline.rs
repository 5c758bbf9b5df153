//! Epoch deadlines as seen by execution contexts.

use std::time::Duration;

use enginekeep_native::{Engine, EngineError};

/// Number of epoch ticks of length `tick` needed to cover `timeout`.
///
/// Rounds up and never returns zero, so a deadline always lies in the future.
pub fn deadline_ticks(timeout: Duration, tick: Duration) -> u64 {
    let tick_ns = tick.as_nanos().max(1);
    let ticks = timeout.as_nanos().div_ceil(tick_ns);
    u64::try_from(ticks).unwrap_or(u64::MAX).max(1)
}

/// An absolute epoch value after which an execution should be interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EpochDeadline {
    target: u64,
}

impl EpochDeadline {
    /// Deadline `ticks` increments after the engine's current epoch.
    pub fn after(engine: &Engine, ticks: u64) -> Result<Self, EngineError> {
        let now = engine.current_epoch()?;
        Ok(Self {
            target: now.saturating_add(ticks),
        })
    }

    /// Epoch value at which the deadline is reached.
    pub fn target(&self) -> u64 {
        self.target
    }

    /// Whether the engine's epoch has reached the deadline.
    pub fn is_reached(&self, engine: &Engine) -> Result<bool, EngineError> {
        Ok(engine.current_epoch()? >= self.target)
    }

    /// Increments still needed before the deadline is reached.
    pub fn remaining(&self, engine: &Engine) -> Result<u64, EngineError> {
        Ok(self.target.saturating_sub(engine.current_epoch()?))
    }
}
