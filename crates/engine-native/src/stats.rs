//! Process-wide counters kept by the native library.

use crate::ffi;

/// Number of native engines currently allocated in this process.
pub fn live_engines() -> u64 {
    // SAFETY: reads an atomic counter; no preconditions.
    unsafe { ffi::ek_stats_live_engines() }
}

/// Number of native configs currently allocated and not yet absorbed by an engine.
pub fn live_configs() -> u64 {
    // SAFETY: as above.
    unsafe { ffi::ek_stats_live_configs() }
}
