#![deny(missing_docs)]
#![deny(unreachable_pub)]

//! Safe handles over the native enginekeep library: engines, configs and epochs.

mod config;
mod engine;
mod error;
mod ffi;

/// Native allocation counters.
pub mod stats;

pub use config::Config;
pub use engine::{Engine, NativeEngine};
pub use error::EngineError;
pub use ffi::{EkConfig, EkEngine};
