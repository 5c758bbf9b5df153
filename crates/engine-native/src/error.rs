//! Errors returned by the engine handles.

use thiserror::Error;

/// Errors returned by [`Engine`](crate::Engine) and [`Config`](crate::Config).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The native allocator could not provide a new object.
    #[error("native allocation failed")]
    OutOfMemory,

    /// The native library rejected the configuration. The config is consumed regardless.
    #[error("native engine creation from config failed")]
    Creation,

    /// The engine was already released, explicitly or by its last handle dropping.
    #[error("engine already released")]
    Released,
}
