//! Native engine configuration.

use std::fmt;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::error::EngineError;
use crate::ffi;

/// Configuration for a native engine.
///
/// A `Config` is consumed by [`Engine::with_config`](crate::Engine::with_config)
/// and cannot be used again afterwards: the native object now belongs to the
/// engine (or was freed by a failed conversion), and dropping the `Config`
/// frees nothing.
pub struct Config {
    // Null once consumed.
    native: AtomicPtr<ffi::EkConfig>,
}

impl Config {
    /// Allocate a native config with default settings.
    pub fn new() -> Result<Self, EngineError> {
        // SAFETY: no preconditions; ownership of the result moves into `Self`.
        let raw = unsafe { ffi::ek_config_new() };
        if raw.is_null() {
            return Err(EngineError::OutOfMemory);
        }
        Ok(Self {
            native: AtomicPtr::new(raw),
        })
    }

    /// Whether an engine has already absorbed this config.
    pub fn is_consumed(&self) -> bool {
        self.native.load(Ordering::Acquire).is_null()
    }

    /// Enable epoch-based interruption for stores created from the engine.
    ///
    /// # Panics
    /// If the config was already consumed.
    pub fn epoch_interruption(&mut self, enable: bool) -> &mut Self {
        let raw = self.live_ptr();
        // SAFETY: `raw` is non-null and exclusively owned through `&mut self`.
        unsafe { ffi::ek_config_epoch_interruption_set(raw, enable) };
        self
    }

    /// Enable fuel accounting.
    ///
    /// # Panics
    /// If the config was already consumed.
    pub fn consume_fuel(&mut self, enable: bool) -> &mut Self {
        let raw = self.live_ptr();
        // SAFETY: as above.
        unsafe { ffi::ek_config_consume_fuel_set(raw, enable) };
        self
    }

    /// Maximum wasm stack size in bytes. Zero is rejected when the engine is created.
    ///
    /// # Panics
    /// If the config was already consumed.
    pub fn max_wasm_stack(&mut self, size: usize) -> &mut Self {
        let raw = self.live_ptr();
        // SAFETY: as above.
        unsafe { ffi::ek_config_max_wasm_stack_set(raw, size) };
        self
    }

    /// Compile functions on multiple threads.
    ///
    /// # Panics
    /// If the config was already consumed.
    pub fn parallel_compilation(&mut self, enable: bool) -> &mut Self {
        let raw = self.live_ptr();
        // SAFETY: as above.
        unsafe { ffi::ek_config_parallel_compilation_set(raw, enable) };
        self
    }

    /// Detach the native config. Returns `None` if it was already taken.
    ///
    /// The swap is the single consumption point: of any number of racing
    /// callers exactly one receives the pointer.
    pub(crate) fn take_native(&self) -> Option<NonNull<ffi::EkConfig>> {
        NonNull::new(self.native.swap(ptr::null_mut(), Ordering::AcqRel))
    }

    fn live_ptr(&mut self) -> *mut ffi::EkConfig {
        let raw = *self.native.get_mut();
        assert!(!raw.is_null(), "config already used");
        raw
    }
}

impl Drop for Config {
    fn drop(&mut self) {
        let raw = *self.native.get_mut();
        if !raw.is_null() {
            // SAFETY: a non-null pointer was never handed to an engine, so we still own it.
            unsafe { ffi::ek_config_delete(raw) };
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_native_succeeds_once() {
        let config = Config::new().unwrap();
        assert!(!config.is_consumed());

        let raw = config.take_native().expect("first take");
        assert!(config.is_consumed());
        assert!(config.take_native().is_none());

        // SAFETY: the test took ownership above.
        unsafe { ffi::ek_config_delete(raw.as_ptr()) };
    }

    #[test]
    #[should_panic(expected = "config already used")]
    fn setters_panic_after_consumption() {
        let mut config = Config::new().unwrap();
        let raw = config.take_native().unwrap();
        // SAFETY: the test took ownership above.
        unsafe { ffi::ek_config_delete(raw.as_ptr()) };

        config.epoch_interruption(true);
    }

    #[test]
    fn setters_chain() {
        let mut config = Config::new().unwrap();
        config
            .epoch_interruption(true)
            .consume_fuel(true)
            .max_wasm_stack(1 << 20)
            .parallel_compilation(false);
        assert!(!config.is_consumed());
        assert_eq!(format!("{config:?}"), "Config { consumed: false }");
    }
}
