//! Host-side handle owning a native engine.

use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::config::Config;
use crate::error::EngineError;
use crate::ffi;

/// Handle to a native engine.
///
/// Engines are a form of global configuration for compilation and execution;
/// one engine backs any number of stores. Cloning an `Engine` is cheap and all
/// clones share the same native engine.
///
/// The native engine is released exactly once: by the first call to
/// [`Engine::release`] through any clone, or when the last clone is dropped,
/// whichever happens first. The memory itself is freed as soon as no
/// [`NativeEngine`] guard is still using it. After release, fallible accessors
/// return [`EngineError::Released`] and [`Engine::increment_epoch`] panics.
#[derive(Clone)]
pub struct Engine {
    // `None` once released. Nothing here ever blocks: readers clone or borrow
    // the `Arc`, release swaps it out.
    slot: Arc<ArcSwapOption<NativeSlot>>,
}

/// Sole owner of the native pointer; dropping it frees the engine.
struct NativeSlot {
    ptr: NonNull<ffi::EkEngine>,
}

// SAFETY: the native engine is thread-safe for increments and reads, and it is
// deleted only from `Drop`, which runs once on the last reference.
unsafe impl Send for NativeSlot {}
// SAFETY: see above.
unsafe impl Sync for NativeSlot {}

impl NativeSlot {
    fn adopt(raw: *mut ffi::EkEngine) -> Option<Self> {
        NonNull::new(raw).map(|ptr| Self { ptr })
    }

    fn increment_epoch(&self) {
        // SAFETY: `self` is alive, so the engine is; the native increment is atomic.
        unsafe { ffi::ek_engine_increment_epoch(self.ptr.as_ptr()) }
    }

    fn current_epoch(&self) -> u64 {
        // SAFETY: as above; the native read is atomic.
        unsafe { ffi::ek_engine_current_epoch(self.ptr.as_ptr()) }
    }

    fn epoch_interruption(&self) -> bool {
        // SAFETY: as above; settings are immutable after creation.
        unsafe { ffi::ek_engine_epoch_interruption(self.ptr.as_ptr()) }
    }

    fn consume_fuel(&self) -> bool {
        // SAFETY: as above.
        unsafe { ffi::ek_engine_consume_fuel(self.ptr.as_ptr()) }
    }

    fn max_wasm_stack(&self) -> usize {
        // SAFETY: as above.
        unsafe { ffi::ek_engine_max_wasm_stack(self.ptr.as_ptr()) }
    }

    fn parallel_compilation(&self) -> bool {
        // SAFETY: as above.
        unsafe { ffi::ek_engine_parallel_compilation(self.ptr.as_ptr()) }
    }
}

impl Drop for NativeSlot {
    fn drop(&mut self) {
        // SAFETY: last reference to the pointer; nothing can observe it afterwards.
        unsafe { ffi::ek_engine_delete(self.ptr.as_ptr()) };
        tracing::debug!(engine = ?self.ptr, "native engine freed");
    }
}

impl Engine {
    fn adopt(raw: *mut ffi::EkEngine) -> Option<Self> {
        NativeSlot::adopt(raw).map(|native| Self {
            slot: Arc::new(ArcSwapOption::from_pointee(native)),
        })
    }

    /// Create an engine with the default configuration.
    pub fn new() -> Result<Self, EngineError> {
        // SAFETY: no preconditions; ownership of the result moves into the handle.
        let raw = unsafe { ffi::ek_engine_new() };
        let engine = Self::adopt(raw).ok_or(EngineError::OutOfMemory)?;
        tracing::debug!("native engine created with default config");
        Ok(engine)
    }

    /// Create an engine from `config`.
    ///
    /// The config is consumed whether or not creation succeeds and cannot be
    /// used again.
    ///
    /// # Panics
    /// If `config` was already consumed by another engine.
    pub fn with_config(config: &Config) -> Result<Self, EngineError> {
        let Some(native_config) = config.take_native() else {
            panic!("config already used");
        };

        // SAFETY: the pointer was detached from `config`, so nothing else will
        // free it; the native call takes ownership on every path.
        let raw = unsafe { ffi::ek_engine_new_with_config(native_config.as_ptr()) };
        let engine = Self::adopt(raw).ok_or(EngineError::Creation)?;
        tracing::debug!("native engine created from config");
        Ok(engine)
    }

    /// Release the native engine now instead of waiting for the last handle to drop.
    ///
    /// Returns `true` for the single call that performed the release, `false`
    /// for every other call (including concurrent ones). Never waits: if a
    /// [`NativeEngine`] guard is still in use, the memory is freed when the
    /// last such guard is dropped.
    pub fn release(&self) -> bool {
        match self.slot.swap(None) {
            Some(native) => {
                tracing::debug!(engine = ?native.ptr, "native engine released");
                true
            }
            None => false,
        }
    }

    /// Whether the native engine has been released.
    pub fn is_released(&self) -> bool {
        self.slot.load().is_none()
    }

    /// Keep the native engine alive for the duration of a native call.
    ///
    /// The returned guard holds its own reference, so the engine stays
    /// allocated until the guard is dropped even if it is released meanwhile.
    pub fn native(&self) -> Result<NativeEngine, EngineError> {
        let slot = self.slot.load_full().ok_or(EngineError::Released)?;
        Ok(NativeEngine { slot })
    }

    fn with_native<R>(&self, f: impl FnOnce(&NativeSlot) -> R) -> Result<R, EngineError> {
        let slot = self.slot.load();
        let native = slot.as_deref().ok_or(EngineError::Released)?;
        Ok(f(native))
    }

    /// Increase the epoch by one.
    ///
    /// Any store created from this engine whose epoch deadline is now reached
    /// will be interrupted at its next check. Safe to call from any thread and
    /// never blocks.
    ///
    /// # Panics
    /// If the engine was released.
    pub fn increment_epoch(&self) {
        if let Err(err) = self.try_increment_epoch() {
            panic!("increment_epoch: {err}");
        }
    }

    /// Like [`Engine::increment_epoch`], for callers that may outlive a release.
    pub fn try_increment_epoch(&self) -> Result<(), EngineError> {
        self.with_native(NativeSlot::increment_epoch)
    }

    /// Current epoch value.
    pub fn current_epoch(&self) -> Result<u64, EngineError> {
        self.with_native(NativeSlot::current_epoch)
    }

    /// Whether the engine was built with epoch interruption enabled.
    pub fn epoch_interruption(&self) -> Result<bool, EngineError> {
        self.with_native(NativeSlot::epoch_interruption)
    }

    /// Whether the engine was built with fuel accounting.
    pub fn consume_fuel(&self) -> Result<bool, EngineError> {
        self.with_native(NativeSlot::consume_fuel)
    }

    /// Maximum wasm stack size the engine was built with, in bytes.
    pub fn max_wasm_stack(&self) -> Result<usize, EngineError> {
        self.with_native(NativeSlot::max_wasm_stack)
    }

    /// Whether the engine compiles on multiple threads.
    pub fn parallel_compilation(&self) -> Result<bool, EngineError> {
        self.with_native(NativeSlot::parallel_compilation)
    }

    /// Whether two handles share the same native engine.
    pub fn same(a: &Engine, b: &Engine) -> bool {
        Arc::ptr_eq(&a.slot, &b.slot)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("released", &self.is_released())
            .finish()
    }
}

/// A live native engine, kept allocated while this guard exists.
pub struct NativeEngine {
    slot: Arc<NativeSlot>,
}

impl NativeEngine {
    /// Raw pointer for native calls. Valid until this guard is dropped.
    pub fn as_ptr(&self) -> *mut ffi::EkEngine {
        self.slot.ptr.as_ptr()
    }

    /// Increase the epoch by one.
    pub fn increment_epoch(&self) {
        self.slot.increment_epoch()
    }

    /// Current epoch value.
    pub fn current_epoch(&self) -> u64 {
        self.slot.current_epoch()
    }

    /// Whether the engine was built with epoch interruption enabled.
    pub fn epoch_interruption(&self) -> bool {
        self.slot.epoch_interruption()
    }
}

impl fmt::Debug for NativeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NativeEngine").field(&self.slot.ptr).finish()
    }
}
