//! FFI bindings to the native enginekeep library.

/// Opaque native engine (`ek_engine_t`).
#[repr(C)]
pub struct EkEngine {
    _private: [u8; 0],
}

/// Opaque native configuration (`ek_config_t`).
#[repr(C)]
pub struct EkConfig {
    _private: [u8; 0],
}

unsafe extern "C" {
    pub(crate) fn ek_config_new() -> *mut EkConfig;
    pub(crate) fn ek_config_delete(config: *mut EkConfig);

    pub(crate) fn ek_config_epoch_interruption_set(config: *mut EkConfig, enable: bool);
    pub(crate) fn ek_config_consume_fuel_set(config: *mut EkConfig, enable: bool);
    pub(crate) fn ek_config_max_wasm_stack_set(config: *mut EkConfig, size: usize);
    pub(crate) fn ek_config_parallel_compilation_set(config: *mut EkConfig, enable: bool);

    pub(crate) fn ek_engine_new() -> *mut EkEngine;

    /// Takes ownership of `config` whether or not an engine is returned.
    pub(crate) fn ek_engine_new_with_config(config: *mut EkConfig) -> *mut EkEngine;
    pub(crate) fn ek_engine_delete(engine: *mut EkEngine);

    pub(crate) fn ek_engine_increment_epoch(engine: *mut EkEngine);
    pub(crate) fn ek_engine_current_epoch(engine: *mut EkEngine) -> u64;
    pub(crate) fn ek_engine_epoch_interruption(engine: *const EkEngine) -> bool;
    pub(crate) fn ek_engine_consume_fuel(engine: *const EkEngine) -> bool;
    pub(crate) fn ek_engine_max_wasm_stack(engine: *const EkEngine) -> usize;
    pub(crate) fn ek_engine_parallel_compilation(engine: *const EkEngine) -> bool;

    pub(crate) fn ek_stats_live_engines() -> u64;
    pub(crate) fn ek_stats_live_configs() -> u64;
}
