use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use enginekeep_native::{Config, EngineError};

/// Engine settings persisted as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub epoch_interruption: bool,
    pub consume_fuel: bool,
    pub max_wasm_stack: usize,
    pub parallel_compilation: bool,
    /// Period of the epoch ticker in milliseconds.
    pub epoch_tick_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            epoch_interruption: true,
            consume_fuel: false,
            max_wasm_stack: Self::DEFAULT_MAX_WASM_STACK,
            parallel_compilation: true,
            epoch_tick_ms: Self::DEFAULT_EPOCH_TICK_MS,
        }
    }
}

impl EngineSettings {
    pub const DEFAULT_MAX_WASM_STACK: usize = 512 * 1024;
    pub const DEFAULT_EPOCH_TICK_MS: u64 = 10;

    fn normalize(&mut self) {
        self.epoch_tick_ms = self.epoch_tick_ms.max(1);
    }

    /// Build a native config carrying these settings.
    pub fn to_config(&self) -> Result<Config, EngineError> {
        let mut config = Config::new()?;
        config
            .epoch_interruption(self.epoch_interruption)
            .consume_fuel(self.consume_fuel)
            .max_wasm_stack(self.max_wasm_stack)
            .parallel_compilation(self.parallel_compilation);
        Ok(config)
    }
}

fn xdg_config_home() -> anyhow::Result<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME") {
        let dir = PathBuf::from(dir);
        if dir.as_os_str().is_empty() {
            anyhow::bail!("XDG_CONFIG_HOME is set but empty");
        }
        return Ok(dir);
    }

    let home = std::env::var_os("HOME").ok_or_else(|| anyhow::anyhow!("HOME is not set"))?;
    let home = PathBuf::from(home);
    if home.as_os_str().is_empty() {
        anyhow::bail!("HOME is set but empty");
    }
    Ok(home.join(".config"))
}

pub fn settings_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_home()?.join("enginekeep").join("settings.json"))
}

/// Load settings from `path`. A missing file is `Ok(None)`.
pub fn load_settings_from(path: &Path) -> anyhow::Result<Option<EngineSettings>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    let mut settings: EngineSettings = serde_json::from_str(&raw)
        .with_context(|| format!("parse {}", path.display()))?;
    settings.normalize();
    Ok(Some(settings))
}

pub fn save_settings_to(path: &Path, settings: &EngineSettings) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("invalid settings path: {}", path.display()))?;
    std::fs::create_dir_all(dir)?;

    let mut settings = settings.clone();
    settings.normalize();

    let json = serde_json::to_string_pretty(&settings)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(tmp, path)?;
    Ok(())
}

/// Load settings from the default location, falling back to defaults.
pub fn load_settings() -> anyhow::Result<EngineSettings> {
    let path = settings_path()?;
    Ok(load_settings_from(&path)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_settings_from(&dir.path().join("settings.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = EngineSettings {
            epoch_interruption: false,
            consume_fuel: true,
            max_wasm_stack: 1 << 20,
            parallel_compilation: false,
            epoch_tick_ms: 25,
        };
        save_settings_to(&path, &settings).unwrap();

        assert_eq!(load_settings_from(&path).unwrap(), Some(settings));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn partial_file_fills_defaults_and_clamps_tick() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "consume_fuel": true, "epoch_tick_ms": 0 }"#).unwrap();

        let loaded = load_settings_from(&path).unwrap().unwrap();
        assert!(loaded.consume_fuel);
        assert!(loaded.epoch_interruption);
        assert_eq!(loaded.max_wasm_stack, EngineSettings::DEFAULT_MAX_WASM_STACK);
        assert_eq!(loaded.epoch_tick_ms, 1);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();

        let err = load_settings_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
    }

    #[test]
    fn to_config_produces_fresh_config() {
        let config = EngineSettings::default().to_config().unwrap();
        assert!(!config.is_consumed());
    }

    #[test]
    fn settings_reach_the_engine() {
        let settings = EngineSettings {
            epoch_interruption: false,
            consume_fuel: true,
            max_wasm_stack: 64 * 1024,
            parallel_compilation: false,
            epoch_tick_ms: 5,
        };
        let config = settings.to_config().unwrap();
        let engine = enginekeep_native::Engine::with_config(&config).unwrap();

        assert_eq!(engine.epoch_interruption(), Ok(false));
        assert_eq!(engine.consume_fuel(), Ok(true));
        assert_eq!(engine.max_wasm_stack(), Ok(64 * 1024));
        assert_eq!(engine.parallel_compilation(), Ok(false));
    }
}
