//! Tool configuration

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rad_model::ModelRegistry;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings read from `config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Port used when `--port` is not given
    pub default_port: String,
    /// Model used when `--radio-model` is not given
    pub default_model: Option<String>,
    /// Tracing filter directives used when `RUST_LOG` is unset
    pub log_filter: Option<String>,
    /// Per-model reset delay in seconds, replacing the built-in value
    pub reset_delay_overrides: BTreeMap<String, f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_port: "/dev/ttyUSB0".to_string(),
            default_model: None,
            log_filter: None,
            reset_delay_overrides: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Get the XDG config directory for radijator
    /// Uses $XDG_CONFIG_HOME/radijator, falls back to ~/.config/radijator
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("radijator"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("radijator"))
    }

    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load the configuration
    ///
    /// An explicit path must exist and parse. Without one, the default
    /// location is tried and any problem there falls back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default_path()
                .and_then(|path| fs::read_to_string(path).ok())
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Built-in registry with this config's reset delay overrides applied
    pub fn registry(&self) -> Result<ModelRegistry> {
        let mut registry = ModelRegistry::builtin();
        for (model, secs) in &self.reset_delay_overrides {
            let delay = Duration::try_from_secs_f64(*secs).with_context(|| {
                format!("Invalid reset delay {} for model '{}'", secs, model)
            })?;
            debug!("Config overrides reset delay of {} to {:?}", model, delay);
            registry = registry
                .with_reset_delay(model, delay)
                .context("Invalid reset_delay_overrides in config")?;
        }
        Ok(registry)
    }
}
