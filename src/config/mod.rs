//! Persistent user preferences.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::metrics::DEFAULT_WARNING_RATIO;
use crate::domain::DEFAULT_CURRENCY_SYMBOL;
use crate::storage::DEFAULT_STORE_KEY;
use crate::utils::{paths, persistence::write_atomic};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serde(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Symbol applied to newly opened sessions.
    pub currency_symbol: String,
    /// Spend ratio at which the dashboard turns from "clear" to "tricky".
    pub warning_ratio: f64,
    pub store_key: String,
    /// Directory holding the session blob. Defaults to the app data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Optional offline barcode catalog used by `scan`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
    pub ui_color_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.into(),
            warning_ratio: DEFAULT_WARNING_RATIO,
            store_key: DEFAULT_STORE_KEY.into(),
            data_dir: None,
            catalog_path: None,
            ui_color_enabled: true,
        }
    }
}

impl Config {
    pub fn resolve_data_dir(&self, base: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| base.join("data"))
    }

    /// Ratio clamped into `(0, 1]`; out-of-range values fall back to the default.
    pub fn effective_warning_ratio(&self) -> f64 {
        if self.warning_ratio.is_finite() && self.warning_ratio > 0.0 && self.warning_ratio <= 1.0
        {
            self.warning_ratio
        } else {
            DEFAULT_WARNING_RATIO
        }
    }
}

/// Handles persistence for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_base_dir(paths::app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&base)?;
        let config_path = paths::config_file_in(&base);
        Ok(Self {
            base_dir: base,
            config_path,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Missing file means defaults.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.config_path.exists() {
            let data = fs::read_to_string(&self.config_path)?;
            serde_json::from_str(&data).map_err(|err| ConfigError::Serde(err.to_string()))
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|err| ConfigError::Serde(err.to_string()))?;
        write_atomic(&self.config_path, &json)?;
        Ok(())
    }
}
