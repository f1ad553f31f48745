//! Engine configuration loaded from TOML.
//!
//! ```toml
//! [judgement]
//! marv = 16.0
//! perf = 40.0
//! great = 73.0
//! good = 103.0
//! okay = 127.0
//!
//! [logging]
//! level = "info"
//! ```

use crate::error::{Error, Result};
use crate::models::engine::hit_window::HitWindow;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::str::FromStr;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (`off`, `error` .. `trace`) used when `RUST_LOG` is not set.
    pub level: String,
}

impl LoggingConfig {
    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(self.level.trim())
            .map_err(|_| Error::Config(format!("unknown log level {:?}", self.level)))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub judgement: HitWindow,
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Loads the config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("CONFIG: {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content).inspect_err(|e| {
            log::error!("Failed to parse TOML file {:?}: {}", path, e);
        })
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.judgement.validate()?;
        config.logging.level_filter()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
