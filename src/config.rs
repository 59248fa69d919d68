//! Deployment settings, stored as [ron].
//!
//! Every field has a default, so a config file only needs the settings it
//! changes:
//!
//! ```text
//! (capacity: 100, policy: Compress)
//! ```

use crate::rolling_window::{EvictionPolicy, DEFAULT_CAPACITY};

use serde::{Deserialize, Serialize};
use std::{
    borrow::Cow,
    fmt,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Settings shared by every part of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    /// Points kept per chart.
    pub capacity: usize,
    /// How charts make room once they are full.
    pub policy: EvictionPolicy,
    /// Serial line speed.
    pub baud_rate: u32,
    /// Where exported tables are written.
    pub export_dir: PathBuf,
    /// How often the dashboard drains the link and redraws, in milliseconds.
    pub tick_rate_ms: u64,
    /// Lines kept in the activity panel.
    pub activity_lines: usize,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            policy: EvictionPolicy::default(),
            baud_rate: 115200,
            export_dir: PathBuf::from("."),
            tick_rate_ms: 100,
            activity_lines: 200,
        }
    }
}

/// Why a config could not be loaded, saved or used.
#[derive(Debug)]
pub enum ConfigError {
    /// Returned when the config file cannot be read or written.
    IoError(std::io::Error),

    /// Returned when serialization fails.
    RonError(ron::Error),

    /// Returned when the config file is not valid ron.
    RonSpannedError(ron::de::SpannedError),

    /// Returned when a value is out of range.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            ConfigError::IoError(error) => Cow::from(format!("io error: {}", error)),
            ConfigError::RonError(error) => Cow::from(format!("ron error: {}", error)),
            ConfigError::RonSpannedError(error) => {
                Cow::from(format!("ron spanning error: {}", error))
            }
            ConfigError::Invalid(why) => Cow::from(format!("invalid config: {}", why)),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for ConfigError {}

impl DashConfig {
    /// Read a [DashConfig] from the path provided.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(ConfigError::IoError)?;
        Self::from_ron(&text)
    }

    /// Parse and validate a [DashConfig].
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text).map_err(ConfigError::RonSpannedError)?;
        config.validate()?;
        Ok(config)
    }

    /// Write out a [DashConfig] to the path provided.
    pub fn to_path(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(ConfigError::RonError)?;
        fs::write(path, text).map_err(ConfigError::IoError)
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be at least 1"));
        }
        if self.tick_rate_ms == 0 {
            return Err(ConfigError::Invalid("tick_rate_ms must be at least 1"));
        }
        Ok(())
    }

    /// [`DashConfig::tick_rate_ms`] as a [`Duration`].
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}
