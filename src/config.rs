use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::refresher::DEFAULT_EXECUTE_RATE;

/// One day.
pub const MAX_INTERVAL_SECS: f64 = 86_400.0;
/// One frame every ten seconds.
pub const MIN_DISPLAY_RATE: f64 = 0.1;
pub const MAX_DISPLAY_RATE: f64 = 240.0;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default)]
    pub viewer: ViewerConfig,
}

/// How the watched command is run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between the end of one run and the start of the next
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,

    /// Shell used to run the command (default: /bin/sh)
    #[serde(default)]
    pub shell: Option<String>,
}

fn default_interval_secs() -> f64 {
    1.0 / DEFAULT_EXECUTE_RATE
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            shell: None,
        }
    }
}

impl RefreshConfig {
    /// Maximum runs per second.
    pub fn execute_rate(&self) -> f64 {
        1.0 / self.interval_secs
    }
}

/// Display behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Maximum frames per second
    #[serde(default = "default_display_rate")]
    pub display_rate: f64,

    /// Stay at the bottom when new output arrives while scrolled to the end
    #[serde(default)]
    pub follow_output: bool,

    /// Columns per tab stop when expanding tabs
    #[serde(default = "default_tab_width")]
    pub tab_width: usize,
}

fn default_display_rate() -> f64 {
    5.0
}

fn default_tab_width() -> usize {
    8
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            display_rate: default_display_rate(),
            follow_output: false,
            tab_width: default_tab_width(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file. Values are not validated here.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(config)
    }

    /// Load `<config_dir>/watchl/config.json` if it exists, defaults otherwise
    pub fn load_default() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Check value ranges. Run once on the merged configuration, after
    /// command-line overrides, since those take precedence over the file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let interval = self.refresh.interval_secs;
        if !(interval > 0.0 && interval <= MAX_INTERVAL_SECS) {
            return Err(ConfigError::Invalid(format!(
                "refresh.interval_secs must be greater than 0 and at most {}, got {}",
                MAX_INTERVAL_SECS, interval
            )));
        }
        let rate = self.viewer.display_rate;
        if !(MIN_DISPLAY_RATE..=MAX_DISPLAY_RATE).contains(&rate) {
            return Err(ConfigError::Invalid(format!(
                "viewer.display_rate must be between {} and {}, got {}",
                MIN_DISPLAY_RATE, MAX_DISPLAY_RATE, rate
            )));
        }
        // Both loops throttle on 1/rate; it has to fit a Duration.
        for (name, secs) in [
            ("refresh.interval_secs", interval),
            ("viewer.display_rate", 1.0 / rate),
        ] {
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "{} gives an unusable period of {}s",
                    name, secs
                )));
            }
        }
        if !(1..=16).contains(&self.viewer.tab_width) {
            return Err(ConfigError::Invalid(format!(
                "viewer.tab_width must be between 1 and 16, got {}",
                self.viewer.tab_width
            )));
        }
        Ok(())
    }
}

/// `<config_dir>/watchl/config.json`, e.g. `~/.config/watchl/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("watchl").join("config.json"))
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
