//! Configuration structures for the ts-model-graph tools.
//!
//! This module provides configuration types for all components:
//!
//! - [`ExtractConfig`] - Model extraction settings
//! - [`WatchConfig`] - File watcher settings (debouncing, recursion)
//! - [`OutputConfig`] - JSON output settings
//! - [`Config`] - Root configuration combining all settings
//!
//! Every section implements [`Default`] and is `#[serde(default)]`, so a
//! configuration file only needs to mention the options it changes.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for the model extraction engine.
///
/// # Examples
///
/// ```
/// use tg_core::ExtractConfig;
///
/// let config = ExtractConfig::default();
/// assert!(!config.inherited_fields);
/// assert!(config.include_classes);
/// assert_eq!(config.alias_depth_limit, 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Whether members inherited from local supertypes are listed in a
    /// model's schema. The `extends` edge is recorded either way.
    pub inherited_fields: bool,

    /// Whether class declarations produce models.
    pub include_classes: bool,

    /// Maximum number of alias hops followed when expanding a type.
    ///
    /// Guards against cyclic aliases such as `type A = B; type B = A`.
    pub alias_depth_limit: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            inherited_fields: false,
            include_classes: true,
            alias_depth_limit: 32,
        }
    }
}

/// Configuration for the file watcher.
///
/// The default debounce window is roughly one animation frame, which is the
/// window an interactive renderer coalesces edits in.
///
/// # Examples
///
/// ```
/// use tg_core::WatchConfig;
///
/// let config = WatchConfig::default();
/// assert_eq!(config.debounce_ms, 16);
/// assert!(!config.recursive);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Debounce window in milliseconds.
    ///
    /// Multiple file changes within this window are batched into a single event.
    pub debounce_ms: u64,

    /// Whether to watch subdirectories recursively.
    pub recursive: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 16,
            recursive: false,
        }
    }
}

/// Configuration for JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Root configuration for the `tsgraph` tool.
///
/// # Examples
///
/// ```
/// use tg_core::Config;
///
/// let config = Config::from_json_str(r#"{ "watch": { "debounce_ms": 50 } }"#)?;
/// assert_eq!(config.watch.debounce_ms, 50);
/// assert!(config.output.pretty);
/// # Ok::<(), tg_core::ConfigError>(())
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extraction configuration.
    pub extract: ExtractConfig,

    /// File watcher configuration.
    pub watch: WatchConfig,

    /// Output configuration.
    pub output: OutputConfig,
}

impl Config {
    /// Parses and validates a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_owned()));
        }
        let contents = std::fs::read_to_string(path.as_std_path())?;
        Self::from_json_str(&contents)
    }

    /// Checks option values that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extract.alias_depth_limit == 0 {
            return Err(ConfigError::invalid_option(
                "extract.alias_depth_limit",
                "must be at least 1",
            ));
        }
        if self.watch.debounce_ms == 0 {
            return Err(ConfigError::invalid_option(
                "watch.debounce_ms",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
