//! Application configuration.
//!
//! The configuration is loaded from `config.json` in the deskbox config
//! directory.  Every section is optional and falls back to its compiled-in
//! default, so a minimal `{}` file is valid.
//!
//! # Example
//!
//! ```json
//! {
//!   "naming": { "first": "main", "prefix": "cont" },
//!   "hotkey": { "modifiers": 16386, "key": 38 },
//!   "ignore": { "titles": ["Program Manager"] },
//!   "restore_on_exit": true,
//!   "release_reveals_windows": false
//! }
//! ```

use crate::command::Hotkey;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How unnamed containers are named.
    pub naming: NamingConfig,

    /// Global hotkey that reveals the input surface.
    pub hotkey: Hotkey,

    /// Windows the enumerator never manages, in addition to the built-in
    /// rules.
    pub ignore: IgnoreConfig,

    /// Show every window of every container when deskbox exits, so nothing
    /// stays hidden without a way back.
    pub restore_on_exit: bool,

    /// Show the windows of a released container instead of hiding them.
    pub release_reveals_windows: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            naming: NamingConfig::default(),
            hotkey: Hotkey::default(),
            ignore: IgnoreConfig::default(),
            restore_on_exit: true,
            release_reveals_windows: false,
        }
    }
}

/// Names given to containers created without an explicit name.
///
/// The first container of a session is called `first`; later ones are
/// called `"<prefix> N"` with the smallest unused `N >= 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub first: String,
    pub prefix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            first: "main".into(),
            prefix: "cont".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Exact window titles to skip.
    pub titles: Vec<String>,
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
