//! REPL configuration
//!
//! Stores prompt strings, history location and logging defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// History file name under the home directory
const HISTORY_FILE: &str = ".aki_history";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    pub prompt: String,
    pub continuation_prompt: String,
    /// `None` disables persistent history
    pub history_file: Option<PathBuf>,
    /// Print each entry function's IR before running it
    pub show_ir: bool,
    /// Used when neither `--log` nor the environment sets a filter
    pub log_filter: String,
    pub banner: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: ">>> ".to_string(),
            continuation_prompt: "... ".to_string(),
            history_file: dirs::home_dir().map(|home| home.join(HISTORY_FILE)),
            show_ir: false,
            log_filter: "warn".to_string(),
            banner: true,
        }
    }
}

impl ReplConfig {
    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("aki").join("repl.toml"))
    }

    /// Load from `path`, or from the default location when `path` is `None`
    pub fn load(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::config_path()
                .map(|path| Self::load_from(&path))
                .unwrap_or_default(),
        }
    }

    /// A missing or unreadable file yields the defaults
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        toml::from_str(&content).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), "ignoring invalid config: {err}");
            Self::default()
        })
    }

    /// Write the configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        std::fs::write(path, content)
    }

    /// Save to the default config file path
    pub fn save(&self) -> std::io::Result<PathBuf> {
        let path = Self::config_path().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "Config directory not found")
        })?;
        self.save_to(&path)?;
        Ok(path)
    }
}
