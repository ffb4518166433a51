// ABOUTME: Configuration loading for simplesession.
// ABOUTME: Reads <config_dir>/simplesession/config.toml, falling back to defaults per field.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Name of the sessions subdirectory under the host's user area.
pub const SESSIONS_SUBDIR: &str = "simplesession";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overrides the sessions directory derived from the host's user area.
    pub sessions_dir: Option<PathBuf>,
    /// Suffix carried by every session file (without the leading dot).
    pub extension: String,
    /// Key of the status marker set on views restored from a session.
    pub status_key: String,
    /// Delay before the name autocomplete popup is shown after a keystroke.
    pub completion_delay_ms: u64,
    /// Load into the current window when it holds no file-backed views.
    pub reuse_empty_window: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sessions_dir: None,
            extension: "simplesession".to_string(),
            status_key: "ss".to_string(),
            completion_delay_ms: 150,
            reuse_empty_window: true,
        }
    }
}

impl Config {
    /// Load config from the default path, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from an explicit file path (for testing).
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Path to the config file.
    pub fn config_path() -> PathBuf {
        Self::base_dir().join("config.toml")
    }

    /// Stand-in for the host's per-user area when running outside an editor.
    pub fn user_dir() -> PathBuf {
        Self::base_dir().join("User")
    }

    /// Sessions directory: the configured override, or `<user_dir>/simplesession`.
    pub fn sessions_dir_in(&self, user_dir: &Path) -> PathBuf {
        self.sessions_dir
            .clone()
            .unwrap_or_else(|| user_dir.join(SESSIONS_SUBDIR))
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }

    fn base_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("simplesession")
    }
}
