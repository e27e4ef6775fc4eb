//! User configuration.
//!
//! Loaded from a TOML file (`--config`, or `<config_dir>/batchpush/config.toml`
//! when present). Every field has a default so an absent file is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::reconcile::FailurePolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub push: PushSettings,

    #[serde(default)]
    pub git: GitSettings,

    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushSettings {
    /// Remote used when `--remote` is not given.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Commits per batch. Prompted for when absent and interactive.
    #[serde(default)]
    pub batch_size: Option<usize>,

    #[serde(default)]
    pub on_failure: FailurePolicy,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            batch_size: None,
            on_failure: FailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitSettings {
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Value for `LANG` and `LC_ALL` in every git child process.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Per-command limit in seconds. `0` disables it.
    #[serde(default)]
    pub timeout_secs: u64,
}

impl GitSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            locale: default_locale(),
            timeout_secs: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_remote() -> String {
    "origin".into()
}

fn default_binary() -> String {
    "git".into()
}

fn default_locale() -> String {
    "C.UTF-8".into()
}

fn default_log_level() -> String {
    "warn".into()
}

impl Settings {
    /// Parse settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `explicit` if given, otherwise from the default location if
    /// a file exists there, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match default_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "loading config");
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

/// `<config_dir>/batchpush/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("batchpush").join("config.toml"))
}
