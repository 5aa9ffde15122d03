use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use skipgate_core::{TagRule, default_rules};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "skipgate.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize)]
pub struct SkipgateConfig {
    #[serde(default = "default_rules")]
    pub rules: Vec<TagRule>,
    #[serde(default)]
    pub git: GitConfig,
}

#[derive(Debug, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_git_bin")]
    pub bin: String,
    /// Per-command limit. Zero is rejected when the file is parsed.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: NonZeroU64,
}

fn default_git_bin() -> String {
    "git".into()
}
fn default_timeout_secs() -> NonZeroU64 {
    NonZeroU64::MIN.saturating_add(9)
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            bin: default_git_bin(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.get())
    }
}

impl Default for SkipgateConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            git: GitConfig::default(),
        }
    }
}

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    BuiltIn,
}

impl std::fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigOrigin::File(path) => write!(f, "{}", path.display()),
            ConfigOrigin::BuiltIn => write!(f, "built-in defaults"),
        }
    }
}

impl SkipgateConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Resolve the configuration: an explicit path must exist; otherwise try
    /// `./skipgate.toml`, then the user config directory, then built-in rules.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, ConfigOrigin), ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Ok((Self::from_file(path)?, ConfigOrigin::File(path.to_path_buf())));
        }

        for candidate in search_paths() {
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "Using config file");
                let config = Self::from_file(&candidate)?;
                return Ok((config, ConfigOrigin::File(candidate)));
            }
        }

        tracing::warn!("No {CONFIG_FILE_NAME} found, using built-in rules");
        Ok((Self::default(), ConfigOrigin::BuiltIn))
    }
}

fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("skipgate").join(CONFIG_FILE_NAME));
    }
    paths
}
