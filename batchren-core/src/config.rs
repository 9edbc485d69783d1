use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::conflict::CasePolicy;
use crate::scanner::default_ignore_dirs;
use crate::validate::NameLimits;

/// Directory holding config, logs and history, relative to the working directory
pub const STATE_DIR: &str = ".batchren";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default preview format: "table", "summary", "json", or "none"
    #[serde(default = "default_preview")]
    pub preview_format: String,

    /// How names are compared when looking for collisions
    #[serde(default)]
    pub case_policy: CasePolicy,

    #[serde(default = "default_max_path_len")]
    pub max_path_len: usize,

    #[serde(default = "default_max_component_len")]
    pub max_component_len: usize,

    /// Whether dot-files and dot-directories are scanned
    #[serde(default)]
    pub include_hidden: bool,

    /// Directory names never descended into
    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,

    /// Whether executed batches are appended to the history file
    #[serde(default = "default_true")]
    pub record_history: bool,

    /// Whether to use color output by default (None = auto-detect)
    #[serde(default)]
    pub use_color: Option<bool>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            preview_format: default_preview(),
            case_policy: CasePolicy::Auto,
            max_path_len: default_max_path_len(),
            max_component_len: default_max_component_len(),
            include_hidden: false,
            ignore_dirs: default_ignore_dirs(),
            record_history: true,
            use_color: None,
        }
    }
}

impl DefaultsConfig {
    pub fn name_limits(&self) -> NameLimits {
        NameLimits {
            max_path_len: self.max_path_len,
            max_component_len: self.max_component_len,
        }
    }
}

fn default_preview() -> String {
    "table".to_string()
}

fn default_max_path_len() -> usize {
    NameLimits::default().max_path_len
}

fn default_max_component_len() -> usize {
    NameLimits::default().max_component_len
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load config from .batchren/config.toml under `root` if it exists
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(STATE_DIR).join("config.toml");
        if config_path.exists() {
            return Self::load_from_path(&config_path);
        }

        Ok(Self::default())
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Save config to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
