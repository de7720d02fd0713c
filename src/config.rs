//! Configuration loading and discovery
//!
//! Discovery order:
//! 1. Current directory: ./wbs.toml or ./.wbs/config.toml
//! 2. User config: ~/.wbs/config.toml
//! 3. Built-in defaults

use crate::env;
use crate::wbs::WbsManagerConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env as std_env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the JSON store
    pub data_dir: PathBuf,
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
    pub manager: WbsManagerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(env::WBS_DIR_NAME),
            log_filter: env::DEFAULT_LOG_FILTER.to_string(),
            manager: WbsManagerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Save configuration to a TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content).context("Failed to write config file")
    }

    /// Convert configuration to a TOML string
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Discover and load configuration using the hierarchy
    pub fn discover_config() -> Result<EngineConfig> {
        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            return EngineConfig::from_toml_file(config_path);
        }

        debug!("No configuration file found, using defaults");
        Ok(EngineConfig::default())
    }

    /// First existing candidate in priority order
    pub fn find_config_file() -> Option<PathBuf> {
        let current_dir = std_env::current_dir().ok();
        let home_dir = Self::home_dir();

        Self::config_candidates(current_dir.as_deref(), home_dir.as_deref())
            .into_iter()
            .find(|candidate| {
                debug!("Checking for config file: {:?}", candidate);
                candidate.is_file()
            })
    }

    /// Candidate paths in priority order
    pub fn config_candidates(current_dir: Option<&Path>, home_dir: Option<&Path>) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(current_dir) = current_dir {
            candidates.push(current_dir.join(env::LOCAL_CONFIG_FILE_NAME));
            candidates.push(env::local_config_file_path(current_dir));
        }
        if let Some(home_dir) = home_dir {
            candidates.push(env::user_config_file_path(home_dir));
        }

        candidates
    }

    fn home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .ok()
            .or_else(|| std_env::var("USERPROFILE").ok())
            .map(PathBuf::from)
    }

    /// Print where configuration would be loaded from
    pub fn show_discovery_info() {
        let current_dir = std_env::current_dir().ok();
        let home_dir = Self::home_dir();

        println!("Configuration discovery order:");
        for candidate in Self::config_candidates(current_dir.as_deref(), home_dir.as_deref()) {
            let marker = if candidate.is_file() { "found" } else { "missing" };
            println!("  [{}] {}", marker, candidate.display());
        }
        match Self::find_config_file() {
            Some(path) => println!("Active: {}", path.display()),
            None => println!("Active: built-in defaults"),
        }
    }
}
