//! Configuration management
//!
//! Default config location: ~/.quarry/config.toml

use crate::error::Error;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Connection group used when none is named
pub const DEFAULT_CONNECTION: &str = "default";

/// Env vars that replace the default group's hosts, first match wins
pub const HOST_ENV_VARS: [&str; 2] = ["QUARRY_ES_HOST", "ELASTICSEARCH_HOST"];

/// Main configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_connections")]
    pub connections: BTreeMap<String, ConnectionConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connections: default_connections(),
            logging: LoggingConfig::default(),
        }
    }
}

/// One named group of engine hosts
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,
    /// Idle connections kept per host
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

fn default_connections() -> BTreeMap<String, ConnectionConfig> {
    let mut connections = BTreeMap::new();
    connections.insert(DEFAULT_CONNECTION.to_string(), ConnectionConfig::default());
    connections
}

fn default_hosts() -> Vec<String> {
    vec!["http://127.0.0.1:9200".to_string()]
}

fn default_max_connections() -> usize {
    50
}

fn default_timeout_secs() -> f64 {
    2.0
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            max_connections: default_max_connections(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter string
    /// Override with RUST_LOG env var
    #[serde(default = "default_level")]
    pub level: String,

    /// Log output format: "pretty" or "json"
    /// Override with LOG_FORMAT env var
    #[serde(default = "default_format")]
    pub format: String,

    /// Append logs to this file instead of stderr
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "info,quarry=debug".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            file: None,
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".quarry")
}

/// Expand ~ to home directory in path
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
        Ok(home.join(rest))
    } else if s == "~" {
        dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))
    } else {
        Ok(path.to_path_buf())
    }
}

impl Config {
    /// Load config from default location (~/.quarry/config.toml)
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_dir())
    }

    /// Load `config.toml` from a directory, defaults when the file is missing
    pub fn load_from(dir: &Path) -> Result<Self> {
        let config_path = dir.join("config.toml");

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env();
        config.expand_paths()?;
        Ok(config)
    }

    /// Load config from file path, or create default
    pub fn load_or_create(config_path: &Path) -> Result<Self> {
        let config_path = expand_tilde(config_path)?;
        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            let config = Config::default();
            if let Some(parent) = config_path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            let _ = config.save(&config_path);
            config
        };

        config.apply_env();
        config.expand_paths()?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Apply host overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply host overrides using `lookup` to read variables
    ///
    /// The value is a comma-separated host list and replaces the hosts of the
    /// default group, creating the group when absent.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(raw) = HOST_ENV_VARS.iter().find_map(|key| lookup(key)) else {
            return;
        };
        let hosts: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(String::from)
            .collect();
        if hosts.is_empty() {
            return;
        }
        self.connections
            .entry(DEFAULT_CONNECTION.to_string())
            .or_default()
            .hosts = hosts;
    }

    /// Settings of a named connection group
    pub fn connection(&self, group: &str) -> crate::Result<&ConnectionConfig> {
        match self.connections.get(group) {
            Some(connection) if !connection.hosts.is_empty() => Ok(connection),
            _ => Err(Error::Config(format!(
                "no hosts configured for connection '{}'",
                group
            ))),
        }
    }

    fn expand_paths(&mut self) -> Result<()> {
        if let Some(ref f) = self.logging.file {
            self.logging.file = Some(expand_tilde(f)?);
        }
        Ok(())
    }
}
