//! Server configuration.
//!
//! Defaults match a local development setup. A JSON file named by
//! `BLOG_CONFIG` is read first, then individual `BLOG_*` variables override it.

use std::env;
use std::fs;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite file (default: "app.db")
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Host to bind to (default: "127.0.0.1")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log file written alongside terminal output; `null` disables it
    #[serde(default = "default_log_file")]
    pub log_file: Option<String>,

    /// One of off, error, warn, info, debug, trace (default: "debug")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_database_path() -> String {
    "app.db".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_file() -> Option<String> {
    Some("app.log".to_string())
}

fn default_log_level() -> String {
    "debug".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            host: default_host(),
            port: default_port(),
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var("BLOG_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.level_filter()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(path, &raw)
    }

    fn from_json(path: &str, raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("BLOG_DATABASE_PATH") {
            self.database_path = path;
        }
        if let Some(host) = lookup("BLOG_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("BLOG_PORT") {
            self.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "BLOG_PORT".to_string(),
                value: port.clone(),
            })?;
        }
        if let Some(level) = lookup("BLOG_LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level.parse().map_err(|_| ConfigError::InvalidValue {
            key: "log_level".to_string(),
            value: self.log_level.clone(),
        })
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
