//! Server configuration file support for holidays.
//!
//! Loads configuration from `holidays.toml` in the working directory, or
//! from an explicit `--config` path.

use anyhow::{Context, Result};
use holidays_db::Database;
use holidays_logging::LogFormat;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The config file name
pub const CONFIG_FILE_NAME: &str = "holidays.toml";

/// Server configuration loaded from `holidays.toml`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Database file; defaults to the per-user data directory
    pub database: Option<PathBuf>,
    /// Browser origins allowed to call the API
    pub allowed_origins: Vec<String>,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
    /// Directory for daily-rolling JSON log files
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3003,
            database: None,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3003".to_string(),
            ],
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            log_dir: None,
        }
    }
}

impl ServerConfig {
    /// Resolve the configuration for a run.
    ///
    /// An explicit path must exist. Without one, `holidays.toml` in
    /// `working_dir` is used if present, otherwise the defaults.
    pub fn resolve(explicit: Option<&Path>, working_dir: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path)?
                .with_context(|| format!("Config file {} not found", path.display())),
            None => Ok(Self::load_from(&working_dir.join(CONFIG_FILE_NAME))?.unwrap_or_default()),
        }
    }

    /// Load configuration from a file.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: ServerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Some(config))
    }

    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(Database::default_path)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
