//! Application configuration model and validation

use crate::types::{AppError, BackendSelection, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// DSN store (odbc.ini) given on the command line; located when absent.
    /// `ODBCINI` only seeds the search, see [`crate::config::FileLocator`].
    #[serde(default)]
    pub dsn_file: Option<PathBuf>,

    /// Driver store (odbcinst.ini) given on the command line; located when absent
    #[serde(default)]
    pub driver_file: Option<PathBuf>,

    /// Per-attempt connection timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,

    /// Backends a connection test goes through
    #[serde(default)]
    pub manager: BackendSelection,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dsn_file: None,
            driver_file: None,
            timeout_seconds: default_timeout_secs(),
            manager: BackendSelection::default(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.timeout_seconds > crate::defaults::MAX_TIMEOUT_SECONDS {
            return Err(AppError::config(format!(
                "Timeout cannot exceed {} seconds",
                crate::defaults::MAX_TIMEOUT_SECONDS
            )));
        }

        for (label, path) in [("DSN file", &self.dsn_file), ("Driver file", &self.driver_file)] {
            if let Some(path) = path {
                if path.as_os_str().is_empty() {
                    return Err(AppError::config(format!("{} path cannot be empty", label)));
                }
                if path.is_dir() {
                    return Err(AppError::config(format!("{} path is a directory: {}", label, path.display())));
                }
            }
        }

        Ok(())
    }

    /// Merge process environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        self.merge_from_vars(|key| std::env::var(key).ok())
    }

    /// Merge variables supplied by `lookup` into this configuration.
    ///
    /// Store file variables are left to the locator.
    pub fn merge_from_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(timeout) = non_empty("ODM_TIMEOUT_SECONDS") {
            self.timeout_seconds = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ODM_TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Some(manager) = non_empty("ODM_MANAGER") {
            self.manager = manager.parse()
                .map_err(|e| AppError::config(format!("Invalid ODM_MANAGER value '{}': {}", manager, e)))?;
        }

        if let Some(enable_color) = non_empty("ODM_ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ODM_ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

fn default_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_TIMEOUT.as_secs()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
