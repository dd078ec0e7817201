//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::types::BackendSelection;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    /// Load a specific env file; values already in the environment win
    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No {} file found, using defaults and CLI arguments", path.display());
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# ODBC DSN Manager Configuration
#
# Values here are defaults; the process environment and command-line
# arguments override them.

# DSN store (odbc.ini) to manage instead of the located one
# ODBCINI=/etc/odbc.ini

# Driver store (odbcinst.ini); ODBCINSTINI is accepted as well
# ODBCINST=/etc/odbcinst.ini

# Per-attempt connection timeout in seconds (1-300)
# ODM_TIMEOUT_SECONDS=15

# Driver manager used by `odm test`: unixodbc, iodbc or all
# ODM_MANAGER=all

# Enable colored output (true/false)
# ODM_ENABLE_COLOR=true
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        let content = Self::create_example_env_content();
        std::fs::write(path, content)
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))?;

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        match key {
            "ODBCINI" | "ODBCINST" | "ODBCINSTINI" => {
                if Path::new(value.trim()).is_dir() {
                    return Err(AppError::config(format!("{} points at a directory: {}", key, value)));
                }
            }
            "ODM_TIMEOUT_SECONDS" => {
                let timeout: u64 = value
                    .trim()
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid ODM_TIMEOUT_SECONDS value '{}': {}", value, e)))?;
                if timeout == 0 || timeout > crate::defaults::MAX_TIMEOUT_SECONDS {
                    return Err(AppError::config(format!(
                        "ODM_TIMEOUT_SECONDS must be between 1 and {}, got: {}",
                        crate::defaults::MAX_TIMEOUT_SECONDS,
                        timeout
                    )));
                }
            }
            "ODM_MANAGER" => {
                value
                    .parse::<BackendSelection>()
                    .map_err(|e| AppError::config(format!("Invalid ODM_MANAGER value '{}': {}", value, e)))?;
            }
            "ODM_ENABLE_COLOR" => {
                value
                    .trim()
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid ODM_ENABLE_COLOR value '{}': {}", value, e)))?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("ODBCINI", "DSN store file (odbc.ini)", "/etc/odbc.ini"),
            ("ODBCINST", "Driver store file (odbcinst.ini)", "/etc/odbcinst.ini"),
            ("ODBCINSTINI", "Driver store file, used when ODBCINST is unset", "/etc/odbcinst.ini"),
            ("ODM_TIMEOUT_SECONDS", "Connection test timeout in seconds (1-300)", "15"),
            ("ODM_MANAGER", "Driver manager for tests (unixodbc, iodbc, all)", "all"),
            ("ODM_ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<20} {}\n", var, description));
            help.push_str(&format!("  {:<20} Example: {}\n\n", "", example));
        }

        help.push_str("Color control: NO_COLOR disables colors, FORCE_COLOR forces them, TERM=dumb disables them.\n\n");
        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(var_name, _, _)| {
                let value = std::env::var(var_name).ok()?;
                Self::validate_env_var(var_name, &value).err().map(|e| format!("Warning: {}", e))
            })
            .collect()
    }

    /// Check if a .env file exists and validate its contents
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let warnings = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let (key, value) = line.split_once('=')?;
                Self::validate_env_var(key.trim(), value.trim().trim_matches('"'))
                    .err()
                    .map(|e| format!("Line '{}': {}", line, e))
            })
            .collect();

        Ok(Some(warnings))
    }
}
