//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::{supports_color, Cli},
    config::env::EnvManager,
    error::Result,
    models::Config,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Load `.env`, then build from the process environment
    pub fn parse(&self) -> Result<Config> {
        EnvManager::load_env_file(self.cli.debug)?;
        self.build(|key| std::env::var(key).ok())
    }

    /// Defaults, then `lookup` variables, then CLI overrides, then validation
    pub fn build<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        config.merge_from_vars(lookup)?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_cli_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.cli.odbcini {
            config.dsn_file = Some(path.clone());
        }

        if let Some(path) = &self.cli.odbcinst {
            config.driver_file = Some(path.clone());
        }

        if let Some(timeout) = self.cli.timeout {
            config.timeout_seconds = timeout;
        }

        if let Some(manager) = self.cli.manager {
            config.manager = manager;
        }

        config.enable_color = if self.cli.color {
            true
        } else if self.cli.no_color {
            false
        } else {
            config.enable_color && supports_color()
        };

        // CLI-only
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;

        if config.debug {
            eprintln!("Applied CLI overrides to configuration");
            eprintln!("{}", display_config_summary(config));
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let path_or_search = |path: &Option<std::path::PathBuf>| {
        path.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(search)".to_string())
    };

    [
        format!("DSN File: {}", path_or_search(&config.dsn_file)),
        format!("Driver File: {}", path_or_search(&config.driver_file)),
        format!("Timeout: {}s", config.timeout_seconds),
        format!("Manager: {}", config.manager),
        format!("Color Output: {}", config.enable_color),
        format!("Verbose: {}", config.verbose),
        format!("Debug: {}", config.debug),
    ]
    .join("\n")
}
