//! Command-line interface module with topic help

pub mod help;

pub use help::HelpSystem;

use crate::types::BackendSelection;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ODBC DSN Manager - administer odbc.ini / odbcinst.ini and test connections
#[derive(Parser, Debug, Clone)]
#[command(name = "odm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// DSN file (odbc.ini) to use instead of the located one
    #[arg(long, value_name = "PATH", global = true)]
    pub odbcini: Option<PathBuf>,

    /// Driver file (odbcinst.ini) to use instead of the located one
    #[arg(long, value_name = "PATH", global = true)]
    pub odbcinst: Option<PathBuf>,

    /// Connection test timeout in seconds
    #[arg(short, long, value_parser = parse_duration, global = true)]
    pub timeout: Option<u64>,

    /// Driver manager for connection tests (unixodbc, iodbc, all)
    #[arg(long, value_name = "NAME", value_parser = parse_manager, global = true)]
    pub manager: Option<BackendSelection>,

    /// Force colored output
    #[arg(long, global = true)]
    pub color: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Show help for specific topic (config, files, backends, troubleshooting, examples)
    #[arg(long, value_name = "TOPIC")]
    pub help_topic: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Manage data sources in odbc.ini
    Dsn {
        #[command(subcommand)]
        command: DsnCommand,
    },
    /// Manage drivers in odbcinst.ini
    Driver {
        #[command(subcommand)]
        command: DriverCommand,
    },
    /// Test a connection through the ODBC driver managers
    Test(TestArgs),
    /// Validate both configuration files
    Check,
    /// Show which configuration files and driver managers are in use
    Paths,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DsnCommand {
    /// List data sources, grouped by driver
    List {
        /// One name per line in file order
        #[arg(long)]
        flat: bool,
    },
    /// Show one data source with secrets masked
    Show { name: String },
    /// Add or replace a data source
    Add(DsnAddArgs),
    /// Remove a data source
    Remove { name: String },
    /// Detect a library path used as the driver name and suggest the registered name
    FixDriver {
        name: String,
        /// Write the suggested driver name back to the DSN file
        #[arg(long)]
        apply: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct DsnAddArgs {
    pub name: String,

    /// Registered driver name
    #[arg(long)]
    pub driver: String,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub database: Option<String>,

    #[arg(long)]
    pub user: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Leave out the OpenLink connection settings
    #[arg(long)]
    pub no_openlink_defaults: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DriverCommand {
    /// List registered drivers and whether their libraries exist
    List,
    /// Show one driver
    Show { name: String },
    /// Register a driver
    Add {
        name: String,

        /// Driver library path
        #[arg(long, value_name = "PATH")]
        library: PathBuf,

        /// Setup library path (defaults to the driver library)
        #[arg(long, value_name = "PATH")]
        setup: Option<PathBuf>,

        #[arg(long)]
        description: Option<String>,

        /// Overwrite an existing registration
        #[arg(long)]
        replace: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct TestArgs {
    /// Data source name
    pub dsn: String,

    /// Username; used only together with --password
    #[arg(long)]
    pub user: Option<String>,

    /// Password; used only together with --user
    #[arg(long)]
    pub password: Option<String>,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if let Some(Command::Test(args)) = &self.command {
            if args.dsn.trim().is_empty() {
                return Err("DSN name cannot be empty".to_string());
            }
        }

        Ok(())
    }

    /// Check if help should be displayed for a specific topic
    pub fn should_show_topic_help(&self) -> bool {
        self.help_topic.is_some()
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            supports_color()
        }
    }

    /// Display help for the specified topic or main help
    pub fn display_help(&self) -> String {
        let help_system = HelpSystem::new();
        let use_colors = self.use_colors();

        if let Some(topic) = &self.help_topic {
            help_system.display_topic_help(topic, use_colors).unwrap_or_else(|| {
                format!(
                    "Unknown help topic: '{}'\n\nAvailable topics: {}\n\n{}",
                    topic,
                    HelpSystem::topics().join(", "),
                    help_system.display_main_help(use_colors)
                )
            })
        } else {
            help_system.display_main_help(use_colors)
        }
    }
}

/// Parse duration from seconds string
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > crate::defaults::MAX_TIMEOUT_SECONDS {
                Err(format!(
                    "Duration cannot exceed {} seconds",
                    crate::defaults::MAX_TIMEOUT_SECONDS
                ))
            } else {
                Ok(secs)
            }
        })
}

fn parse_manager(s: &str) -> Result<BackendSelection, String> {
    s.parse::<BackendSelection>().map_err(|e| e.to_string())
}

/// Check if the terminal supports color output
pub fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Backend;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["odm", "test", "Sales", "--manager", "iodbc", "--timeout", "5", "--verbose"]);
        assert_eq!(cli.manager, Some(BackendSelection::Specific(Backend::IOdbc)));
        assert_eq!(cli.timeout, Some(5));
        assert!(cli.verbose);
        match cli.command {
            Some(Command::Test(args)) => {
                assert_eq!(args.dsn, "Sales");
                assert!(args.user.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_dsn_subcommands() {
        let cli = Cli::parse_from(["odm", "dsn", "list", "--flat"]);
        assert!(matches!(cli.command, Some(Command::Dsn { command: DsnCommand::List { flat: true } })));

        let cli = Cli::parse_from([
            "odm", "dsn", "add", "Sales", "--driver", "Virtuoso", "--port", "1112", "--no-openlink-defaults",
        ]);
        match cli.command {
            Some(Command::Dsn { command: DsnCommand::Add(args) }) => {
                assert_eq!(args.name, "Sales");
                assert_eq!(args.driver, "Virtuoso");
                assert_eq!(args.port, Some(1112));
                assert!(args.no_openlink_defaults);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::parse_from(["odm", "dsn", "fix-driver", "Sales", "--apply"]);
        assert!(matches!(
            cli.command,
            Some(Command::Dsn { command: DsnCommand::FixDriver { apply: true, .. } })
        ));
    }

    #[test]
    fn test_driver_add_parsing() {
        let cli = Cli::parse_from(["odm", "driver", "add", "Foo", "--library", "/usr/lib/foo.so", "--replace"]);
        match cli.command {
            Some(Command::Driver { command: DriverCommand::Add { name, library, setup, replace, .. } }) => {
                assert_eq!(name, "Foo");
                assert_eq!(library, PathBuf::from("/usr/lib/foo.so"));
                assert!(setup.is_none());
                assert!(replace);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["odm", "--manager", "oracle", "check"]).is_err());
        assert!(Cli::try_parse_from(["odm", "--timeout", "0", "check"]).is_err());
        assert!(Cli::try_parse_from(["odm", "dsn", "add", "X"]).is_err());
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(parse_duration("1").unwrap(), 1);
        assert_eq!(parse_duration("300").unwrap(), 300);
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("301").is_err());
        assert!(parse_duration("+10").is_err());
        assert!(parse_duration("0x10").is_err());
        assert!(parse_duration("10.5").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_cli_validation() {
        let conflict = Cli::parse_from(["odm", "--color", "--no-color", "check"]);
        assert!(conflict.validate().unwrap_err().contains("Cannot specify both"));

        assert!(Cli::parse_from(["odm", "check"]).validate().is_ok());
        assert!(Cli::parse_from(["odm", "test", " "]).validate().is_err());
    }

    #[test]
    fn test_use_colors_flags() {
        assert!(!Cli::parse_from(["odm", "--no-color", "paths"]).use_colors());
        assert!(Cli::parse_from(["odm", "--color", "paths"]).use_colors());
    }

    #[test]
    fn test_help_display() {
        let cli = Cli::parse_from(["odm", "--no-color"]);
        assert!(cli.display_help().contains("USAGE:"));

        let cli = Cli::parse_from(["odm", "--no-color", "--help-topic", "files"]);
        assert!(cli.display_help().contains("CONFIGURATION FILES"));

        let cli = Cli::parse_from(["odm", "--no-color", "--help-topic", "bogus"]);
        let help = cli.display_help();
        assert!(help.contains("Unknown help topic: 'bogus'"));
        assert!(help.contains("Available topics:"));
    }
}
