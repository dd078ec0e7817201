//! Topic help, usage examples and troubleshooting guidance

use crate::{config::env::EnvManager, types::FailureKind};
use colored::*;

/// Every failure kind, in the order the troubleshooting topic lists them
const ALL_KINDS: [FailureKind; 8] = [
    FailureKind::DriverNotFound,
    FailureKind::DriverLoadFailed,
    FailureKind::AuthenticationRejected,
    FailureKind::HostUnreachable,
    FailureKind::ConnectionRejected,
    FailureKind::Timeout,
    FailureKind::BackendUnavailable,
    FailureKind::Unclassified,
];

/// Help system for the CLI application
pub struct HelpSystem {
    platform: String,
}

impl HelpSystem {
    /// Create a new help system
    pub fn new() -> Self {
        Self {
            platform: std::env::consts::OS.to_string(),
        }
    }

    /// Display the main help message
    pub fn display_main_help(&self, use_colors: bool) -> String {
        let mut help = String::new();

        help.push_str(&self.format_header(use_colors));
        help.push('\n');
        help.push_str(&self.format_usage_section(use_colors));
        help.push('\n');
        help.push_str(&self.format_options_section(use_colors));
        help.push('\n');
        help.push_str(&self.format_examples_section(use_colors));
        help.push('\n');
        help.push_str(&self.format_footer(use_colors));

        help
    }

    /// Display help for one topic
    pub fn display_topic_help(&self, topic: &str, use_colors: bool) -> Option<String> {
        match topic.to_lowercase().as_str() {
            "config" | "configuration" | "env" | "environment" => Some(self.format_configuration_help(use_colors)),
            "files" | "paths" => Some(self.format_files_help(use_colors)),
            "backends" | "managers" | "test" => Some(self.format_backends_help(use_colors)),
            "troubleshooting" | "errors" => Some(self.format_troubleshooting_help(use_colors)),
            "examples" => Some(self.format_examples_section(use_colors)),
            _ => None,
        }
    }

    /// Names accepted by [`display_topic_help`](Self::display_topic_help)
    pub fn topics() -> &'static [&'static str] {
        &["config", "files", "backends", "troubleshooting", "examples"]
    }

    /// Suggestions printed after a failed connection attempt
    pub fn hints_for(kind: FailureKind) -> &'static [&'static str] {
        match kind {
            FailureKind::DriverNotFound => &[
                "Check that the DSN exists in the DSN file the driver manager reads (odm paths)",
                "Make sure the DSN's Driver entry names a driver registered in odbcinst.ini (odm driver list)",
                "If the Driver entry is a library path, run: odm dsn fix-driver <DSN> --apply",
            ],
            FailureKind::DriverLoadFailed => &[
                "Verify the driver library exists and is readable (odm driver show <DRIVER>)",
                "Check the library's own dependencies, for example with ldd or otool -L",
                "Make sure the library matches the driver manager's architecture",
            ],
            FailureKind::AuthenticationRejected => &[
                "Check the UID/PWD stored in the DSN or pass --user and --password",
                "Confirm the account is allowed to log in from this host",
            ],
            FailureKind::HostUnreachable => &[
                "Check the DSN's Address or host and port",
                "Confirm the database server is running and reachable from this machine",
                "Look for a firewall between this machine and the server",
            ],
            FailureKind::ConnectionRejected => &[
                "The server refused the connection; check its listener configuration and connection limits",
            ],
            FailureKind::Timeout => &[
                "The server did not answer in time; raise --timeout or check network latency",
                "A hung driver can also cause this; try the other driver manager with --manager",
            ],
            FailureKind::BackendUnavailable => &[
                "Install unixODBC (isql) or iODBC (iodbctest) and make sure it is on PATH",
                "Run odm paths to see which driver managers were detected",
            ],
            FailureKind::Unclassified => &[
                "Re-run with --verbose to see the full driver manager output",
                "Run odm check to look for configuration problems",
            ],
        }
    }

    fn section_header(&self, title: &str, use_colors: bool) -> String {
        if use_colors {
            title.bright_green().bold().to_string()
        } else {
            title.to_string()
        }
    }

    fn format_header(&self, use_colors: bool) -> String {
        let title = "ODBC DSN Manager";
        let subtitle = "Manage odbc.ini data sources and odbcinst.ini drivers, and test connections";
        let version = env!("CARGO_PKG_VERSION");

        if use_colors {
            format!(
                "{}\n{}\nVersion: {} | Platform: {}\n",
                title.bright_cyan().bold(),
                subtitle.bright_blue(),
                version.green(),
                self.platform.yellow()
            )
        } else {
            format!("{}\n{}\nVersion: {} | Platform: {}\n", title, subtitle, version, self.platform)
        }
    }

    fn format_usage_section(&self, use_colors: bool) -> String {
        let usage_patterns = [
            "odm [OPTIONS] dsn <list|show|add|remove|fix-driver> ...",
            "odm [OPTIONS] driver <list|show|add> ...",
            "odm [OPTIONS] test <DSN> [--user <U> --password <P>]",
            "odm [OPTIONS] check",
            "odm [OPTIONS] paths",
            "odm --help-topic <TOPIC>",
        ];

        let mut usage = format!("{}\n", self.section_header("USAGE:", use_colors));
        for pattern in usage_patterns {
            if use_colors {
                usage.push_str(&format!("  {}\n", pattern.bright_white()));
            } else {
                usage.push_str(&format!("  {}\n", pattern));
            }
        }

        usage
    }

    fn format_options_section(&self, use_colors: bool) -> String {
        let options = [
            OptionHelp {
                long: "odbcini",
                value: "<PATH>",
                description: "DSN file to use instead of the located one",
                example: Some("--odbcini /etc/odbc.ini"),
            },
            OptionHelp {
                long: "odbcinst",
                value: "<PATH>",
                description: "Driver file to use instead of the located one",
                example: None,
            },
            OptionHelp {
                long: "timeout",
                value: "<SECONDS>",
                description: "Connection test timeout in seconds (1-300)",
                example: Some("--timeout 30"),
            },
            OptionHelp {
                long: "manager",
                value: "<NAME>",
                description: "Driver manager for tests: unixodbc, iodbc or all",
                example: Some("--manager iodbc"),
            },
            OptionHelp {
                long: "verbose",
                value: "",
                description: "Show full driver manager output and informational logs",
                example: None,
            },
            OptionHelp {
                long: "debug",
                value: "",
                description: "Enable debug logging in JSON on stderr",
                example: None,
            },
            OptionHelp {
                long: "no-color",
                value: "",
                description: "Disable colored output",
                example: None,
            },
            OptionHelp {
                long: "help-topic",
                value: "<TOPIC>",
                description: "Show help for config, files, backends, troubleshooting or examples",
                example: Some("--help-topic troubleshooting"),
            },
        ];

        let mut output = format!("{}\n", self.section_header("OPTIONS:", use_colors));
        for option in options {
            output.push_str(&option.format(use_colors));
            output.push('\n');
        }

        output
    }

    fn format_examples_section(&self, use_colors: bool) -> String {
        let examples = [
            ExampleHelp {
                title: "List data sources grouped by driver",
                command: "odm dsn list",
                description: "Use --flat for one name per line in file order",
            },
            ExampleHelp {
                title: "Show a data source",
                command: "odm dsn show Sales",
                description: "Passwords are masked",
            },
            ExampleHelp {
                title: "Add a data source",
                command: "odm dsn add Sales --driver \"OpenLink Virtuoso\" --host db.example.com --port 1111 --database DB",
                description: "Missing fields fall back to localhost:1111, DB and dba/dba",
            },
            ExampleHelp {
                title: "Register a driver",
                command: "odm driver add Virtuoso --library /usr/lib/virtodbc.so",
                description: "Use --replace to overwrite an existing registration",
            },
            ExampleHelp {
                title: "Repair a DSN that names a library path as its driver",
                command: "odm dsn fix-driver Sales --apply",
                description: "Without --apply the suggested change is only shown",
            },
            ExampleHelp {
                title: "Test a connection through every driver manager",
                command: "odm test Sales --user scott --password tiger",
                description: "Credentials are only used when both are given",
            },
            ExampleHelp {
                title: "Work on a copy of the configuration",
                command: "odm --odbcini ./odbc.ini --odbcinst ./odbcinst.ini check",
                description: "Validate another pair of files without touching the system ones",
            },
        ];

        let mut output = format!("{}\n", self.section_header("EXAMPLES:", use_colors));
        for example in examples {
            output.push_str(&example.format(use_colors));
            output.push('\n');
        }

        output
    }

    fn format_footer(&self, use_colors: bool) -> String {
        let mut footer = format!("{}\n", self.section_header("ADDITIONAL HELP:", use_colors));

        let help_topics = [
            ("--help-topic config", "Environment variables and configuration priority"),
            ("--help-topic files", "Where odbc.ini and odbcinst.ini are looked up"),
            ("--help-topic backends", "How connection tests drive unixODBC and iODBC"),
            ("--help-topic troubleshooting", "What each failure kind means"),
            ("--help-topic examples", "Usage examples"),
        ];

        for (command, description) in help_topics {
            if use_colors {
                footer.push_str(&format!("  {}: {}\n", command.bright_yellow(), description.white()));
            } else {
                footer.push_str(&format!("  {}: {}\n", command, description));
            }
        }

        footer
    }

    fn format_configuration_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n\n", self.section_header("CONFIGURATION REFERENCE:", use_colors));

        help.push_str(&EnvManager::display_env_help());
        help.push('\n');
        help.push_str("PARAMETER LIMITS:\n");
        help.push_str(&format!("- Timeout: 1-{} seconds\n", crate::defaults::MAX_TIMEOUT_SECONDS));
        help.push_str("- Manager: unixodbc, iodbc, or all (both is accepted)\n");

        help
    }

    fn format_files_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n\n", self.section_header("CONFIGURATION FILES:", use_colors));

        help.push_str("DSN file search order (first existing wins):\n");
        help.push_str("  $ODBCINI, ~/.odbc.ini, ~/Library/ODBC/odbc.ini, /etc/odbc.ini, /usr/local/etc/odbc.ini\n\n");
        help.push_str("Driver file search order:\n");
        help.push_str("  $ODBCINST or $ODBCINSTINI, ~/.odbcinst.ini, ~/Library/ODBC/odbcinst.ini,\n");
        help.push_str("  /Library/ODBC/odbcinst.ini, /etc/odbcinst.ini, /usr/local/etc/odbcinst.ini\n\n");
        help.push_str("When nothing exists the DSN file defaults to ~/.odbc.ini and the driver file\n");
        help.push_str("to odbcinst.ini beside it. --odbcini and --odbcinst bypass the search.\n\n");
        help.push_str("The [ODBC Data Sources], [ODBC Drivers] and [ODBC] headers are manager\n");
        help.push_str("metadata; they are kept on write but never listed.\n");

        help
    }

    fn format_backends_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n\n", self.section_header("DRIVER MANAGERS:", use_colors));

        help.push_str("unixODBC: isql -b -v <DSN> [UID PWD], runs SELECT 1\n");
        help.push_str("iODBC:    iodbctest \"DSN=<DSN>;UID=..;PWD=..\", runs SELECT 1 then quit\n\n");
        help.push_str("A manager is available when its program is found on PATH. With --manager all\n");
        help.push_str("(the default) every available manager is tried, unixODBC first; the test\n");
        help.push_str("succeeds when any of them connects. The selected files are passed to the\n");
        help.push_str("child process through ODBCINI and ODBCINST.\n");

        help
    }

    fn format_troubleshooting_help(&self, use_colors: bool) -> String {
        let mut help = format!("{}\n", self.section_header("TROUBLESHOOTING:", use_colors));

        for kind in ALL_KINDS {
            help.push('\n');
            if use_colors {
                help.push_str(&format!("{}\n", kind.label().bright_yellow().bold()));
            } else {
                help.push_str(&format!("{}\n", kind.label()));
            }
            for hint in Self::hints_for(kind) {
                help.push_str(&format!("  - {}\n", hint));
            }
        }

        help
    }
}

impl Default for HelpSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for formatting individual options
struct OptionHelp {
    long: &'static str,
    value: &'static str,
    description: &'static str,
    example: Option<&'static str>,
}

impl OptionHelp {
    fn format(&self, use_colors: bool) -> String {
        let long_with_value = if self.value.is_empty() {
            format!("--{}", self.long)
        } else {
            format!("--{} {}", self.long, self.value)
        };

        let mut option_str = if use_colors {
            format!("  {} {}", format!("{:<28}", long_with_value).bright_cyan(), self.description.white())
        } else {
            format!("  {:<28} {}", long_with_value, self.description)
        };

        if let Some(example) = self.example {
            if use_colors {
                option_str.push_str(&format!(
                    "\n{}{}",
                    " ".repeat(31),
                    format!("Example: {}", example).bright_blue().italic()
                ));
            } else {
                option_str.push_str(&format!("\n{}Example: {}", " ".repeat(31), example));
            }
        }

        option_str
    }
}

/// Helper struct for formatting examples
struct ExampleHelp {
    title: &'static str,
    command: &'static str,
    description: &'static str,
}

impl ExampleHelp {
    fn format(&self, use_colors: bool) -> String {
        if use_colors {
            format!(
                "  {}:\n    {}\n    {}\n",
                self.title.bright_yellow().bold(),
                self.command.bright_white(),
                self.description.bright_blue().italic()
            )
        } else {
            format!("  {}:\n    {}\n    {}\n", self.title, self.command, self.description)
        }
    }
}
