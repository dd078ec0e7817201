//! Error handling for the ODBC DSN manager

use thiserror::Error;

/// Error taxonomy shared by the configuration stores, the registry and the
/// connection tester
#[derive(Error, Debug)]
pub enum AppError {
    /// A requested DSN or driver is absent from its store
    #[error("Not found: {0}")]
    NotFound(String),

    /// A configuration line could not be classified
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The same section name appeared twice in one file
    #[error("Duplicate section: {0}")]
    DuplicateSection(String),

    /// The filesystem rejected a write to a store file
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A classified failure reported by a driver manager backend
    #[error("Connection failed: {0}")]
    ConnectorFailure(String),

    /// No usable driver manager backend
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Store file exists but cannot be read, or other I/O failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Parsing errors (numbers, manager names, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a new malformed-input error
    pub fn malformed_input<S: Into<String>>(message: S) -> Self {
        Self::MalformedInput(message.into())
    }

    /// Create a new duplicate-section error
    pub fn duplicate_section<S: Into<String>>(message: S) -> Self {
        Self::DuplicateSection(message.into())
    }

    /// Create a new permission-denied error
    pub fn permission_denied<S: Into<String>>(message: S) -> Self {
        Self::PermissionDenied(message.into())
    }

    /// Create a new connector failure
    pub fn connector_failure<S: Into<String>>(message: S) -> Self {
        Self::ConnectorFailure(message.into())
    }

    /// Create a new backend-unavailable error
    pub fn backend_unavailable<S: Into<String>>(message: S) -> Self {
        Self::BackendUnavailable(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::MalformedInput(_) => "MALFORMED",
            Self::DuplicateSection(_) => "DUPLICATE",
            Self::PermissionDenied(_) => "PERMISSION",
            Self::ConnectorFailure(_) => "CONNECT",
            Self::BackendUnavailable(_) => "BACKEND",
            Self::Io(_) => "IO",
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::Parse(_) => "PARSE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if the caller can reasonably retry with a new call
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::MalformedInput(_) | Self::DuplicateSection(_) => true,
            Self::ConnectorFailure(_) => true,
            Self::PermissionDenied(_) | Self::BackendUnavailable(_) | Self::Io(_) => false,
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) | Self::Internal(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::NotFound(msg) => {
                format!("Entry not found: {}\n\nSuggestion: Run 'odm dsn list' or 'odm driver list' to see configured names.", msg)
            }
            Self::MalformedInput(msg) => {
                format!("Malformed configuration line: {}\n\nSuggestion: Check for stray key=value lines outside a [Section] header.", msg)
            }
            Self::DuplicateSection(msg) => {
                format!("Duplicate section: {}\n\nSuggestion: Remove or rename the duplicated [Section] block in the file.", msg)
            }
            Self::PermissionDenied(msg) => {
                format!("Cannot write configuration file: {}\n\nSuggestion: Run with elevated privileges or point --odbcini/--odbcinst at a user-level file.", msg)
            }
            Self::ConnectorFailure(msg) => {
                format!("Connection test failed: {}\n\nSuggestion: Verify the driver is registered and the database server is reachable.", msg)
            }
            Self::BackendUnavailable(msg) => {
                format!("No ODBC driver manager available: {}\n\nSuggestion: Install unixODBC (isql) or iODBC (iodbctest) and make sure it is on PATH.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check file permissions and that the path is a regular file.", msg)
            }
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your .env file, ODBCINI/ODBCINST variables or command line arguments.", msg)
            }
            Self::Validation(msg) => {
                format!("Invalid input: {}\n\nSuggestion: Check names, paths and option values.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse value: {}\n\nSuggestion: Check the format of the value you supplied.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::NotFound(_) => 2,
            Self::ConnectorFailure(_) => 3,
            Self::BackendUnavailable(_) => 4,
            Self::PermissionDenied(_) | Self::Io(_) => 5,
            Self::MalformedInput(_) | Self::DuplicateSection(_) => 6,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::ConnectorFailure(_) | Self::BackendUnavailable(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::NotFound(_) | Self::MalformedInput(_) | Self::DuplicateSection(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::PermissionDenied(_) => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(error.to_string()),
            _ => Self::io(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error
    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let original_error = e.into();
            let context = f();
            AppError::internal(format!("{}: {}", context, original_error))
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

/// Error reporter for user feedback on stderr
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());

            if error.is_recoverable() {
                eprintln!();
                if self.use_color {
                    use colored::Colorize;
                    eprintln!("{}", "You can retry the operation after correcting the input.".green());
                } else {
                    eprintln!("You can retry the operation after correcting the input.");
                }
            }
        }
    }

    /// Report multiple errors
    pub fn report_errors(&self, errors: &[AppError]) {
        for (i, error) in errors.iter().enumerate() {
            if i > 0 {
                eprintln!();
            }
            self.report_error(error);
        }
    }

    /// Get formatted error summary, categories in first-seen order
    pub fn format_error_summary(&self, errors: &[AppError]) -> String {
        if errors.is_empty() {
            return "No errors".to_string();
        }

        let mut summary = format!("Found {} error(s):", errors.len());

        let mut error_groups: indexmap::IndexMap<&'static str, Vec<&AppError>> = indexmap::IndexMap::new();
        for error in errors {
            error_groups.entry(error.category()).or_default().push(error);
        }

        for (category, group_errors) in error_groups {
            summary.push_str(&format!("\n  {}: {} error(s)", category, group_errors.len()));
            if self.verbose {
                for error in group_errors {
                    summary.push_str(&format!("\n    - {}", error));
                }
            }
        }

        summary
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}
