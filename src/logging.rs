//! Structured logging for the DSN manager
//!
//! This module provides:
//! - Leveled, structured log entries with correlation IDs
//! - Console, JSON and compact output formats
//! - Store, connection and error event loggers
//!
//! All log output goes to stderr so command output on stdout stays clean.

use crate::error::{AppError, Result};
use crate::models::{Config, ConnectionDescriptor, ConnectionResult, DriverAdvisory};
use crate::store::ParseWarning;
use crate::types::Backend;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Trace level - most detailed
    Trace = 0,
    /// Debug level - detailed information for debugging
    Debug = 1,
    /// Info level - general application information
    Info = 2,
    /// Warning level - potentially harmful situations
    Warn = 3,
    /// Error level - error events but application can continue
    Error = 4,
    /// Fatal level - severe error events that cause application termination
    Fatal = 5,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
            LogLevel::Fatal => "\x1b[35m",
        }
    }

    /// Reset ANSI color code
    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID for tracking related events
    pub correlation_id: Option<String>,
    /// Additional structured fields
    pub fields: HashMap<String, serde_json::Value>,
    pub location: Option<LogLocation>,
}

/// Source code location information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
    pub module: Option<String>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
    /// Compact single-line format
    Compact,
}

/// Shared logging context for correlation and session tracking
#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
    current_correlation_id: Option<String>,
}

/// Logger implementation with multiple output formats
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            include_location: false,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Create a logger whose level and format follow the configuration
    pub fn with_config(name: String, config: &Config) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            include_location: config.debug,
            format: if config.debug {
                LogFormat::Json
            } else if config.verbose {
                LogFormat::Console
            } else {
                LogFormat::Compact
            },
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    pub fn set_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    /// Set session correlation ID
    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    /// Start a correlated operation
    pub async fn start_operation(&self, operation_name: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        {
            let mut context = self.context.write().await;
            context.current_correlation_id = Some(correlation_id.clone());
        }

        self.debug(&format!("Started operation: {}", operation_name))
            .correlation_id(&correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "start")
            .log()
            .await;

        correlation_id
    }

    /// End a correlated operation
    pub async fn end_operation(&self, correlation_id: &str, operation_name: &str, success: bool) {
        self.debug(&format!("Completed operation: {} (success: {})", operation_name, success))
            .correlation_id(correlation_id)
            .field("operation", operation_name)
            .field("operation_type", "end")
            .field("success", success)
            .log()
            .await;

        let mut context = self.context.write().await;
        if context.current_correlation_id.as_deref() == Some(correlation_id) {
            context.current_correlation_id = None;
        }
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }

        let context = self.context.read().await;
        if let Some(session_id) = &context.session_id {
            entry.fields.insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }
        if entry.correlation_id.is_none() {
            entry.correlation_id = context.current_correlation_id.clone();
        }
        drop(context);

        let output = self.render(&entry);
        let _ = writeln!(io::stderr(), "{}", output);
    }

    fn render(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.format_console(entry),
            LogFormat::Json => self.format_json(entry),
            LogFormat::Compact => self.format_compact(entry),
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            let short: String = correlation_id.chars().take(8).collect();
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let mut fields: Vec<String> = entry.fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            fields.sort();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        if self.include_location {
            if let Some(location) = &entry.location {
                output.push_str(&format!(" @ {}:{}", location.file, location.line));
            }
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => serde_json::json!({
                "error": "Failed to serialize log entry",
                "message": entry.message,
            })
            .to_string(),
        }
    }

    fn format_compact(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%H:%M:%S");
        format!(
            "{} {} {}: {}",
            timestamp,
            entry.level.as_str().chars().next().unwrap_or('?'),
            entry.logger,
            entry.message
        )
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
                location: None,
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    pub fn location(mut self, file: &str, line: u32, module: Option<&str>) -> Self {
        self.entry.location = Some(LogLocation {
            file: file.to_string(),
            line,
            module: module.map(String::from),
        });
        self
    }

    /// Attach the outcome of one backend attempt
    pub fn attempt(self, result: &ConnectionResult) -> Self {
        let builder = self
            .field("backend", result.backend.name())
            .field("success", result.is_success())
            .field("duration_ms", result.duration.as_millis() as u64);

        match &result.failure {
            Some(failure) => builder
                .field("failure_kind", failure.kind.label())
                .field("sqlstate", &failure.sqlstate),
            None => builder,
        }
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error_exit_code", error.exit_code())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logger for store loads and writes
pub struct StoreLogger {
    logger: Logger,
}

impl StoreLogger {
    pub fn new(config: &Config) -> Self {
        Self { logger: Logger::with_config("STORE".to_string(), config) }
    }

    /// Log a completed load along with every parse warning
    pub async fn log_load(&self, role: &str, path: &Path, sections: usize, warnings: &[ParseWarning]) {
        self.logger
            .info(&format!("Loaded {} store {} ({} sections)", role, path.display(), sections))
            .field("role", role)
            .field("path", path.display().to_string())
            .field("sections", sections)
            .field("warnings", warnings.len())
            .log()
            .await;

        for warning in warnings {
            self.logger
                .warn(&format!("{}: {}", path.display(), warning))
                .field("role", role)
                .field("line", warning.line)
                .field("duplicate", warning.is_duplicate())
                .log()
                .await;
        }
    }

    /// Log a persisted write
    pub async fn log_write(&self, role: &str, path: &Path, section: &str, action: &str) {
        self.logger
            .info(&format!("{} section '{}' in {}", action, section, path.display()))
            .field("role", role)
            .field("path", path.display().to_string())
            .field("section", section)
            .field("action", action)
            .log()
            .await;
    }

    /// Log a failed write; the in-memory store was left unchanged
    pub async fn log_write_failure(&self, role: &str, path: &Path, error: &AppError) {
        self.logger
            .error(&format!("Failed to write {} store {}: {}", role, path.display(), error))
            .field("role", role)
            .field("path", path.display().to_string())
            .error_info(error)
            .log()
            .await;
    }
}

/// Logger for connection attempts
pub struct ConnectionLogger {
    logger: Logger,
}

impl ConnectionLogger {
    pub fn new(config: &Config) -> Self {
        Self { logger: Logger::with_config("CONN".to_string(), config) }
    }

    /// Start a correlated test and return its correlation id
    pub async fn start_test(&self, dsn_name: &str) -> String {
        self.logger.start_operation(&format!("test {}", dsn_name)).await
    }

    pub async fn end_test(&self, correlation_id: &str, dsn_name: &str, success: bool) {
        self.logger
            .end_operation(correlation_id, &format!("test {}", dsn_name), success)
            .await;
    }

    /// Log an attempt about to be made; only the masked connection string is logged
    pub async fn log_attempt_start(&self, backend: Backend, descriptor: &ConnectionDescriptor) {
        self.logger
            .info(&format!("Connecting through {}", backend))
            .field("backend", backend.name())
            .field("connection", descriptor.masked_connection_string())
            .field("timeout_ms", descriptor.timeout.as_millis() as u64)
            .log()
            .await;
    }

    pub async fn log_attempt_result(&self, result: &ConnectionResult) {
        let (level, message) = match &result.failure {
            None => (LogLevel::Info, format!("{} connected", result.backend)),
            Some(failure) => (LogLevel::Warn, format!("{} failed: {}", result.backend, failure.kind)),
        };

        self.logger.log(level, &message).attempt(result).log().await;
    }

    pub async fn log_skipped(&self, backend: Backend) {
        self.logger
            .debug(&format!("{} is not available, skipping", backend))
            .field("backend", backend.name())
            .log()
            .await;
    }

    pub async fn log_advisory(&self, advisory: &DriverAdvisory) {
        self.logger
            .warn(&advisory.message())
            .field("dsn", &advisory.dsn_name)
            .field("configured_driver", &advisory.configured_value)
            .field("suggested_driver", &advisory.suggested_driver)
            .log()
            .await;
    }
}

/// Error event logger with enhanced context
pub struct ErrorEventLogger {
    logger: Logger,
}

impl ErrorEventLogger {
    pub fn new(config: &Config) -> Self {
        Self { logger: Logger::with_config("ERR".to_string(), config) }
    }

    /// Log an application error with full context
    pub async fn log_error(&self, error: &AppError, context: Option<&str>, correlation_id: Option<&str>) {
        let message = match context {
            Some(ctx) => format!("{}: {}", ctx, error),
            None => error.to_string(),
        };

        let mut builder = self.logger.error(&message).error_info(error);

        if let Some(id) = correlation_id {
            builder = builder.correlation_id(id);
        }

        if let Some(ctx) = context {
            builder = builder.field("context", ctx);
        }

        builder.log().await;
    }
}

/// Creates loggers sharing one session id
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self { config, session_id: Uuid::new_v4().to_string() }
    }

    /// Create a logger with a specific name
    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    pub fn create_store_logger(&self) -> StoreLogger {
        StoreLogger::new(&self.config)
    }

    pub fn create_connection_logger(&self) -> ConnectionLogger {
        ConnectionLogger::new(&self.config)
    }

    pub fn create_error_logger(&self) -> ErrorEventLogger {
        ErrorEventLogger::new(&self.config)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Log with the call site attached
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}
