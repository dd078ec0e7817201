//! Output formatting and display system
//!
//! Formatters render registry listings, connection test reports and
//! validation results as plain or colored text.

mod colored;
mod formatter;

pub use colored::{ColorScheme, ColoredFormatter};
pub use formatter::{Alignment, Column, FormattingOptions, OutputFormatter, PlainFormatter, RowData, TableFormat};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
            ..Default::default()
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false, false)
    }
}
