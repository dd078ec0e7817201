//! Colored formatter implementation with terminal color support

use super::formatter::{
    failure_text, fmt_failed, format_duration, library_status, FormattingOptions, OutputFormatter, PlainFormatter,
};
use crate::config::locator::StorePaths;
use crate::config::validation::ValidationWarning;
use crate::error::Result;
use crate::models::{DriverEntry, DsnEntry, TestReport, MASKED_VALUE};
use crate::registry::{DsnGroup, UNKNOWN_DRIVER_GROUP};
use crate::types::{Backend, FailureKind};
use colored::*;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub highlight: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            highlight: Color::Magenta,
            muted: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    plain_formatter: PlainFormatter,
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_color_scheme(options, ColorScheme::default())
    }

    /// Create a colored formatter with custom color scheme
    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        let plain_formatter = PlainFormatter::new(options.clone());
        Self {
            plain_formatter,
            options,
            color_scheme,
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    /// Apply bold formatting if colors are enabled
    fn bold(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    /// Apply dimmed formatting if colors are enabled
    fn dimmed(&self, text: &str) -> ColoredString {
        if self.options.enable_color {
            text.dimmed()
        } else {
            text.normal()
        }
    }

    /// Bold and colored, or plain when colors are disabled
    fn emphasize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color).bold()
        } else {
            text.normal()
        }
    }

    fn kind_color(&self, kind: FailureKind) -> Color {
        match kind {
            FailureKind::Timeout | FailureKind::BackendUnavailable => self.color_scheme.warning,
            FailureKind::Unclassified => self.color_scheme.highlight,
            _ => self.color_scheme.error,
        }
    }

    fn marker(&self, present: bool) -> ColoredString {
        if present {
            self.colorize("✓", self.color_scheme.success)
        } else {
            self.colorize("✗", self.color_scheme.error)
        }
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let plain = self.plain_formatter.format_header(title)?;
        Ok(self.emphasize(&plain, self.color_scheme.header).to_string())
    }

    fn format_dsn_groups(&self, groups: &[DsnGroup]) -> Result<String> {
        if groups.is_empty() {
            return Ok(self.colorize("No data sources defined.", self.color_scheme.muted).to_string());
        }

        let mut output = String::new();
        for (index, group) in groups.iter().enumerate() {
            if index > 0 {
                writeln!(output).map_err(fmt_failed)?;
            }
            let color = if group.driver == UNKNOWN_DRIVER_GROUP {
                self.color_scheme.warning
            } else {
                self.color_scheme.header
            };
            writeln!(
                output,
                "{} {}",
                self.emphasize(&group.driver, color),
                self.dimmed(&format!("({})", group.dsns.len()))
            )
            .map_err(fmt_failed)?;
            for dsn in &group.dsns {
                writeln!(output, "  {}", dsn).map_err(fmt_failed)?;
            }
        }

        Ok(output.trim_end().to_string())
    }

    fn format_dsn_list(&self, names: &[String]) -> Result<String> {
        self.plain_formatter.format_dsn_list(names)
    }

    fn format_dsn_details(&self, dsn: &DsnEntry) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "{}", self.emphasize(&format!("[{}]", dsn.name), self.color_scheme.header))
            .map_err(fmt_failed)?;

        let fields = dsn.masked_fields();
        let key_width = fields.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
        for (key, value) in &fields {
            let padded = format!("{:<width$}", key, width = key_width);
            let shown = if value == MASKED_VALUE {
                self.dimmed(value)
            } else {
                self.colorize(value, self.color_scheme.info)
            };
            writeln!(output, "  {} = {}", self.bold(&padded), shown).map_err(fmt_failed)?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_driver_table(&self, drivers: &[DriverEntry]) -> Result<String> {
        // Lay out plain, then color the status cells so widths stay aligned.
        let table = self.plain_formatter.format_driver_table(drivers)?;
        if !self.options.enable_color {
            return Ok(table);
        }

        Ok(table
            .replace("✓ found", &self.colorize("✓ found", self.color_scheme.success).to_string())
            .replace("✗ missing", &self.colorize("✗ missing", self.color_scheme.error).to_string())
            .replace("- not set", &self.colorize("- not set", self.color_scheme.warning).to_string()))
    }

    fn format_driver_details(&self, driver: &DriverEntry) -> Result<String> {
        let mut output = String::new();
        let (_, status) = library_status(driver);

        writeln!(output, "{}", self.emphasize(&format!("[{}]", driver.name), self.color_scheme.header))
            .map_err(fmt_failed)?;
        for (key, value) in driver.section.iter() {
            writeln!(output, "  {} = {}", self.bold(key), value).map_err(fmt_failed)?;
        }
        let status_color = if driver.library_exists() {
            self.color_scheme.success
        } else {
            self.color_scheme.error
        };
        write!(
            output,
            "Library: {} {}",
            self.marker(driver.library_exists()),
            self.colorize(status, status_color)
        )
        .map_err(fmt_failed)?;

        Ok(output)
    }

    fn format_test_report(&self, report: &TestReport) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "{} {}", self.bold("Connection test:"), self.colorize(&report.dsn_name, self.color_scheme.header))
            .map_err(fmt_failed)?;

        if !report.dsn_known {
            writeln!(
                output,
                "  {}",
                self.dimmed("(DSN not found in the loaded file; the driver manager may still resolve it)")
            )
            .map_err(fmt_failed)?;
        }

        if let Some(advisory) = &report.advisory {
            writeln!(
                output,
                "{} {}",
                self.emphasize("Advisory:", self.color_scheme.warning),
                advisory.message()
            )
            .map_err(fmt_failed)?;
        }

        if report.results.is_empty() {
            writeln!(
                output,
                "{}",
                self.colorize("No ODBC driver manager is available to run the test.", self.color_scheme.warning)
            )
            .map_err(fmt_failed)?;
        }

        for result in &report.results {
            let backend = format!("{:<9}", result.backend.name());
            let elapsed = self.dimmed(&format!("({})", format_duration(result.duration)));
            match &result.failure {
                None => writeln!(
                    output,
                    "  {} {} {}",
                    self.marker(true),
                    self.bold(&backend),
                    elapsed
                )
                .map_err(fmt_failed)?,
                Some(failure) => {
                    let state = failure.sqlstate.as_ref().map(|s| format!(" [{}]", s)).unwrap_or_default();
                    writeln!(
                        output,
                        "  {} {} {}{} {}",
                        self.marker(false),
                        self.bold(&backend),
                        self.colorize(failure.kind.label(), self.kind_color(failure.kind)),
                        self.colorize(&state, self.color_scheme.muted),
                        elapsed
                    )
                    .map_err(fmt_failed)?;
                    for line in failure_text(&failure.message, self.options.verbose_mode).lines() {
                        writeln!(output, "      {}", self.dimmed(line)).map_err(fmt_failed)?;
                    }
                }
            }
        }

        let connected = report.results.iter().filter(|r| r.is_success()).count();
        let verdict = if report.overall_success() {
            self.emphasize("SUCCESS", self.color_scheme.success)
        } else {
            self.emphasize("FAILED", self.color_scheme.error)
        };
        write!(
            output,
            "Result: {} {}",
            verdict,
            self.dimmed(&format!("({} of {} backends connected)", connected, report.results.len()))
        )
        .map_err(fmt_failed)?;

        Ok(output)
    }

    fn format_validation(&self, warnings: &[ValidationWarning]) -> Result<String> {
        if warnings.is_empty() {
            return Ok(self.colorize("✓ No problems found.", self.color_scheme.success).to_string());
        }
        Ok(warnings
            .iter()
            .map(|w| w.format(self.options.enable_color))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn format_paths(&self, paths: &StorePaths, backends: &[(Backend, Option<PathBuf>)]) -> Result<String> {
        let mut output = String::new();

        writeln!(
            output,
            "{}    {} {}",
            self.bold("DSN file:"),
            self.colorize(&paths.dsn.display().to_string(), self.color_scheme.info),
            self.dimmed(&format!("({})", paths.dsn_source))
        )
        .map_err(fmt_failed)?;
        writeln!(
            output,
            "{} {} {}",
            self.bold("Driver file:"),
            self.colorize(&paths.driver.display().to_string(), self.color_scheme.info),
            self.dimmed(&format!("({})", paths.driver_source))
        )
        .map_err(fmt_failed)?;

        for (label, candidates) in [("DSN candidates", &paths.dsn_candidates), ("Driver candidates", &paths.driver_candidates)] {
            writeln!(output, "{}", self.bold(&format!("{}:", label))).map_err(fmt_failed)?;
            for candidate in candidates {
                writeln!(output, "  {} {}", self.marker(candidate.exists()), candidate.display()).map_err(fmt_failed)?;
            }
        }

        writeln!(output, "{}", self.bold("Driver managers:")).map_err(fmt_failed)?;
        for (backend, program) in backends {
            match program {
                Some(path) => writeln!(output, "  {} {:<9} {}", self.marker(true), backend.name(), path.display()),
                None => writeln!(
                    output,
                    "  {} {:<9} {}",
                    self.marker(false),
                    backend.name(),
                    self.dimmed(&format!("{} not found", backend.program()))
                ),
            }
            .map_err(fmt_failed)?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_hints(&self, hints: &[&str]) -> Result<String> {
        let mut output = self.emphasize("Troubleshooting:", self.color_scheme.info).to_string();
        for hint in hints {
            write!(output, "\n  {} {}", self.colorize("-", self.color_scheme.info), hint).map_err(fmt_failed)?;
        }
        Ok(output)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("Error:", self.color_scheme.error), error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("Warning:", self.color_scheme.warning), warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.emphasize("✓", self.color_scheme.success), message))
    }
}
