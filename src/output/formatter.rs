//! Core formatting traits and the plain text implementation
//!
//! Formatters turn registry views, test reports and validation results into
//! display text. They never print; the caller decides where text goes.

use crate::config::locator::StorePaths;
use crate::config::validation::ValidationWarning;
use crate::error::{AppError, Result};
use crate::models::{DriverEntry, DsnEntry, TestReport};
use crate::registry::DsnGroup;
use crate::types::Backend;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

/// Main trait for output formatting
pub trait OutputFormatter {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// DSNs grouped by driver
    fn format_dsn_groups(&self, groups: &[DsnGroup]) -> Result<String>;

    /// DSN names in file order
    fn format_dsn_list(&self, names: &[String]) -> Result<String>;

    /// One DSN with secrets masked
    fn format_dsn_details(&self, dsn: &DsnEntry) -> Result<String>;

    /// Registered drivers with library status
    fn format_driver_table(&self, drivers: &[DriverEntry]) -> Result<String>;

    /// One driver
    fn format_driver_details(&self, driver: &DriverEntry) -> Result<String>;

    /// Per-backend results of a connection test
    fn format_test_report(&self, report: &TestReport) -> Result<String>;

    /// Registry health check results
    fn format_validation(&self, warnings: &[ValidationWarning]) -> Result<String>;

    /// Store locations and detected backends
    fn format_paths(&self, paths: &StorePaths, backends: &[(Backend, Option<PathBuf>)]) -> Result<String>;

    /// Troubleshooting suggestions
    fn format_hints(&self, hints: &[&str]) -> Result<String>;

    fn format_error(&self, error: &str) -> Result<String>;

    fn format_warning(&self, warning: &str) -> Result<String>;

    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    pub enable_color: bool,
    /// Show full driver manager output in test reports
    pub verbose_mode: bool,
    pub table_borders: bool,
    /// Maximum output width
    pub max_width: usize,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            table_borders: true,
            max_width: 120,
        }
    }
}

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    pub columns: Vec<Column>,
    pub show_borders: bool,
    pub show_header: bool,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub min_width: usize,
    pub max_width: usize,
}

impl Column {
    pub fn left(header: &str, min_width: usize, max_width: usize) -> Self {
        Self { header: header.to_string(), alignment: Alignment::Left, min_width, max_width }
    }
}

/// Text alignment options
#[derive(Debug, Clone)]
pub enum Alignment {
    Left,
    Right,
    Center,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

pub(crate) fn fmt_failed(e: std::fmt::Error) -> AppError {
    AppError::internal(format!("Failed to format output: {}", e))
}

/// Human-readable attempt duration
pub(crate) fn format_duration(duration: Duration) -> String {
    let ms = duration.as_secs_f64() * 1000.0;
    if ms < 1000.0 {
        format!("{:.0}ms", ms)
    } else {
        format!("{:.2}s", ms / 1000.0)
    }
}

/// `✓`/`✗` marker plus status word for a driver's library
pub(crate) fn library_status(driver: &DriverEntry) -> (&'static str, &'static str) {
    match driver.library() {
        None => ("-", "not set"),
        Some(_) if driver.library_exists() => ("✓", "found"),
        Some(_) => ("✗", "missing"),
    }
}

/// First line of driver manager output, or all of it in verbose mode
pub(crate) fn failure_text(message: &str, verbose: bool) -> String {
    if verbose {
        message.to_string()
    } else {
        message.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim().to_string()
    }
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    /// Create a table with the given format and data
    pub(crate) fn create_table(&self, format: &TableFormat, rows: &[RowData]) -> Result<String> {
        if rows.is_empty() {
            return Ok(String::new());
        }

        let column_widths = self.calculate_column_widths(format, rows);
        let mut output = String::new();

        if format.show_header && !format.columns.is_empty() {
            if format.show_borders {
                output.push_str(&self.create_horizontal_border(&column_widths));
                output.push('\n');
            }

            let headers: Vec<String> = format.columns.iter().map(|c| c.header.clone()).collect();
            output.push_str(&self.create_row(&headers, &column_widths, format));
            output.push('\n');

            if format.show_borders {
                output.push_str(&self.create_horizontal_border(&column_widths));
                output.push('\n');
            }
        }

        for row in rows {
            output.push_str(&self.create_row(row, &column_widths, format));
            output.push('\n');
        }

        if format.show_borders {
            output.push_str(&self.create_horizontal_border(&column_widths));
        }

        Ok(output.trim_end_matches('\n').to_string())
    }

    fn calculate_column_widths(&self, format: &TableFormat, rows: &[RowData]) -> Vec<usize> {
        format
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let content = rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0);
                content
                    .max(column.min_width)
                    .max(column.header.chars().count())
                    .min(column.max_width)
            })
            .collect()
    }

    fn create_row(&self, data: &[String], widths: &[usize], format: &TableFormat) -> String {
        let mut row = String::new();

        if format.show_borders {
            row.push('|');
        }

        for (idx, (cell, &width)) in data.iter().zip(widths.iter()).enumerate() {
            let alignment = format.columns.get(idx).map(|c| &c.alignment).unwrap_or(&Alignment::Left);
            let padded_cell = self.align_text(cell, width, alignment);

            if format.show_borders {
                row.push(' ');
                row.push_str(&padded_cell);
                row.push_str(" |");
            } else {
                row.push_str(&padded_cell);
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }

    fn create_horizontal_border(&self, widths: &[usize]) -> String {
        let mut border = String::new();

        if !widths.is_empty() {
            border.push('+');
            for &width in widths {
                border.push_str(&"-".repeat(width + 2));
                border.push('+');
            }
        }

        border
    }

    /// Align text within specified width, truncating on char boundaries
    fn align_text(&self, text: &str, width: usize, alignment: &Alignment) -> String {
        let length = text.chars().count();
        if length >= width {
            return text.chars().take(width).collect();
        }

        let padding = width - length;
        match alignment {
            Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
            Alignment::Right => format!("{}{}", " ".repeat(padding), text),
            Alignment::Center => {
                let left_pad = padding / 2;
                let right_pad = padding - left_pad;
                format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
            }
        }
    }

    pub(crate) fn driver_table_format(&self) -> TableFormat {
        let library_width = self.options.max_width.saturating_sub(60).max(20);
        TableFormat {
            columns: vec![
                Column::left("Driver", 6, 30),
                Column::left("Library", 7, library_width),
                Column::left("Status", 6, 10),
                Column::left("Description", 11, 40),
            ],
            show_borders: self.options.table_borders,
            show_header: true,
        }
    }

    pub(crate) fn driver_rows(&self, drivers: &[DriverEntry]) -> Vec<RowData> {
        drivers
            .iter()
            .map(|driver| {
                let (marker, status) = library_status(driver);
                vec![
                    driver.name.clone(),
                    driver.library().unwrap_or("").to_string(),
                    format!("{} {}", marker, status),
                    driver.description().to_string(),
                ]
            })
            .collect()
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.chars().count() + 4);

        writeln!(output, "{}", border).map_err(fmt_failed)?;
        writeln!(output, "  {}  ", title).map_err(fmt_failed)?;
        write!(output, "{}", border).map_err(fmt_failed)?;

        Ok(output)
    }

    fn format_dsn_groups(&self, groups: &[DsnGroup]) -> Result<String> {
        if groups.is_empty() {
            return Ok("No data sources defined.".to_string());
        }

        let mut output = String::new();
        for (index, group) in groups.iter().enumerate() {
            if index > 0 {
                writeln!(output).map_err(fmt_failed)?;
            }
            writeln!(output, "{} ({})", group.driver, group.dsns.len()).map_err(fmt_failed)?;
            for dsn in &group.dsns {
                writeln!(output, "  {}", dsn).map_err(fmt_failed)?;
            }
        }

        Ok(output.trim_end().to_string())
    }

    fn format_dsn_list(&self, names: &[String]) -> Result<String> {
        if names.is_empty() {
            return Ok("No data sources defined.".to_string());
        }
        Ok(names.join("\n"))
    }

    fn format_dsn_details(&self, dsn: &DsnEntry) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "[{}]", dsn.name).map_err(fmt_failed)?;

        let fields = dsn.masked_fields();
        let key_width = fields.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
        for (key, value) in &fields {
            writeln!(output, "  {:<width$} = {}", key, value, width = key_width).map_err(fmt_failed)?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_driver_table(&self, drivers: &[DriverEntry]) -> Result<String> {
        if drivers.is_empty() {
            return Ok("No drivers registered.".to_string());
        }
        self.create_table(&self.driver_table_format(), &self.driver_rows(drivers))
    }

    fn format_driver_details(&self, driver: &DriverEntry) -> Result<String> {
        let mut output = String::new();
        let (marker, status) = library_status(driver);

        writeln!(output, "[{}]", driver.name).map_err(fmt_failed)?;
        for (key, value) in driver.section.iter() {
            writeln!(output, "  {} = {}", key, value).map_err(fmt_failed)?;
        }
        write!(output, "Library: {} {}", marker, status).map_err(fmt_failed)?;

        Ok(output)
    }

    fn format_test_report(&self, report: &TestReport) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "Connection test: {}", report.dsn_name).map_err(fmt_failed)?;

        if !report.dsn_known {
            writeln!(output, "  (DSN not found in the loaded file; the driver manager may still resolve it)")
                .map_err(fmt_failed)?;
        }

        if let Some(advisory) = &report.advisory {
            writeln!(output, "Advisory: {}", advisory.message()).map_err(fmt_failed)?;
        }

        if report.results.is_empty() {
            writeln!(output, "No ODBC driver manager is available to run the test.").map_err(fmt_failed)?;
        }

        for result in &report.results {
            match &result.failure {
                None => writeln!(
                    output,
                    "  {:<9} OK      ({})",
                    result.backend.name(),
                    format_duration(result.duration)
                )
                .map_err(fmt_failed)?,
                Some(failure) => {
                    let state = failure.sqlstate.as_ref().map(|s| format!(" [{}]", s)).unwrap_or_default();
                    writeln!(
                        output,
                        "  {:<9} FAILED  {}{} ({})",
                        result.backend.name(),
                        failure.kind,
                        state,
                        format_duration(result.duration)
                    )
                    .map_err(fmt_failed)?;
                    for line in failure_text(&failure.message, self.options.verbose_mode).lines() {
                        writeln!(output, "            {}", line).map_err(fmt_failed)?;
                    }
                }
            }
        }

        let connected = report.results.iter().filter(|r| r.is_success()).count();
        write!(
            output,
            "Result: {} ({} of {} backends connected)",
            if report.overall_success() { "SUCCESS" } else { "FAILED" },
            connected,
            report.results.len()
        )
        .map_err(fmt_failed)?;

        Ok(output)
    }

    fn format_validation(&self, warnings: &[ValidationWarning]) -> Result<String> {
        if warnings.is_empty() {
            return Ok("No problems found.".to_string());
        }
        Ok(warnings.iter().map(|w| w.format(false)).collect::<Vec<_>>().join("\n"))
    }

    fn format_paths(&self, paths: &StorePaths, backends: &[(Backend, Option<PathBuf>)]) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "DSN file:    {} ({})", paths.dsn.display(), paths.dsn_source).map_err(fmt_failed)?;
        writeln!(output, "Driver file: {} ({})", paths.driver.display(), paths.driver_source).map_err(fmt_failed)?;

        for (label, candidates) in [("DSN candidates", &paths.dsn_candidates), ("Driver candidates", &paths.driver_candidates)] {
            writeln!(output, "{}:", label).map_err(fmt_failed)?;
            for candidate in candidates {
                let marker = if candidate.exists() { "✓" } else { "✗" };
                writeln!(output, "  {} {}", marker, candidate.display()).map_err(fmt_failed)?;
            }
        }

        writeln!(output, "Driver managers:").map_err(fmt_failed)?;
        for (backend, program) in backends {
            match program {
                Some(path) => writeln!(output, "  ✓ {:<9} {}", backend.name(), path.display()),
                None => writeln!(output, "  ✗ {:<9} {} not found", backend.name(), backend.program()),
            }
            .map_err(fmt_failed)?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_hints(&self, hints: &[&str]) -> Result<String> {
        let mut output = String::from("Troubleshooting:");
        for hint in hints {
            write!(output, "\n  - {}", hint).map_err(fmt_failed)?;
        }
        Ok(output)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("Error: {}", error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("Warning: {}", warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("Success: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConnectionResult, DriverAdvisory, FailureDetail};
    use crate::store::ConfigSection;
    use crate::types::FailureKind;

    fn formatter() -> PlainFormatter {
        PlainFormatter::new(FormattingOptions { enable_color: false, ..Default::default() })
    }

    #[test]
    fn test_format_header() {
        assert_eq!(formatter().format_header("DSNs").unwrap(), "========\n  DSNs  \n========");
    }

    #[test]
    fn test_format_dsn_groups() {
        let groups = vec![
            DsnGroup { driver: "A".into(), dsns: vec!["Alpha".into(), "Beta".into()] },
            DsnGroup { driver: "B".into(), dsns: vec!["Zeta".into()] },
        ];
        let text = formatter().format_dsn_groups(&groups).unwrap();
        assert_eq!(text, "A (2)\n  Alpha\n  Beta\n\nB (1)\n  Zeta");
        assert_eq!(formatter().format_dsn_groups(&[]).unwrap(), "No data sources defined.");
    }

    #[test]
    fn test_dsn_details_masks_password() {
        let dsn = DsnEntry::new("Sales", ConfigSection::new().with("Driver", "PG").with("PWD", "tiger"));
        let text = formatter().format_dsn_details(&dsn).unwrap();
        assert!(text.contains("Driver = PG"));
        assert!(text.contains("PWD    = ********"));
        assert!(!text.contains("tiger"));
    }

    #[test]
    fn test_driver_table() {
        let drivers = vec![DriverEntry::new(
            "Foo",
            ConfigSection::new().with("Driver", "/nonexistent/libfoo.so").with("Description", "Foo driver"),
        )];
        let text = formatter().format_driver_table(&drivers).unwrap();
        assert!(text.contains("| Foo"));
        assert!(text.contains("✗ missing"));
        assert!(text.starts_with('+'));
    }

    #[test]
    fn test_test_report_text() {
        let report = TestReport {
            dsn_name: "Sales".into(),
            dsn_known: true,
            advisory: Some(DriverAdvisory {
                dsn_name: "Sales".into(),
                configured_value: "/usr/lib/foo.so".into(),
                suggested_driver: Some("FooDriver".into()),
            }),
            results: vec![
                ConnectionResult::failure(
                    Backend::UnixOdbc,
                    FailureDetail {
                        kind: FailureKind::HostUnreachable,
                        sqlstate: Some("08001".into()),
                        message: "[08001] could not connect\nsecond line".into(),
                    },
                    Duration::from_millis(40),
                ),
                ConnectionResult::success(Backend::IOdbc, Duration::from_millis(7)),
            ],
        };

        let text = formatter().format_test_report(&report).unwrap();
        assert!(text.contains("Advisory: "));
        assert!(text.contains("unixODBC  FAILED  host unreachable [08001] (40ms)"));
        assert!(text.contains("[08001] could not connect"));
        assert!(!text.contains("second line"));
        assert!(text.contains("iODBC     OK      (7ms)"));
        assert!(text.ends_with("Result: SUCCESS (1 of 2 backends connected)"));
    }

    #[test]
    fn test_empty_report_text() {
        let report = TestReport { dsn_name: "X".into(), dsn_known: false, advisory: None, results: vec![] };
        let text = formatter().format_test_report(&report).unwrap();
        assert!(text.contains("No ODBC driver manager is available"));
        assert!(text.ends_with("Result: FAILED (0 of 0 backends connected)"));
    }

    #[test]
    fn test_align_text_truncates_on_chars() {
        let f = formatter();
        assert_eq!(f.align_text("✓ found", 3, &Alignment::Left), "✓ f");
        assert_eq!(f.align_text("ab", 4, &Alignment::Right), "  ab");
        assert_eq!(f.align_text("ab", 5, &Alignment::Center), " ab  ");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(12)), "12ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }
}
