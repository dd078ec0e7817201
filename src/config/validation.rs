//! Configuration and registry validation rules

use crate::{
    error::Result,
    models::{Config, DsnEntry},
    registry::Registry,
    resolver::DriverResolver,
};
use colored::*;

/// Settings validator producing advisory warnings
pub struct ConfigValidator;

impl ConfigValidator {
    /// Hard validation followed by advisory checks
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        if config.timeout_seconds < 3 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Timeout of {}s is very short; remote drivers may not finish logging in",
                    config.timeout_seconds
                ),
            ));
        } else if config.timeout_seconds > 60 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Timeout of {}s means a hung driver blocks for a long time", config.timeout_seconds),
            ));
        }

        Ok(warnings)
    }
}

/// Health checks over a loaded registry
pub struct RegistryValidator;

impl RegistryValidator {
    /// Run every check, in store order
    pub fn validate(registry: &Registry) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        warnings.extend(Self::parse_warnings(registry));
        for dsn in registry.dsns() {
            warnings.extend(Self::check_dsn(registry, &dsn));
        }
        warnings.extend(Self::check_drivers(registry));
        warnings
    }

    fn parse_warnings(registry: &Registry) -> Vec<ValidationWarning> {
        let dsn_file = registry.dsn_path().display().to_string();
        let driver_file = registry.driver_path().display().to_string();

        registry
            .dsn_warnings()
            .iter()
            .map(|w| (dsn_file.as_str(), w))
            .chain(registry.driver_warnings().iter().map(|w| (driver_file.as_str(), w)))
            .map(|(file, warning)| {
                ValidationWarning::new(ValidationLevel::Warning, format!("{}: {}", file, warning))
                    .with_subject(file)
            })
            .collect()
    }

    fn check_dsn(registry: &Registry, dsn: &DsnEntry) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let driver = dsn.driver();

        if driver.is_empty() {
            warnings.push(
                ValidationWarning::new(ValidationLevel::Error, format!("DSN '{}' has no Driver entry", dsn.name))
                    .with_subject(&dsn.name),
            );
        } else if let Some(advisory) = DriverResolver::advise(dsn, registry.driver_store()) {
            warnings.push(ValidationWarning::new(ValidationLevel::Warning, advisory.message()).with_subject(&dsn.name));
        } else if !registry.driver_store().contains_section(driver) {
            warnings.push(
                ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("DSN '{}' uses driver '{}', which is not registered", dsn.name, driver),
                )
                .with_subject(&dsn.name),
            );
        }

        warnings
    }

    fn check_drivers(registry: &Registry) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for driver in registry.list_drivers() {
            match driver.library() {
                None => warnings.push(
                    ValidationWarning::new(
                        ValidationLevel::Error,
                        format!("Driver '{}' has no Driver library entry", driver.name),
                    )
                    .with_subject(&driver.name),
                ),
                Some(library) if !driver.library_exists() => warnings.push(
                    ValidationWarning::new(
                        ValidationLevel::Warning,
                        format!("Driver '{}' library not found: {}", driver.name, library),
                    )
                    .with_subject(&driver.name),
                ),
                Some(_) => {}
            }
        }

        warnings
    }
}

/// Validation warning levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
}

impl ValidationLevel {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    /// Get color for display
    pub fn color(&self) -> Color {
        match self {
            Self::Info => Color::Blue,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
        }
    }
}

/// Validation warning with level and message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
    /// DSN, driver or file the warning is about
    pub subject: Option<String>,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message, subject: None }
    }

    pub fn with_subject<S: Into<String>>(mut self, subject: S) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        let tag = format!("[{}]", self.level.as_str());
        if use_color {
            format!("{} {}", tag.color(self.level.color()).bold(), self.message)
        } else {
            format!("{} {}", tag, self.message)
        }
    }
}

/// Errors present in a warning list
pub fn has_errors(warnings: &[ValidationWarning]) -> bool {
    warnings.iter().any(|w| w.level == ValidationLevel::Error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ConfigStore;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn registry(dsn_text: &str, driver_text: &str) -> Registry {
        Registry::from_stores(
            PathBuf::from("/tmp/odbc.ini"),
            ConfigStore::parse(dsn_text).store,
            PathBuf::from("/tmp/odbcinst.ini"),
            ConfigStore::parse(driver_text).store,
        )
    }

    #[test]
    fn test_validation_warning_format() {
        let warning = ValidationWarning::new(ValidationLevel::Warning, "Test warning".to_string());
        assert_eq!(warning.format(false), "[WARNING] Test warning");
        assert_eq!(warning.subject, None);
    }

    #[test]
    fn test_validation_levels() {
        assert_eq!(ValidationLevel::Info.as_str(), "INFO");
        assert_eq!(ValidationLevel::Error.color(), Color::Red);
        assert!(ValidationLevel::Error > ValidationLevel::Warning);
    }

    #[test]
    fn test_timeout_advice() {
        let mut config = Config::default();
        config.timeout_seconds = 1;
        let warnings = ConfigValidator::validate_comprehensive(&config).unwrap();
        assert_eq!(warnings[0].level, ValidationLevel::Warning);

        config.timeout_seconds = 120;
        let warnings = ConfigValidator::validate_comprehensive(&config).unwrap();
        assert_eq!(warnings[0].level, ValidationLevel::Info);

        config.timeout_seconds = 15;
        assert!(ConfigValidator::validate_comprehensive(&config).unwrap().is_empty());

        config.timeout_seconds = 0;
        assert!(ConfigValidator::validate_comprehensive(&config).is_err());
    }

    #[test]
    fn test_registry_checks() {
        let dir = TempDir::new().unwrap();
        let library = dir.path().join("libgood.so");
        std::fs::write(&library, b"").unwrap();

        let drivers = format!(
            "[Good]\nDriver = {}\n\n[Broken]\nDriver = /nonexistent/libbroken.so\n\n[Empty]\nDescription = none\n",
            library.display()
        );
        let dsns = format!(
            "[Fine]\nDriver = Good\n\n[NoDriver]\nDatabase = x\n\n[ByPath]\nDriver = {}\n\n[Stranger]\nDriver = Mystery\n",
            library.display()
        );

        let warnings = RegistryValidator::validate(&registry(&dsns, &drivers));
        let about = |name: &str| warnings.iter().filter(|w| w.subject.as_deref() == Some(name)).count();

        assert_eq!(about("Fine"), 0);
        assert_eq!(about("Good"), 0);
        assert_eq!(about("NoDriver"), 1);
        assert_eq!(about("ByPath"), 1);
        assert_eq!(about("Stranger"), 1);
        assert_eq!(about("Broken"), 1);
        assert_eq!(about("Empty"), 1);

        let by_path = warnings.iter().find(|w| w.subject.as_deref() == Some("ByPath")).unwrap();
        assert!(by_path.message.contains("Good"));
        assert!(has_errors(&warnings));
    }

    #[test]
    fn test_parse_warnings_reported() {
        let warnings = RegistryValidator::validate(&registry("[A]\nDriver = X\n[A]\nDriver = Y\n", "[X]\nDriver = /x.so\n"));
        assert!(warnings.iter().any(|w| w.message.contains("duplicate section")));
    }
}
