//! Main application orchestration and execution

use crate::{
    cli::{Cli, Command, DriverCommand, DsnAddArgs, DsnCommand, HelpSystem, TestArgs},
    config::{
        load_config,
        validation::{has_errors, ConfigValidator, RegistryValidator},
        FileLocator, StorePaths,
    },
    error::{AppError, Result},
    log_debug,
    logging::{LoggerFactory, StoreLogger},
    models::{
        Config, ConnectionAttempt, Credentials, DriverTemplate, DsnEntry, DsnTemplate, TestReport, WellKnownKey,
    },
    output::{OutputFormatter, OutputFormatterFactory},
    registry::Registry,
    resolver::DriverResolver,
    store::ConfigSection,
    tester::{BackendDetector, ConnectionTester},
    types::FailureKind,
};
use std::path::Path;

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

/// Everything a command needs once configuration is settled
struct Session {
    config: Config,
    paths: StorePaths,
    factory: LoggerFactory,
    store_logger: StoreLogger,
    formatter: Box<dyn OutputFormatter>,
}

impl App {
    /// Create a new application instance with CLI configuration
    pub fn new(cli: Cli) -> Result<Self> {
        cli.validate().map_err(AppError::validation)?;
        Ok(Self { cli })
    }

    /// Run the selected command
    pub async fn run(self) -> Result<()> {
        let Some(command) = self.cli.command.clone() else {
            println!("{}", self.cli.display_help());
            return Ok(());
        };

        let config = load_config(self.cli.clone())?;
        let session = Session::start(config).await?;

        match command {
            Command::Dsn { command } => session.run_dsn(command).await,
            Command::Driver { command } => session.run_driver(command).await,
            Command::Test(args) => session.run_test(args).await,
            Command::Check => session.run_check().await,
            Command::Paths => session.run_paths(),
        }
    }
}

impl Session {
    async fn start(config: Config) -> Result<Self> {
        let formatter = OutputFormatterFactory::create_formatter(config.enable_color, config.verbose);

        for warning in ConfigValidator::validate_comprehensive(&config)? {
            if config.verbose || warning.level > crate::config::ValidationLevel::Info {
                eprintln!("{}", warning.format(config.enable_color));
            }
        }

        let paths = FileLocator::from_env().locate(config.dsn_file.as_deref(), config.driver_file.as_deref());
        let factory = LoggerFactory::new(config.clone());
        let store_logger = factory.create_store_logger();

        let logger = factory.create_logger("APP").await;
        log_debug!(logger, "DSN file {} ({})", paths.dsn.display(), paths.dsn_source);
        log_debug!(logger, "Driver file {} ({})", paths.driver.display(), paths.driver_source);

        Ok(Self { config, paths, factory, store_logger, formatter })
    }

    async fn load_registry(&self) -> Result<Registry> {
        let registry = Registry::load(&self.paths.dsn, &self.paths.driver)?;
        self.store_logger
            .log_load("dsn", registry.dsn_path(), registry.dsn_store().len(), registry.dsn_warnings())
            .await;
        self.store_logger
            .log_load("driver", registry.driver_path(), registry.driver_store().len(), registry.driver_warnings())
            .await;
        Ok(registry)
    }

    /// Log a write outcome and pass it through
    async fn logged_write<T>(&self, role: &str, path: &Path, section: &str, action: &str, outcome: Result<T>) -> Result<T> {
        match &outcome {
            Ok(_) => self.store_logger.log_write(role, path, section, action).await,
            Err(e) => {
                self.store_logger.log_write_failure(role, path, e).await;
                self.factory
                    .create_error_logger()
                    .log_error(e, Some(format!("{} {}", action, section).as_str()), None)
                    .await;
            }
        }
        outcome
    }

    fn warn(&self, message: &str) -> Result<()> {
        eprintln!("{}", self.formatter.format_warning(message)?);
        Ok(())
    }

    async fn run_dsn(&self, command: DsnCommand) -> Result<()> {
        let mut registry = self.load_registry().await?;

        match command {
            DsnCommand::List { flat } => {
                let text = if flat {
                    self.formatter.format_dsn_list(&registry.list_dsns(false))?
                } else {
                    self.formatter.format_dsn_groups(&registry.dsn_groups())?
                };
                println!("{}", text);
            }
            DsnCommand::Show { name } => {
                let dsn = registry.get_dsn(&name)?;
                println!("{}", self.formatter.format_dsn_details(&dsn)?);
                if let Some(advisory) = DriverResolver::advise(&dsn, registry.driver_store()) {
                    self.warn(&advisory.message())?;
                }
            }
            DsnCommand::Add(args) => {
                let section = dsn_template(&args).to_section(&args.name);
                if !registry.driver_store().contains_section(&args.driver) {
                    self.warn(&format!("Driver '{}' is not registered in {}", args.driver, registry.driver_path().display()))?;
                }

                let path = registry.dsn_path().to_path_buf();
                let outcome = registry.upsert_dsn(&args.name, section);
                let previous = self.logged_write("dsn", &path, &args.name, "upsert", outcome).await?;
                let verb = if previous.is_some() { "replaced" } else { "added" };
                println!("{}", self.formatter.format_success(&format!("DSN '{}' {} in {}", args.name, verb, path.display()))?);
            }
            DsnCommand::Remove { name } => {
                let path = registry.dsn_path().to_path_buf();
                let outcome = registry.remove_dsn(&name);
                self.logged_write("dsn", &path, &name, "remove", outcome).await?;
                println!("{}", self.formatter.format_success(&format!("DSN '{}' removed from {}", name, path.display()))?);
            }
            DsnCommand::FixDriver { name, apply } => {
                self.fix_driver(&mut registry, &name, apply).await?;
            }
        }

        Ok(())
    }

    async fn fix_driver(&self, registry: &mut Registry, name: &str, apply: bool) -> Result<()> {
        let dsn = registry.get_dsn(name)?;
        let Some(advisory) = DriverResolver::advise(&dsn, registry.driver_store()) else {
            let message = if dsn.driver().is_empty() {
                format!("DSN '{}' has no Driver entry; nothing to resolve", name)
            } else {
                format!("DSN '{}' already names driver '{}'", name, dsn.driver())
            };
            println!("{}", self.formatter.format_success(&message)?);
            return Ok(());
        };

        println!("{}", advisory.message());

        let Some(suggested) = advisory.suggested_driver.clone() else {
            return if apply {
                Err(AppError::not_found(format!(
                    "No driver in {} uses library '{}'; register one with `odm driver add`",
                    registry.driver_path().display(),
                    advisory.configured_value
                )))
            } else {
                Ok(())
            };
        };

        if !apply {
            println!("Run `odm dsn fix-driver {} --apply` to set Driver = {}", name, suggested);
            return Ok(());
        }

        let section = with_driver_name(&dsn, &suggested);
        let path = registry.dsn_path().to_path_buf();
        let outcome = registry.upsert_dsn(name, section);
        self.logged_write("dsn", &path, name, "fix-driver", outcome).await?;
        println!("{}", self.formatter.format_success(&format!("DSN '{}' now uses driver '{}'", name, suggested))?);
        Ok(())
    }

    async fn run_driver(&self, command: DriverCommand) -> Result<()> {
        let mut registry = self.load_registry().await?;

        match command {
            DriverCommand::List => {
                println!("{}", self.formatter.format_driver_table(&registry.list_drivers())?);
            }
            DriverCommand::Show { name } => {
                println!("{}", self.formatter.format_driver_details(&registry.get_driver(&name)?)?);
            }
            DriverCommand::Add { name, library, setup, description, replace } => {
                if registry.driver_store().contains_section(&name) && !replace {
                    return Err(AppError::validation(format!(
                        "Driver '{}' is already registered; use --replace to overwrite it",
                        name
                    )));
                }
                if !library.is_file() {
                    self.warn(&format!("Driver library not found: {}", library.display()))?;
                }

                let template = DriverTemplate {
                    library: library.display().to_string(),
                    setup: setup.map(|p| p.display().to_string()),
                    description,
                };
                let path = registry.driver_path().to_path_buf();
                let outcome = registry.upsert_driver(&name, template.to_section(&name));
                let previous = self.logged_write("driver", &path, &name, "register", outcome).await?;
                let verb = if previous.is_some() { "replaced" } else { "registered" };
                println!("{}", self.formatter.format_success(&format!("Driver '{}' {} in {}", name, verb, path.display()))?);
            }
        }

        Ok(())
    }

    async fn run_test(&self, args: TestArgs) -> Result<()> {
        let registry = self.load_registry().await?;

        let credentials = Credentials::new(args.user.as_deref(), args.password.as_deref());
        if credentials.is_none() && (args.user.is_some() || args.password.is_some()) {
            self.warn("Credentials ignored: --user and --password must be given together")?;
        }

        let attempt = ConnectionAttempt::new(args.dsn.as_str(), self.config.manager, self.config.timeout())
            .with_credentials(credentials);
        let tester = ConnectionTester::new(BackendDetector::from_env().connectors())
            .with_logger(self.factory.create_connection_logger());

        let report = tester.test(&registry, &attempt).await;
        println!("{}", self.formatter.format_test_report(&report)?);

        if report.overall_success() {
            return Ok(());
        }

        let hints = hints_for_report(&report);
        if !hints.is_empty() {
            println!("{}", self.formatter.format_hints(&hints)?);
        }

        Err(test_failure(&report))
    }

    async fn run_check(&self) -> Result<()> {
        let registry = self.load_registry().await?;
        let warnings = RegistryValidator::validate(&registry);
        println!("{}", self.formatter.format_validation(&warnings)?);

        if has_errors(&warnings) {
            return Err(AppError::validation(format!(
                "{} problem(s) found in {} and {}",
                warnings.len(),
                registry.dsn_path().display(),
                registry.driver_path().display()
            )));
        }
        Ok(())
    }

    fn run_paths(&self) -> Result<()> {
        let backends = BackendDetector::from_env().detect();
        println!("{}", self.formatter.format_paths(&self.paths, &backends)?);
        Ok(())
    }
}

fn dsn_template(args: &DsnAddArgs) -> DsnTemplate {
    let mut template = DsnTemplate::new(args.driver.as_str());
    if let Some(host) = &args.host {
        template.host = host.clone();
    }
    if let Some(port) = args.port {
        template.port = port;
    }
    if let Some(database) = &args.database {
        template.database = database.clone();
    }
    if let Some(user) = &args.user {
        template.username = user.clone();
    }
    if let Some(password) = &args.password {
        template.password = password.clone();
    }
    template.description = args.description.clone();
    template.openlink_defaults = !args.no_openlink_defaults;
    template
}

/// Copy of the DSN's section with the driver reference replaced, keeping the key's spelling
fn with_driver_name(dsn: &DsnEntry, driver: &str) -> ConfigSection {
    let key = dsn
        .section
        .keys()
        .find(|k| WellKnownKey::Driver.matches(k))
        .unwrap_or(WellKnownKey::Driver.canonical())
        .to_string();
    let mut section = dsn.section.clone();
    section.insert(key, driver);
    section
}

/// Hints for each distinct failure kind, in attempt order
fn hints_for_report(report: &TestReport) -> Vec<&'static str> {
    let mut kinds: Vec<FailureKind> = Vec::new();
    for kind in report.failures().filter_map(|r| r.failure_kind()) {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if report.results.is_empty() {
        kinds.push(FailureKind::BackendUnavailable);
    }

    kinds.into_iter().flat_map(|kind| HelpSystem::hints_for(kind).iter().copied()).collect()
}

fn test_failure(report: &TestReport) -> AppError {
    let all_unavailable = report
        .results
        .iter()
        .all(|r| r.failure_kind() == Some(FailureKind::BackendUnavailable));

    if all_unavailable {
        AppError::backend_unavailable(format!(
            "No ODBC driver manager could test '{}' (install unixODBC or iODBC)",
            report.dsn_name
        ))
    } else {
        AppError::connector_failure(format!("Could not connect to '{}'", report.dsn_name))
    }
}
