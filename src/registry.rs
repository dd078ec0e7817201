//! Typed view over the DSN store and the driver store

use crate::error::{AppError, Result};
use crate::models::{DriverEntry, DsnEntry};
use crate::store::{is_reserved_name, ConfigSection, ConfigStore, ParseWarning};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Group name for DSNs without a usable driver reference
pub const UNKNOWN_DRIVER_GROUP: &str = "unknown";

/// DSN names sharing one driver reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsnGroup {
    pub driver: String,
    pub dsns: Vec<String>,
}

/// The two stores plus the files they persist to.
///
/// Mutations are applied to a copy first and only committed in memory
/// once the file write succeeded.
#[derive(Debug, Clone)]
pub struct Registry {
    dsn_path: PathBuf,
    driver_path: PathBuf,
    dsn_store: ConfigStore,
    driver_store: ConfigStore,
    dsn_warnings: Vec<ParseWarning>,
    driver_warnings: Vec<ParseWarning>,
}

impl Registry {
    /// Load both stores; missing files give empty stores
    pub fn load(dsn_path: &Path, driver_path: &Path) -> Result<Self> {
        let dsn = ConfigStore::load(dsn_path)?;
        let drivers = ConfigStore::load(driver_path)?;

        Ok(Self {
            dsn_path: dsn_path.to_path_buf(),
            driver_path: driver_path.to_path_buf(),
            dsn_store: dsn.store,
            driver_store: drivers.store,
            dsn_warnings: dsn.warnings,
            driver_warnings: drivers.warnings,
        })
    }

    /// Build a registry over stores that are already in memory
    pub fn from_stores(dsn_path: PathBuf, dsn_store: ConfigStore, driver_path: PathBuf, driver_store: ConfigStore) -> Self {
        Self {
            dsn_path,
            driver_path,
            dsn_store,
            driver_store,
            dsn_warnings: Vec::new(),
            driver_warnings: Vec::new(),
        }
    }

    pub fn dsn_path(&self) -> &Path {
        &self.dsn_path
    }

    pub fn driver_path(&self) -> &Path {
        &self.driver_path
    }

    pub fn dsn_store(&self) -> &ConfigStore {
        &self.dsn_store
    }

    pub fn driver_store(&self) -> &ConfigStore {
        &self.driver_store
    }

    /// Warnings from parsing the DSN file
    pub fn dsn_warnings(&self) -> &[ParseWarning] {
        &self.dsn_warnings
    }

    /// Warnings from parsing the driver file
    pub fn driver_warnings(&self) -> &[ParseWarning] {
        &self.driver_warnings
    }

    /// DSN names, either in file order or grouped by driver.
    ///
    /// Grouped order: groups sorted by driver name, names sorted within each
    /// group, groups concatenated.
    pub fn list_dsns(&self, group_by_driver: bool) -> Vec<String> {
        if group_by_driver {
            self.dsn_groups().into_iter().flat_map(|group| group.dsns).collect()
        } else {
            self.dsn_store.section_names().map(str::to_string).collect()
        }
    }

    /// DSNs grouped by their driver reference, in listing order
    pub fn dsn_groups(&self) -> Vec<DsnGroup> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (name, section) in self.dsn_store.sections() {
            let entry = DsnEntry::new(name, section.clone());
            let driver = entry.driver().trim();
            let key = if driver.is_empty() { UNKNOWN_DRIVER_GROUP } else { driver };
            groups.entry(key.to_string()).or_default().push(name.to_string());
        }

        groups
            .into_iter()
            .map(|(driver, mut dsns)| {
                dsns.sort();
                DsnGroup { driver, dsns }
            })
            .collect()
    }

    pub fn dsns(&self) -> impl Iterator<Item = DsnEntry> + '_ {
        self.dsn_store
            .sections()
            .map(|(name, section)| DsnEntry::new(name, section.clone()))
    }

    /// Exact-match DSN lookup
    pub fn get_dsn(&self, name: &str) -> Result<DsnEntry> {
        self.dsn_store
            .section(name)
            .map(|section| DsnEntry::new(name, section.clone()))
            .ok_or_else(|| AppError::not_found(format!("DSN '{}' is not defined in {}", name, self.dsn_path.display())))
    }

    /// Drivers in file order
    pub fn list_drivers(&self) -> Vec<DriverEntry> {
        self.driver_store
            .sections()
            .map(|(name, section)| DriverEntry::new(name, section.clone()))
            .collect()
    }

    /// Exact-match driver lookup
    pub fn get_driver(&self, name: &str) -> Result<DriverEntry> {
        self.driver_store
            .section(name)
            .map(|section| DriverEntry::new(name, section.clone()))
            .ok_or_else(|| {
                AppError::not_found(format!("Driver '{}' is not registered in {}", name, self.driver_path.display()))
            })
    }

    /// Replace or add a DSN and persist the DSN file.
    ///
    /// Returns the previous section when one was replaced.
    pub fn upsert_dsn(&mut self, name: &str, section: ConfigSection) -> Result<Option<ConfigSection>> {
        validate_section_name(name)?;
        validate_section_fields(name, &section)?;
        let mut candidate = self.dsn_store.clone();
        let previous = candidate.add_or_replace_section(name, section);
        candidate.save(&self.dsn_path)?;
        self.dsn_store = candidate;
        Ok(previous)
    }

    /// Replace or add a driver and persist the driver file
    pub fn upsert_driver(&mut self, name: &str, section: ConfigSection) -> Result<Option<ConfigSection>> {
        validate_section_name(name)?;
        validate_section_fields(name, &section)?;
        let mut candidate = self.driver_store.clone();
        let previous = candidate.add_or_replace_section(name, section);
        candidate.save(&self.driver_path)?;
        self.driver_store = candidate;
        Ok(previous)
    }

    /// Remove a DSN and persist the DSN file
    pub fn remove_dsn(&mut self, name: &str) -> Result<ConfigSection> {
        let mut candidate = self.dsn_store.clone();
        let removed = candidate
            .remove_section(name)
            .ok_or_else(|| AppError::not_found(format!("DSN '{}' is not defined in {}", name, self.dsn_path.display())))?;
        candidate.save(&self.dsn_path)?;
        self.dsn_store = candidate;
        Ok(removed)
    }
}

/// Names that would not survive a write/parse cycle are rejected
fn validate_section_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Section name cannot be empty"));
    }
    if name != name.trim() {
        return Err(AppError::validation(format!("Section name '{}' has surrounding whitespace", name)));
    }
    if name.contains(['[', ']', '\n', '\r']) {
        return Err(AppError::validation(format!("Section name '{}' contains brackets or line breaks", name)));
    }
    if is_reserved_name(name) {
        return Err(AppError::validation(format!("'{}' is a reserved section name", name)));
    }
    Ok(())
}

/// Keys and values must stay on their own `key = value` line
fn validate_section_fields(name: &str, section: &ConfigSection) -> Result<()> {
    for (key, value) in section.iter() {
        if key.trim().is_empty() {
            return Err(AppError::validation(format!("Section '{}' has an empty key", name)));
        }
        if key != key.trim() || key.contains(['=', '\n', '\r']) || key.starts_with(['[', '#', ';']) {
            return Err(AppError::validation(format!("Key '{}' in section '{}' cannot be written to an ini file", key.escape_debug(), name)));
        }
        if value.contains(['\n', '\r']) {
            return Err(AppError::validation(format!("Value of '{}' in section '{}' contains a line break", key, name)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry_from(dsn_text: &str, driver_text: &str) -> (TempDir, Registry) {
        let dir = TempDir::new().unwrap();
        let dsn_path = dir.path().join("odbc.ini");
        let driver_path = dir.path().join("odbcinst.ini");
        std::fs::write(&dsn_path, dsn_text).unwrap();
        std::fs::write(&driver_path, driver_text).unwrap();
        let registry = Registry::load(&dsn_path, &driver_path).unwrap();
        (dir, registry)
    }

    #[test]
    fn test_grouped_ordering() {
        let (_dir, registry) = registry_from(
            "[Zeta]\nDriver = B\n[Alpha]\nDriver = A\n[Beta]\nDriver = A\n",
            "",
        );
        assert_eq!(registry.list_dsns(true), vec!["Alpha", "Beta", "Zeta"]);
        assert_eq!(registry.list_dsns(false), vec!["Zeta", "Alpha", "Beta"]);
    }

    #[test]
    fn test_driver_key_casing_groups_together() {
        let (_dir, registry) = registry_from(
            "[One]\nDRIVER = PG\n[Two]\ndriver = PG\n[Three]\nDriver = Other\n",
            "",
        );
        let groups = registry.dsn_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1], DsnGroup { driver: "PG".into(), dsns: vec!["One".into(), "Two".into()] });
    }

    #[test]
    fn test_missing_or_empty_driver_grouped_unknown() {
        let (_dir, registry) = registry_from("[NoKey]\nAddress = x\n[Empty]\nDriver =\n[Ok]\nDriver = A\n", "");
        let groups = registry.dsn_groups();
        assert_eq!(groups[0].driver, "A");
        assert_eq!(groups[1].driver, UNKNOWN_DRIVER_GROUP);
        assert_eq!(groups[1].dsns, vec!["Empty", "NoKey"]);
    }

    #[test]
    fn test_lookups() {
        let (_dir, registry) = registry_from("[Sales]\nDriver = PG\n", "[PG]\nDriver = /usr/lib/psqlodbcw.so\n");
        assert_eq!(registry.get_dsn("Sales").unwrap().driver(), "PG");
        assert!(matches!(registry.get_dsn("sales"), Err(AppError::NotFound(_))));
        assert_eq!(registry.get_driver("PG").unwrap().library(), Some("/usr/lib/psqlodbcw.so"));
        assert!(matches!(registry.get_driver("Missing"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_load_keeps_warnings() {
        let (_dir, registry) = registry_from("[A]\n[A]\n", "orphan = 1\n");
        assert_eq!(registry.dsn_warnings().len(), 1);
        assert_eq!(registry.driver_warnings().len(), 1);
    }

    #[test]
    fn test_missing_files_load_empty() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::load(&dir.path().join("a.ini"), &dir.path().join("b.ini")).unwrap();
        assert!(registry.list_dsns(true).is_empty());
        assert!(registry.list_drivers().is_empty());
    }

    #[test]
    fn test_upsert_replaces_whole_section_and_persists() {
        let (_dir, mut registry) = registry_from("", "");

        registry.upsert_dsn("X", ConfigSection::new().with("A", "1")).unwrap();
        let previous = registry.upsert_dsn("X", ConfigSection::new().with("B", "2")).unwrap();
        assert_eq!(previous.unwrap().get("A"), Some("1"));

        let section = registry.dsn_store().section("X").unwrap();
        assert_eq!(section.len(), 1);
        assert_eq!(section.get("B"), Some("2"));

        let reloaded = Registry::load(registry.dsn_path(), registry.driver_path()).unwrap();
        assert_eq!(reloaded.dsn_store(), registry.dsn_store());
    }

    #[test]
    fn test_upsert_driver_persists() {
        let (_dir, mut registry) = registry_from("", "");
        registry
            .upsert_driver("Foo", ConfigSection::new().with("Driver", "/usr/lib/foo.so"))
            .unwrap();
        let text = std::fs::read_to_string(registry.driver_path()).unwrap();
        assert_eq!(text, "[Foo]\nDriver = /usr/lib/foo.so\n");
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let mut registry = Registry::from_stores(
            blocker.join("odbc.ini"),
            ConfigStore::parse("[Keep]\nDriver = A\n").store,
            blocker.join("odbcinst.ini"),
            ConfigStore::new(),
        );

        let result = registry.upsert_dsn("New", ConfigSection::new().with("Driver", "B"));
        assert!(result.is_err());
        assert!(!registry.dsn_store().contains_section("New"));

        assert!(registry.remove_dsn("Keep").is_err());
        assert!(registry.dsn_store().contains_section("Keep"));
    }

    #[test]
    fn test_remove_dsn() {
        let (_dir, mut registry) = registry_from("[A]\nDriver = x\n[B]\nDriver = y\n", "");
        let removed = registry.remove_dsn("A").unwrap();
        assert_eq!(removed.get("Driver"), Some("x"));
        assert_eq!(registry.list_dsns(false), vec!["B"]);
        assert!(matches!(registry.remove_dsn("A"), Err(AppError::NotFound(_))));

        let text = std::fs::read_to_string(registry.dsn_path()).unwrap();
        assert!(!text.contains("[A]"));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let (_dir, mut registry) = registry_from("", "");
        for name in ["", " padded", "a]b", "ODBC Data Sources"] {
            let result = registry.upsert_dsn(name, ConfigSection::new());
            assert!(matches!(result, Err(AppError::Validation(_))), "{name:?}");
        }
    }

    #[test]
    fn test_line_break_in_value_cannot_inject_sections() {
        let original = "[Sales]\nDriver = PG\n";
        let (_dir, mut registry) = registry_from(original, "");
        let section = ConfigSection::new()
            .with("Driver", "PG")
            .with("PWD", "a\n[Injected]\nDriver = evil");

        let result = registry.upsert_dsn("Sales", section);

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(std::fs::read_to_string(registry.dsn_path()).unwrap(), original);
        assert_eq!(registry.get_dsn("Sales").unwrap().section.get("PWD"), None);
        assert!(!registry.dsn_store().contains_section("Injected"));
    }

    #[test]
    fn test_unwritable_keys_rejected() {
        let (_dir, mut registry) = registry_from("", "");
        for key in ["", "a=b", "[X]", "#note", " Host", "Ho\rst"] {
            let result = registry.upsert_driver("Foo", ConfigSection::new().with(key, "v"));
            assert!(matches!(result, Err(AppError::Validation(_))), "{key:?}");
        }
        assert!(registry.driver_store().is_empty());
    }

    #[test]
    fn test_reserved_blocks_survive_upsert() {
        let (_dir, mut registry) = registry_from("[ODBC Data Sources]\nSales = PG\n\n[Sales]\nDriver = PG\n", "");
        registry.upsert_dsn("Other", ConfigSection::new().with("Driver", "PG")).unwrap();
        let text = std::fs::read_to_string(registry.dsn_path()).unwrap();
        assert!(text.starts_with("[ODBC Data Sources]\nSales = PG\n"));
    }
}
