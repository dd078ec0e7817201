//! Detection of DSNs that store a library path where a driver name belongs

use crate::models::{DriverAdvisory, DriverEntry, DsnEntry};
use crate::store::ConfigStore;

/// Advisory-only resolver; it never mutates either store
pub struct DriverResolver;

impl DriverResolver {
    /// True when the DSN's driver value contains a path separator
    pub fn detect_path_misconfiguration(dsn: &DsnEntry) -> bool {
        is_path_like(dsn.driver())
    }

    /// First driver, in store order, whose library path equals `path` byte for byte
    pub fn resolve_correct_name(driver_store: &ConfigStore, path: &str) -> Option<String> {
        driver_store
            .sections()
            .find(|(name, section)| DriverEntry::new(*name, (*section).clone()).library() == Some(path))
            .map(|(name, _)| name.to_string())
    }

    /// Combined check; `None` when the DSN's driver reference looks like a name
    pub fn advise(dsn: &DsnEntry, driver_store: &ConfigStore) -> Option<DriverAdvisory> {
        if !Self::detect_path_misconfiguration(dsn) {
            return None;
        }

        let configured = dsn.driver();
        Some(DriverAdvisory {
            dsn_name: dsn.name.clone(),
            configured_value: configured.to_string(),
            suggested_driver: Self::resolve_correct_name(driver_store, configured),
        })
    }
}

/// Whether a value contains `/` or `\`
pub fn is_path_like(value: &str) -> bool {
    value.contains('/') || value.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ConfigSection;

    fn dsn(driver: &str) -> DsnEntry {
        DsnEntry::new("Sales", ConfigSection::new().with("Driver", driver))
    }

    #[test]
    fn test_detects_path_separators() {
        assert!(DriverResolver::detect_path_misconfiguration(&dsn("/usr/lib/foo.so")));
        assert!(DriverResolver::detect_path_misconfiguration(&dsn(r"C:\odbc\foo.dll")));
        assert!(!DriverResolver::detect_path_misconfiguration(&dsn("FooDriver")));
        assert!(!DriverResolver::detect_path_misconfiguration(&DsnEntry::new("Bare", ConfigSection::new())));
    }

    #[test]
    fn test_resolves_first_matching_driver() {
        let drivers = ConfigStore::parse(
            "[Other]\nDriver = /usr/lib/bar.so\n[FooDriver]\nDriver = /usr/lib/foo.so\n[FooCopy]\nDriver = /usr/lib/foo.so\n",
        )
        .store;
        assert_eq!(
            DriverResolver::resolve_correct_name(&drivers, "/usr/lib/foo.so"),
            Some("FooDriver".to_string())
        );
    }

    #[test]
    fn test_exact_match_only() {
        let drivers = ConfigStore::parse("[FooDriver]\nDriver = /usr/lib/foo.so\n").store;
        assert_eq!(DriverResolver::resolve_correct_name(&drivers, "/usr/lib/FOO.so"), None);
        assert_eq!(DriverResolver::resolve_correct_name(&drivers, "/usr/lib/foo.so "), None);
    }

    #[test]
    fn test_advise_leaves_dsn_untouched() {
        let drivers = ConfigStore::parse("[FooDriver]\nDriver = /usr/lib/foo.so\n").store;
        let entry = dsn("/usr/lib/foo.so");

        let advisory = DriverResolver::advise(&entry, &drivers).unwrap();
        assert_eq!(advisory.suggested_driver.as_deref(), Some("FooDriver"));
        assert_eq!(entry.driver(), "/usr/lib/foo.so");

        let unmatched = DriverResolver::advise(&dsn("/opt/none.so"), &drivers).unwrap();
        assert!(unmatched.suggested_driver.is_none());

        assert!(DriverResolver::advise(&dsn("FooDriver"), &drivers).is_none());
    }
}
