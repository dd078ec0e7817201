//! Standard locations of `odbc.ini` and `odbcinst.ini`

use std::fmt;
use std::path::{Path, PathBuf};

/// How a store path was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    /// Given with `--odbcini` or `--odbcinst`
    Explicit,
    /// First existing search candidate
    Found,
    /// Nothing exists yet; the file is created on first write
    Default,
}

impl fmt::Display for PathSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PathSource::Explicit => "explicit",
            PathSource::Found => "found",
            PathSource::Default => "default",
        })
    }
}

/// Selected store files plus the candidates that were considered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub dsn: PathBuf,
    pub driver: PathBuf,
    pub dsn_source: PathSource,
    pub driver_source: PathSource,
    pub dsn_candidates: Vec<PathBuf>,
    pub driver_candidates: Vec<PathBuf>,
}

/// Search order for the two store files
#[derive(Debug, Clone, Default)]
pub struct FileLocator {
    home: Option<PathBuf>,
    env_dsn: Option<PathBuf>,
    env_driver: Option<PathBuf>,
}

impl FileLocator {
    /// Locator seeded from `HOME`, `ODBCINI` and `ODBCINST`/`ODBCINSTINI`
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Locator seeded from variables supplied by `lookup`.
    ///
    /// Blank values count as unset. The variables only head the candidate
    /// lists; a path that does not exist falls through to the next one.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self::new(var("HOME"), var("ODBCINI"), var("ODBCINST").or_else(|| var("ODBCINSTINI")))
    }

    pub fn new(home: Option<PathBuf>, env_dsn: Option<PathBuf>, env_driver: Option<PathBuf>) -> Self {
        Self { home, env_dsn, env_driver }
    }

    fn home_join(&self, relative: &str) -> Option<PathBuf> {
        self.home.as_ref().map(|home| home.join(relative))
    }

    /// DSN file candidates, most specific first
    pub fn dsn_candidates(&self) -> Vec<PathBuf> {
        dedupe(
            [
                self.env_dsn.clone(),
                self.home_join(".odbc.ini"),
                self.home_join("Library/ODBC/odbc.ini"),
                Some(PathBuf::from("/etc/odbc.ini")),
                Some(PathBuf::from("/usr/local/etc/odbc.ini")),
            ]
            .into_iter()
            .flatten(),
        )
    }

    /// Driver file candidates, most specific first
    pub fn driver_candidates(&self) -> Vec<PathBuf> {
        dedupe(
            [
                self.env_driver.clone(),
                self.home_join(".odbcinst.ini"),
                self.home_join("Library/ODBC/odbcinst.ini"),
                Some(PathBuf::from("/Library/ODBC/odbcinst.ini")),
                Some(PathBuf::from("/etc/odbcinst.ini")),
                Some(PathBuf::from("/usr/local/etc/odbcinst.ini")),
            ]
            .into_iter()
            .flatten(),
        )
    }

    /// Pick both store files; explicit paths bypass the search
    pub fn locate(&self, explicit_dsn: Option<&Path>, explicit_driver: Option<&Path>) -> StorePaths {
        let dsn_candidates = self.dsn_candidates();
        let driver_candidates = self.driver_candidates();

        let (dsn, dsn_source) = match explicit_dsn {
            Some(path) => (path.to_path_buf(), PathSource::Explicit),
            None => match first_existing(&dsn_candidates) {
                Some(path) => (path, PathSource::Found),
                None => (
                    self.home_join(".odbc.ini").unwrap_or_else(|| PathBuf::from(".odbc.ini")),
                    PathSource::Default,
                ),
            },
        };

        let (driver, driver_source) = match explicit_driver {
            Some(path) => (path.to_path_buf(), PathSource::Explicit),
            None => match first_existing(&driver_candidates) {
                Some(path) => (path, PathSource::Found),
                None => (sibling_driver_file(&dsn), PathSource::Default),
            },
        };

        StorePaths { dsn, driver, dsn_source, driver_source, dsn_candidates, driver_candidates }
    }
}

fn dedupe<I: Iterator<Item = PathBuf>>(paths: I) -> Vec<PathBuf> {
    let mut unique: Vec<PathBuf> = Vec::new();
    for path in paths {
        if !unique.contains(&path) {
            unique.push(path);
        }
    }
    unique
}

fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|path| path.is_file()).cloned()
}

/// `odbcinst.ini` beside the DSN file
fn sibling_driver_file(dsn: &Path) -> PathBuf {
    match dsn.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join("odbcinst.ini"),
        _ => PathBuf::from("odbcinst.ini"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn locator_from(vars: &[(&str, &str)]) -> FileLocator {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        FileLocator::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_from_vars_seeds_candidates() {
        let locator = locator_from(&[("HOME", "/home/u"), ("ODBCINI", " /srv/odbc.ini "), ("ODBCINSTINI", "/srv/inst.ini")]);
        assert_eq!(locator.dsn_candidates()[0], PathBuf::from("/srv/odbc.ini"));
        assert_eq!(locator.dsn_candidates()[1], PathBuf::from("/home/u/.odbc.ini"));
        assert_eq!(locator.driver_candidates()[0], PathBuf::from("/srv/inst.ini"));
    }

    #[test]
    fn test_odbcinst_preferred_over_odbcinstini() {
        let locator = locator_from(&[("ODBCINST", "/a/inst.ini"), ("ODBCINSTINI", "/b/inst.ini")]);
        assert_eq!(locator.driver_candidates()[0], PathBuf::from("/a/inst.ini"));
        assert!(!locator.driver_candidates().contains(&PathBuf::from("/b/inst.ini")));
    }

    #[test]
    fn test_blank_vars_ignored() {
        let locator = locator_from(&[("HOME", "/home/u"), ("ODBCINI", "   "), ("ODBCINST", "")]);
        assert_eq!(locator.dsn_candidates()[0], PathBuf::from("/home/u/.odbc.ini"));
        assert_eq!(locator.driver_candidates()[0], PathBuf::from("/home/u/.odbcinst.ini"));
    }

    #[test]
    fn test_missing_odbcini_falls_through_to_home_file() {
        let home = TempDir::new().unwrap();
        let home_ini = home.path().join(".odbc.ini");
        std::fs::write(&home_ini, "[Sales]\nDriver = X\n").unwrap();
        let missing = home.path().join("nowhere/odbc.ini");

        let locator = locator_from(&[
            ("HOME", home.path().to_str().unwrap()),
            ("ODBCINI", missing.to_str().unwrap()),
        ]);
        let paths = locator.locate(None, None);

        assert_eq!(paths.dsn_candidates[0], missing);
        assert_eq!(paths.dsn, home_ini);
        assert_eq!(paths.dsn_source, PathSource::Found);
    }

    #[test]
    fn test_candidate_order() {
        let locator = FileLocator::new(Some(PathBuf::from("/home/u")), Some(PathBuf::from("/srv/odbc.ini")), None);
        let candidates = locator.dsn_candidates();
        assert_eq!(candidates[0], PathBuf::from("/srv/odbc.ini"));
        assert_eq!(candidates[1], PathBuf::from("/home/u/.odbc.ini"));
        assert_eq!(candidates[2], PathBuf::from("/home/u/Library/ODBC/odbc.ini"));
        assert_eq!(candidates.len(), 5);
        assert_eq!(locator.driver_candidates().len(), 5);
    }

    #[test]
    fn test_candidates_deduplicated() {
        let locator = FileLocator::new(Some(PathBuf::from("/home/u")), Some(PathBuf::from("/etc/odbc.ini")), None);
        let candidates = locator.dsn_candidates();
        assert_eq!(candidates[0], PathBuf::from("/etc/odbc.ini"));
        assert_eq!(candidates.iter().filter(|p| **p == PathBuf::from("/etc/odbc.ini")).count(), 1);
    }

    #[test]
    fn test_explicit_paths_bypass_search() {
        let locator = FileLocator::new(None, None, None);
        let paths = locator.locate(Some(Path::new("/a/odbc.ini")), Some(Path::new("/b/inst.ini")));
        assert_eq!(paths.dsn, PathBuf::from("/a/odbc.ini"));
        assert_eq!(paths.driver, PathBuf::from("/b/inst.ini"));
        assert_eq!(paths.dsn_source, PathSource::Explicit);
        assert_eq!(paths.driver_source, PathSource::Explicit);
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let home = TempDir::new().unwrap();
        let library_ini = home.path().join("Library/ODBC/odbc.ini");
        std::fs::create_dir_all(library_ini.parent().unwrap()).unwrap();
        std::fs::write(&library_ini, "[A]\n").unwrap();
        std::fs::write(home.path().join(".odbcinst.ini"), "").unwrap();

        let locator = FileLocator::new(
            Some(home.path().to_path_buf()),
            Some(home.path().join("missing.ini")),
            None,
        );
        let paths = locator.locate(None, None);
        assert_eq!(paths.dsn, library_ini);
        assert_eq!(paths.dsn_source, PathSource::Found);
        assert_eq!(paths.driver, home.path().join(".odbcinst.ini"));
    }

    #[test]
    fn test_explicit_dsn_gives_sibling_default_driver() {
        let locator = FileLocator::new(Some(PathBuf::from("/nonexistent-home")), None, Some(PathBuf::from("/nonexistent/inst.ini")));
        let paths = locator.locate(Some(Path::new("/nonexistent/dir/odbc.ini")), None);
        if paths.driver_source == PathSource::Default {
            assert_eq!(paths.driver, PathBuf::from("/nonexistent/dir/odbcinst.ini"));
        }
        assert_eq!(sibling_driver_file(Path::new("odbc.ini")), PathBuf::from("odbcinst.ini"));
    }
}
