//! Named fixture storage for test cases and traces.
//!
//! A `Catalog` maps a name (the JSON file stem) to a deserialized record.
//! Directory layout under a fixture root:
//!
//! ```text
//! <root>/tests/<model>/<case>.json
//! <root>/traces/<model>/<trace>.json
//! ```
//!
//! A missing directory is an empty catalog. Unreadable or malformed files
//! are skipped with a warning so one broken fixture never hides the rest.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::de::DeserializeOwned;

use crate::core::{HarnessError, HarnessResult};

/// A record stored in a catalog.
pub trait CatalogEntry: DeserializeOwned {
    /// Optional display title embedded in the record.
    fn title(&self) -> Option<&str> {
        None
    }
}

/// Name → record map with deterministic (sorted) iteration.
#[derive(Clone, Debug)]
pub struct Catalog<T> {
    entries: BTreeMap<String, T>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: CatalogEntry> Catalog<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file of `dir`.
    pub fn from_dir(dir: &Path) -> Self {
        let mut catalog = Self::new();
        let Ok(read_dir) = fs::read_dir(dir) else {
            return catalog;
        };

        let mut paths: Vec<PathBuf> = read_dir
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match read_json::<T>(&path) {
                Ok(record) => catalog.insert(stem, record),
                Err(err) => warn!("skipping fixture {}: {err}", path.display()),
            }
        }
        catalog
    }

    /// Register a record programmatically, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, record: T) {
        self.entries.insert(name.into(), record);
    }

    /// Builder form of [`Catalog::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, record: T) -> Self {
        self.insert(name, record);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(name, title)` pairs; the title falls back to the name.
    #[must_use]
    pub fn listing(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(name, record)| (name.clone(), record.title().unwrap_or(name).to_string()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Directory holding the test cases of `model` under a fixture root.
#[must_use]
pub fn tests_dir(root: &Path, model: &str) -> PathBuf {
    root.join("tests").join(model)
}

/// Directory holding the traces of `model` under a fixture root.
#[must_use]
pub fn traces_dir(root: &Path, model: &str) -> PathBuf {
    root.join("traces").join(model)
}

/// Read and deserialize one JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> HarnessResult<T> {
    let text = fs::read_to_string(path).map_err(|source| HarnessError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Case {
        name: Option<String>,
        value: i32,
    }

    impl CatalogEntry for Case {
        fn title(&self) -> Option<&str> {
            self.name.as_deref()
        }
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("puzzle-harness-catalog-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let catalog: Catalog<Case> = Catalog::from_dir(Path::new("/definitely/not/here"));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_from_dir_skips_broken_files() {
        let dir = scratch_dir("broken");
        fs::write(dir.join("b_case.json"), r#"{"value": 2}"#).unwrap();
        fs::write(dir.join("a_case.json"), r#"{"name": "First", "value": 1}"#).unwrap();
        fs::write(dir.join("broken.json"), "{ not json").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let catalog: Catalog<Case> = Catalog::from_dir(&dir);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("b_case").unwrap().value, 2);
        assert_eq!(
            catalog.listing(),
            vec![
                ("a_case".to_string(), "First".to_string()),
                ("b_case".to_string(), "b_case".to_string()),
            ]
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_insert_replaces() {
        let catalog = Catalog::new()
            .with("x", Case { name: None, value: 1 })
            .with("x", Case { name: None, value: 5 });
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("x").unwrap().value, 5);
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["x"]);
    }
}
