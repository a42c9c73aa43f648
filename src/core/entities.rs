//! core::entities
//!
//! Desired-entity-list providers.
//!
//! The orchestrator processes entities strictly in the order the provider
//! returns them. Range and selection logic live with the caller; this
//! module only loads and validates the list.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::core::types::{IconName, TypeError};

/// Errors from entity-list loading.
#[derive(Debug, Error)]
pub enum EntityListError {
    #[error("failed to read entity list '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse entity list '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("entity list is empty")]
    Empty,

    #[error(transparent)]
    InvalidName(#[from] TypeError),
}

/// Supplies the ordered list of entities a run should process.
pub trait EntityListProvider {
    fn entities(&self) -> Result<Vec<IconName>, EntityListError>;
}

/// JSON file shape: `{ "icons": ["home", "wifi_off", ...] }`.
#[derive(Debug, Deserialize)]
struct ListFile {
    icons: Vec<IconName>,
}

/// Entity list loaded from a JSON file.
#[derive(Debug)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EntityListProvider for JsonFileProvider {
    fn entities(&self) -> Result<Vec<IconName>, EntityListError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| EntityListError::Read {
            path: self.path.clone(),
            source,
        })?;
        let file: ListFile =
            serde_json::from_str(&raw).map_err(|e| EntityListError::Parse {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        dedupe_keeping_order(file.icons)
    }
}

/// Fixed entity list, for tests and embedding callers.
#[derive(Debug)]
pub struct StaticProvider {
    entities: Vec<IconName>,
}

impl StaticProvider {
    pub fn new(entities: Vec<IconName>) -> Self {
        Self { entities }
    }
}

impl EntityListProvider for StaticProvider {
    fn entities(&self) -> Result<Vec<IconName>, EntityListError> {
        dedupe_keeping_order(self.entities.clone())
    }
}

/// Drop repeated names, keeping first occurrence; an empty result is an
/// error because a run with nothing to process is almost always a caller
/// mistake.
fn dedupe_keeping_order(entities: Vec<IconName>) -> Result<Vec<IconName>, EntityListError> {
    let mut seen = std::collections::HashSet::new();
    let deduped: Vec<IconName> = entities
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect();
    if deduped.is_empty() {
        return Err(EntityListError::Empty);
    }
    Ok(deduped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn icon(s: &str) -> IconName {
        IconName::new(s).unwrap()
    }

    #[test]
    fn json_file_preserves_order_and_dedupes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("icons.json");
        std::fs::write(&path, r#"{"icons": ["wifi", "home", "wifi"]}"#).unwrap();

        let list = JsonFileProvider::new(&path).entities().unwrap();
        assert_eq!(list, vec![icon("wifi"), icon("home")]);
    }

    #[test]
    fn invalid_names_fail_the_parse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("icons.json");
        std::fs::write(&path, r#"{"icons": ["Not Valid"]}"#).unwrap();

        assert!(matches!(
            JsonFileProvider::new(&path).entities(),
            Err(EntityListError::Parse { .. })
        ));
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(matches!(
            StaticProvider::new(vec![]).entities(),
            Err(EntityListError::Empty)
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            JsonFileProvider::new("/nonexistent/icons.json").entities(),
            Err(EntityListError::Read { .. })
        ));
    }
}
