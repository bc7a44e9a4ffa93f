//! Store configuration
//!
//! ```json
//! {
//!   "path": "library.fdb",
//!   "fields": [
//!     {"name": "title", "length": 100, "index": true},
//!     {"name": "status", "length": 1, "default": "1"}
//!   ],
//!   "sync_writes": true
//! }
//! ```
//!
//! A relative `path` is resolved against the directory holding the
//! configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{FlatDbError, FlatDbResult};
use crate::schema::{FieldSpec, Schema};

/// Configuration for one store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Data file path
    pub path: PathBuf,

    /// Field specifications in layout order (`id` is implicit)
    pub fields: Vec<FieldSpec>,

    /// Sync file data after every write (optional, default true)
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
}

fn default_sync_writes() -> bool {
    true
}

impl StoreConfig {
    /// Create a configuration with default options
    pub fn new(path: impl Into<PathBuf>, fields: Vec<FieldSpec>) -> Self {
        Self {
            path: path.into(),
            fields,
            sync_writes: default_sync_writes(),
        }
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> FlatDbResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FlatDbError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let mut config: StoreConfig = serde_json::from_str(&content)
            .map_err(|e| FlatDbError::Config(format!("Invalid config JSON: {}", e)))?;

        if config.path.is_relative() {
            if let Some(dir) = path.parent() {
                config.path = dir.join(&config.path);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return the schema it describes
    pub fn validate(&self) -> FlatDbResult<Schema> {
        if self.path.as_os_str().is_empty() {
            return Err(FlatDbError::Config("path must not be empty".into()));
        }
        Schema::build(self.fields.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_resolves_relative_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("flatdb.json");
        fs::write(
            &config_path,
            r#"{"path": "books.fdb", "fields": [{"name": "title", "length": 20, "index": true}]}"#,
        )
        .unwrap();

        let config = StoreConfig::load(&config_path).unwrap();
        assert_eq!(config.path, temp_dir.path().join("books.fdb"));
        assert!(config.sync_writes);
        assert_eq!(config.fields, vec![FieldSpec::new("title").with_length(20).indexed()]);
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("flatdb.json");
        fs::write(&config_path, "{not json").unwrap();

        let err = StoreConfig::load(&config_path).unwrap_err();
        assert_eq!(err.code(), "FLATDB_INVALID_CONFIG");
    }

    #[test]
    fn test_load_rejects_invalid_schema() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("flatdb.json");
        fs::write(&config_path, r#"{"path": "x.fdb", "fields": [{"name": "id"}]}"#).unwrap();

        let err = StoreConfig::load(&config_path).unwrap_err();
        assert_eq!(err.code(), "FLATDB_SCHEMA_VIOLATION");
    }

    #[test]
    fn test_missing_file() {
        let err = StoreConfig::load(Path::new("/nonexistent/flatdb.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_empty_path_rejected() {
        let config = StoreConfig::new("", vec![FieldSpec::new("title")]);
        assert!(config.validate().is_err());
    }
}
