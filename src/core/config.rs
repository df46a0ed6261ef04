//! Catalog tool configuration
//!
//! Loaded from TOML; every key is optional:
//!
//! ```toml
//! root = "/mnt/image"
//! directories = ["/usr/local/lib/systemd/catalog/", "/usr/lib/systemd/catalog/"]
//! database = "/var/lib/systemd/catalog/database"
//! staging_dir = "/var/lib/systemd/catalog"
//! ```

use crate::error::{CatalogError, Result};
use crate::sources::prefix_root;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Source directories, highest priority first
pub const DEFAULT_DIRECTORIES: &[&str] = &[
    "/usr/local/lib/systemd/catalog/",
    "/usr/lib/systemd/catalog/",
];

pub const DEFAULT_DATABASE: &str = "/var/lib/systemd/catalog/database";

fn default_directories() -> Vec<PathBuf> {
    DEFAULT_DIRECTORIES.iter().map(PathBuf::from).collect()
}

fn default_database() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Alternate root that directories and the database live under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Catalog source directories, highest priority first
    #[serde(default = "default_directories")]
    pub directories: Vec<PathBuf>,

    /// Database location, before root prefixing
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Temporary file directory; must share a file system with the database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            root: None,
            directories: default_directories(),
            database: default_database(),
            staging_dir: None,
        }
    }
}

impl CatalogConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CatalogError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Database path with the root applied
    pub fn database_path(&self) -> PathBuf {
        prefix_root(self.root.as_deref(), &self.database)
    }

    /// Staging directory with the root applied
    pub fn staging_path(&self) -> Option<PathBuf> {
        self.staging_dir
            .as_deref()
            .map(|dir| prefix_root(self.root.as_deref(), dir))
    }
}
