//! Settings system for the modelmove tooling.
//!
//! Configuration is read from a TOML file (`modelmove.toml` by default).
//! Every field has a sensible default so a minimal file only needs to list
//! the installed apps.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ModelMoveError, ModelMoveResult};

/// The default database alias.
pub const DEFAULT_DB_ALIAS: &str = "default";

/// Database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// The database engine ("sqlite" is the only live backend).
    #[serde(default = "default_engine")]
    pub engine: String,
    /// The database name (file path for SQLite, or ":memory:").
    #[serde(default = "default_db_name")]
    pub name: String,
}

fn default_engine() -> String {
    "sqlite".to_string()
}

fn default_db_name() -> String {
    "db.sqlite3".to_string()
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            name: default_db_name(),
        }
    }
}

/// Project-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether debug mode is enabled (pretty logging instead of JSON).
    pub debug: bool,
    /// The tracing filter directive (e.g. "info", "modelmove=debug").
    pub log_level: String,
    /// Labels of installed applications, in order.
    pub installed_apps: Vec<String>,
    /// Directory containing one subdirectory per installed app.
    pub apps_dir: PathBuf,
    /// Directory containing per-app migration files.
    pub migrations_dir: PathBuf,
    /// Named database connections, keyed by alias.
    pub databases: HashMap<String, DatabaseSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut databases = HashMap::new();
        databases.insert(DEFAULT_DB_ALIAS.to_string(), DatabaseSettings::default());
        Self {
            debug: false,
            log_level: "info".to_string(),
            installed_apps: Vec::new(),
            apps_dir: PathBuf::from("apps"),
            migrations_dir: PathBuf::from("migrations"),
            databases,
        }
    }
}

impl Settings {
    /// Loads settings from a TOML file.
    pub fn from_file(path: &Path) -> ModelMoveResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ModelMoveError::ConfigurationError(format!(
                "Cannot read settings file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parses settings from a TOML string.
    pub fn from_toml(content: &str) -> ModelMoveResult<Self> {
        let mut settings: Self = toml::from_str(content).map_err(|e| {
            ModelMoveError::ConfigurationError(format!("Invalid settings TOML: {e}"))
        })?;
        // An explicit [databases] table replaces the default map entirely;
        // make sure "default" always resolves.
        settings
            .databases
            .entry(DEFAULT_DB_ALIAS.to_string())
            .or_default();
        Ok(settings)
    }

    /// Returns the database settings for the given alias.
    pub fn database(&self, alias: &str) -> ModelMoveResult<&DatabaseSettings> {
        self.databases.get(alias).ok_or_else(|| {
            ModelMoveError::ConfigurationError(format!(
                "The connection '{alias}' doesn't exist"
            ))
        })
    }
}
