//! Application registry.
//!
//! An application is a directory under the project's apps directory holding a
//! `models.json` declaration of its models. The [`AppRegistry`] resolves app
//! labels to installed applications; an app counts as installed only when it
//! is listed in the settings *and* its directory exists on disk. An app that
//! has been physically renamed away in the project tree therefore stops
//! resolving, which is exactly what the relocation preconditions test for.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{ModelMoveError, ModelMoveResult};
use crate::settings::Settings;

/// Configuration for a single installed application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// The app label (unique within the project).
    pub label: String,
    /// The app's directory on disk.
    pub path: PathBuf,
}

impl AppConfig {
    /// Creates a new app configuration.
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }

    /// Returns the path to the app's model declaration file.
    pub fn models_file(&self) -> PathBuf {
        self.path.join("models.json")
    }
}

/// The central registry of installed applications.
pub struct AppRegistry {
    apps: Vec<AppConfig>,
    app_labels: HashMap<String, usize>,
}

impl Default for AppRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AppRegistry {
    /// Creates a new, empty `AppRegistry`.
    pub fn new() -> Self {
        Self {
            apps: Vec::new(),
            app_labels: HashMap::new(),
        }
    }

    /// Registers an application.
    ///
    /// # Panics
    ///
    /// Panics if an application with the same label is already registered.
    pub fn register(&mut self, app: AppConfig) {
        assert!(
            !self.app_labels.contains_key(&app.label),
            "Application with label '{}' is already registered",
            app.label
        );
        let index = self.apps.len();
        self.app_labels.insert(app.label.clone(), index);
        self.apps.push(app);
    }

    /// Builds a registry from the settings' installed apps.
    ///
    /// Each label in `installed_apps` is looked up under `apps_dir`; labels
    /// whose directory is missing are skipped with a warning, so an app that
    /// has been physically renamed in the project tree no longer resolves.
    pub fn from_settings(settings: &Settings) -> ModelMoveResult<Self> {
        let mut registry = Self::new();
        for label in &settings.installed_apps {
            let path = settings.apps_dir.join(label);
            if path.is_dir() {
                registry.register(AppConfig::new(label, path));
            } else {
                tracing::warn!(
                    "Installed app '{label}' has no directory at {}; skipping",
                    path.display()
                );
            }
        }
        if registry.apps.is_empty() && !settings.installed_apps.is_empty() {
            return Err(ModelMoveError::ConfigurationError(format!(
                "None of the installed apps exist under '{}'",
                settings.apps_dir.display()
            )));
        }
        Ok(registry)
    }

    /// Returns the configuration for the app with the given label, if installed.
    pub fn get_app_config(&self, label: &str) -> Option<&AppConfig> {
        self.app_labels.get(label).map(|&idx| &self.apps[idx])
    }

    /// Returns `true` if the given label is installed.
    pub fn contains(&self, label: &str) -> bool {
        self.app_labels.contains_key(label)
    }

    /// Returns a slice of all installed app configurations.
    pub fn get_app_configs(&self) -> &[AppConfig] {
        &self.apps
    }

    /// Returns all installed app labels, sorted.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.app_labels.keys().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }

    /// Returns the number of installed apps.
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Returns `true` if no apps are installed.
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}
