//! Change detection by comparing project states.
//!
//! A [`ProjectState`] is a snapshot of every model across all apps at a point
//! in time: either replayed from migration files (the "from" side) or loaded
//! from the apps' model declarations (the "to" side, i.e. the current code).
//!
//! Detection itself is a pure function: build an immutable [`DiffRequest`]
//! with the two states and a [`DiffScope`], and [`detect_changes`] returns
//! the operations per app. The scope is what lets the relocation protocol
//! drive detection phase by phase (seeding the created-model candidate set,
//! restricting deletions to one app, or looking at field alterations only)
//! without mutating any detector internals between calls.

use std::collections::BTreeMap;

use modelmove_core::{AppRegistry, ModelMoveError, ModelMoveResult};
use modelmove_db::fields::FieldDef;
use serde::{Deserialize, Serialize};

use crate::operations::{
    AddField, AlterField, CreateModel, DeleteModel, Operation, RemoveField,
};

/// Model-level options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOptions {
    /// The explicit database table name, if set.
    #[serde(default)]
    pub db_table: Option<String>,
}

/// The state of a single model at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    /// The application label this model belongs to.
    #[serde(default)]
    pub app_label: String,
    /// The model name (lowercase).
    pub name: String,
    /// The fields of this model.
    pub fields: Vec<FieldDef>,
    /// Model-level options.
    #[serde(default)]
    pub options: ModelOptions,
}

impl ModelState {
    /// Creates a new model state.
    pub fn new(
        app_label: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<FieldDef>,
    ) -> Self {
        Self {
            app_label: app_label.into(),
            name: name.into(),
            fields,
            options: ModelOptions::default(),
        }
    }

    /// Sets model options.
    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the database table name for this model.
    ///
    /// Defaults to `{app_label}_{name}` unless `db_table` is set.
    pub fn db_table(&self) -> String {
        self.options
            .db_table
            .clone()
            .unwrap_or_else(|| format!("{}_{}", self.app_label, self.name))
    }

    /// Returns the `(app_label, name)` key for this model.
    pub fn key(&self) -> (String, String) {
        (self.app_label.clone(), self.name.clone())
    }
}

/// A snapshot of the entire project's model state at a point in time.
#[derive(Debug, Clone, Default)]
pub struct ProjectState {
    /// All models in the project, keyed by `(app_label, model_name)`.
    pub models: BTreeMap<(String, String), ModelState>,
}

impl ProjectState {
    /// Creates a new empty project state.
    pub fn new() -> Self {
        Self {
            models: BTreeMap::new(),
        }
    }

    /// Adds a model to this project state.
    pub fn add_model(&mut self, model: ModelState) {
        self.models.insert(model.key(), model);
    }

    /// Removes a model from this project state.
    pub fn remove_model(&mut self, app_label: &str, name: &str) {
        self.models
            .remove(&(app_label.to_string(), name.to_string()));
    }

    /// Returns `true` if a model resolves under the given app.
    pub fn has_model(&self, app_label: &str, name: &str) -> bool {
        self.models
            .contains_key(&(app_label.to_string(), name.to_string()))
    }

    /// Loads the current code state from every installed app's `models.json`.
    ///
    /// Apps without a declaration file simply contribute no models. Model
    /// names are normalized to lowercase and the app label always comes from
    /// the registry, never from the file.
    pub fn from_app_dirs(registry: &AppRegistry) -> ModelMoveResult<Self> {
        let mut state = Self::new();
        for app in registry.get_app_configs() {
            let path = app.models_file();
            if !path.exists() {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            let models: Vec<ModelState> = serde_json::from_str(&content).map_err(|e| {
                ModelMoveError::SerializationError(format!(
                    "Invalid model declarations in '{}': {e}",
                    path.display()
                ))
            })?;
            for mut model in models {
                model.app_label.clone_from(&app.label);
                model.name = model.name.to_lowercase();
                state.add_model(model);
            }
        }
        Ok(state)
    }
}

/// What a diff run is allowed to detect.
#[derive(Debug, Clone)]
pub enum DiffScope {
    /// Full diff: created and deleted models plus all field changes.
    All,
    /// Only creations, for exactly the seeded `(app_label, model)` keys.
    CreatedModels {
        /// The candidate keys to treat as newly created.
        keys: Vec<(String, String)>,
    },
    /// Only deletions, restricted to one app.
    DeletedModels {
        /// The app whose vanished models should be detected.
        app_label: String,
    },
    /// Only field alterations on models present in both states.
    AlteredFieldsOnly,
}

/// An immutable description of one detection run.
#[derive(Debug, Clone)]
pub struct DiffRequest {
    /// The old project state (before changes).
    pub from_state: ProjectState,
    /// The new project state (after changes).
    pub to_state: ProjectState,
    /// What to detect.
    pub scope: DiffScope,
}

impl DiffRequest {
    /// Creates a new diff request.
    pub fn new(from_state: ProjectState, to_state: ProjectState, scope: DiffScope) -> Self {
        Self {
            from_state,
            to_state,
            scope,
        }
    }
}

/// Compares the request's two states and returns operations grouped by app
/// label, in deterministic order.
pub fn detect_changes(request: &DiffRequest) -> BTreeMap<String, Vec<Box<dyn Operation>>> {
    let mut result: BTreeMap<String, Vec<Box<dyn Operation>>> = BTreeMap::new();

    match &request.scope {
        DiffScope::All => {
            detect_created(request, None, &mut result);
            detect_deleted(request, None, &mut result);
            detect_field_changes(request, true, &mut result);
        }
        DiffScope::CreatedModels { keys } => {
            detect_created(request, Some(keys.as_slice()), &mut result);
        }
        DiffScope::DeletedModels { app_label } => {
            detect_deleted(request, Some(app_label.as_str()), &mut result);
        }
        DiffScope::AlteredFieldsOnly => {
            detect_field_changes(request, false, &mut result);
        }
    }

    result
}

/// Emits `CreateModel` for models in `to_state` missing from `from_state`.
///
/// When `seed` is given, only the seeded keys are considered candidates.
fn detect_created(
    request: &DiffRequest,
    seed: Option<&[(String, String)]>,
    result: &mut BTreeMap<String, Vec<Box<dyn Operation>>>,
) {
    let candidates: Vec<&(String, String)> = match seed {
        Some(keys) => keys.iter().collect(),
        None => request.to_state.models.keys().collect(),
    };

    for key in candidates {
        if request.from_state.models.contains_key(key) {
            continue;
        }
        if let Some(model) = request.to_state.models.get(key) {
            result
                .entry(key.0.clone())
                .or_default()
                .push(Box::new(CreateModel {
                    name: model.name.clone(),
                    fields: model.fields.clone(),
                    options: model.options.clone(),
                }));
        }
    }
}

/// Emits `DeleteModel` for models in `from_state` missing from `to_state`,
/// optionally restricted to one app.
fn detect_deleted(
    request: &DiffRequest,
    only_app: Option<&str>,
    result: &mut BTreeMap<String, Vec<Box<dyn Operation>>>,
) {
    for (key, model) in &request.from_state.models {
        if let Some(app) = only_app {
            if key.0 != app {
                continue;
            }
        }
        if !request.to_state.models.contains_key(key) {
            result
                .entry(key.0.clone())
                .or_default()
                .push(Box::new(DeleteModel {
                    name: model.name.clone(),
                }));
        }
    }
}

/// Emits field operations for models present in both states.
///
/// With `include_add_remove`, added and removed fields are detected too;
/// otherwise only alterations of fields that exist on both sides.
fn detect_field_changes(
    request: &DiffRequest,
    include_add_remove: bool,
    result: &mut BTreeMap<String, Vec<Box<dyn Operation>>>,
) {
    for (key, new_model) in &request.to_state.models {
        let Some(old_model) = request.from_state.models.get(key) else {
            continue;
        };

        let old_fields: BTreeMap<&str, &FieldDef> = old_model
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f))
            .collect();
        let new_fields: BTreeMap<&str, &FieldDef> = new_model
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f))
            .collect();

        if include_add_remove {
            for (name, field) in &new_fields {
                if !old_fields.contains_key(name) {
                    result
                        .entry(key.0.clone())
                        .or_default()
                        .push(Box::new(AddField {
                            model_name: new_model.name.clone(),
                            field: (*field).clone(),
                        }));
                }
            }
            for name in old_fields.keys() {
                if !new_fields.contains_key(name) {
                    result
                        .entry(key.0.clone())
                        .or_default()
                        .push(Box::new(RemoveField {
                            model_name: new_model.name.clone(),
                            field_name: (*name).to_string(),
                        }));
                }
            }
        }

        for (name, new_field) in &new_fields {
            if let Some(old_field) = old_fields.get(name) {
                if old_field != new_field {
                    result
                        .entry(key.0.clone())
                        .or_default()
                        .push(Box::new(AlterField {
                            model_name: new_model.name.clone(),
                            field_name: (*name).to_string(),
                            field: (*new_field).clone(),
                        }));
                }
            }
        }
    }
}
