//! Migration file serialization.
//!
//! Migration files are pretty-printed JSON; the operation list is an
//! internally tagged enum so the loader can parse any file back into the
//! exact graph that produced it. That round-trip is the durable contract
//! other tooling (and future runs) relies on.

use std::path::{Path, PathBuf};

use modelmove_core::{ModelMoveError, ModelMoveResult};
use modelmove_db::fields::FieldDef;
use serde::{Deserialize, Serialize};

use crate::autodetect::ModelOptions;
use crate::migration::Migration;
use crate::operations::{
    AddField, AlterField, AlterModelTable, CreateModel, DeleteModel, Operation, RemoveField,
    RunSql, SeparateStateAndSchema,
};

/// A serializable representation of a migration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableMigration {
    /// The app label this migration belongs to.
    pub app_label: String,
    /// The migration name (e.g. "0001_initial").
    pub name: String,
    /// Dependencies as `[app_label, name]` pairs.
    pub dependencies: Vec<(String, String)>,
    /// Whether this is the initial migration for the app.
    #[serde(default)]
    pub initial: bool,
    /// The operations to apply.
    pub operations: Vec<SerializableOperation>,
}

/// A serializable representation of a single migration operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SerializableOperation {
    /// Create a new model/table.
    CreateModel {
        /// The model name.
        name: String,
        /// The fields for the model.
        fields: Vec<FieldDef>,
        /// Model options.
        #[serde(default)]
        options: ModelOptions,
    },
    /// Delete a model/table.
    DeleteModel {
        /// The model name.
        name: String,
    },
    /// Add a field/column to an existing model.
    AddField {
        /// The model name.
        model_name: String,
        /// The field definition.
        field: FieldDef,
    },
    /// Remove a field/column from a model.
    RemoveField {
        /// The model name.
        model_name: String,
        /// The field name.
        field_name: String,
    },
    /// Alter a field/column on a model.
    AlterField {
        /// The model name.
        model_name: String,
        /// The field name.
        field_name: String,
        /// The new field definition.
        field: FieldDef,
    },
    /// Rename the physical table backing a model.
    AlterModelTable {
        /// The model name.
        name: String,
        /// The new table name.
        table: String,
    },
    /// Apply state bookkeeping and database DDL independently.
    SeparateStateAndSchema {
        /// Operations applied to the project state only.
        #[serde(default)]
        state_operations: Vec<SerializableOperation>,
        /// Operations applied to the database only.
        #[serde(default)]
        database_operations: Vec<SerializableOperation>,
    },
    /// Run raw SQL.
    RunSql {
        /// Forward SQL.
        sql_forwards: String,
        /// Backward SQL.
        sql_backwards: String,
    },
}

impl SerializableMigration {
    /// Serializes this migration to a JSON string.
    pub fn to_json(&self) -> ModelMoveResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ModelMoveError::SerializationError(format!("Failed to serialize migration: {e}"))
        })
    }

    /// Deserializes a migration from a JSON string.
    pub fn from_json(json: &str) -> ModelMoveResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            ModelMoveError::SerializationError(format!("Failed to deserialize migration: {e}"))
        })
    }

    /// Builds a serializable migration from boxed trait-object operations.
    pub fn from_operations(
        app_label: &str,
        name: &str,
        dependencies: Vec<(String, String)>,
        initial: bool,
        operations: &[Box<dyn Operation>],
    ) -> Self {
        Self {
            app_label: app_label.to_string(),
            name: name.to_string(),
            dependencies,
            initial,
            operations: operations.iter().map(|op| op.to_serializable()).collect(),
        }
    }

    /// Converts the serializable operations back to boxed trait objects.
    pub fn to_operations(&self) -> Vec<Box<dyn Operation>> {
        self.operations
            .iter()
            .map(SerializableOperation::to_operation)
            .collect()
    }

    /// Converts this file representation into a full [`Migration`].
    pub fn into_migration(self) -> Migration {
        let mut migration = Migration::new(self.app_label, self.name);
        migration.dependencies = self.dependencies;
        migration.initial = self.initial;
        migration.operations = self
            .operations
            .iter()
            .map(SerializableOperation::to_operation)
            .collect();
        migration
    }

    /// Returns the `(app_label, name)` key for this migration.
    pub fn key(&self) -> (String, String) {
        (self.app_label.clone(), self.name.clone())
    }

    /// Writes this migration to a file at the given path.
    pub fn write_to_file(&self, path: &Path) -> ModelMoveResult<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reads a migration from a file.
    pub fn read_from_file(path: &Path) -> ModelMoveResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| {
            ModelMoveError::SerializationError(format!("{}: {e}", path.display()))
        })
    }
}

impl SerializableOperation {
    /// Converts this serializable operation to a boxed `dyn Operation`.
    pub fn to_operation(&self) -> Box<dyn Operation> {
        match self {
            Self::CreateModel {
                name,
                fields,
                options,
            } => Box::new(CreateModel {
                name: name.clone(),
                fields: fields.clone(),
                options: options.clone(),
            }),
            Self::DeleteModel { name } => Box::new(DeleteModel { name: name.clone() }),
            Self::AddField { model_name, field } => Box::new(AddField {
                model_name: model_name.clone(),
                field: field.clone(),
            }),
            Self::RemoveField {
                model_name,
                field_name,
            } => Box::new(RemoveField {
                model_name: model_name.clone(),
                field_name: field_name.clone(),
            }),
            Self::AlterField {
                model_name,
                field_name,
                field,
            } => Box::new(AlterField {
                model_name: model_name.clone(),
                field_name: field_name.clone(),
                field: field.clone(),
            }),
            Self::AlterModelTable { name, table } => Box::new(AlterModelTable {
                name: name.clone(),
                table: table.clone(),
            }),
            Self::SeparateStateAndSchema {
                state_operations,
                database_operations,
            } => Box::new(SeparateStateAndSchema {
                state_operations: state_operations.iter().map(Self::to_operation).collect(),
                database_operations: database_operations
                    .iter()
                    .map(Self::to_operation)
                    .collect(),
            }),
            Self::RunSql {
                sql_forwards,
                sql_backwards,
            } => Box::new(RunSql {
                sql_forwards: sql_forwards.clone(),
                sql_backwards: sql_backwards.clone(),
            }),
        }
    }
}

/// Generates a migration filename from a number and an optional suffix.
///
/// Without a suffix, an auto name embedding the current UTC timestamp is
/// produced.
pub fn generate_migration_name(number: u32, custom_name: Option<&str>) -> String {
    if let Some(name) = custom_name {
        format!("{number:04}_{name}")
    } else {
        let now = chrono::Utc::now();
        format!("{number:04}_auto_{}", now.format("%Y%m%d_%H%M"))
    }
}

/// Parses the leading number of a migration name ("0003_delete_x" -> 3).
pub fn migration_number(name: &str) -> Option<u32> {
    name.split('_').next().and_then(|n| n.parse().ok())
}

/// Returns the path where a migration file should be written.
pub fn migration_file_path(migrations_dir: &Path, app_label: &str, name: &str) -> PathBuf {
    migrations_dir.join(app_label).join(format!("{name}.json"))
}
