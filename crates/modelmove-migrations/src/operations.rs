//! Migration operations that describe schema changes.
//!
//! Each operation knows how to apply itself to the in-memory project state
//! and how to produce forward/backward DDL. The [`SeparateStateAndSchema`]
//! wrapper is what makes a cross-app model move possible at all: it lets one
//! migration change the state bookkeeping (which app a model's metadata
//! belongs to) independently of the SQL that actually executes, because at
//! the database level the move is just a table rename, never a drop and
//! recreate.

use modelmove_core::{ModelMoveError, ModelMoveResult};
use modelmove_db::fields::FieldDef;

use crate::autodetect::{ModelOptions, ModelState, ProjectState};
use crate::schema_editor::SchemaEditor;
use crate::serializer::SerializableOperation;

/// A single migration operation that can be applied forwards or backwards.
pub trait Operation: Send + Sync {
    /// Returns a human-readable description of this operation.
    fn describe(&self) -> String;

    /// Applies this operation to the in-memory project state (forward direction).
    fn state_forwards(&self, app_label: &str, state: &mut ProjectState);

    /// Generates the DDL SQL to apply this operation (forward direction).
    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        from_state: &ProjectState,
        to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>>;

    /// Generates the DDL SQL to reverse this operation (backward direction).
    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        from_state: &ProjectState,
        to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>>;

    /// Returns whether this operation is reversible.
    fn reversible(&self) -> bool;

    /// Converts this operation to its serializable form.
    fn to_serializable(&self) -> SerializableOperation;
}

/// Resolves the physical table name for a model in a given state, falling
/// back to the `{app}_{model}` convention when the state has no entry.
fn resolved_table(state: &ProjectState, app_label: &str, model_name: &str) -> String {
    state
        .models
        .get(&(app_label.to_string(), model_name.to_string()))
        .map_or_else(
            || format!("{app_label}_{model_name}"),
            ModelState::db_table,
        )
}

/// Creates a new database table.
#[derive(Debug, Clone)]
pub struct CreateModel {
    /// The model name.
    pub name: String,
    /// The fields for the new table.
    pub fields: Vec<FieldDef>,
    /// Model-level options.
    pub options: ModelOptions,
}

impl Operation for CreateModel {
    fn describe(&self) -> String {
        format!("Create model {}", self.name)
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        state.add_model(ModelState {
            app_label: app_label.to_string(),
            name: self.name.clone(),
            fields: self.fields.clone(),
            options: self.options.clone(),
        });
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        _from_state: &ProjectState,
        to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        let key = (app_label.to_string(), self.name.clone());
        let model = to_state.models.get(&key).ok_or_else(|| {
            ModelMoveError::DatabaseError(format!("Model {} not found in state", self.name))
        })?;
        Ok(schema_editor.create_table(model))
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        _from_state: &ProjectState,
        to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        Ok(schema_editor.drop_table(&resolved_table(to_state, app_label, &self.name)))
    }

    fn reversible(&self) -> bool {
        true
    }

    fn to_serializable(&self) -> SerializableOperation {
        SerializableOperation::CreateModel {
            name: self.name.clone(),
            fields: self.fields.clone(),
            options: self.options.clone(),
        }
    }
}

/// Drops a database table.
#[derive(Debug, Clone)]
pub struct DeleteModel {
    /// The model name to delete.
    pub name: String,
}

impl Operation for DeleteModel {
    fn describe(&self) -> String {
        format!("Delete model {}", self.name)
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        state.remove_model(app_label, &self.name);
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        Ok(schema_editor.drop_table(&resolved_table(from_state, app_label, &self.name)))
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        let key = (app_label.to_string(), self.name.clone());
        let model = from_state.models.get(&key).ok_or_else(|| {
            ModelMoveError::DatabaseError(format!(
                "Model {} not found in from_state",
                self.name
            ))
        })?;
        Ok(schema_editor.create_table(model))
    }

    fn reversible(&self) -> bool {
        true
    }

    fn to_serializable(&self) -> SerializableOperation {
        SerializableOperation::DeleteModel {
            name: self.name.clone(),
        }
    }
}

/// Adds a column to an existing table.
#[derive(Debug, Clone)]
pub struct AddField {
    /// The model name the field is being added to.
    pub model_name: String,
    /// The field to add.
    pub field: FieldDef,
}

impl Operation for AddField {
    fn describe(&self) -> String {
        format!("Add field {} to {}", self.field.name, self.model_name)
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        let key = (app_label.to_string(), self.model_name.clone());
        if let Some(model) = state.models.get_mut(&key) {
            model.fields.push(self.field.clone());
        }
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        let table = resolved_table(from_state, app_label, &self.model_name);
        Ok(schema_editor.add_column(&table, &self.field))
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        let table = resolved_table(from_state, app_label, &self.model_name);
        Ok(schema_editor.drop_column(&table, &self.field.column))
    }

    fn reversible(&self) -> bool {
        true
    }

    fn to_serializable(&self) -> SerializableOperation {
        SerializableOperation::AddField {
            model_name: self.model_name.clone(),
            field: self.field.clone(),
        }
    }
}

/// Removes a column from an existing table.
#[derive(Debug, Clone)]
pub struct RemoveField {
    /// The model name the field is being removed from.
    pub model_name: String,
    /// The name of the field to remove.
    pub field_name: String,
}

impl Operation for RemoveField {
    fn describe(&self) -> String {
        format!("Remove field {} from {}", self.field_name, self.model_name)
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        let key = (app_label.to_string(), self.model_name.clone());
        if let Some(model) = state.models.get_mut(&key) {
            model.fields.retain(|f| f.name != self.field_name);
        }
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        let table = resolved_table(from_state, app_label, &self.model_name);
        Ok(schema_editor.drop_column(&table, &self.field_name))
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        let key = (app_label.to_string(), self.model_name.clone());
        let model = from_state
            .models
            .get(&key)
            .ok_or_else(|| ModelMoveError::DatabaseError("Model not found".into()))?;
        let field = model
            .fields
            .iter()
            .find(|f| f.name == self.field_name)
            .ok_or_else(|| ModelMoveError::DatabaseError("Field not found".into()))?;
        let table = resolved_table(from_state, app_label, &self.model_name);
        Ok(schema_editor.add_column(&table, field))
    }

    fn reversible(&self) -> bool {
        true
    }

    fn to_serializable(&self) -> SerializableOperation {
        SerializableOperation::RemoveField {
            model_name: self.model_name.clone(),
            field_name: self.field_name.clone(),
        }
    }
}

/// Alters a column on an existing table.
#[derive(Debug, Clone)]
pub struct AlterField {
    /// The model name containing the field.
    pub model_name: String,
    /// The name of the field being altered.
    pub field_name: String,
    /// The new field definition.
    pub field: FieldDef,
}

impl AlterField {
    fn old_field<'a>(
        &self,
        app_label: &str,
        state: &'a ProjectState,
    ) -> ModelMoveResult<&'a FieldDef> {
        let key = (app_label.to_string(), self.model_name.clone());
        let model = state
            .models
            .get(&key)
            .ok_or_else(|| ModelMoveError::DatabaseError("Model not found".into()))?;
        model
            .fields
            .iter()
            .find(|f| f.name == self.field_name)
            .ok_or_else(|| ModelMoveError::DatabaseError("Old field not found".into()))
    }
}

impl Operation for AlterField {
    fn describe(&self) -> String {
        format!("Alter field {} on {}", self.field_name, self.model_name)
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        let key = (app_label.to_string(), self.model_name.clone());
        if let Some(model) = state.models.get_mut(&key) {
            if let Some(f) = model.fields.iter_mut().find(|f| f.name == self.field_name) {
                *f = self.field.clone();
            }
        }
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        let table = resolved_table(from_state, app_label, &self.model_name);
        let old = self.old_field(app_label, from_state)?;
        Ok(schema_editor.alter_column(&table, old, &self.field))
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        let table = resolved_table(from_state, app_label, &self.model_name);
        let old = self.old_field(app_label, from_state)?;
        Ok(schema_editor.alter_column(&table, &self.field, old))
    }

    fn reversible(&self) -> bool {
        true
    }

    fn to_serializable(&self) -> SerializableOperation {
        SerializableOperation::AlterField {
            model_name: self.model_name.clone(),
            field_name: self.field_name.clone(),
            field: self.field.clone(),
        }
    }
}

/// Renames the physical table backing a model.
///
/// The state effect records the explicit `db_table`; the database effect is
/// a single `ALTER TABLE ... RENAME` that carries all row data along.
#[derive(Debug, Clone)]
pub struct AlterModelTable {
    /// The model whose table is renamed.
    pub name: String,
    /// The new table name.
    pub table: String,
}

impl Operation for AlterModelTable {
    fn describe(&self) -> String {
        format!("Rename table for {} to {}", self.name, self.table)
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        let key = (app_label.to_string(), self.name.clone());
        if let Some(model) = state.models.get_mut(&key) {
            model.options.db_table = Some(self.table.clone());
        }
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        let old_table = resolved_table(from_state, app_label, &self.name);
        if old_table == self.table {
            return Ok(vec![]);
        }
        Ok(schema_editor.rename_table(&old_table, &self.table))
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        let old_table = resolved_table(from_state, app_label, &self.name);
        if old_table == self.table {
            return Ok(vec![]);
        }
        Ok(schema_editor.rename_table(&self.table, &old_table))
    }

    fn reversible(&self) -> bool {
        true
    }

    fn to_serializable(&self) -> SerializableOperation {
        SerializableOperation::AlterModelTable {
            name: self.name.clone(),
            table: self.table.clone(),
        }
    }
}

/// Applies state bookkeeping and database DDL independently.
///
/// State operations touch only the in-memory project state; database
/// operations produce only SQL. A state-only wrapper registers or removes a
/// model's metadata without any DDL; a database-only wrapper changes the
/// schema while the recorded state stays put.
pub struct SeparateStateAndSchema {
    /// Operations applied to the project state only.
    pub state_operations: Vec<Box<dyn Operation>>,
    /// Operations applied to the database only.
    pub database_operations: Vec<Box<dyn Operation>>,
}

impl SeparateStateAndSchema {
    /// Creates a state-only wrapper (no DDL executes).
    pub fn state_only(operations: Vec<Box<dyn Operation>>) -> Self {
        Self {
            state_operations: operations,
            database_operations: vec![],
        }
    }

    /// Creates a database-only wrapper (state bookkeeping untouched).
    pub fn database_only(operations: Vec<Box<dyn Operation>>) -> Self {
        Self {
            state_operations: vec![],
            database_operations: operations,
        }
    }
}

impl Operation for SeparateStateAndSchema {
    fn describe(&self) -> String {
        "Custom state/schema change".to_string()
    }

    fn state_forwards(&self, app_label: &str, state: &mut ProjectState) {
        for op in &self.state_operations {
            op.state_forwards(app_label, state);
        }
    }

    fn database_forwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        from_state: &ProjectState,
        to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        let mut sqls = Vec::new();
        for op in &self.database_operations {
            sqls.extend(op.database_forwards(app_label, schema_editor, from_state, to_state)?);
        }
        Ok(sqls)
    }

    fn database_backwards(
        &self,
        app_label: &str,
        schema_editor: &dyn SchemaEditor,
        from_state: &ProjectState,
        to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        let mut sqls = Vec::new();
        for op in self.database_operations.iter().rev() {
            sqls.extend(op.database_backwards(
                app_label,
                schema_editor,
                from_state,
                to_state,
            )?);
        }
        Ok(sqls)
    }

    fn reversible(&self) -> bool {
        self.database_operations.iter().all(|op| op.reversible())
    }

    fn to_serializable(&self) -> SerializableOperation {
        SerializableOperation::SeparateStateAndSchema {
            state_operations: self
                .state_operations
                .iter()
                .map(|op| op.to_serializable())
                .collect(),
            database_operations: self
                .database_operations
                .iter()
                .map(|op| op.to_serializable())
                .collect(),
        }
    }
}

/// Runs raw SQL in a migration.
#[derive(Debug, Clone)]
pub struct RunSql {
    /// SQL to run in the forward direction.
    pub sql_forwards: String,
    /// SQL to run in the backward direction (empty string = irreversible).
    pub sql_backwards: String,
}

impl Operation for RunSql {
    fn describe(&self) -> String {
        "Run SQL".to_string()
    }

    fn state_forwards(&self, _app_label: &str, _state: &mut ProjectState) {
        // Raw SQL does not change the project state.
    }

    fn database_forwards(
        &self,
        _app_label: &str,
        _schema_editor: &dyn SchemaEditor,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        Ok(vec![self.sql_forwards.clone()])
    }

    fn database_backwards(
        &self,
        _app_label: &str,
        _schema_editor: &dyn SchemaEditor,
        _from_state: &ProjectState,
        _to_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        if self.sql_backwards.is_empty() {
            Err(ModelMoveError::DatabaseError(
                "RunSql operation is not reversible (no backwards SQL provided)".into(),
            ))
        } else {
            Ok(vec![self.sql_backwards.clone()])
        }
    }

    fn reversible(&self) -> bool {
        !self.sql_backwards.is_empty()
    }

    fn to_serializable(&self) -> SerializableOperation {
        SerializableOperation::RunSql {
            sql_forwards: self.sql_forwards.clone(),
            sql_backwards: self.sql_backwards.clone(),
        }
    }
}
