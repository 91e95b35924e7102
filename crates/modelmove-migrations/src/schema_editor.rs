//! Schema editor implementations for DDL generation.
//!
//! The [`SchemaEditor`] trait defines operations for creating, renaming, and
//! dropping database schema objects. Each backend has its own implementation
//! generating the correct SQL dialect. Operations return `Vec<String>`
//! because some changes require multiple statements; lines starting with
//! `--` are advisory comments the executor skips.

use modelmove_db::fields::{FieldDef, FieldType, OnDelete};
use modelmove_db::value::Value;

use crate::autodetect::ModelState;

/// Generates DDL SQL for schema operations.
pub trait SchemaEditor: Send + Sync {
    /// Returns the vendor this editor targets (e.g. "sqlite", "postgresql").
    fn vendor(&self) -> &'static str;

    /// Generates `CREATE TABLE` DDL for a model.
    fn create_table(&self, model: &ModelState) -> Vec<String>;

    /// Generates `DROP TABLE` DDL.
    fn drop_table(&self, table_name: &str) -> Vec<String>;

    /// Generates `ALTER TABLE ... RENAME TO` DDL.
    ///
    /// A rename carries all row data along; it is the only DDL the move
    /// procedure ever issues against an existing table.
    fn rename_table(&self, old_name: &str, new_name: &str) -> Vec<String>;

    /// Generates `ALTER TABLE ... ADD COLUMN` DDL.
    fn add_column(&self, table_name: &str, field: &FieldDef) -> Vec<String>;

    /// Generates `ALTER TABLE ... DROP COLUMN` DDL.
    fn drop_column(&self, table_name: &str, column_name: &str) -> Vec<String>;

    /// Generates DDL to alter a column's type, nullability, or default.
    fn alter_column(
        &self,
        table_name: &str,
        old_field: &FieldDef,
        new_field: &FieldDef,
    ) -> Vec<String>;

    /// Generates the SQL fragment for a column definition (type, constraints).
    fn column_sql(&self, field: &FieldDef) -> String;
}

/// Returns a schema editor for the given backend vendor.
pub fn editor_for_vendor(vendor: &str) -> Box<dyn SchemaEditor> {
    match vendor {
        "postgresql" => Box::new(PostgresSchemaEditor),
        _ => Box::new(SqliteSchemaEditor),
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Generates the default value SQL fragment for a field.
fn default_sql(field: &FieldDef) -> String {
    match &field.default {
        Some(Value::Null) => " DEFAULT NULL".to_string(),
        Some(Value::Bool(b)) => format!(" DEFAULT {}", if *b { "TRUE" } else { "FALSE" }),
        Some(Value::Int(i)) => format!(" DEFAULT {i}"),
        Some(Value::Float(x)) => format!(" DEFAULT {x}"),
        Some(Value::String(s)) => format!(" DEFAULT '{}'", s.replace('\'', "''")),
        Some(_) | None => String::new(),
    }
}

/// Generates the ON DELETE clause for foreign key fields.
fn on_delete_sql(on_delete: OnDelete) -> &'static str {
    match on_delete {
        OnDelete::Cascade => "CASCADE",
        OnDelete::Protect => "RESTRICT",
        OnDelete::SetNull => "SET NULL",
        OnDelete::SetDefault => "SET DEFAULT",
        OnDelete::DoNothing => "NO ACTION",
    }
}

/// Converts an `"app_label.model"` reference into its conventional table name.
fn fk_target_table(to: &str) -> String {
    to.replace('.', "_")
}

/// Returns the REFERENCES clause for a relational column, if any.
fn references_sql(field: &FieldDef) -> Option<String> {
    match &field.field_type {
        FieldType::ForeignKey { to, on_delete, .. }
        | FieldType::OneToOneField { to, on_delete, .. } => Some(format!(
            " REFERENCES \"{}\" (\"id\") ON DELETE {}",
            fk_target_table(to),
            on_delete_sql(*on_delete)
        )),
        _ => None,
    }
}

/// Returns `true` when the only difference between two fields is the
/// relational target reference. The database constraint cares about the
/// table and column, both of which are unchanged here, so no DDL is needed.
fn only_relation_target_changed(old: &FieldDef, new: &FieldDef) -> bool {
    if !old.field_type.is_relation() || !new.field_type.is_relation() {
        return false;
    }
    let Some(old_to) = old.field_type.relation_target() else {
        return false;
    };
    let retargeted = match new.field_type.clone() {
        FieldType::ForeignKey {
            on_delete,
            related_name,
            ..
        } => FieldType::ForeignKey {
            to: old_to.to_string(),
            on_delete,
            related_name,
        },
        FieldType::OneToOneField {
            on_delete,
            related_name,
            ..
        } => FieldType::OneToOneField {
            to: old_to.to_string(),
            on_delete,
            related_name,
        },
        FieldType::ManyToManyField {
            through,
            related_name,
            ..
        } => FieldType::ManyToManyField {
            to: old_to.to_string(),
            through,
            related_name,
        },
        other => other,
    };
    let mut normalized = new.clone();
    normalized.field_type = retargeted;
    &normalized == old
}

/// Shared `CREATE TABLE` assembly; the type mapping comes from the editor.
fn create_table_sql(editor: &dyn SchemaEditor, model: &ModelState) -> Vec<String> {
    let table = model.db_table();
    let mut col_defs: Vec<String> = Vec::new();

    for field in &model.fields {
        // M2M relations live in their own through table, not as a column.
        if matches!(field.field_type, FieldType::ManyToManyField { .. }) {
            continue;
        }
        let mut col = format!("\"{}\" {}", field.column, editor.column_sql(field));
        if let Some(refs) = references_sql(field) {
            col.push_str(&refs);
        }
        col_defs.push(col);
    }

    let mut sqls = vec![format!(
        "CREATE TABLE \"{table}\" ({})",
        col_defs.join(", ")
    )];

    for field in &model.fields {
        if field.db_index && !field.unique && !field.primary_key {
            sqls.push(format!(
                "CREATE INDEX \"idx_{table}_{col}\" ON \"{table}\" (\"{col}\")",
                col = field.column
            ));
        }
    }

    sqls
}

// ── SQLite ───────────────────────────────────────────────────────────────

/// Schema editor for SQLite databases.
///
/// SQLite cannot alter existing columns in place; unsupported alterations
/// are emitted as `--` comment hints which the executor skips.
pub struct SqliteSchemaEditor;

impl SqliteSchemaEditor {
    fn column_type(field: &FieldDef) -> String {
        match &field.field_type {
            FieldType::AutoField | FieldType::BigAutoField => {
                if field.primary_key {
                    "INTEGER PRIMARY KEY AUTOINCREMENT".to_string()
                } else {
                    "INTEGER".to_string()
                }
            }
            FieldType::IntegerField
            | FieldType::BigIntegerField
            | FieldType::BooleanField
            | FieldType::ForeignKey { .. }
            | FieldType::OneToOneField { .. } => "INTEGER".to_string(),
            FieldType::FloatField => "REAL".to_string(),
            FieldType::DecimalField { .. } => "NUMERIC".to_string(),
            FieldType::CharField | FieldType::EmailField | FieldType::SlugField => field
                .max_length
                .map_or_else(|| "TEXT".to_string(), |n| format!("VARCHAR({n})")),
            FieldType::TextField
            | FieldType::DateField
            | FieldType::DateTimeField
            | FieldType::UuidField
            | FieldType::JsonField
            | FieldType::ManyToManyField { .. } => "TEXT".to_string(),
        }
    }
}

impl SchemaEditor for SqliteSchemaEditor {
    fn vendor(&self) -> &'static str {
        "sqlite"
    }

    fn create_table(&self, model: &ModelState) -> Vec<String> {
        create_table_sql(self, model)
    }

    fn drop_table(&self, table_name: &str) -> Vec<String> {
        vec![format!("DROP TABLE \"{table_name}\"")]
    }

    fn rename_table(&self, old_name: &str, new_name: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE \"{old_name}\" RENAME TO \"{new_name}\""
        )]
    }

    fn add_column(&self, table_name: &str, field: &FieldDef) -> Vec<String> {
        vec![format!(
            "ALTER TABLE \"{table_name}\" ADD COLUMN \"{}\" {}",
            field.column,
            self.column_sql(field)
        )]
    }

    fn drop_column(&self, table_name: &str, column_name: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE \"{table_name}\" DROP COLUMN \"{column_name}\""
        )]
    }

    fn alter_column(
        &self,
        table_name: &str,
        old_field: &FieldDef,
        new_field: &FieldDef,
    ) -> Vec<String> {
        if old_field == new_field {
            return vec![];
        }
        if only_relation_target_changed(old_field, new_field) {
            return vec![format!(
                "-- relation target of \"{}\".\"{}\" repointed; table and column unchanged, no DDL",
                table_name, new_field.column
            )];
        }
        // In-place column alteration is not supported; a full table
        // recreation would be required.
        vec![format!(
            "-- alter column \"{}\".\"{}\" requires table recreation on sqlite",
            table_name, new_field.column
        )]
    }

    fn column_sql(&self, field: &FieldDef) -> String {
        let mut sql = Self::column_type(field);
        let auto_pk = sql.contains("AUTOINCREMENT");
        if field.primary_key && !auto_pk {
            sql.push_str(" PRIMARY KEY");
        }
        if !field.primary_key {
            if !field.null {
                sql.push_str(" NOT NULL");
            }
            if field.unique {
                sql.push_str(" UNIQUE");
            }
        }
        sql.push_str(&default_sql(field));
        sql
    }
}

// ── PostgreSQL ───────────────────────────────────────────────────────────

/// Schema editor for PostgreSQL databases.
///
/// Uses PostgreSQL-specific DDL including `BIGSERIAL`, native `UUID`,
/// `JSONB`, and proper `ALTER COLUMN` support.
pub struct PostgresSchemaEditor;

impl PostgresSchemaEditor {
    fn column_type(field: &FieldDef) -> String {
        match &field.field_type {
            FieldType::AutoField => "SERIAL".to_string(),
            FieldType::BigAutoField => "BIGSERIAL".to_string(),
            FieldType::IntegerField => "INTEGER".to_string(),
            FieldType::BigIntegerField
            | FieldType::ForeignKey { .. }
            | FieldType::OneToOneField { .. } => "BIGINT".to_string(),
            FieldType::FloatField => "DOUBLE PRECISION".to_string(),
            FieldType::DecimalField {
                max_digits,
                decimal_places,
            } => format!("NUMERIC({max_digits}, {decimal_places})"),
            FieldType::BooleanField => "BOOLEAN".to_string(),
            FieldType::CharField | FieldType::EmailField | FieldType::SlugField => field
                .max_length
                .map_or_else(|| "TEXT".to_string(), |n| format!("VARCHAR({n})")),
            FieldType::TextField | FieldType::ManyToManyField { .. } => "TEXT".to_string(),
            FieldType::DateField => "DATE".to_string(),
            FieldType::DateTimeField => "TIMESTAMP WITH TIME ZONE".to_string(),
            FieldType::UuidField => "UUID".to_string(),
            FieldType::JsonField => "JSONB".to_string(),
        }
    }
}

impl SchemaEditor for PostgresSchemaEditor {
    fn vendor(&self) -> &'static str {
        "postgresql"
    }

    fn create_table(&self, model: &ModelState) -> Vec<String> {
        create_table_sql(self, model)
    }

    fn drop_table(&self, table_name: &str) -> Vec<String> {
        vec![format!("DROP TABLE \"{table_name}\" CASCADE")]
    }

    fn rename_table(&self, old_name: &str, new_name: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE \"{old_name}\" RENAME TO \"{new_name}\""
        )]
    }

    fn add_column(&self, table_name: &str, field: &FieldDef) -> Vec<String> {
        vec![format!(
            "ALTER TABLE \"{table_name}\" ADD COLUMN \"{}\" {}",
            field.column,
            self.column_sql(field)
        )]
    }

    fn drop_column(&self, table_name: &str, column_name: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE \"{table_name}\" DROP COLUMN \"{column_name}\""
        )]
    }

    fn alter_column(
        &self,
        table_name: &str,
        old_field: &FieldDef,
        new_field: &FieldDef,
    ) -> Vec<String> {
        if old_field == new_field {
            return vec![];
        }
        if only_relation_target_changed(old_field, new_field) {
            return vec![format!(
                "-- relation target of \"{}\".\"{}\" repointed; table and column unchanged, no DDL",
                table_name, new_field.column
            )];
        }

        let col = &new_field.column;
        let mut sqls = Vec::new();

        if old_field.field_type != new_field.field_type
            || old_field.max_length != new_field.max_length
        {
            sqls.push(format!(
                "ALTER TABLE \"{table_name}\" ALTER COLUMN \"{col}\" TYPE {}",
                Self::column_type(new_field)
            ));
        }
        if old_field.null != new_field.null {
            let clause = if new_field.null {
                "DROP NOT NULL"
            } else {
                "SET NOT NULL"
            };
            sqls.push(format!(
                "ALTER TABLE \"{table_name}\" ALTER COLUMN \"{col}\" {clause}"
            ));
        }
        if old_field.default != new_field.default {
            let fragment = default_sql(new_field);
            if fragment.is_empty() {
                sqls.push(format!(
                    "ALTER TABLE \"{table_name}\" ALTER COLUMN \"{col}\" DROP DEFAULT"
                ));
            } else {
                sqls.push(format!(
                    "ALTER TABLE \"{table_name}\" ALTER COLUMN \"{col}\" SET{fragment}"
                ));
            }
        }
        if old_field.unique != new_field.unique {
            if new_field.unique {
                sqls.push(format!(
                    "ALTER TABLE \"{table_name}\" ADD CONSTRAINT \"{table_name}_{col}_uniq\" UNIQUE (\"{col}\")"
                ));
            } else {
                sqls.push(format!(
                    "ALTER TABLE \"{table_name}\" DROP CONSTRAINT IF EXISTS \"{table_name}_{col}_uniq\""
                ));
            }
        }

        sqls
    }

    fn column_sql(&self, field: &FieldDef) -> String {
        let mut sql = Self::column_type(field);
        if field.primary_key {
            sql.push_str(" PRIMARY KEY");
        } else {
            if !field.null {
                sql.push_str(" NOT NULL");
            }
            if field.unique {
                sql.push_str(" UNIQUE");
            }
        }
        sql.push_str(&default_sql(field));
        sql
    }
}
