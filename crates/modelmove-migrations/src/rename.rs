//! Live app renaming.
//!
//! Renaming an app touches no migration files: the history already written
//! under the old label stays valid once every row tagged with it is
//! re-tagged. [`AppRenamer`] runs three sequential steps against live data:
//!
//! 1. Re-tag content-type rows (and fix model strings ending in the old
//!    label).
//! 2. Rename every `{old}_{model}` table to `{new}_{model}` inside one
//!    transaction.
//! 3. Re-tag migration-history rows.
//!
//! The steps are independently committed; a failure partway leaves a mixed
//! state the operator must resolve manually. This is the accepted failure
//! model, not something the tool corrects.

use modelmove_core::{AppRegistry, ModelMoveError, ModelMoveResult};
use modelmove_db::backend::DatabaseBackend;
use modelmove_db::value::Value;

use crate::executor::HISTORY_TABLE;
use crate::schema_editor::{editor_for_vendor, SchemaEditor};

/// The table holding content-type registry rows.
pub const CONTENT_TYPE_TABLE: &str = "content_types";

/// What the rename touched, step by step.
#[derive(Debug, Clone, Default)]
pub struct RenameOutcome {
    /// Content-type rows re-tagged in step 1.
    pub content_type_rows: u64,
    /// `(old, new)` table names renamed in step 2.
    pub renamed_tables: Vec<(String, String)>,
    /// Migration-history rows re-tagged in step 3.
    pub history_rows: u64,
}

/// Renames an app label across live data.
pub struct AppRenamer<'a> {
    base_app: String,
    target_app: String,
    backend: &'a dyn DatabaseBackend,
    schema_editor: Box<dyn SchemaEditor>,
}

impl<'a> AppRenamer<'a> {
    /// Creates a renamer over the given backend; the schema editor is chosen
    /// from the backend's vendor.
    pub fn new(
        base_app: impl Into<String>,
        target_app: impl Into<String>,
        backend: &'a dyn DatabaseBackend,
    ) -> Self {
        let schema_editor = editor_for_vendor(backend.vendor());
        Self {
            base_app: base_app.into(),
            target_app: target_app.into(),
            backend,
            schema_editor,
        }
    }

    /// Verifies the preconditions: the target app must be installed and the
    /// source app must no longer be (physically renamed in code already).
    pub fn verify_input(&self, registry: &AppRegistry) -> ModelMoveResult<()> {
        if !registry.contains(&self.target_app) {
            return Err(ModelMoveError::Precondition(format!(
                "App '{}' could not be found. Is it listed in installed_apps?",
                self.target_app
            )));
        }
        if registry.contains(&self.base_app) {
            return Err(ModelMoveError::Precondition(format!(
                "Did you rename the '{}' app physically and resolve all \
                 imports and string occurrences?",
                self.base_app
            )));
        }
        Ok(())
    }

    /// Runs the three rename steps in order.
    pub async fn run(&self) -> ModelMoveResult<RenameOutcome> {
        let content_type_rows = self.rewrite_content_types().await?;
        tracing::info!("Re-tagged {content_type_rows} content-type row(s)");

        let renamed_tables = self.rename_tables().await?;
        tracing::info!("Renamed {} table(s)", renamed_tables.len());

        let history_rows = self.rewrite_migration_history().await?;
        tracing::info!("Re-tagged {history_rows} migration-history row(s)");

        Ok(RenameOutcome {
            content_type_rows,
            renamed_tables,
            history_rows,
        })
    }

    /// Step 1: rewrite content-type registry rows.
    ///
    /// The stored model string is rewritten only when it ends with the old
    /// label; a substring hit elsewhere is left alone.
    async fn rewrite_content_types(&self) -> ModelMoveResult<u64> {
        if !self.table_exists(CONTENT_TYPE_TABLE).await? {
            tracing::debug!("No {CONTENT_TYPE_TABLE} table; skipping step 1");
            return Ok(0);
        }

        let rows = self
            .backend
            .query(
                &format!(
                    "SELECT \"id\", \"model\" FROM \"{CONTENT_TYPE_TABLE}\" \
                     WHERE \"app_label\" = ?1"
                ),
                &[Value::String(self.base_app.clone())],
            )
            .await?;

        let mut count = 0u64;
        for row in &rows {
            let id = row.get_i64("id")?;
            let model = row.get_string("model")?;
            let new_model = model
                .strip_suffix(&self.base_app)
                .map_or_else(|| model.clone(), |stem| format!("{stem}{}", self.target_app));

            self.backend
                .execute(
                    &format!(
                        "UPDATE \"{CONTENT_TYPE_TABLE}\" \
                         SET \"app_label\" = ?1, \"model\" = ?2 WHERE \"id\" = ?3"
                    ),
                    &[
                        Value::String(self.target_app.clone()),
                        Value::String(new_model),
                        Value::Int(id),
                    ],
                )
                .await?;
            count += 1;
        }

        Ok(count)
    }

    /// Step 2: rename every table following the `{old}_{model}` convention,
    /// inside one transaction.
    async fn rename_tables(&self) -> ModelMoveResult<Vec<(String, String)>> {
        let prefix = format!("{}_", self.base_app);
        let tables = self.backend.list_tables().await?;

        let mut statements = Vec::new();
        let mut renamed = Vec::new();
        for table in tables {
            let Some(suffix) = table.strip_prefix(&prefix) else {
                continue;
            };
            let new_table = format!("{}_{suffix}", self.target_app);
            statements.extend(self.schema_editor.rename_table(&table, &new_table));
            renamed.push((table, new_table));
        }

        if !statements.is_empty() {
            self.backend.execute_in_transaction(&statements).await?;
        }
        Ok(renamed)
    }

    /// Step 3: re-tag migration-history rows.
    async fn rewrite_migration_history(&self) -> ModelMoveResult<u64> {
        if !self.table_exists(HISTORY_TABLE).await? {
            tracing::debug!("No {HISTORY_TABLE} table; skipping step 3");
            return Ok(0);
        }
        self.backend
            .execute(
                &format!("UPDATE \"{HISTORY_TABLE}\" SET \"app\" = ?1 WHERE \"app\" = ?2"),
                &[
                    Value::String(self.target_app.clone()),
                    Value::String(self.base_app.clone()),
                ],
            )
            .await
    }

    async fn table_exists(&self, name: &str) -> ModelMoveResult<bool> {
        Ok(self
            .backend
            .list_tables()
            .await?
            .iter()
            .any(|table| table == name))
    }
}
