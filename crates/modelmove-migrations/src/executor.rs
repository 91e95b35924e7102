//! Migration execution engine.
//!
//! The [`MigrationExecutor`] builds a [`MigrationPlan`] from the graph and
//! the set of applied migrations, then applies each step's SQL against a
//! [`DatabaseBackend`]. The [`MigrationRecorder`] tracks applied migrations
//! in the `schema_migrations` table.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use modelmove_core::{ModelMoveError, ModelMoveResult};
use modelmove_db::backend::DatabaseBackend;
use modelmove_db::value::Value;

use crate::autodetect::ProjectState;
use crate::loader::MigrationLoader;
use crate::migration::MigrationGraph;
use crate::operations::Operation;
use crate::schema_editor::{editor_for_vendor, SchemaEditor};
use crate::serializer::SerializableMigration;

/// The table where applied migrations are recorded.
pub const HISTORY_TABLE: &str = "schema_migrations";

/// A single step in a migration plan.
#[derive(Debug, Clone)]
pub struct MigrationStep {
    /// The migration key: `(app_label, migration_name)`.
    pub migration: (String, String),
    /// If `true`, this step reverses the migration.
    pub backwards: bool,
}

impl MigrationStep {
    /// Creates a forward migration step.
    pub fn forward(app_label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            migration: (app_label.into(), name.into()),
            backwards: false,
        }
    }

    /// Creates a backward (reverse) migration step.
    pub fn backward(app_label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            migration: (app_label.into(), name.into()),
            backwards: true,
        }
    }
}

/// An ordered list of migration steps to execute.
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    /// The ordered steps to execute.
    pub steps: Vec<MigrationStep>,
}

impl MigrationPlan {
    /// Creates a new empty migration plan.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Adds a step to the plan.
    pub fn add_step(&mut self, step: MigrationStep) {
        self.steps.push(step);
    }

    /// Returns whether the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

/// Executes migration plans using a schema editor.
pub struct MigrationExecutor {
    /// The schema editor to use for generating SQL.
    schema_editor: Box<dyn SchemaEditor>,
    /// The recorder tracking applied migrations.
    recorder: MigrationRecorder,
}

impl MigrationExecutor {
    /// Creates a new executor with the given schema editor.
    pub fn new(schema_editor: Box<dyn SchemaEditor>) -> Self {
        Self {
            schema_editor,
            recorder: MigrationRecorder::new(),
        }
    }

    /// Creates a new executor with a pre-populated recorder.
    pub fn with_recorder(
        schema_editor: Box<dyn SchemaEditor>,
        recorder: MigrationRecorder,
    ) -> Self {
        Self {
            schema_editor,
            recorder,
        }
    }

    /// Creates a plan applying every unapplied migration in dependency order.
    pub fn make_plan(&self, graph: &MigrationGraph) -> ModelMoveResult<MigrationPlan> {
        let order = graph.topological_order()?;
        let applied = self.recorder.applied();
        let mut plan = MigrationPlan::new();
        for key in order {
            if !applied.contains(&key) {
                plan.add_step(MigrationStep::forward(key.0, key.1));
            }
        }
        Ok(plan)
    }

    /// Generates the SQL for a plan without touching any database.
    ///
    /// Updates the recorder in memory as it goes, so the executor reflects
    /// the plan having run.
    pub fn execute_plan(
        &mut self,
        plan: &MigrationPlan,
        operations: &BTreeMap<(String, String), Vec<Box<dyn Operation>>>,
        initial_state: &ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        let mut all_sql = Vec::new();
        let mut state = initial_state.clone();

        for step in &plan.steps {
            let step_sql = self.step_sql(step, operations, &mut state)?;
            all_sql.extend(step_sql);
            if step.backwards {
                self.recorder.unapply(&step.migration);
            } else {
                self.recorder.apply(step.migration.clone());
            }
        }

        Ok(all_sql)
    }

    /// Executes a migration plan against a real database.
    ///
    /// For each step, generates SQL via the schema editor, executes each
    /// statement on the backend, and records the migration in the
    /// `schema_migrations` table. With `fake`, migrations are recorded
    /// without running their SQL. Execution failures surface as
    /// [`ModelMoveError::Apply`]; already-written migration files are never
    /// touched.
    pub async fn execute_against_db(
        &mut self,
        plan: &MigrationPlan,
        operations: &BTreeMap<(String, String), Vec<Box<dyn Operation>>>,
        initial_state: &ProjectState,
        backend: &dyn DatabaseBackend,
        fake: bool,
    ) -> ModelMoveResult<Vec<String>> {
        self.recorder.ensure_table(backend).await?;

        let mut all_sql = Vec::new();
        let mut state = initial_state.clone();

        for step in &plan.steps {
            let step_sql = self.step_sql(step, operations, &mut state)?;

            if !fake {
                for sql in &step_sql {
                    // Advisory comment lines carry no DDL.
                    if sql.starts_with("--") {
                        continue;
                    }
                    backend
                        .execute(sql, &[])
                        .await
                        .map_err(|e| ModelMoveError::Apply(e.to_string()))?;
                }
            }
            all_sql.extend(step_sql);

            if step.backwards {
                self.recorder.unapply(&step.migration);
                self.recorder
                    .unrecord_from_db(backend, &step.migration.0, &step.migration.1)
                    .await?;
            } else {
                self.recorder.apply(step.migration.clone());
                self.recorder
                    .record_to_db(backend, &step.migration.0, &step.migration.1)
                    .await?;
            }
            tracing::info!(
                "{} {}.{}",
                if step.backwards { "Unapplied" } else { "Applied" },
                step.migration.0,
                step.migration.1
            );
        }

        Ok(all_sql)
    }

    /// Generates the SQL for one step, advancing the in-memory state.
    fn step_sql(
        &self,
        step: &MigrationStep,
        operations: &BTreeMap<(String, String), Vec<Box<dyn Operation>>>,
        state: &mut ProjectState,
    ) -> ModelMoveResult<Vec<String>> {
        let ops = operations.get(&step.migration).ok_or_else(|| {
            ModelMoveError::DatabaseError(format!(
                "Operations for migration {:?} not found",
                step.migration
            ))
        })?;

        let from_state = state.clone();
        let mut step_sql = Vec::new();

        if step.backwards {
            for op in ops.iter().rev() {
                step_sql.extend(op.database_backwards(
                    &step.migration.0,
                    &*self.schema_editor,
                    &from_state,
                    state,
                )?);
            }
        } else {
            for op in ops {
                op.state_forwards(&step.migration.0, state);
                step_sql.extend(op.database_forwards(
                    &step.migration.0,
                    &*self.schema_editor,
                    &from_state,
                    state,
                )?);
            }
        }

        Ok(step_sql)
    }

    /// Returns a reference to the recorder.
    pub fn recorder(&self) -> &MigrationRecorder {
        &self.recorder
    }

    /// Returns a mutable reference to the recorder.
    pub fn recorder_mut(&mut self) -> &mut MigrationRecorder {
        &mut self.recorder
    }
}

/// Loads migrations from disk and applies every unapplied one.
///
/// This is the whole-project runner used by the `migrate` command and by
/// `move_model --migrate`: it reloads the graph, replays already-applied
/// migrations into the starting state, plans the remainder in dependency
/// order, and executes against the backend. Returns the applied keys.
pub async fn migrate_all(
    migrations_dir: &Path,
    backend: &dyn DatabaseBackend,
    fake: bool,
) -> ModelMoveResult<Vec<(String, String)>> {
    let mut loader = MigrationLoader::new(migrations_dir);
    let graph = loader.load()?;
    if graph.is_empty() {
        tracing::info!("No migrations found");
        return Ok(vec![]);
    }

    let mut recorder = MigrationRecorder::new();
    recorder.load_from_db(backend).await?;

    let applied_refs: Vec<&SerializableMigration> = loader
        .migrations()
        .values()
        .filter(|m| recorder.is_applied(&m.key()))
        .collect();
    let initial_state = MigrationLoader::state_from(&applied_refs, &graph)?;

    let operations: BTreeMap<(String, String), Vec<Box<dyn Operation>>> = loader
        .migrations()
        .iter()
        .map(|(key, m)| (key.clone(), m.to_operations()))
        .collect();

    let mut executor =
        MigrationExecutor::with_recorder(editor_for_vendor(backend.vendor()), recorder);
    let plan = executor.make_plan(&graph)?;
    let keys: Vec<(String, String)> = plan.steps.iter().map(|s| s.migration.clone()).collect();
    executor
        .execute_against_db(&plan, &operations, &initial_state, backend, fake)
        .await?;
    Ok(keys)
}

/// Tracks which migrations have been applied.
///
/// Operates both in-memory and against the `schema_migrations` table. The
/// in-memory set is the source of truth for plan building; the table
/// provides persistence across runs.
#[derive(Debug, Clone, Default)]
pub struct MigrationRecorder {
    applied_migrations: HashSet<(String, String)>,
}

impl MigrationRecorder {
    /// Creates a new empty recorder.
    pub fn new() -> Self {
        Self {
            applied_migrations: HashSet::new(),
        }
    }

    /// Returns the SQL creating the `schema_migrations` table.
    pub fn ensure_schema_sql() -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS \"{HISTORY_TABLE}\" (\
                \"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
                \"app\" TEXT NOT NULL, \
                \"name\" TEXT NOT NULL, \
                \"applied\" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP\
            )"
        )
    }

    /// Records a migration as applied (in-memory only).
    pub fn apply(&mut self, key: (String, String)) {
        self.applied_migrations.insert(key);
    }

    /// Records a migration as unapplied (in-memory only).
    pub fn unapply(&mut self, key: &(String, String)) {
        self.applied_migrations.remove(key);
    }

    /// Returns the set of applied migrations.
    pub fn applied(&self) -> &HashSet<(String, String)> {
        &self.applied_migrations
    }

    /// Returns whether a specific migration has been applied.
    pub fn is_applied(&self, key: &(String, String)) -> bool {
        self.applied_migrations.contains(key)
    }

    /// Ensures the `schema_migrations` table exists in the database.
    pub async fn ensure_table(&self, backend: &dyn DatabaseBackend) -> ModelMoveResult<()> {
        backend.execute(&Self::ensure_schema_sql(), &[]).await?;
        Ok(())
    }

    /// Loads applied migrations from the database into the in-memory set.
    pub async fn load_from_db(&mut self, backend: &dyn DatabaseBackend) -> ModelMoveResult<()> {
        self.ensure_table(backend).await?;

        let rows = backend
            .query(
                &format!("SELECT \"app\", \"name\" FROM \"{HISTORY_TABLE}\""),
                &[],
            )
            .await?;

        self.applied_migrations.clear();
        for row in &rows {
            let app = row.get_string("app")?;
            let name = row.get_string("name")?;
            self.applied_migrations.insert((app, name));
        }

        Ok(())
    }

    /// Records a migration as applied in the database.
    pub async fn record_to_db(
        &self,
        backend: &dyn DatabaseBackend,
        app_label: &str,
        name: &str,
    ) -> ModelMoveResult<()> {
        backend
            .execute(
                &format!(
                    "INSERT INTO \"{HISTORY_TABLE}\" (\"app\", \"name\", \"applied\") \
                     VALUES (?1, ?2, CURRENT_TIMESTAMP)"
                ),
                &[
                    Value::String(app_label.to_string()),
                    Value::String(name.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    /// Removes a migration record from the database.
    pub async fn unrecord_from_db(
        &self,
        backend: &dyn DatabaseBackend,
        app_label: &str,
        name: &str,
    ) -> ModelMoveResult<()> {
        backend
            .execute(
                &format!(
                    "DELETE FROM \"{HISTORY_TABLE}\" WHERE \"app\" = ?1 AND \"name\" = ?2"
                ),
                &[
                    Value::String(app_label.to_string()),
                    Value::String(name.to_string()),
                ],
            )
            .await?;
        Ok(())
    }
}
