//! The four-phase model relocation sequencer.
//!
//! Moving a model between apps cannot be expressed as a single diff: a
//! full-state comparison sees "delete from source + create in target", which
//! would drop the table and destroy its data. [`ModelMover`] instead drives
//! change detection through four strictly ordered phases, each producing one
//! migration file per affected app with explicit cross-app dependency edges:
//!
//! 1. Rename the physical table, database-only: the state still records the
//!    model under the source app.
//! 2. Register the model's state under the target app, state-only: the
//!    table already exists.
//! 3. Re-point every relational field elsewhere in the project at the new
//!    app-qualified reference.
//! 4. Remove the model's state from the source app, state-only: the table
//!    was renamed away in phase 1, so there is nothing to drop.
//!
//! Each phase reloads the migration graph fresh so the previous phase's
//! artifact is visible, and hands its generated migration identity to the
//! next phase as a typed [`PhaseResult`].

use std::path::PathBuf;

use modelmove_core::{AppRegistry, ModelMoveError, ModelMoveResult};

use crate::autodetect::{detect_changes, DiffRequest, DiffScope, ProjectState};
use crate::loader::MigrationLoader;
use crate::operations::{AlterModelTable, Operation, SeparateStateAndSchema};
use crate::serializer::{
    generate_migration_name, migration_file_path, migration_number, SerializableMigration,
    SerializableOperation,
};

/// The identity of a migration generated by one phase, consumed by the next
/// phase's dependency list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseResult {
    /// The app the migration belongs to.
    pub app_label: String,
    /// The generated migration name.
    pub migration_id: String,
}

impl PhaseResult {
    /// Returns the `(app_label, name)` graph key.
    pub fn key(&self) -> (String, String) {
        (self.app_label.clone(), self.migration_id.clone())
    }
}

/// One migration artifact produced by the mover.
#[derive(Debug, Clone)]
pub struct WrittenMigration {
    /// The migration's identity.
    pub result: PhaseResult,
    /// Human-readable descriptions of the contained operations.
    pub operations: Vec<String>,
    /// The declared dependency edges.
    pub dependencies: Vec<(String, String)>,
    /// Where the file was written; `None` under dry-run.
    pub path: Option<PathBuf>,
}

/// Everything the move produced, phase by phase.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    /// Phase 1: the database-only table rename in the source app.
    pub rename_table: WrittenMigration,
    /// Phase 2: the state-only model registration in the target app.
    pub register_target: WrittenMigration,
    /// Phase 3: one migration per app with re-pointed relations.
    pub repoint_relations: Vec<WrittenMigration>,
    /// Phase 4: the state-only model removal from the source app.
    pub drop_source_state: WrittenMigration,
    /// Whether this was a dry run (nothing written).
    pub dry_run: bool,
}

impl MoveOutcome {
    /// Returns every artifact in phase order.
    pub fn artifacts(&self) -> Vec<&WrittenMigration> {
        let mut all = vec![&self.rename_table, &self.register_target];
        all.extend(self.repoint_relations.iter());
        all.push(&self.drop_source_state);
        all
    }
}

/// Drives the four-phase relocation of one model between two apps.
pub struct ModelMover {
    model: String,
    base_app: String,
    target_app: String,
    migrations_dir: PathBuf,
    installed_apps: Vec<String>,
    current_state: ProjectState,
    dry_run: bool,
    /// Migrations produced this run; under dry-run they are never written,
    /// so later phases compose against this overlay instead of the disk.
    pending: Vec<SerializableMigration>,
}

impl ModelMover {
    /// Creates a mover for the given model and app pair.
    ///
    /// `current_state` is the declared code state (see
    /// [`ProjectState::from_app_dirs`]); the registry supplies the installed
    /// app labels.
    pub fn new(
        model: impl Into<String>,
        base_app: impl Into<String>,
        target_app: impl Into<String>,
        registry: &AppRegistry,
        current_state: ProjectState,
        migrations_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            model: model.into().to_lowercase(),
            base_app: base_app.into(),
            target_app: target_app.into(),
            migrations_dir: migrations_dir.into(),
            installed_apps: registry.labels().iter().map(ToString::to_string).collect(),
            current_state,
            dry_run: false,
            pending: Vec::new(),
        }
    }

    /// Enables dry-run mode: phases run and report, nothing is written.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Verifies the pure (database-independent) preconditions.
    ///
    /// Both apps must be installed, and the model must already be physically
    /// relocated in code: gone from the source app, present in the target.
    pub fn verify_input(&self) -> ModelMoveResult<()> {
        for app in [&self.base_app, &self.target_app] {
            if !self.installed_apps.iter().any(|label| label == app) {
                return Err(ModelMoveError::Precondition(format!(
                    "App '{app}' could not be found. Is it listed in installed_apps?"
                )));
            }
        }

        let moved_msg = format!(
            "You must physically move model {} from {} to {} and resolve all imports.",
            self.model, self.base_app, self.target_app
        );
        if self.current_state.has_model(&self.base_app, &self.model) {
            return Err(ModelMoveError::Precondition(moved_msg));
        }
        if !self.current_state.has_model(&self.target_app, &self.model) {
            return Err(ModelMoveError::Precondition(moved_msg));
        }
        Ok(())
    }

    /// Runs all four phases in order.
    pub fn execute(&mut self) -> ModelMoveResult<MoveOutcome> {
        self.verify_input()?;

        let rename_table = self.phase_rename_table()?;
        let register_target = self.phase_register_target(&rename_table)?;
        let repoint_relations = self.phase_repoint_relations(&rename_table, &register_target)?;
        let drop_source_state =
            self.phase_drop_source_state(&register_target, &repoint_relations)?;

        Ok(MoveOutcome {
            rename_table,
            register_target,
            repoint_relations,
            drop_source_state,
            dry_run: self.dry_run,
        })
    }

    // ── Phases ──────────────────────────────────────────────────────────

    /// Phase 1: rename the physical table; state keeps pointing at the
    /// source app.
    fn phase_rename_table(&mut self) -> ModelMoveResult<WrittenMigration> {
        let (migrations, graph, _from_state) = self.snapshot()?;

        let ops: Vec<Box<dyn Operation>> =
            vec![Box::new(SeparateStateAndSchema::database_only(vec![
                Box::new(AlterModelTable {
                    name: self.model.clone(),
                    table: format!("{}_{}", self.target_app, self.model),
                }),
            ]))];

        let dependencies = graph.leaf_nodes(&self.base_app);
        let name = Self::allocate_name(
            &migrations,
            &self.base_app,
            &format!("alter_{}_table", self.model),
        );
        let initial = !migrations.iter().any(|m| m.app_label == self.base_app);

        let migration = SerializableMigration::from_operations(
            &self.base_app,
            &name,
            dependencies,
            initial,
            &ops,
        );
        self.persist(migration)
    }

    /// Phase 2: register the model's bookkeeping state under the target app.
    fn phase_register_target(
        &mut self,
        rename_table: &WrittenMigration,
    ) -> ModelMoveResult<WrittenMigration> {
        let (migrations, graph, from_state) = self.snapshot()?;

        let request = DiffRequest::new(
            from_state,
            self.current_state.clone(),
            DiffScope::CreatedModels {
                keys: vec![(self.target_app.clone(), self.model.clone())],
            },
        );
        let mut changes = detect_changes(&request);
        let create_ops = changes.remove(&self.target_app).unwrap_or_default();
        if create_ops.len() != 1 {
            return Err(ModelMoveError::InvariantViolation(format!(
                "expected exactly one create-model operation for {}.{}, got {}",
                self.target_app,
                self.model,
                create_ops.len()
            )));
        }

        let ops: Vec<Box<dyn Operation>> =
            vec![Box::new(SeparateStateAndSchema::state_only(create_ops))];

        let mut dependencies = graph.leaf_nodes(&self.target_app);
        push_unique(&mut dependencies, rename_table.result.key());
        let name = Self::allocate_name(&migrations, &self.target_app, &self.model);
        let initial = !migrations.iter().any(|m| m.app_label == self.target_app);

        let migration = SerializableMigration::from_operations(
            &self.target_app,
            &name,
            dependencies,
            initial,
            &ops,
        );
        self.persist(migration)
    }

    /// Phase 3: re-point every relational field across the whole project.
    fn phase_repoint_relations(
        &mut self,
        rename_table: &WrittenMigration,
        register_target: &WrittenMigration,
    ) -> ModelMoveResult<Vec<WrittenMigration>> {
        let (migrations, graph, from_state) = self.snapshot()?;

        let request = DiffRequest::new(
            from_state,
            self.current_state.clone(),
            DiffScope::AlteredFieldsOnly,
        );
        let changes = detect_changes(&request);

        let mut written = Vec::new();
        for (app_label, ops) in changes {
            let mut dependencies = graph.leaf_nodes(&app_label);
            push_unique(&mut dependencies, rename_table.result.key());
            push_unique(&mut dependencies, register_target.result.key());

            let name = match alter_suffix(&ops) {
                Some(suffix) => Self::allocate_name(&migrations, &app_label, &suffix),
                None => generate_migration_name(Self::next_number(&migrations, &app_label), None),
            };
            let initial = !migrations.iter().any(|m| m.app_label == app_label);

            let migration = SerializableMigration::from_operations(
                &app_label,
                &name,
                dependencies,
                initial,
                &ops,
            );
            written.push(self.persist(migration)?);
        }

        Ok(written)
    }

    /// Phase 4: remove the model's bookkeeping state from the source app.
    fn phase_drop_source_state(
        &mut self,
        register_target: &WrittenMigration,
        repoint_relations: &[WrittenMigration],
    ) -> ModelMoveResult<WrittenMigration> {
        let (migrations, graph, from_state) = self.snapshot()?;

        let request = DiffRequest::new(
            from_state,
            self.current_state.clone(),
            DiffScope::DeletedModels {
                app_label: self.base_app.clone(),
            },
        );
        let mut changes = detect_changes(&request);
        let delete_ops = changes.remove(&self.base_app).unwrap_or_default();
        if delete_ops.len() != 1 {
            return Err(ModelMoveError::InvariantViolation(format!(
                "expected exactly one delete-model operation for {}.{} \
                 (the source app is not a clean single-model diff), got {}",
                self.base_app,
                self.model,
                delete_ops.len()
            )));
        }
        match delete_ops[0].to_serializable() {
            SerializableOperation::DeleteModel { ref name } if *name == self.model => {}
            other => {
                return Err(ModelMoveError::InvariantViolation(format!(
                    "detected an unexpected operation in the source app: {other:?}"
                )));
            }
        }

        let ops: Vec<Box<dyn Operation>> =
            vec![Box::new(SeparateStateAndSchema::state_only(delete_ops))];

        let mut dependencies = graph.leaf_nodes(&self.base_app);
        if repoint_relations.is_empty() {
            // Nothing referenced the model; depend on the registration
            // directly so the four artifacts still form one connected chain.
            push_unique(&mut dependencies, register_target.result.key());
        } else {
            for relation in repoint_relations {
                push_unique(&mut dependencies, relation.result.key());
            }
        }

        let name = Self::allocate_name(
            &migrations,
            &self.base_app,
            &format!("delete_{}", self.model),
        );

        let migration = SerializableMigration::from_operations(
            &self.base_app,
            &name,
            dependencies,
            false,
            &ops,
        );
        self.persist(migration)
    }

    // ── Plumbing ────────────────────────────────────────────────────────

    /// Reloads the migration set fresh from disk, composed with this run's
    /// dry-run overlay, and derives the graph and replayed state.
    fn snapshot(
        &self,
    ) -> ModelMoveResult<(
        Vec<SerializableMigration>,
        crate::migration::MigrationGraph,
        ProjectState,
    )> {
        let mut loader = MigrationLoader::new(&self.migrations_dir);
        loader.load()?;
        let mut migrations: Vec<SerializableMigration> =
            loader.migrations().values().cloned().collect();
        migrations.extend(self.pending.iter().cloned());

        let graph = MigrationLoader::graph_from(migrations.iter())?;
        let refs: Vec<&SerializableMigration> = migrations.iter().collect();
        let state = MigrationLoader::state_from(&refs, &graph)?;
        Ok((migrations, graph, state))
    }

    /// Writes the migration (or stores it on the overlay under dry-run) and
    /// returns its artifact record.
    fn persist(
        &mut self,
        migration: SerializableMigration,
    ) -> ModelMoveResult<WrittenMigration> {
        let operations = migration
            .to_operations()
            .iter()
            .map(|op| op.describe())
            .collect();
        let record = WrittenMigration {
            result: PhaseResult {
                app_label: migration.app_label.clone(),
                migration_id: migration.name.clone(),
            },
            operations,
            dependencies: migration.dependencies.clone(),
            path: None,
        };

        if self.dry_run {
            self.pending.push(migration);
            return Ok(record);
        }

        let path = migration_file_path(
            &self.migrations_dir,
            &migration.app_label,
            &migration.name,
        );
        migration.write_to_file(&path)?;
        tracing::info!("Wrote {}", path.display());
        Ok(WrittenMigration {
            path: Some(path),
            ..record
        })
    }

    fn next_number(migrations: &[SerializableMigration], app_label: &str) -> u32 {
        migrations
            .iter()
            .filter(|m| m.app_label == app_label)
            .filter_map(|m| migration_number(&m.name))
            .max()
            .unwrap_or(0)
            + 1
    }

    fn allocate_name(
        migrations: &[SerializableMigration],
        app_label: &str,
        suffix: &str,
    ) -> String {
        generate_migration_name(Self::next_number(migrations, app_label), Some(suffix))
    }
}

/// Appends a dependency if not already present.
fn push_unique(dependencies: &mut Vec<(String, String)>, key: (String, String)) {
    if !dependencies.contains(&key) {
        dependencies.push(key);
    }
}

/// Derives a descriptive name suffix when a phase-3 migration holds exactly
/// one field alteration.
fn alter_suffix(ops: &[Box<dyn Operation>]) -> Option<String> {
    if ops.len() != 1 {
        return None;
    }
    match ops[0].to_serializable() {
        SerializableOperation::AlterField {
            model_name,
            field_name,
            ..
        } => Some(format!("alter_{model_name}_{field_name}")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodetect::ModelState;
    use modelmove_core::AppConfig;
    use modelmove_db::fields::{FieldDef, FieldType, OnDelete};
    use std::path::Path;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir() -> PathBuf {
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "modelmove_test_mover_{}_{}",
            std::process::id(),
            id
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = std::fs::remove_dir_all(dir);
    }

    fn registry() -> AppRegistry {
        let mut registry = AppRegistry::new();
        for app in ["base_app", "target_app", "foreign_app"] {
            registry.register(AppConfig::new(app, format!("/project/apps/{app}")));
        }
        registry
    }

    fn testmodel_fields() -> Vec<FieldDef> {
        vec![
            FieldDef::new("id", FieldType::BigAutoField).primary_key(),
            FieldDef::new("name", FieldType::CharField).max_length(100),
        ]
    }

    fn fk_field(to: &str) -> FieldDef {
        FieldDef::new(
            "test_fk",
            FieldType::ForeignKey {
                to: to.into(),
                on_delete: OnDelete::Cascade,
                related_name: None,
            },
        )
        .column("test_fk_id")
    }

    /// Writes the on-disk history: testmodel lives in base_app, foreign_app
    /// references it.
    fn write_history(migrations_dir: &Path) {
        let m1 = SerializableMigration {
            app_label: "base_app".into(),
            name: "0001_initial".into(),
            dependencies: vec![],
            initial: true,
            operations: vec![SerializableOperation::CreateModel {
                name: "testmodel".into(),
                fields: testmodel_fields(),
                options: crate::autodetect::ModelOptions::default(),
            }],
        };
        let m2 = SerializableMigration {
            app_label: "foreign_app".into(),
            name: "0001_initial".into(),
            dependencies: vec![("base_app".into(), "0001_initial".into())],
            initial: true,
            operations: vec![SerializableOperation::CreateModel {
                name: "testfkmodel".into(),
                fields: vec![
                    FieldDef::new("id", FieldType::BigAutoField).primary_key(),
                    fk_field("base_app.testmodel"),
                ],
                options: crate::autodetect::ModelOptions::default(),
            }],
        };
        for m in [&m1, &m2] {
            m.write_to_file(&migration_file_path(migrations_dir, &m.app_label, &m.name))
                .unwrap();
        }
    }

    /// The code state after the physical move.
    fn moved_state() -> ProjectState {
        let mut state = ProjectState::new();
        state.add_model(ModelState::new(
            "target_app",
            "testmodel",
            testmodel_fields(),
        ));
        state.add_model(ModelState::new(
            "foreign_app",
            "testfkmodel",
            vec![
                FieldDef::new("id", FieldType::BigAutoField).primary_key(),
                fk_field("target_app.testmodel"),
            ],
        ));
        state
    }

    #[test]
    fn test_move_produces_four_connected_artifacts() {
        let dir = create_temp_dir();
        write_history(&dir);

        let mut mover = ModelMover::new(
            "TestModel",
            "base_app",
            "target_app",
            &registry(),
            moved_state(),
            &dir,
        );
        let outcome = mover.execute().unwrap();

        assert_eq!(outcome.artifacts().len(), 4);

        // Phase 1: database-only rename in the source app.
        assert_eq!(outcome.rename_table.result.app_label, "base_app");
        assert_eq!(
            outcome.rename_table.result.migration_id,
            "0002_alter_testmodel_table"
        );
        assert_eq!(
            outcome.rename_table.dependencies,
            vec![("base_app".to_string(), "0001_initial".to_string())]
        );

        // Phase 2 depends on phase 1.
        assert_eq!(outcome.register_target.result.app_label, "target_app");
        assert!(outcome
            .register_target
            .dependencies
            .contains(&outcome.rename_table.result.key()));

        // Phase 3: exactly one AlterField in foreign_app, depending on both.
        assert_eq!(outcome.repoint_relations.len(), 1);
        let relation = &outcome.repoint_relations[0];
        assert_eq!(relation.result.app_label, "foreign_app");
        assert_eq!(
            relation.result.migration_id,
            "0002_alter_testfkmodel_test_fk"
        );
        assert_eq!(relation.operations.len(), 1);
        assert!(relation.operations[0].contains("Alter field test_fk"));
        assert!(relation
            .dependencies
            .contains(&outcome.rename_table.result.key()));
        assert!(relation
            .dependencies
            .contains(&outcome.register_target.result.key()));

        // Phase 4 depends on every phase-3 node.
        assert_eq!(
            outcome.drop_source_state.result.migration_id,
            "0003_delete_testmodel"
        );
        assert!(outcome
            .drop_source_state
            .dependencies
            .contains(&relation.result.key()));

        // Every artifact landed on disk and parses back.
        for artifact in outcome.artifacts() {
            let path = artifact.path.as_ref().unwrap();
            let loaded = SerializableMigration::read_from_file(path).unwrap();
            assert_eq!(loaded.name, artifact.result.migration_id);
        }

        cleanup(&dir);
    }

    #[test]
    fn test_replayed_state_after_move_has_model_in_target_only() {
        let dir = create_temp_dir();
        write_history(&dir);

        let mut mover = ModelMover::new(
            "testmodel",
            "base_app",
            "target_app",
            &registry(),
            moved_state(),
            &dir,
        );
        mover.execute().unwrap();

        let mut loader = MigrationLoader::new(&dir);
        loader.load().unwrap();
        let state = loader.project_state().unwrap();

        assert!(!state.has_model("base_app", "testmodel"));
        assert!(state.has_model("target_app", "testmodel"));

        // The repointed FK resolves to the target app.
        let fk_model = state
            .models
            .get(&("foreign_app".into(), "testfkmodel".into()))
            .unwrap();
        let fk = fk_model.fields.iter().find(|f| f.name == "test_fk").unwrap();
        assert_eq!(
            fk.field_type.relation_target(),
            Some("target_app.testmodel")
        );

        cleanup(&dir);
    }

    #[test]
    fn test_dry_run_writes_nothing_but_reports_all_phases() {
        let dir = create_temp_dir();
        write_history(&dir);

        let mut mover = ModelMover::new(
            "testmodel",
            "base_app",
            "target_app",
            &registry(),
            moved_state(),
            &dir,
        )
        .dry_run(true);
        let outcome = mover.execute().unwrap();

        assert!(outcome.dry_run);
        assert_eq!(outcome.artifacts().len(), 4);
        assert!(outcome.artifacts().iter().all(|a| a.path.is_none()));

        // Nothing new on disk: still just the two initial migrations.
        let mut loader = MigrationLoader::new(&dir);
        let graph = loader.load().unwrap();
        assert_eq!(graph.len(), 2);

        cleanup(&dir);
    }

    #[test]
    fn test_model_not_moved_is_precondition_failure() {
        let dir = create_temp_dir();
        write_history(&dir);

        // Code state still has the model under base_app.
        let mut state = moved_state();
        state.add_model(ModelState::new("base_app", "testmodel", testmodel_fields()));

        let mut mover = ModelMover::new(
            "testmodel",
            "base_app",
            "target_app",
            &registry(),
            state,
            &dir,
        );
        let err = mover.execute().unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("physically move"));

        // Fail-fast: no files written.
        let mut loader = MigrationLoader::new(&dir);
        assert_eq!(loader.load().unwrap().len(), 2);

        cleanup(&dir);
    }

    #[test]
    fn test_unknown_app_is_precondition_failure() {
        let dir = create_temp_dir();
        write_history(&dir);

        let mut mover = ModelMover::new(
            "testmodel",
            "base_app",
            "nonexistent_app",
            &registry(),
            moved_state(),
            &dir,
        );
        let err = mover.execute().unwrap_err();
        assert!(err.is_precondition());
        assert!(err.to_string().contains("nonexistent_app"));

        cleanup(&dir);
    }

    #[test]
    fn test_already_registered_target_is_invariant_violation() {
        let dir = create_temp_dir();
        write_history(&dir);

        // Disk history already records the model under target_app: phase 2's
        // seeded detection yields zero operations.
        let m = SerializableMigration {
            app_label: "target_app".into(),
            name: "0001_initial".into(),
            dependencies: vec![],
            initial: true,
            operations: vec![SerializableOperation::CreateModel {
                name: "testmodel".into(),
                fields: testmodel_fields(),
                options: crate::autodetect::ModelOptions::default(),
            }],
        };
        m.write_to_file(&migration_file_path(&dir, "target_app", "0001_initial"))
            .unwrap();

        let mut mover = ModelMover::new(
            "testmodel",
            "base_app",
            "target_app",
            &registry(),
            moved_state(),
            &dir,
        );
        let err = mover.execute().unwrap_err();
        assert!(matches!(err, ModelMoveError::InvariantViolation(_)));

        cleanup(&dir);
    }

    #[test]
    fn test_move_without_relations_still_forms_a_chain() {
        let dir = create_temp_dir();
        // Only base_app history, no referencing apps.
        let m = SerializableMigration {
            app_label: "base_app".into(),
            name: "0001_initial".into(),
            dependencies: vec![],
            initial: true,
            operations: vec![SerializableOperation::CreateModel {
                name: "testmodel".into(),
                fields: testmodel_fields(),
                options: crate::autodetect::ModelOptions::default(),
            }],
        };
        m.write_to_file(&migration_file_path(&dir, "base_app", "0001_initial"))
            .unwrap();

        let mut state = ProjectState::new();
        state.add_model(ModelState::new(
            "target_app",
            "testmodel",
            testmodel_fields(),
        ));

        let mut mover = ModelMover::new(
            "testmodel",
            "base_app",
            "target_app",
            &registry(),
            state,
            &dir,
        );
        let outcome = mover.execute().unwrap();

        assert!(outcome.repoint_relations.is_empty());
        // Phase 4 falls back to depending on phase 2 directly.
        assert!(outcome
            .drop_source_state
            .dependencies
            .contains(&outcome.register_target.result.key()));

        cleanup(&dir);
    }

    #[test]
    fn test_model_name_is_lowercased() {
        let dir = create_temp_dir();
        write_history(&dir);

        let mut mover = ModelMover::new(
            "TESTMODEL",
            "base_app",
            "target_app",
            &registry(),
            moved_state(),
            &dir,
        );
        let outcome = mover.execute().unwrap();
        assert_eq!(
            outcome.rename_table.result.migration_id,
            "0002_alter_testmodel_table"
        );

        cleanup(&dir);
    }
}
