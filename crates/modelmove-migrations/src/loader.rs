//! Migration loader for discovering migrations from the filesystem.
//!
//! The [`MigrationLoader`] scans `{migrations_dir}/{app_label}/*.json`,
//! parses every file into a [`SerializableMigration`], and builds a validated
//! [`MigrationGraph`]. It can also replay all operations in topological order
//! to reconstruct the [`ProjectState`] the migration history describes, which
//! is the "from" side of every diff.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use modelmove_core::{ModelMoveError, ModelMoveResult};

use crate::autodetect::ProjectState;
use crate::migration::MigrationGraph;
use crate::serializer::SerializableMigration;

/// Discovers and loads migrations from the filesystem.
///
/// The loader expects a directory structure like:
/// ```text
/// migrations_dir/
///   app_label/
///     0001_initial.json
///     0002_add_field.json
/// ```
pub struct MigrationLoader {
    /// The base directory containing app migration directories.
    migrations_dir: PathBuf,
    /// Discovered migrations keyed by `(app_label, name)`.
    migrations: BTreeMap<(String, String), SerializableMigration>,
}

impl MigrationLoader {
    /// Creates a new loader for the given migrations directory.
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
            migrations: BTreeMap::new(),
        }
    }

    /// Scans the filesystem for migration files and builds a graph.
    pub fn load(&mut self) -> ModelMoveResult<MigrationGraph> {
        self.discover()?;
        Self::graph_from(self.migrations.values())
    }

    /// Discovers migration files from the directory structure.
    fn discover(&mut self) -> ModelMoveResult<()> {
        self.migrations.clear();

        let dir = &self.migrations_dir;
        if !dir.exists() {
            return Ok(());
        }

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let app_label = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string();
            if !app_label.is_empty() {
                self.discover_app(&app_label, &path)?;
            }
        }

        Ok(())
    }

    /// Discovers migration files for a single app.
    fn discover_app(&mut self, app_label: &str, app_dir: &Path) -> ModelMoveResult<()> {
        for entry in std::fs::read_dir(app_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let name = path
                .file_stem()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string();
            if name.is_empty() {
                continue;
            }
            let mut migration = SerializableMigration::read_from_file(&path)?;
            // The directory and filename are authoritative for identity.
            migration.app_label = app_label.to_string();
            migration.name.clone_from(&name);
            self.migrations
                .insert((app_label.to_string(), name), migration);
        }

        Ok(())
    }

    /// Returns the discovered migrations.
    pub fn migrations(&self) -> &BTreeMap<(String, String), SerializableMigration> {
        &self.migrations
    }

    /// Returns the migrations directory.
    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Replays every discovered migration's operations in topological order,
    /// producing the project state the history describes.
    pub fn project_state(&self) -> ModelMoveResult<ProjectState> {
        let migrations: Vec<&SerializableMigration> = self.migrations.values().collect();
        let graph = Self::graph_from(migrations.iter().copied())?;
        Self::state_from(&migrations, &graph)
    }

    /// Builds a validated graph from a set of migrations.
    pub fn graph_from<'a>(
        migrations: impl IntoIterator<Item = &'a SerializableMigration> + Clone,
    ) -> ModelMoveResult<MigrationGraph> {
        let mut graph = MigrationGraph::new();

        for m in migrations.clone() {
            graph.add_node(&m.app_label, &m.name, m.initial);
        }
        for m in migrations {
            for dep in &m.dependencies {
                graph
                    .add_dependency(m.key(), dep.clone())
                    .map_err(|e| match e {
                        ModelMoveError::DatabaseError(msg) => ModelMoveError::DatabaseError(
                            format!("Broken migration history: {msg}"),
                        ),
                        other => other,
                    })?;
            }
        }

        graph.validate()?;
        Ok(graph)
    }

    /// Replays the given migrations' state effects in topological order.
    pub fn state_from(
        migrations: &[&SerializableMigration],
        graph: &MigrationGraph,
    ) -> ModelMoveResult<ProjectState> {
        let by_key: BTreeMap<(String, String), &SerializableMigration> =
            migrations.iter().map(|m| (m.key(), *m)).collect();

        let mut state = ProjectState::new();
        for key in graph.topological_order()? {
            if let Some(migration) = by_key.get(&key) {
                for op in migration.to_operations() {
                    op.state_forwards(&migration.app_label, &mut state);
                }
            }
        }
        Ok(state)
    }
}
