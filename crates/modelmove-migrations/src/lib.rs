//! # modelmove-migrations
//!
//! The migration engine behind the modelmove commands. It mirrors the usual
//! makemigrations/migrate machinery (graph, loader, operations, schema
//! editors, executor) and adds the two pieces generic tooling lacks:
//!
//! - [`ModelMover`] relocates a model between app namespaces through a
//!   four-phase migration protocol that preserves the physical table and its
//!   data (the default single-pass diff would drop and recreate it).
//! - [`AppRenamer`] renames an app namespace outright against live data.
//!
//! ## Module Overview
//!
//! - [`migration`] - `Migration`, `MigrationGraph`
//! - [`loader`] - `MigrationLoader` for filesystem discovery and state replay
//! - [`operations`] - `Operation` trait and all concrete operations,
//!   including `SeparateStateAndSchema` and `AlterModelTable`
//! - [`autodetect`] - `ProjectState`, `DiffRequest`/`DiffScope`, and the pure
//!   `detect_changes` function
//! - [`serializer`] - migration file reading/writing
//! - [`checker`] - pre-flight consistency checks
//! - [`schema_editor`] - `SchemaEditor` trait and SQLite/PostgreSQL dialects
//! - [`executor`] - `MigrationExecutor`, `MigrationPlan`, `MigrationRecorder`
//! - [`mover`] - the four-phase `ModelMover`
//! - [`rename`] - the live `AppRenamer`

// Clippy overrides appropriate for a DDL generation / migration crate.
#![allow(clippy::too_many_lines)]
#![allow(clippy::result_large_err)]
#![allow(clippy::format_push_string)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::use_self)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod autodetect;
pub mod checker;
pub mod executor;
pub mod loader;
pub mod migration;
pub mod mover;
pub mod operations;
pub mod rename;
pub mod schema_editor;
pub mod serializer;

// Re-export key types at the crate root.
pub use autodetect::{detect_changes, DiffRequest, DiffScope, ModelState, ProjectState};
pub use checker::ConsistencyChecker;
pub use executor::{
    migrate_all, MigrationExecutor, MigrationPlan, MigrationRecorder, MigrationStep,
};
pub use loader::MigrationLoader;
pub use migration::{Migration, MigrationGraph};
pub use mover::{ModelMover, MoveOutcome, PhaseResult, WrittenMigration};
pub use operations::Operation;
pub use rename::{AppRenamer, RenameOutcome};
pub use schema_editor::{editor_for_vendor, PostgresSchemaEditor, SchemaEditor, SqliteSchemaEditor};
pub use serializer::SerializableMigration;
