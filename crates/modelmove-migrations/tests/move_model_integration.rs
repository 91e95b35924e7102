//! End-to-end relocation: generate the four migrations and apply them
//! against a live SQLite database, asserting that the moved table keeps its
//! identity and every row.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use modelmove_core::{AppConfig, AppRegistry};
use modelmove_db::backend::DatabaseBackend;
use modelmove_db::fields::{FieldDef, FieldType, OnDelete};
use modelmove_db::sqlite::SqliteBackend;
use modelmove_migrations::autodetect::{ModelState, ProjectState};
use modelmove_migrations::checker::ConsistencyChecker;
use modelmove_migrations::executor::{migrate_all, MigrationRecorder};
use modelmove_migrations::loader::MigrationLoader;
use modelmove_migrations::mover::ModelMover;
use modelmove_migrations::serializer::{migration_file_path, SerializableMigration};

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn create_temp_dir() -> PathBuf {
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "modelmove_itest_move_{}_{}",
        std::process::id(),
        id
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
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

fn write_history(migrations_dir: &Path) {
    let base = SerializableMigration {
        app_label: "base_app".into(),
        name: "0001_initial".into(),
        dependencies: vec![],
        initial: true,
        operations: vec![
            modelmove_migrations::serializer::SerializableOperation::CreateModel {
                name: "testmodel".into(),
                fields: testmodel_fields(),
                options: modelmove_migrations::autodetect::ModelOptions::default(),
            },
        ],
    };
    let foreign = SerializableMigration {
        app_label: "foreign_app".into(),
        name: "0001_initial".into(),
        dependencies: vec![("base_app".into(), "0001_initial".into())],
        initial: true,
        operations: vec![
            modelmove_migrations::serializer::SerializableOperation::CreateModel {
                name: "testfkmodel".into(),
                fields: vec![
                    FieldDef::new("id", FieldType::BigAutoField).primary_key(),
                    fk_field("base_app.testmodel"),
                ],
                options: modelmove_migrations::autodetect::ModelOptions::default(),
            },
        ],
    };
    for m in [&base, &foreign] {
        m.write_to_file(&migration_file_path(migrations_dir, &m.app_label, &m.name))
            .unwrap();
    }
}

fn registry() -> AppRegistry {
    let mut registry = AppRegistry::new();
    for app in ["base_app", "target_app", "foreign_app"] {
        registry.register(AppConfig::new(app, format!("/project/apps/{app}")));
    }
    registry
}

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

#[tokio::test]
async fn move_preserves_table_data_and_history_stays_consistent() {
    let dir = create_temp_dir();
    write_history(&dir);

    let backend = SqliteBackend::memory().unwrap();

    // Apply the initial history, then put real rows in the table.
    let applied = migrate_all(&dir, &backend, false).await.unwrap();
    assert_eq!(applied.len(), 2);
    backend
        .execute(
            "INSERT INTO \"base_app_testmodel\" (\"name\") \
             VALUES ('alpha'), ('beta'), ('gamma')",
            &[],
        )
        .await
        .unwrap();
    backend
        .execute(
            "INSERT INTO \"foreign_app_testfkmodel\" (\"test_fk_id\") VALUES (1), (2)",
            &[],
        )
        .await
        .unwrap();

    // Pre-flight checks pass on a clean, fully-applied history.
    let mut loader = MigrationLoader::new(&dir);
    let graph = loader.load().unwrap();
    let mut recorder = MigrationRecorder::new();
    recorder.load_from_db(&backend).await.unwrap();
    ConsistencyChecker::new(&graph, &recorder)
        .check_all()
        .unwrap();

    // Generate the four relocation migrations and apply them.
    let mut mover = ModelMover::new(
        "testmodel",
        "base_app",
        "target_app",
        &registry(),
        moved_state(),
        &dir,
    );
    let outcome = mover.execute().unwrap();
    assert_eq!(outcome.artifacts().len(), 4);

    let applied = migrate_all(&dir, &backend, false).await.unwrap();
    assert_eq!(applied.len(), 4);

    // The physical table was renamed, never dropped: identical rows and ids.
    let tables = backend.list_tables().await.unwrap();
    assert!(tables.contains(&"target_app_testmodel".to_string()));
    assert!(!tables.contains(&"base_app_testmodel".to_string()));

    let rows = backend
        .query(
            "SELECT \"id\", \"name\" FROM \"target_app_testmodel\" ORDER BY \"id\"",
            &[],
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get_i64("id").unwrap(), 1);
    assert_eq!(rows[2].get_i64("id").unwrap(), 3);
    assert_eq!(rows[0].get_string("name").unwrap(), "alpha");

    // The referencing rows survived untouched.
    let rows = backend
        .query("SELECT \"test_fk_id\" FROM \"foreign_app_testfkmodel\"", &[])
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    // Idempotence of detection: a re-check on the fully-applied set reports
    // zero unapplied migrations and zero conflicts.
    let mut loader = MigrationLoader::new(&dir);
    let graph = loader.load().unwrap();
    assert_eq!(graph.len(), 6);
    let mut recorder = MigrationRecorder::new();
    recorder.load_from_db(&backend).await.unwrap();
    ConsistencyChecker::new(&graph, &recorder)
        .check_all()
        .unwrap();
    assert!(migrate_all(&dir, &backend, false).await.unwrap().is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn unapplied_history_blocks_the_move() {
    let dir = create_temp_dir();
    write_history(&dir);

    let backend = SqliteBackend::memory().unwrap();

    // History exists on disk but was never applied.
    let mut loader = MigrationLoader::new(&dir);
    let graph = loader.load().unwrap();
    let mut recorder = MigrationRecorder::new();
    recorder.load_from_db(&backend).await.unwrap();

    let err = ConsistencyChecker::new(&graph, &recorder)
        .check_all()
        .unwrap_err();
    assert!(err.is_precondition());
    assert_eq!(err.exit_code(), 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn moved_files_form_a_single_connected_chain() {
    let dir = create_temp_dir();
    write_history(&dir);

    let backend = SqliteBackend::memory().unwrap();
    migrate_all(&dir, &backend, false).await.unwrap();

    let mut mover = ModelMover::new(
        "testmodel",
        "base_app",
        "target_app",
        &registry(),
        moved_state(),
        &dir,
    );
    let outcome = mover.execute().unwrap();

    // Walk the written files and verify the dependency edges the protocol
    // promises.
    let mut loader = MigrationLoader::new(&dir);
    let graph = loader.load().unwrap();

    let ph1 = outcome.rename_table.result.key();
    let ph2 = outcome.register_target.result.key();
    let ph4 = outcome.drop_source_state.result.key();

    assert!(graph.dependencies(&ph2).contains(&ph1));
    for relation in &outcome.repoint_relations {
        let deps = graph.dependencies(&relation.result.key());
        assert!(deps.contains(&ph1));
        assert!(deps.contains(&ph2));
        assert!(graph.dependencies(&ph4).contains(&relation.result.key()));
    }

    let _ = std::fs::remove_dir_all(&dir);
}
