//! The `move_model` management command.
//!
//! Creates the four migrations that relocate a model (and its data) from one
//! app to another. The model must already be physically moved in code; this
//! command takes care of the migration history and, with `--migrate`, the
//! live schema.

use async_trait::async_trait;
use modelmove_core::settings::DEFAULT_DB_ALIAS;
use modelmove_core::{AppRegistry, ModelMoveResult, Settings};
use modelmove_db::backend::open_backend;
use modelmove_migrations::autodetect::ProjectState;
use modelmove_migrations::checker::ConsistencyChecker;
use modelmove_migrations::executor::{migrate_all, MigrationRecorder};
use modelmove_migrations::loader::MigrationLoader;
use modelmove_migrations::mover::{ModelMover, MoveOutcome};

use crate::command::{confirm, ManagementCommand};

/// Creates migrations for moving a model from one app to another.
pub struct MoveModelCommand;

#[async_trait]
impl ManagementCommand for MoveModelCommand {
    fn name(&self) -> &'static str {
        "move_model"
    }

    fn help(&self) -> &'static str {
        "Create migrations for moving a model from base_app to target_app"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("model")
                .help("Name of the model to be transferred")
                .required(true),
        )
        .arg(
            clap::Arg::new("base_app")
                .help("App label from where to move the model")
                .required(true),
        )
        .arg(
            clap::Arg::new("target_app")
                .help("App label to put the model into")
                .required(true),
        )
        .arg(
            clap::Arg::new("database")
                .long("database")
                .default_value(DEFAULT_DB_ALIAS)
                .help("Database alias to check and migrate. Defaults to the 'default' database"),
        )
        .arg(
            clap::Arg::new("noinput")
                .long("noinput")
                .alias("no-input")
                .action(clap::ArgAction::SetTrue)
                .help("Do not prompt for input of any kind"),
        )
        .arg(
            clap::Arg::new("dry-run")
                .long("dry-run")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with("migrate")
                .help("Just show what migrations would be made; don't actually write them"),
        )
        .arg(
            clap::Arg::new("migrate")
                .long("migrate")
                .action(clap::ArgAction::SetTrue)
                .help("Apply the migrations immediately after the files are written"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> ModelMoveResult<()> {
        let model = matches.get_one::<String>("model").expect("required");
        let base_app = matches.get_one::<String>("base_app").expect("required");
        let target_app = matches.get_one::<String>("target_app").expect("required");
        let database = matches.get_one::<String>("database").expect("defaulted");
        let interactive = !matches.get_flag("noinput");
        let dry_run = matches.get_flag("dry-run");
        let migrate = matches.get_flag("migrate");

        let registry = AppRegistry::from_settings(settings)?;
        let current_state = ProjectState::from_app_dirs(&registry)?;

        let mut mover = ModelMover::new(
            model,
            base_app,
            target_app,
            &registry,
            current_state,
            &settings.migrations_dir,
        )
        .dry_run(dry_run);
        // The pure preconditions run up front so an operator typo fails
        // before any database connection is made.
        mover.verify_input()?;

        let backend = open_backend(settings.database(database)?)?;

        let mut loader = MigrationLoader::new(&settings.migrations_dir);
        let graph = loader.load()?;
        let mut recorder = MigrationRecorder::new();
        recorder.load_from_db(&*backend).await?;
        ConsistencyChecker::new(&graph, &recorder).check_all()?;

        if interactive
            && !dry_run
            && !confirm(&format!(
                "Write migrations moving '{model}' from '{base_app}' to '{target_app}'?"
            ))
        {
            println!("Cancelled.");
            return Ok(());
        }

        let outcome = mover.execute()?;
        print_outcome(&outcome);

        if migrate {
            tracing::info!("Applying migrations on database '{database}'");
            let applied = migrate_all(&settings.migrations_dir, &*backend, false).await?;
            println!("Applied {} migration(s).", applied.len());
        }

        Ok(())
    }
}

/// Prints the generated migrations grouped per app.
fn print_outcome(outcome: &MoveOutcome) {
    if outcome.dry_run {
        println!("Dry run; the following migrations would be written:");
    }
    for artifact in outcome.artifacts() {
        println!("Migrations for '{}':", artifact.result.app_label);
        match &artifact.path {
            Some(path) => println!("  {}", path.display()),
            None => println!("  {} (not written)", artifact.result.migration_id),
        }
        for op in &artifact.operations {
            println!("    - {op}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> clap::Command {
        MoveModelCommand.add_arguments(clap::Command::new("move_model"))
    }

    #[test]
    fn test_argument_parsing() {
        let matches = cli()
            .try_get_matches_from([
                "move_model",
                "TestModel",
                "base_app",
                "target_app",
                "--dry-run",
                "--noinput",
            ])
            .unwrap();
        assert_eq!(matches.get_one::<String>("model").unwrap(), "TestModel");
        assert_eq!(matches.get_one::<String>("base_app").unwrap(), "base_app");
        assert!(matches.get_flag("dry-run"));
        assert!(matches.get_flag("noinput"));
        assert_eq!(
            matches.get_one::<String>("database").unwrap(),
            DEFAULT_DB_ALIAS
        );
    }

    #[test]
    fn test_dry_run_conflicts_with_migrate() {
        let result = cli().try_get_matches_from([
            "move_model",
            "TestModel",
            "base_app",
            "target_app",
            "--dry-run",
            "--migrate",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_positional_arguments_required() {
        assert!(cli()
            .try_get_matches_from(["move_model", "TestModel"])
            .is_err());
    }
}
