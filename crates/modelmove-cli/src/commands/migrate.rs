//! The `migrate` management command.
//!
//! Applies all pending migrations against the configured database.

use async_trait::async_trait;
use modelmove_core::settings::DEFAULT_DB_ALIAS;
use modelmove_core::{ModelMoveResult, Settings};
use modelmove_db::backend::open_backend;
use modelmove_migrations::executor::migrate_all;

use crate::command::ManagementCommand;

/// Applies pending database migrations.
pub struct MigrateCommand;

#[async_trait]
impl ManagementCommand for MigrateCommand {
    fn name(&self) -> &'static str {
        "migrate"
    }

    fn help(&self) -> &'static str {
        "Apply database migrations"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("database")
                .long("database")
                .default_value(DEFAULT_DB_ALIAS)
                .help("Database alias to migrate. Defaults to the 'default' database"),
        )
        .arg(
            clap::Arg::new("fake")
                .long("fake")
                .action(clap::ArgAction::SetTrue)
                .help("Mark migrations as applied without running their SQL"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> ModelMoveResult<()> {
        let database = matches.get_one::<String>("database").expect("defaulted");
        let fake = matches.get_flag("fake");

        tracing::info!("Running migrations on database '{database}'");
        if fake {
            tracing::info!("Fake mode: marking migrations as applied");
        }

        let backend = open_backend(settings.database(database)?)?;
        let applied = migrate_all(&settings.migrations_dir, &*backend, fake).await?;

        if applied.is_empty() {
            println!("No migrations to apply.");
        } else {
            for (app, name) in &applied {
                println!("Applied {app}.{name}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_parsing() {
        let matches = MigrateCommand
            .add_arguments(clap::Command::new("migrate"))
            .try_get_matches_from(["migrate", "--fake", "--database", "replica"])
            .unwrap();
        assert!(matches.get_flag("fake"));
        assert_eq!(matches.get_one::<String>("database").unwrap(), "replica");
    }
}
