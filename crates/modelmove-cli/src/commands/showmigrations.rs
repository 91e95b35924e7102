//! The `showmigrations` management command.
//!
//! Lists every migration per app with an applied marker.

use std::collections::BTreeMap;

use async_trait::async_trait;
use modelmove_core::settings::DEFAULT_DB_ALIAS;
use modelmove_core::{ModelMoveResult, Settings};
use modelmove_db::backend::open_backend;
use modelmove_migrations::executor::MigrationRecorder;
use modelmove_migrations::loader::MigrationLoader;

use crate::command::ManagementCommand;

/// Shows the migration list and applied state per app.
pub struct ShowmigrationsCommand;

#[async_trait]
impl ManagementCommand for ShowmigrationsCommand {
    fn name(&self) -> &'static str {
        "showmigrations"
    }

    fn help(&self) -> &'static str {
        "List migrations and their applied state"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("database")
                .long("database")
                .default_value(DEFAULT_DB_ALIAS)
                .help("Database alias to inspect. Defaults to the 'default' database"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> ModelMoveResult<()> {
        let database = matches.get_one::<String>("database").expect("defaulted");

        let mut loader = MigrationLoader::new(&settings.migrations_dir);
        let graph = loader.load()?;
        if graph.is_empty() {
            println!("No migrations found.");
            return Ok(());
        }

        let backend = open_backend(settings.database(database)?)?;
        let mut recorder = MigrationRecorder::new();
        recorder.load_from_db(&*backend).await?;

        let mut by_app: BTreeMap<&str, Vec<&(String, String)>> = BTreeMap::new();
        let keys = graph.node_keys();
        for key in &keys {
            by_app.entry(key.0.as_str()).or_default().push(key);
        }

        for (app, migrations) in by_app {
            println!("{app}");
            for key in migrations {
                let marker = if recorder.is_applied(key) { "X" } else { " " };
                println!(" [{marker}] {}", key.1);
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
        let matches = ShowmigrationsCommand
            .add_arguments(clap::Command::new("showmigrations"))
            .try_get_matches_from(["showmigrations"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("database").unwrap(),
            DEFAULT_DB_ALIAS
        );
    }
}
