//! The `rename_app` management command.
//!
//! Renames an app label across live data: content-type rows, the physical
//! tables following the naming convention, and the migration-history rows.
//! The app must already be physically renamed in code.

use async_trait::async_trait;
use modelmove_core::settings::DEFAULT_DB_ALIAS;
use modelmove_core::{AppRegistry, ModelMoveResult, Settings};
use modelmove_db::backend::open_backend;
use modelmove_migrations::rename::AppRenamer;

use crate::command::{confirm, ManagementCommand};

/// Renames an app, keeping all data and previous migrations valid.
pub struct RenameAppCommand;

#[async_trait]
impl ManagementCommand for RenameAppCommand {
    fn name(&self) -> &'static str {
        "rename_app"
    }

    fn help(&self) -> &'static str {
        "Rename base_app to target_app keeping all data and migration history"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("base_app")
                .help("Existing app label to be renamed")
                .required(true),
        )
        .arg(
            clap::Arg::new("target_app")
                .help("Target label for the app")
                .required(true),
        )
        .arg(
            clap::Arg::new("database")
                .long("database")
                .default_value(DEFAULT_DB_ALIAS)
                .help("Database alias to modify. Defaults to the 'default' database"),
        )
        .arg(
            clap::Arg::new("noinput")
                .long("noinput")
                .alias("no-input")
                .action(clap::ArgAction::SetTrue)
                .help("Do not prompt for input of any kind"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> ModelMoveResult<()> {
        let base_app = matches.get_one::<String>("base_app").expect("required");
        let target_app = matches.get_one::<String>("target_app").expect("required");
        let database = matches.get_one::<String>("database").expect("defaulted");
        let interactive = !matches.get_flag("noinput");

        let registry = AppRegistry::from_settings(settings)?;
        let backend = open_backend(settings.database(database)?)?;

        let renamer = AppRenamer::new(base_app, target_app, &*backend);
        renamer.verify_input(&registry)?;

        if interactive
            && !confirm(&format!(
                "Rename '{base_app}' to '{target_app}' on database '{database}'? \
                 The steps are committed independently"
            ))
        {
            println!("Cancelled.");
            return Ok(());
        }

        let outcome = renamer.run().await?;

        println!(
            "Re-tagged {} content-type row(s).",
            outcome.content_type_rows
        );
        for (old, new) in &outcome.renamed_tables {
            println!("Renamed table {old} -> {new}");
        }
        println!(
            "Re-tagged {} migration-history row(s).",
            outcome.history_rows
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> clap::Command {
        RenameAppCommand.add_arguments(clap::Command::new("rename_app"))
    }

    #[test]
    fn test_argument_parsing() {
        let matches = cli()
            .try_get_matches_from(["rename_app", "rename_app", "renamed_app", "--noinput"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("base_app").unwrap(),
            "rename_app"
        );
        assert_eq!(
            matches.get_one::<String>("target_app").unwrap(),
            "renamed_app"
        );
        assert!(matches.get_flag("noinput"));
    }

    #[test]
    fn test_target_app_required() {
        assert!(cli().try_get_matches_from(["rename_app", "only_one"]).is_err());
    }
}
