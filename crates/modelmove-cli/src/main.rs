//! The `modelmove` binary.
//!
//! Loads settings, sets up logging, and dispatches to the registered
//! management commands. Precondition failures exit with code 2; every other
//! error exits with code 1.

use std::path::Path;

use modelmove_cli::command::CommandRegistry;
use modelmove_cli::commands::register_builtin_commands;
use modelmove_core::{logging, Settings};

#[tokio::main]
async fn main() {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);

    let matches = registry.build_cli().get_matches();

    let settings_path = matches
        .get_one::<String>("settings")
        .map_or("modelmove.toml", String::as_str);
    let settings = if Path::new(settings_path).exists() {
        match Settings::from_file(Path::new(settings_path)) {
            Ok(settings) => settings,
            Err(err) => {
                eprintln!("{err}");
                std::process::exit(err.exit_code());
            }
        }
    } else {
        Settings::default()
    };

    logging::setup_logging(&settings);

    if let Err(err) = registry.execute(&matches, &settings).await {
        eprintln!("{err}");
        std::process::exit(err.exit_code());
    }
}
