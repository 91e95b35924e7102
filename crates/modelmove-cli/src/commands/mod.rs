//! Built-in management commands.

pub mod migrate;
pub mod move_model;
pub mod rename_app;
pub mod showmigrations;

pub use migrate::MigrateCommand;
pub use move_model::MoveModelCommand;
pub use rename_app::RenameAppCommand;
pub use showmigrations::ShowmigrationsCommand;

use crate::command::CommandRegistry;

/// Registers all built-in management commands into the given registry.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(MoveModelCommand));
    registry.register(Box::new(RenameAppCommand));
    registry.register(Box::new(MigrateCommand));
    registry.register(Box::new(ShowmigrationsCommand));
}
