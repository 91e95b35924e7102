//! # modelmove-cli
//!
//! The management-command layer: a [`ManagementCommand`] trait with a
//! [`CommandRegistry`] dispatcher, plus the built-in commands
//! (`move_model`, `rename_app`, `migrate`, `showmigrations`).

#![allow(clippy::result_large_err)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::unused_async)]

pub mod command;
pub mod commands;

pub use command::{CommandRegistry, ManagementCommand};
pub use commands::register_builtin_commands;
