//! # modelmove-core
//!
//! Core types shared by every modelmove crate: the [`ModelMoveError`] error
//! taxonomy, the [`AppRegistry`] of installed applications, the [`Settings`]
//! configuration system, and logging bootstrap helpers.

#![allow(clippy::result_large_err)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]

pub mod apps;
pub mod error;
pub mod logging;
pub mod settings;

// Re-export key types at the crate root.
pub use apps::{AppConfig, AppRegistry};
pub use error::{ModelMoveError, ModelMoveResult};
pub use settings::{DatabaseSettings, Settings};
