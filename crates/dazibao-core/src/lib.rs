//! dazibao-core: Polling engine behind the Dazibao status page
//!
//! Runs user-defined shell commands and built-in variables on per-block
//! intervals and keeps the latest results in one shared configuration tree
//! that renderers read as consistent snapshots. Used by the `dazibao` CLI.
//!
//! # Main Entry Points
//!
//! - [`scheduler`] - Per-block tick loops and the supervisor that owns them
//! - [`store`] - The exclusion boundary around the configuration tree
//! - [`executor`] - Run one command string (shell or `%variable`)
//! - [`render`] - HTML page and JSON encoders over a snapshot
//! - [`config`] - Paths and loading/saving of the persisted tree

pub mod blocks;
pub mod config;
pub mod errors;
pub mod events;
pub mod executor;
pub mod logging;
pub mod render;
pub mod scheduler;
pub mod store;
pub mod variables;

/// Display name reported by `%app_name`.
pub const APP_NAME: &str = "Dazibao";

/// Version reported by `%app_version` and stamped into the tree at startup.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export commonly used types at crate root for convenience
pub use blocks::{Block, BlockColors, BlockKind, DashboardConfig, GlobalColors, GroupCommand};
pub use config::Config;
pub use errors::{ConfigError, DazibaoError};
pub use executor::ExecutionError;
pub use render::RenderError;
pub use scheduler::{BlockScheduler, Supervisor, TickOutcome};
pub use store::ConfigStore;

// Re-export logging initialization
pub use logging::init_logging;
