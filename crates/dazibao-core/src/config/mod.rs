//! # Configuration System
//!
//! Two layers of configuration:
//!
//! 1. **Runtime paths** ([`Config`]) - where Dazibao keeps its files. Defaults to
//!    `~/.dazibao`, overridable with the `DAZIBAO_DIR` environment variable.
//! 2. **Persisted tree** (`config.json`) - the [`DashboardConfig`](crate::blocks::DashboardConfig)
//!    holding every block, its latest outputs, and global settings. The same
//!    file is rewritten after every committed tick.
//!
//! ## Loading Configuration
//!
//! ```rust,no_run
//! use dazibao_core::config::{Config, loading};
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let tree = loading::load_or_create(&config.config_file())?;
//!     println!("{} blocks on port {}", tree.blocks.len(), tree.port);
//!     Ok(())
//! }
//! ```

pub mod loading;
pub mod types;

pub use loading::{load_config_file, load_or_create, save_config_file};
pub use types::{Config, DAZIBAO_DIR_ENV};
