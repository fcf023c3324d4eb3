//! # Display blocks
//!
//! The configuration tree rendered by the status page: an ordered list of
//! blocks plus global metadata. A block is either a `single` command or a
//! `group` of labeled commands, modelled as [`BlockKind`].
//!
//! ```json
//! {
//!   "blocks": [
//!     {"type": "single", "title": "Uptime", "command": "uptime", "interval": 5,
//!      "output": "...", "last_updated": "2024-03-09T07:05:03Z", "colors": {}}
//!   ],
//!   "last_updated": "2024-03-09T07:05:03Z",
//!   "port": 8080,
//!   "version": "0.1.0",
//!   "colors": {"page_background": "#f0f0f0"}
//! }
//! ```

pub mod defaults;
pub mod types;

pub use defaults::{DEFAULT_PORT, default_config};
pub use types::{Block, BlockColors, BlockKind, DashboardConfig, GlobalColors, GroupCommand};
