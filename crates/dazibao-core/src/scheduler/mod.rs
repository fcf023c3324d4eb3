//! Per-block polling.
//!
//! Each block gets one [`BlockScheduler`] task that ticks on the block's own
//! interval, executes the block's commands, and commits the whole tick through
//! the [`ConfigStore`](crate::store::ConfigStore). The [`Supervisor`] spawns
//! those tasks at startup and stops them at shutdown.

pub mod block;
pub mod supervisor;

pub use block::{BlockScheduler, TickOutcome, run_all_once};
pub use supervisor::{DEFAULT_SHUTDOWN_GRACE, Supervisor};
