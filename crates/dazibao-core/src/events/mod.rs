//! Lifecycle events shared by the CLI and the schedulers.
//!
//! Per-operation events (command failures, persistence, HTTP errors) are
//! logged where they happen; these helpers cover start/stop transitions so
//! their field sets stay identical across call sites.

use std::time::Duration;

use tracing::{error, info};

pub fn log_app_startup() {
    info!(
        event = "core.app.startup_completed",
        version = crate::APP_VERSION
    );
}

pub fn log_app_shutdown() {
    info!(event = "core.app.shutdown_started");
}

pub fn log_app_error(error: &dyn std::error::Error) {
    error!(
        event = "core.app.error_occurred",
        error = %error,
        error_type = std::any::type_name_of_val(error)
    );
}

pub fn log_scheduler_started(
    index: usize,
    title: &str,
    interval: Duration,
    command_count: usize,
) {
    info!(
        event = "core.scheduler.started",
        block = title,
        index = index,
        interval_secs = interval.as_secs(),
        command_count = command_count
    );
}

pub fn log_scheduler_stopped(index: usize, title: &str) {
    info!(event = "core.scheduler.stopped", block = title, index = index);
}

pub fn log_supervisor_started(block_count: usize) {
    info!(event = "core.supervisor.started", block_count = block_count);
}

pub fn log_supervisor_stopped(block_count: usize, aborted: usize) {
    info!(
        event = "core.supervisor.stopped",
        block_count = block_count,
        aborted = aborted
    );
}
