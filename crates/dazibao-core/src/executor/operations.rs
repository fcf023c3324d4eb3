use std::process::Stdio;

use tracing::{debug, warn};

use crate::executor::errors::ExecutionError;
use crate::variables::{self, SENTINEL};

/// Shell used to run literal command lines.
pub const SHELL: &str = "bash";

/// Prefix that points the shell's stderr at its stdout pipe, so the captured
/// text keeps the order in which the command wrote it. Kept on the same line
/// as the command so bash reports errors against `line 1`.
const MERGE_STDERR: &str = "exec 2>&1; ";

/// Whether `command` names a built-in variable instead of a shell command.
///
/// A lone `%` is not a reference and goes to the shell like any other string.
pub fn is_variable_reference(command: &str) -> bool {
    command.len() > 1 && command.starts_with(SENTINEL)
}

/// Execute one command string.
///
/// Variable references are resolved in-process and always succeed. Anything
/// else runs as `bash -c <command>` with stderr merged into stdout; on success
/// the interleaved output is returned trimmed. A non-zero exit, a signal, or
/// a spawn failure is returned as an [`ExecutionError`] and is never retried
/// here.
pub async fn execute(command: &str) -> Result<String, ExecutionError> {
    if is_variable_reference(command) {
        return Ok(variables::resolve(command));
    }

    debug!(event = "core.executor.shell_started", command = command);

    let output = tokio::process::Command::new(SHELL)
        .arg("-c")
        .arg(format!("{}{}", MERGE_STDERR, command))
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| {
            warn!(
                event = "core.executor.spawn_failed",
                command = command,
                error = %source
            );
            ExecutionError::SpawnFailed { source }
        })?;

    // stderr only carries what bash printed before the merge took effect,
    // i.e. a syntax error in the command line.
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    let combined = combined.trim().to_string();

    if output.status.success() {
        debug!(
            event = "core.executor.shell_completed",
            command = command,
            output_len = combined.len()
        );
        return Ok(combined);
    }

    match output.status.code() {
        Some(code) => Err(ExecutionError::NonZeroExit {
            code,
            output: combined,
        }),
        None => Err(ExecutionError::Terminated { output: combined }),
    }
}

/// Text stored in an output slot for one execution result.
///
/// Failures are rendered inline as `Error: <cause>` so the page stays
/// self-describing instead of silently stale.
pub fn slot_text(result: Result<String, ExecutionError>) -> String {
    match result {
        Ok(output) => output,
        Err(e) => format!("Error: {}", e),
    }
}
