use crate::errors::DazibaoError;

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("failed to spawn shell: {source}")]
    SpawnFailed {
        #[source]
        source: std::io::Error,
    },

    #[error("exit status {code}")]
    NonZeroExit { code: i32, output: String },

    #[error("terminated by signal")]
    Terminated { output: String },
}

impl ExecutionError {
    /// Captured stdout+stderr of the failed command, if it ran at all.
    pub fn output(&self) -> Option<&str> {
        match self {
            ExecutionError::SpawnFailed { .. } => None,
            ExecutionError::NonZeroExit { output, .. } | ExecutionError::Terminated { output } => {
                Some(output)
            }
        }
    }
}

impl DazibaoError for ExecutionError {
    fn error_code(&self) -> &'static str {
        match self {
            ExecutionError::SpawnFailed { .. } => "EXECUTION_SPAWN_FAILED",
            ExecutionError::NonZeroExit { .. } => "EXECUTION_NON_ZERO_EXIT",
            ExecutionError::Terminated { .. } => "EXECUTION_TERMINATED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, ExecutionError::NonZeroExit { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_zero_exit_display() {
        let error = ExecutionError::NonZeroExit {
            code: 1,
            output: String::new(),
        };
        assert_eq!(error.to_string(), "exit status 1");
        assert_eq!(error.error_code(), "EXECUTION_NON_ZERO_EXIT");
        assert!(error.is_user_error());
        assert_eq!(error.output(), Some(""));
    }

    #[test]
    fn test_spawn_failed_has_no_output() {
        let error = ExecutionError::SpawnFailed {
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "bash not found"),
        };
        assert_eq!(error.to_string(), "failed to spawn shell: bash not found");
        assert!(error.output().is_none());
        assert!(!error.is_user_error());
    }
}
