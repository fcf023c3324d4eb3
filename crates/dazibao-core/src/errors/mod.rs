use std::error::Error;
use std::path::PathBuf;

/// Base trait for all application errors
pub trait DazibaoError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether this error should be logged as an error or warning
    fn is_user_error(&self) -> bool {
        false
    }
}

/// Common result type for the application
pub type DazibaoResult<T> = Result<T, Box<dyn DazibaoError>>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found at '{path}'")]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParseError { path: PathBuf, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Could not find home directory")]
    HomeDirNotFound,

    #[error("Failed to serialize config: {source}")]
    SerializeError {
        #[from]
        source: serde_json::Error,
    },

    #[error("IO error on config file: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl DazibaoError for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::ConfigNotFound { .. } => "CONFIG_NOT_FOUND",
            ConfigError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            ConfigError::HomeDirNotFound => "HOME_DIR_NOT_FOUND",
            ConfigError::SerializeError { .. } => "CONFIG_SERIALIZE_ERROR",
            ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            ConfigError::ConfigParseError { .. } | ConfigError::InvalidConfiguration { .. }
        )
    }
}
