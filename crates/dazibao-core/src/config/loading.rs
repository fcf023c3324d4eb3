//! Loading and saving the persisted tree.
//!
//! The file is written with a temp-file-then-rename so a reader (or a crash)
//! never sees a half-written config.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::blocks::{DashboardConfig, default_config};
use crate::errors::ConfigError;

/// Load the tree from `path`.
///
/// The port is defaulted and the tree validated before it is returned.
pub fn load_config_file(path: &Path) -> Result<DashboardConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(ConfigError::IoError { source: e }),
    };

    let mut config: DashboardConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    config.normalize();
    config
        .validate()
        .map_err(|message| ConfigError::InvalidConfiguration { message })?;

    Ok(config)
}

/// Load the tree, or create and persist the default tree if the file is absent.
///
/// Any other failure (unreadable file, invalid JSON, invalid content) is
/// returned; startup must not proceed on a config it cannot understand.
pub fn load_or_create(path: &Path) -> Result<DashboardConfig, ConfigError> {
    match load_config_file(path) {
        Ok(config) => {
            info!(
                event = "core.config.load_completed",
                path = %path.display(),
                block_count = config.blocks.len(),
                port = config.port
            );
            Ok(config)
        }
        Err(ConfigError::ConfigNotFound { .. }) => {
            info!(
                event = "core.config.default_created",
                path = %path.display(),
                "Config not found, creating it with default blocks"
            );
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let config = default_config();
            save_config_file(&config, path)?;
            Ok(config)
        }
        Err(e) => Err(e),
    }
}

fn cleanup_temp_file(temp_file: &Path, original_error: &std::io::Error) {
    if let Err(cleanup_err) = fs::remove_file(temp_file) {
        warn!(
            event = "core.config.temp_file_cleanup_failed",
            temp_file = %temp_file.display(),
            original_error = %original_error,
            cleanup_error = %cleanup_err,
            "Failed to clean up temp file after write error"
        );
    }
}

/// Write the whole tree to `path` as pretty JSON, replacing it atomically.
pub fn save_config_file(config: &DashboardConfig, path: &Path) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(config)?;
    let temp_file = path.with_extension("json.tmp");

    if let Err(e) = fs::write(&temp_file, &json) {
        cleanup_temp_file(&temp_file, &e);
        return Err(ConfigError::IoError { source: e });
    }

    if let Err(e) = fs::rename(&temp_file, path) {
        cleanup_temp_file(&temp_file, &e);
        return Err(ConfigError::IoError { source: e });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{Block, DEFAULT_PORT};

    #[test]
    fn test_missing_file_creates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.blocks.len(), 3);

        // Second load reads what was written
        let reloaded = load_or_create(&path).unwrap();
        assert_eq!(config, reloaded);
    }

    #[test]
    fn test_zero_port_defaults_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"blocks":[{"type":"single","title":"A","command":"true","interval":1}],"port":0}"#,
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_or_create(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        // The broken file must not be overwritten with defaults
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_zero_interval_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"blocks":[{"type":"single","title":"A","command":"true","interval":0}]}"#,
        )
        .unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = default_config();
        config.blocks.push(Block::single("Echo", "echo hi", 7));
        config.blocks[3].set_outputs(vec!["hi".to_string()]);
        config.blocks[3].touch(chrono::Utc::now());

        save_config_file(&config, &path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = load_config_file(&path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("config.json");

        let err = save_config_file(&default_config(), &path).unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }
}
