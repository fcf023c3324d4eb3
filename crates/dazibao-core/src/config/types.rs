use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

/// Environment variable overriding the base directory.
pub const DAZIBAO_DIR_ENV: &str = "DAZIBAO_DIR";

/// Runtime paths for Dazibao.
///
/// Derived from the environment and the user's home directory, never from
/// the config file itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base directory for all Dazibao data (default: ~/.dazibao)
    pub dazibao_dir: PathBuf,
}

impl Config {
    pub fn new(dazibao_dir: impl Into<PathBuf>) -> Self {
        Self {
            dazibao_dir: dazibao_dir.into(),
        }
    }

    /// Resolve the base directory from `DAZIBAO_DIR` or `~/.dazibao`.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Some(dir) = std::env::var_os(DAZIBAO_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(Self::new(dir));
        }
        let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
        Ok(Self::new(home.join(".dazibao")))
    }

    pub fn dir(&self) -> &Path {
        &self.dazibao_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.dazibao_dir.join("config.json")
    }

    pub fn template_file(&self) -> PathBuf {
        self.dazibao_dir.join("template.html")
    }

    pub fn icons_dir(&self) -> PathBuf {
        self.dazibao_dir.join("icons")
    }

    pub fn icon_file(&self) -> PathBuf {
        self.icons_dir().join("dazibao.png")
    }

    pub fn lock_file(&self) -> PathBuf {
        self.dazibao_dir.join("dazibao.lock")
    }

    /// Default target of periodic static generation.
    pub fn index_file(&self) -> PathBuf {
        self.dazibao_dir.join("index.html")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_paths() {
        let config = Config::new("/srv/dz");
        assert_eq!(config.config_file(), PathBuf::from("/srv/dz/config.json"));
        assert_eq!(config.template_file(), PathBuf::from("/srv/dz/template.html"));
        assert_eq!(
            config.icon_file(),
            PathBuf::from("/srv/dz/icons/dazibao.png")
        );
        assert_eq!(config.lock_file(), PathBuf::from("/srv/dz/dazibao.lock"));
        assert_eq!(config.index_file(), PathBuf::from("/srv/dz/index.html"));
    }
}
