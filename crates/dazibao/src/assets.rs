//! First-run bootstrap of the Dazibao directory.

use std::fs;
use std::path::{Path, PathBuf};

use dazibao_core::config::Config;
use dazibao_core::errors::DazibaoError;
use tracing::info;

/// Page template installed when the directory has none.
pub const DEFAULT_TEMPLATE: &str = include_str!("../assets/template.html");

/// Directory next to the working directory whose icons are installed on first run.
const ICONS_SOURCE_DIR: &str = "icons";

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Failed to create '{path}': {source}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy '{from}' to '{to}': {source}")]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DazibaoError for AssetError {
    fn error_code(&self) -> &'static str {
        match self {
            AssetError::CreateFailed { .. } => "ASSET_CREATE_FAILED",
            AssetError::CopyFailed { .. } => "ASSET_COPY_FAILED",
        }
    }
}

/// Make sure the directory, template, and icons exist.
///
/// Existing files are never overwritten, so a customized template survives
/// restarts.
pub fn ensure_assets(config: &Config) -> Result<(), AssetError> {
    ensure_assets_from(config, Path::new(ICONS_SOURCE_DIR))
}

fn ensure_assets_from(config: &Config, icons_source: &Path) -> Result<(), AssetError> {
    let dir = config.dir();
    fs::create_dir_all(dir).map_err(|source| AssetError::CreateFailed {
        path: dir.to_path_buf(),
        source,
    })?;

    let template = config.template_file();
    if !template.exists() {
        info!(
            event = "cli.assets.template_installed",
            path = %template.display()
        );
        fs::write(&template, DEFAULT_TEMPLATE).map_err(|source| AssetError::CreateFailed {
            path: template.clone(),
            source,
        })?;
    }

    let icons = config.icons_dir();
    if !icons.exists() && icons_source.is_dir() {
        info!(
            event = "cli.assets.icons_copied",
            from = %icons_source.display(),
            to = %icons.display()
        );
        copy_dir(icons_source, &icons)?;
    }

    Ok(())
}

fn copy_dir(src: &Path, dest: &Path) -> Result<(), AssetError> {
    let copy_err = |source: std::io::Error| AssetError::CopyFailed {
        from: src.to_path_buf(),
        to: dest.to_path_buf(),
        source,
    };

    fs::create_dir_all(dest).map_err(copy_err)?;
    for entry in fs::read_dir(src).map_err(copy_err)? {
        let entry = entry.map_err(copy_err)?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        if entry.file_type().map_err(copy_err)?.is_dir() {
            copy_dir(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|source| AssetError::CopyFailed {
                from: from.clone(),
                to: to.clone(),
                source,
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installs_template_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path().join("dz"));
        let no_icons = dir.path().join("no-icons");

        ensure_assets_from(&config, &no_icons).unwrap();
        assert_eq!(
            fs::read_to_string(config.template_file()).unwrap(),
            DEFAULT_TEMPLATE
        );
        assert!(!config.icons_dir().exists());

        // A customized template is left alone
        fs::write(config.template_file(), "custom").unwrap();
        ensure_assets_from(&config, &no_icons).unwrap();
        assert_eq!(fs::read_to_string(config.template_file()).unwrap(), "custom");
    }

    #[test]
    fn test_copies_icons_tree() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("icons");
        fs::create_dir_all(source.join("extra")).unwrap();
        fs::write(source.join("dazibao.png"), b"png").unwrap();
        fs::write(source.join("extra").join("other.png"), b"other").unwrap();

        let config = Config::new(dir.path().join("dz"));
        ensure_assets_from(&config, &source).unwrap();

        assert_eq!(fs::read(config.icon_file()).unwrap(), b"png");
        assert_eq!(
            fs::read(config.icons_dir().join("extra").join("other.png")).unwrap(),
            b"other"
        );
    }

    #[test]
    fn test_default_template_has_placeholders() {
        assert!(DEFAULT_TEMPLATE.contains(dazibao_core::render::CONFIG_JSON_PLACEHOLDER));
        assert!(DEFAULT_TEMPLATE.contains(dazibao_core::render::ICON_PLACEHOLDER));
    }
}
