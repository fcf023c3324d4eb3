//! Renderers over a store snapshot.
//!
//! Both renderers take an already-copied [`DashboardConfig`], so every block
//! they emit is consistent as of a single committed tick.
//!
//! The page template is plain HTML with two placeholders:
//!
//! - `{{.ConfigJSON}}` - the snapshot as JSON, safe to place inside `<script>`
//! - `{{.IconDataURI}}` - `data:image/png;base64,...`, or empty without an icon

pub mod errors;

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use tracing::warn;

use crate::blocks::DashboardConfig;
use crate::config::Config;

pub use errors::RenderError;

pub const CONFIG_JSON_PLACEHOLDER: &str = "{{.ConfigJSON}}";
pub const ICON_PLACEHOLDER: &str = "{{.IconDataURI}}";

/// Encode a snapshot for the `/data` endpoint.
pub fn render_json(snapshot: &DashboardConfig) -> Result<String, RenderError> {
    serde_json::to_string(snapshot).map_err(|source| RenderError::SerializeFailed { source })
}

/// `data:` URI for a PNG icon.
pub fn icon_data_uri(png: &[u8]) -> String {
    let engine = base64::engine::general_purpose::STANDARD;
    format!("data:image/png;base64,{}", engine.encode(png))
}

/// JSON that cannot terminate or comment out the `<script>` element it sits in.
///
/// `<`, `>` and `&` only occur inside JSON strings, where the `\uXXXX` form
/// decodes to the same text.
fn script_safe_json(snapshot: &DashboardConfig) -> Result<String, RenderError> {
    Ok(render_json(snapshot)?
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

/// Fill `template` with the snapshot and optional icon.
pub fn render_page(
    template: &str,
    snapshot: &DashboardConfig,
    icon_png: Option<&[u8]>,
) -> Result<String, RenderError> {
    let config_json = script_safe_json(snapshot)?;
    let icon_uri = icon_png.map(icon_data_uri).unwrap_or_default();

    Ok(fill_placeholders(
        template,
        &[
            (CONFIG_JSON_PLACEHOLDER, config_json.as_str()),
            (ICON_PLACEHOLDER, icon_uri.as_str()),
        ],
    ))
}

/// Replace every placeholder in one left-to-right pass over `template`.
///
/// Inserted values are never scanned again, so block text that happens to
/// contain a placeholder is emitted as-is.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let next = values
            .iter()
            .filter_map(|&(placeholder, value)| {
                rest.find(placeholder).map(|at| (at, placeholder, value))
            })
            .min_by_key(|&(at, _, _)| at);

        match next {
            Some((at, placeholder, value)) => {
                out.push_str(&rest[..at]);
                out.push_str(value);
                rest = &rest[at + placeholder.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// Page renderer reading the template and icon from the Dazibao directory.
///
/// Files are re-read on every render so edits to the template show up on the
/// next page load.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    template_path: PathBuf,
    icon_path: PathBuf,
}

impl PageRenderer {
    pub fn new(template_path: impl Into<PathBuf>, icon_path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
            icon_path: icon_path.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.template_file(), config.icon_file())
    }

    pub fn icon_path(&self) -> &Path {
        &self.icon_path
    }

    /// Icon bytes, or `None` (with a warning) if the icon cannot be read.
    pub fn icon(&self) -> Option<Vec<u8>> {
        match fs::read(&self.icon_path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(
                    event = "core.render.icon_read_failed",
                    path = %self.icon_path.display(),
                    error = %e
                );
                None
            }
        }
    }

    pub fn render(&self, snapshot: &DashboardConfig) -> Result<String, RenderError> {
        let template =
            fs::read_to_string(&self.template_path).map_err(|source| RenderError::TemplateRead {
                path: self.template_path.clone(),
                source,
            })?;
        let icon = self.icon();
        render_page(&template, snapshot, icon.as_deref())
    }
}
