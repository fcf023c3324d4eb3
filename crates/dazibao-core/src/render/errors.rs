use std::path::PathBuf;

use crate::errors::DazibaoError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to read template '{path}': {source}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize snapshot: {source}")]
    SerializeFailed {
        #[source]
        source: serde_json::Error,
    },
}

impl DazibaoError for RenderError {
    fn error_code(&self) -> &'static str {
        match self {
            RenderError::TemplateRead { .. } => "RENDER_TEMPLATE_READ",
            RenderError::SerializeFailed { .. } => "RENDER_SERIALIZE_FAILED",
        }
    }
}
