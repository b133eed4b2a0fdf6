//! Template rendering collaborator.
//!
//! # Data Flow
//! ```text
//! Context::html(code, name, data)
//!     → serde_json::to_value(data)
//!     → TemplateEngine::render(name, &value)
//!     → bytes written with text/html
//! ```
//!
//! # Design Decisions
//! - The engine is a trait object so applications can swap implementations
//! - Render errors surface as values; the context turns them into a 500

pub mod template;

use std::path::PathBuf;

use thiserror::Error;

pub use template::FileTemplates;

/// Renders a named template with JSON data.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, name: &str, data: &serde_json::Value) -> Result<Vec<u8>, RenderError>;
}

/// Errors raised by template engines.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template {0:?} not found")]
    NotFound(String),

    #[error("failed to read templates from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template data could not be serialized: {0}")]
    Data(#[from] serde_json::Error),
}
