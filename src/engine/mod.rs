//! Typesetting engine service.
//!
//! Turning markup into vector output is delegated to an external engine.
//! The rest of the crate only sees the [`TypesetEngine`] trait, so tests
//! can substitute a scripted engine and the binary can pick a backend.

mod process;

pub use process::{DEFAULT_ENGINE_COMMAND, MARKUP_PLACEHOLDER, ProcessEngine};

use thiserror::Error;

/// Errors raised while waiting for or calling the engine.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("typesetting engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("failed to start typesetting engine: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("typesetting engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("typesetting engine produced invalid output: {0}")]
    InvalidOutput(String),
}

/// Vector output for one piece of markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typeset {
    /// The markup that was rendered
    pub markup: String,
    /// Standalone SVG document
    pub svg: String,
}

/// An external capability that renders markup to SVG.
///
/// Implementations must be callable from worker threads; calls may overlap.
pub trait TypesetEngine: Send + Sync {
    /// Short name for status bars and logs.
    fn name(&self) -> &str;

    /// Whether [`TypesetEngine::typeset`] can be called right now.
    fn is_ready(&self) -> bool;

    /// Block until the engine is ready, once.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::EngineUnavailable`] if the engine can never
    /// become ready (for example, its program is missing).
    fn wait_ready(&self) -> Result<(), RenderError>;

    /// Render `markup`.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine rejects the markup or fails to run.
    fn typeset(&self, markup: &str) -> Result<Typeset, RenderError>;
}

/// Check that engine output looks like an SVG document.
pub(crate) fn validate_svg(markup: &str, output: &str) -> Result<Typeset, RenderError> {
    let start = output
        .find("<svg")
        .ok_or_else(|| RenderError::InvalidOutput("no <svg> element in output".to_string()))?;
    let end = output
        .rfind("</svg>")
        .ok_or_else(|| RenderError::InvalidOutput("unterminated <svg> element".to_string()))?;
    if end < start {
        return Err(RenderError::InvalidOutput(
            "unterminated <svg> element".to_string(),
        ));
    }
    Ok(Typeset {
        markup: markup.to_string(),
        svg: output[start..end + "</svg>".len()].to_string(),
    })
}
