// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. engine::EngineError)
    clippy::module_name_repetitions
)]

//! # mathpad
//!
//! A terminal editor for LaTeX math with live preview.
//!
//! mathpad lets you compose a formula with:
//! - A syntax-highlighted multi-line editor
//! - A toolbar and searchable palette of math commands
//! - A debounced preview rendered by an external typesetting engine
//! - SVG export and clipboard copy
//!
//! ## Architecture
//!
//! mathpad uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! Typesetting runs on worker threads; results come back tagged with a
//! sequence number so only the newest render reaches the preview.
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`editor`]: Text buffer with caret and selection
//! - [`commands`]: Command palette table and examples
//! - [`engine`]: Typesetting engine service
//! - [`scheduler`]: Debounced render scheduling and the render worker
//! - [`preview`]: SVG rasterization for the preview pane
//! - [`export`]: SVG export
//! - [`highlight`]: Markup syntax highlighting
//! - [`ui`]: Terminal UI components

pub mod app;
pub mod commands;
pub mod config;
pub mod editor;
pub mod engine;
pub mod export;
pub mod highlight;
pub mod perf;
pub mod preview;
pub mod scheduler;
pub mod ui;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::editor::EditorBuffer;
    pub use crate::engine::{ProcessEngine, TypesetEngine};
    pub use crate::scheduler::RenderScheduler;
}
