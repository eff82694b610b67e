//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! Engine readiness and render results arrive from the
//! [`RenderWorker`](crate::scheduler::RenderWorker) and are applied to the
//! model by the event loop.

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Focus, Model, Popover, PopoverSource, PreviewImage, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::TypesetEngine;
use crate::scheduler::DEFAULT_DEBOUNCE;

/// Main application struct that owns the engine and runs the event loop.
pub struct App {
    engine: Arc<dyn TypesetEngine>,
    initial_markup: String,
    debounce: Duration,
    export_dir: PathBuf,
    preview_enabled: bool,
    force_half_cell: bool,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create an application that renders through `engine`.
    ///
    /// The document starts with the default example formula.
    pub fn new(engine: Arc<dyn TypesetEngine>) -> Self {
        Self {
            engine,
            initial_markup: crate::commands::default_example().to_string(),
            debounce: DEFAULT_DEBOUNCE,
            export_dir: PathBuf::from("."),
            preview_enabled: true,
            force_half_cell: false,
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Start with `markup` instead of the default example.
    pub fn with_initial_markup(mut self, markup: impl Into<String>) -> Self {
        self.initial_markup = markup.into();
        self
    }

    /// Quiet period before a render is issued.
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Directory exported SVG files are written to.
    pub fn with_export_dir(mut self, dir: PathBuf) -> Self {
        self.export_dir = dir;
        self
    }

    /// Enable or disable drawing the preview as an image.
    pub const fn with_preview_enabled(mut self, enabled: bool) -> Self {
        self.preview_enabled = enabled;
        self
    }

    /// Force image rendering to use half-cell fallback mode.
    pub const fn with_force_half_cell(mut self, force: bool) -> Self {
        self.force_half_cell = force;
        self
    }

    /// Set config paths to show in help.
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}

#[cfg(test)]
mod tests;
