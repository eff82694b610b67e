//! Terminal UI components.
//!
//! This module contains all UI-related code including:
//! - the toolbar of command groups
//! - the editor pane with highlighting, caret and selection
//! - the preview pane (image or text fallback)
//! - status bar, toasts and overlays

mod overlays;
mod render;
mod status;

pub use overlays::{centered_popup_rect, popover_rect};
pub use render::{AppLayout, editor_inner_area, preview_inner_area, render, split_layout};

pub const TOOLBAR_HEIGHT: u16 = 3;
/// Toast row plus status bar.
pub const FOOTER_HEIGHT: u16 = 2;
pub const EDITOR_WIDTH_PERCENT: u16 = 50;
pub const PREVIEW_WIDTH_PERCENT: u16 = 50;
