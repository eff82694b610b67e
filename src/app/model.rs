use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::GenericImageView;
use ratatui::layout::Rect;
use ratatui_image::picker::{Picker, ProtocolType};
use ratatui_image::protocol::StatefulProtocol;

use crate::commands::{self, CommandEntry};
use crate::editor::EditorBuffer;
use crate::export::ExportOptions;
use crate::scheduler::{RenderRequest, RenderScheduler, WorkerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Which pane receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Editor,
    Toolbar,
}

/// Where the open popover gets its commands from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopoverSource {
    /// All commands of one toolbar group.
    Group(usize),
    /// Palette-wide search filtered by the typed query.
    Search,
}

/// The command list overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popover {
    pub source: PopoverSource,
    pub filter: String,
    pub selected: usize,
}

impl Popover {
    pub const fn group(index: usize) -> Self {
        Self {
            source: PopoverSource::Group(index),
            filter: String::new(),
            selected: 0,
        }
    }

    pub const fn search() -> Self {
        Self {
            source: PopoverSource::Search,
            filter: String::new(),
            selected: 0,
        }
    }

    /// Entries currently listed, in table order.
    pub fn entries(&self) -> Vec<(&'static str, &'static CommandEntry)> {
        match self.source {
            PopoverSource::Group(index) => commands::group(index)
                .map(|group| {
                    group
                        .commands
                        .iter()
                        .map(|entry| (group.name.as_str(), entry))
                        .collect()
                })
                .unwrap_or_default(),
            PopoverSource::Search => commands::search(&self.filter)
                .into_iter()
                .map(|found| (found.group, found.entry))
                .collect(),
        }
    }

    pub fn selected_entry(&self) -> Option<&'static CommandEntry> {
        self.entries().get(self.selected).map(|(_, entry)| *entry)
    }
}

/// Rasterized preview for one render at one pane size.
pub struct PreviewImage {
    pub seq: u64,
    pub area: (u16, u16),
    /// `None` when rasterization failed; the pane falls back to text.
    pub protocol: Option<(StatefulProtocol, u16, u16)>,
}

impl std::fmt::Debug for PreviewImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewImage")
            .field("seq", &self.seq)
            .field("area", &self.area)
            .field("rasterized", &self.protocol.is_some())
            .finish()
    }
}

/// The complete application state.
///
/// All state lives here - no global or scattered state.
pub struct Model {
    /// Document text with caret and selection
    pub buffer: EditorBuffer,
    /// Debounce and sequencing for engine renders
    pub scheduler: RenderScheduler,
    /// Buffer revision the scheduler was last told about
    seen_revision: u64,
    /// Display name of the typesetting engine
    pub engine_name: String,
    pub focus: Focus,
    /// Focus goes back to the editor after the next frame is drawn
    pub focus_restore_pending: bool,
    /// Highlighted group in the toolbar
    pub toolbar_group: usize,
    pub popover: Option<Popover>,
    pub example_picker_visible: bool,
    pub help_visible: bool,
    /// Blocking message; any key dismisses it
    pub alert: Option<String>,
    toast: Option<Toast>,
    /// First visible editor line
    pub editor_scroll_offset: usize,
    pub export_dir: PathBuf,
    pub export_options: ExportOptions,
    /// Whether the preview is drawn as an image
    pub preview_enabled: bool,
    /// Image picker for terminal rendering
    pub picker: Option<Picker>,
    pub preview_image: Option<PreviewImage>,
    pub terminal_size: (u16, u16),
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    pub should_quit: bool,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("focus", &self.focus)
            .field("render_state", &self.scheduler.state())
            .field("revision", &self.buffer.revision())
            .field("popover", &self.popover)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Create a model editing `markup`.
    pub fn new(markup: &str, terminal_size: (u16, u16)) -> Self {
        let buffer = EditorBuffer::from_text(markup);
        Self {
            seen_revision: buffer.revision(),
            buffer,
            terminal_size,
            ..Self::default()
        }
    }

    pub fn with_picker(mut self, picker: Option<Picker>) -> Self {
        self.picker = picker;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.scheduler = RenderScheduler::new(debounce);
        self
    }

    /// Any overlay that swallows keys is open.
    pub const fn overlay_active(&self) -> bool {
        self.alert.is_some()
            || self.help_visible
            || self.example_picker_visible
            || self.popover.is_some()
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }

    /// Complete a deferred focus change. Returns `true` if focus moved.
    pub fn apply_pending_focus(&mut self) -> bool {
        if !self.focus_restore_pending {
            return false;
        }
        self.focus_restore_pending = false;
        self.focus = Focus::Editor;
        true
    }

    /// Tell the scheduler about edits made since the last call.
    pub fn sync_text_changes(&mut self, now: Instant) -> bool {
        let revision = self.buffer.revision();
        if revision == self.seen_revision {
            return false;
        }
        self.seen_revision = revision;
        self.scheduler.text_changed(&self.buffer.text(), now);
        true
    }

    /// Fire the debounce timer if it is due.
    pub fn poll_render(&mut self, now: Instant) -> Option<RenderRequest> {
        self.scheduler.poll(&self.buffer.text(), now)
    }

    /// Apply an event from the render worker.
    ///
    /// Returns a request to submit when the engine just became ready.
    pub fn apply_worker_event(&mut self, event: WorkerEvent) -> Option<RenderRequest> {
        match event {
            WorkerEvent::EngineReady => {
                crate::perf::log_event("engine.ready", &self.engine_name);
                self.seen_revision = self.buffer.revision();
                self.scheduler.engine_ready(&self.buffer.text())
            }
            WorkerEvent::EngineUnavailable(err) => {
                tracing::warn!(engine = %self.engine_name, %err, "typesetting engine unavailable");
                self.show_toast(
                    ToastLevel::Warning,
                    format!("Typesetting engine unavailable: {err}"),
                );
                None
            }
            WorkerEvent::Rendered { seq, result } => {
                let ok = result.is_ok();
                let applied = self.scheduler.complete(seq, result);
                crate::perf::log_event(
                    "render.complete",
                    format!("seq={seq} ok={ok} applied={applied}"),
                );
                None
            }
        }
    }

    /// Keep the editor caret on screen for a pane of `height` rows.
    pub fn scroll_editor_to_caret(&mut self, height: usize) {
        let line = self.buffer.caret_position().line;
        let height = height.max(1);
        if line < self.editor_scroll_offset {
            self.editor_scroll_offset = line;
        } else if line >= self.editor_scroll_offset + height {
            self.editor_scroll_offset = line + 1 - height;
        }
        let max = self.buffer.line_count().saturating_sub(1);
        self.editor_scroll_offset = self.editor_scroll_offset.min(max);
    }

    /// Rebuild the preview image when the render or the pane size changed.
    pub fn refresh_preview_image(&mut self, inner: Rect) {
        if !self.preview_enabled || inner.width == 0 || inner.height == 0 {
            self.preview_image = None;
            return;
        }
        let Some(picker) = self.picker.as_ref() else {
            return;
        };
        let Some(typeset) = self.scheduler.preview().output() else {
            self.preview_image = None;
            return;
        };
        let seq = self.scheduler.applied_seq();
        let area = (inner.width, inner.height);
        if self
            .preview_image
            .as_ref()
            .is_some_and(|img| img.seq == seq && img.area == area)
        {
            return;
        }

        let _scope = crate::perf::scope("preview.rasterize");
        let font_size = picker.font_size();
        let max_w = u32::from(inner.width) * u32::from(font_size.0);
        let max_h = u32::from(inner.height) * u32::from(font_size.1);
        let protocol = match crate::preview::rasterize_svg(&typeset.svg, max_w, max_h) {
            Ok(image) => {
                let (cols, rows) = crate::preview::cells_for_image(image.dimensions(), font_size);
                crate::perf::log_event(
                    "preview.rasterize",
                    format!(
                        "seq={seq} px={}x{} cells={cols}x{rows} halfblocks={}",
                        image.width(),
                        image.height(),
                        matches!(picker.protocol_type(), ProtocolType::Halfblocks)
                    ),
                );
                Some((
                    picker.new_resize_protocol(image),
                    cols.clamp(1, inner.width),
                    rows.clamp(1, inner.height),
                ))
            }
            Err(err) => {
                tracing::warn!(seq, %err, "could not rasterize preview");
                None
            }
        };
        self.preview_image = Some(PreviewImage {
            seq,
            area,
            protocol,
        });
    }
}

// Implement Default for Model to allow std::mem::take
impl Default for Model {
    fn default() -> Self {
        Self {
            buffer: EditorBuffer::default(),
            scheduler: RenderScheduler::default(),
            seen_revision: 0,
            engine_name: String::new(),
            focus: Focus::Editor,
            focus_restore_pending: false,
            toolbar_group: 0,
            popover: None,
            example_picker_visible: false,
            help_visible: false,
            alert: None,
            toast: None,
            editor_scroll_offset: 0,
            export_dir: PathBuf::from("."),
            export_options: ExportOptions::default(),
            preview_enabled: true,
            picker: None,
            preview_image: None,
            terminal_size: (80, 24),
            config_global_path: None,
            config_local_path: None,
            should_quit: false,
        }
    }
}
