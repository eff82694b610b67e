use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;

use crate::app::{App, Message, Model, update};
use crate::scheduler::{RenderState, RenderWorker};

/// Poll interval while nothing is scheduled.
const IDLE_POLL: Duration = Duration::from_millis(250);
/// Poll interval while the worker may post results.
const BUSY_POLL: Duration = Duration::from_millis(25);

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// How long the loop may block waiting for input.
pub(super) fn poll_timeout(
    model: &Model,
    now: Instant,
    needs_render: bool,
    resize_pending: bool,
) -> Duration {
    if needs_render {
        return Duration::ZERO;
    }
    let mut timeout = if resize_pending {
        Duration::from_millis(10)
    } else {
        IDLE_POLL
    };
    if model.scheduler.state() == RenderState::Rendering {
        timeout = timeout.min(BUSY_POLL);
    }
    if let Some(deadline) = model.scheduler.next_deadline() {
        timeout = timeout.min(deadline.saturating_duration_since(now));
    }
    timeout
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization or the event loop
    /// encounters an I/O failure.
    pub fn run(&mut self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        // Create image picker BEFORE initializing terminal (queries stdio)
        let picker = if self.preview_enabled {
            let _picker_scope = crate::perf::scope("app.create_picker");
            crate::preview::create_picker(self.force_half_cell)
        } else {
            None
        };

        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; mathpad requires an interactive terminal")?;
        let size = terminal.size()?;
        let _ = execute!(stdout(), EnableBracketedPaste);
        drop(init_scope);

        let mut model = Model::new(&self.initial_markup, (size.width, size.height))
            .with_picker(picker)
            .with_debounce(self.debounce);
        model.engine_name = self.engine.name().to_string();
        model.export_dir.clone_from(&self.export_dir);
        model.preview_enabled = self.preview_enabled;
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);
        crate::perf::log_event(
            "init.model",
            format!(
                "terminal={}x{} engine={} debounce_ms={} preview={}",
                size.width,
                size.height,
                model.engine_name,
                self.debounce.as_millis(),
                self.preview_enabled
            ),
        );

        let worker = RenderWorker::new(Arc::clone(&self.engine));
        worker.spawn_readiness();

        let result = Self::event_loop(&mut terminal, &mut model, &worker);

        // Restore terminal
        let _ = execute!(stdout(), DisableBracketedPaste);
        ratatui::restore();

        result
    }

    fn apply_message(model: &mut Model, msg: Message) {
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        Self::handle_message_side_effects(model, &side_msg);
    }

    fn event_loop(
        terminal: &mut DefaultTerminal,
        model: &mut Model,
        worker: &RenderWorker,
    ) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;

        loop {
            let now = Instant::now();
            if model.expire_toast(now) {
                needs_render = true;
            }

            for event in worker.drain() {
                if let Some(request) = model.apply_worker_event(event) {
                    worker.submit(request);
                }
                needs_render = true;
            }

            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                crate::perf::log_event(
                    "event.resize.apply",
                    format!("frame={frame_idx} width={width} height={height}"),
                );
                *model = update(std::mem::take(model), Message::Resize(width, height));
                needs_render = true;
            }

            if let Some(request) = model.poll_render(Instant::now()) {
                worker.submit(request);
                needs_render = true;
            }

            let timeout = poll_timeout(
                model,
                Instant::now(),
                needs_render,
                resize_debouncer.is_pending(),
            );
            if event::poll(timeout)? {
                // Coalesce key repeat bursts into a single render.
                let mut handled = 0_u32;
                loop {
                    let event_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    let msg =
                        Self::handle_event(&event::read()?, model, event_ms, &mut resize_debouncer);
                    if let Some(msg) = msg {
                        crate::perf::log_event(
                            "event.message",
                            format!("frame={frame_idx} msg={msg:?}"),
                        );
                        Self::apply_message(model, msg);
                        handled += 1;
                        needs_render = true;
                    }
                    if model.should_quit || !event::poll(Duration::ZERO)? {
                        break;
                    }
                }
                if handled > 1 {
                    crate::perf::log_event(
                        "event.drain",
                        format!("frame={frame_idx} handled={handled}"),
                    );
                }
            }

            // Start the debounce from the time of the edit, not the next tick.
            if model.sync_text_changes(Instant::now()) {
                needs_render = true;
            }

            if model.should_quit {
                break;
            }

            if needs_render {
                frame_idx += 1;
                let area = Rect::new(0, 0, model.terminal_size.0, model.terminal_size.1);
                let prep_start = Instant::now();
                model.refresh_preview_image(crate::ui::preview_inner_area(area));
                model.scroll_editor_to_caret(usize::from(crate::ui::editor_inner_area(area).height));
                crate::perf::log_event(
                    "frame.prep",
                    format!(
                        "frame={} prep_ms={:.3} state={:?}",
                        frame_idx,
                        prep_start.elapsed().as_secs_f64() * 1000.0,
                        model.scheduler.state()
                    ),
                );

                let draw_start = Instant::now();
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                crate::perf::log_event(
                    "frame.draw",
                    format!(
                        "frame={} draw_ms={:.3}",
                        frame_idx,
                        draw_start.elapsed().as_secs_f64() * 1000.0
                    ),
                );

                // Focus moves only once the inserted text is on screen.
                needs_render = model.apply_pending_focus();
            }
        }
        Ok(())
    }
}
