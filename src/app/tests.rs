use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tempfile::tempdir;

use crate::commands;
use crate::editor::Direction;
use crate::engine::testing::{SAMPLE_SVG, ScriptedEngine};
use crate::engine::{RenderError, Typeset};
use crate::scheduler::{Preview, RENDER_ERROR_MESSAGE, RenderState, RenderWorker, WorkerEvent};

use super::event_loop::{ResizeDebouncer, poll_timeout};
use super::{App, Focus, Message, Model, Popover, PopoverSource, ToastLevel, update};

const WAIT: Duration = Duration::from_secs(5);

fn create_test_model() -> Model {
    Model::new("x^2", (80, 24))
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

/// Engine ready, initial render applied with the sample output.
fn ready_model(markup: &str) -> Model {
    let mut model = Model::new(markup, (80, 24)).with_debounce(ms(500));
    if let Some(request) = model.apply_worker_event(WorkerEvent::EngineReady) {
        model.apply_worker_event(rendered(request.seq, &request.markup));
    }
    model
}

fn rendered(seq: u64, markup: &str) -> WorkerEvent {
    WorkerEvent::Rendered {
        seq,
        result: Ok(Typeset {
            markup: markup.to_string(),
            svg: SAMPLE_SVG.to_string(),
        }),
    }
}

fn type_text(mut model: Model, text: &str) -> Model {
    for ch in text.chars() {
        model = update(model, Message::InsertChar(ch));
    }
    model
}

// ---------------------------------------------------------------------------
// Editing

#[test]
fn test_insert_char_appends_at_caret() {
    let model = type_text(create_test_model(), "+1");
    assert_eq!(model.buffer.text(), "x^2+1");
}

#[test]
fn test_snippet_replaces_selection() {
    let mut model = Model::new("a + b", (80, 24));
    model.buffer.set_selection(4, 5);
    let model = update(model, Message::InsertSnippet(r"\beta".to_string()));
    assert_eq!(model.buffer.text(), r"a + \beta");
    assert_eq!(model.buffer.caret(), 9);
    assert!(model.buffer.selection().is_empty());
}

#[test]
fn test_newline_and_delete_back() {
    let model = update(create_test_model(), Message::Newline);
    assert_eq!(model.buffer.text(), "x^2\n");
    let model = update(model, Message::DeleteBack);
    assert_eq!(model.buffer.text(), "x^2");
}

#[test]
fn test_select_all_then_type_replaces_everything() {
    let model = update(create_test_model(), Message::SelectAll);
    let model = update(model, Message::InsertChar('y'));
    assert_eq!(model.buffer.text(), "y");
}

#[test]
fn test_move_cursor_with_shift_extends_selection() {
    let model = update(create_test_model(), Message::MoveCursor(Direction::Left, true));
    let model = update(model, Message::MoveCursor(Direction::Left, true));
    assert_eq!(model.buffer.selected_text().as_deref(), Some("^2"));
    let model = update(model, Message::MoveHome(false));
    assert_eq!(model.buffer.caret(), 0);
    assert!(model.buffer.selection().is_empty());
}

// ---------------------------------------------------------------------------
// Toolbar and popover

#[test]
fn test_switch_focus_toggles_panes() {
    let model = update(create_test_model(), Message::SwitchFocus);
    assert_eq!(model.focus, Focus::Toolbar);
    let model = update(model, Message::SwitchFocus);
    assert_eq!(model.focus, Focus::Editor);
}

#[test]
fn test_toolbar_navigation_wraps() {
    let last = commands::groups().len() - 1;
    let model = update(create_test_model(), Message::ToolbarPrev);
    assert_eq!(model.toolbar_group, last);
    let model = update(model, Message::ToolbarNext);
    assert_eq!(model.toolbar_group, 0);
}

#[test]
fn test_open_group_shows_group_commands() {
    let mut model = create_test_model();
    model.toolbar_group = 1;
    let model = update(model, Message::OpenGroup);
    let popover = model.popover.as_ref().expect("popover");
    assert_eq!(popover.source, PopoverSource::Group(1));
    assert_eq!(popover.entries().len(), commands::groups()[1].commands.len());
    assert_eq!(model.focus, Focus::Toolbar);
}

#[test]
fn test_popover_down_stops_at_last_entry() {
    let mut model = update(create_test_model(), Message::OpenGroup);
    let count = commands::groups()[0].commands.len();
    for _ in 0..count + 5 {
        model = update(model, Message::PopoverDown);
    }
    assert_eq!(model.popover.as_ref().unwrap().selected, count - 1);
    let model = update(model, Message::PopoverUp);
    assert_eq!(model.popover.as_ref().unwrap().selected, count - 2);
}

#[test]
fn test_popover_up_stops_at_first_entry() {
    let model = update(create_test_model(), Message::OpenGroup);
    let model = update(model, Message::PopoverUp);
    assert_eq!(model.popover.as_ref().unwrap().selected, 0);
}

#[test]
fn test_confirm_from_toolbar_inserts_and_defers_focus() {
    let model = update(create_test_model(), Message::SwitchFocus);
    let model = update(model, Message::OpenGroup);
    let model = update(model, Message::PopoverDown);
    let snippet = model
        .popover
        .as_ref()
        .and_then(Popover::selected_entry)
        .map(|entry| entry.snippet.clone())
        .unwrap();

    let mut model = update(model, Message::PopoverConfirm);
    assert_eq!(model.buffer.text(), format!("x^2{snippet}"));
    assert!(model.popover.is_none());
    // Still on the toolbar until the frame with the new text is drawn.
    assert_eq!(model.focus, Focus::Toolbar);
    assert!(model.focus_restore_pending);

    assert!(model.apply_pending_focus());
    assert_eq!(model.focus, Focus::Editor);
    assert!(!model.apply_pending_focus());
}

#[test]
fn test_switch_focus_cancels_pending_restore() {
    let model = update(create_test_model(), Message::SwitchFocus);
    let model = update(model, Message::OpenGroup);
    let model = update(model, Message::PopoverConfirm);
    assert!(model.focus_restore_pending);
    let mut model = update(model, Message::SwitchFocus);
    assert!(!model.focus_restore_pending);
    assert_eq!(model.focus, Focus::Editor);
    assert!(!model.apply_pending_focus());
}

#[test]
fn test_search_filter_resets_selection_and_inserts() {
    let model = update(create_test_model(), Message::OpenSearch);
    let model = update(model, Message::PopoverDown);
    let model = update(model, Message::PopoverFilter("alpha".to_string()));
    let popover = model.popover.as_ref().unwrap();
    assert_eq!(popover.selected, 0);
    assert_eq!(popover.entries().len(), 1);

    let model = update(model, Message::PopoverConfirm);
    assert_eq!(model.buffer.text(), r"x^2\alpha");
    assert_eq!(model.focus, Focus::Editor);
    assert!(!model.focus_restore_pending);
}

#[test]
fn test_confirm_with_no_hits_closes_without_inserting() {
    let model = update(create_test_model(), Message::OpenSearch);
    let model = update(model, Message::PopoverFilter("no such command".to_string()));
    let revision = model.buffer.revision();
    let model = update(model, Message::PopoverConfirm);
    assert!(model.popover.is_none());
    assert_eq!(model.buffer.revision(), revision);
}

#[test]
fn test_close_popover() {
    let model = update(create_test_model(), Message::OpenSearch);
    let model = update(model, Message::ClosePopover);
    assert!(model.popover.is_none());
    assert!(!model.overlay_active());
}

// ---------------------------------------------------------------------------
// Examples and clearing

#[test]
fn test_load_example_replaces_text() {
    let model = update(create_test_model(), Message::ShowExamples);
    assert!(model.example_picker_visible);
    let model = update(model, Message::LoadExample(1));
    assert!(!model.example_picker_visible);
    assert_eq!(model.buffer.text(), commands::examples()[1].markup);
    assert_eq!(model.focus, Focus::Editor);
}

#[test]
fn test_loading_same_example_twice_does_not_change_revision() {
    let model = update(create_test_model(), Message::LoadExample(0));
    let revision = model.buffer.revision();
    let model = update(model, Message::LoadExample(0));
    assert_eq!(model.buffer.revision(), revision);
}

#[test]
fn test_load_example_out_of_range_only_closes_picker() {
    let model = update(create_test_model(), Message::ShowExamples);
    let model = update(model, Message::LoadExample(99));
    assert!(!model.example_picker_visible);
    assert_eq!(model.buffer.text(), "x^2");
}

#[test]
fn test_show_examples_closes_popover() {
    let model = update(create_test_model(), Message::OpenSearch);
    let model = update(model, Message::ShowExamples);
    assert!(model.popover.is_none());
    assert!(model.example_picker_visible);
}

#[test]
fn test_clear_empties_document_and_focuses_editor() {
    let model = update(create_test_model(), Message::SwitchFocus);
    let model = update(model, Message::Clear);
    assert_eq!(model.buffer.text(), "");
    assert_eq!(model.focus, Focus::Editor);
}

// ---------------------------------------------------------------------------
// Misc messages

#[test]
fn test_toggle_help_and_quit() {
    let model = update(create_test_model(), Message::ToggleHelp);
    assert!(model.help_visible);
    let model = update(model, Message::HideHelp);
    assert!(!model.help_visible);
    let model = update(model, Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_resize_updates_terminal_size() {
    let model = update(create_test_model(), Message::Resize(120, 40));
    assert_eq!(model.terminal_size, (120, 40));
}

#[test]
fn test_dismiss_alert() {
    let mut model = create_test_model();
    model.alert = Some("boom".to_string());
    assert!(model.overlay_active());
    let model = update(model, Message::DismissAlert);
    assert!(model.alert.is_none());
}

#[test]
fn test_toast_expires() {
    let mut model = create_test_model();
    model.show_toast(ToastLevel::Info, "hello");
    assert_eq!(model.active_toast(), Some(("hello", ToastLevel::Info)));
    assert!(!model.expire_toast(Instant::now()));
    assert!(model.expire_toast(Instant::now() + Duration::from_secs(5)));
    assert!(model.active_toast().is_none());
}

#[test]
fn test_scroll_editor_follows_caret() {
    let text: String = (0..30).map(|i| format!("line {i}\n")).collect();
    let mut model = Model::new(&text, (80, 24));
    model.scroll_editor_to_caret(10);
    assert_eq!(model.editor_scroll_offset, 21);
    model.buffer.set_selection(0, 0);
    model.scroll_editor_to_caret(10);
    assert_eq!(model.editor_scroll_offset, 0);
}

// ---------------------------------------------------------------------------
// Render scheduling through the model

#[test]
fn test_edits_are_synced_once() {
    let mut model = type_text(ready_model("x"), "y");
    let now = Instant::now();
    assert!(model.sync_text_changes(now));
    assert!(!model.sync_text_changes(now));
    assert_eq!(model.scheduler.next_deadline(), Some(now + ms(500)));
}

#[test]
fn test_render_fires_after_quiet_period_with_latest_text() {
    let mut model = ready_model("x");
    let t0 = Instant::now();
    model = type_text(model, "+");
    model.sync_text_changes(t0);
    model = type_text(model, "1");
    model.sync_text_changes(t0 + ms(300));

    assert!(model.poll_render(t0 + ms(700)).is_none());
    let request = model.poll_render(t0 + ms(800)).expect("render after debounce");
    assert_eq!(request.markup, "x+1");
    assert_eq!(model.scheduler.state(), RenderState::Rendering);
}

#[test]
fn test_edits_while_loading_render_when_engine_becomes_ready() {
    let mut model = create_test_model();
    model = type_text(model, "+y");
    model.sync_text_changes(Instant::now());
    assert_eq!(model.scheduler.preview(), &Preview::Loading);
    assert!(model.scheduler.next_deadline().is_none());

    let request = model
        .apply_worker_event(WorkerEvent::EngineReady)
        .expect("initial render");
    assert_eq!(request.markup, "x^2+y");
    // The ready render already covers these edits.
    assert!(!model.sync_text_changes(Instant::now()));
}

#[test]
fn test_unavailable_engine_keeps_loading_and_warns() {
    let mut model = create_test_model();
    let next = model.apply_worker_event(WorkerEvent::EngineUnavailable(
        RenderError::EngineUnavailable("no tex2svg".to_string()),
    ));
    assert!(next.is_none());
    assert_eq!(model.scheduler.state(), RenderState::EngineLoading);
    let (message, level) = model.active_toast().unwrap();
    assert_eq!(level, ToastLevel::Warning);
    assert!(message.starts_with("Typesetting engine unavailable"));
    assert_eq!(model.scheduler.preview(), &Preview::Loading);
}

#[test]
fn test_out_of_order_results_keep_latest() {
    let mut model = ready_model("a");
    let t0 = Instant::now();
    model = type_text(model, "b");
    model.sync_text_changes(t0);
    let first = model.poll_render(t0 + ms(500)).unwrap();
    model = type_text(model, "c");
    model.sync_text_changes(t0 + ms(600));
    let second = model.poll_render(t0 + ms(1_100)).unwrap();

    model.apply_worker_event(rendered(second.seq, &second.markup));
    model.apply_worker_event(rendered(first.seq, &first.markup));
    assert_eq!(
        model.scheduler.preview().output().map(|t| t.markup.as_str()),
        Some("abc")
    );
}

#[test]
fn test_failed_render_shows_error_then_recovers() {
    let mut model = ready_model("a");
    let t0 = Instant::now();
    model = type_text(model, "}");
    model.sync_text_changes(t0);
    let bad = model.poll_render(t0 + ms(500)).unwrap();
    model.apply_worker_event(WorkerEvent::Rendered {
        seq: bad.seq,
        result: Err(RenderError::InvalidOutput("nope".to_string())),
    });
    assert_eq!(
        model.scheduler.preview(),
        &Preview::Error(RENDER_ERROR_MESSAGE.to_string())
    );

    model = update(model, Message::DeleteBack);
    model.sync_text_changes(t0 + ms(600));
    let good = model.poll_render(t0 + ms(1_100)).unwrap();
    model.apply_worker_event(rendered(good.seq, &good.markup));
    assert_eq!(model.scheduler.state(), RenderState::Idle);
}

#[test]
fn test_clearing_shows_placeholder_immediately() {
    let mut model = ready_model("x");
    model = update(model, Message::Clear);
    model.sync_text_changes(Instant::now());
    assert_eq!(model.scheduler.preview(), &Preview::Placeholder);
}

#[test]
fn test_worker_round_trip_with_scripted_engine() {
    let engine = Arc::new(ScriptedEngine::new(true));
    let worker = RenderWorker::new(Arc::clone(&engine) as Arc<dyn crate::engine::TypesetEngine>);
    let mut model = create_test_model();
    worker.spawn_readiness();

    let ready = worker.recv_timeout(WAIT).expect("readiness event");
    let request = model.apply_worker_event(ready).expect("initial render");
    worker.submit(request);
    let done = worker.recv_timeout(WAIT).expect("render result");
    assert!(model.apply_worker_event(done).is_none());

    assert_eq!(model.scheduler.state(), RenderState::Idle);
    assert_eq!(
        model.scheduler.preview().output().map(|t| t.svg.as_str()),
        Some(SAMPLE_SVG)
    );
    assert_eq!(engine.calls.lock().unwrap().as_slice(), ["x^2".to_string()]);
}

// ---------------------------------------------------------------------------
// Side effects

#[test]
fn test_export_before_engine_ready_warns() {
    let mut model = create_test_model();
    App::handle_message_side_effects(&mut model, &Message::Export);
    let (message, level) = model.active_toast().unwrap();
    assert_eq!(level, ToastLevel::Warning);
    assert!(message.contains("still loading"));
    assert!(model.alert.is_none());
}

#[test]
fn test_export_without_formula_raises_alert() {
    let dir = tempdir().unwrap();
    let mut model = ready_model("  ");
    model.export_dir = dir.path().to_path_buf();
    App::handle_message_side_effects(&mut model, &Message::Export);
    assert_eq!(
        model.alert.as_deref(),
        Some("No formula to export. Render a formula first.")
    );
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_export_writes_svg_file() {
    let dir = tempdir().unwrap();
    let mut model = ready_model("x^2");
    model.export_dir = dir.path().join("out");
    App::handle_message_side_effects(&mut model, &Message::Export);

    assert!(model.alert.is_none(), "{:?}", model.alert);
    let (message, level) = model.active_toast().unwrap();
    assert_eq!(level, ToastLevel::Info);
    assert!(message.starts_with("Exported "));

    let files: Vec<_> = std::fs::read_dir(dir.path().join("out"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("formula-") && files[0].ends_with(".svg"));
}

#[test]
fn test_copy_blank_document_reports_nothing_to_copy() {
    let mut model = Model::new("  ", (80, 24));
    App::handle_message_side_effects(&mut model, &Message::CopyMarkup);
    assert_eq!(model.active_toast(), Some(("Nothing to copy", ToastLevel::Info)));
}

// ---------------------------------------------------------------------------
// Input mapping

#[test]
fn test_ctrl_q_quits_from_anywhere() {
    let mut model = update(create_test_model(), Message::OpenSearch);
    assert_eq!(App::handle_key(ctrl('q'), &model), Some(Message::Quit));
    model.popover = None;
    model.help_visible = true;
    assert_eq!(App::handle_key(ctrl('c'), &model), Some(Message::Quit));
}

#[test]
fn test_any_key_dismisses_alert() {
    let mut model = create_test_model();
    model.alert = Some("boom".to_string());
    assert_eq!(App::handle_key(ctrl('q'), &model), Some(Message::DismissAlert));
    assert_eq!(
        App::handle_key(key(KeyCode::Char('x')), &model),
        Some(Message::DismissAlert)
    );
}

#[test]
fn test_example_picker_keys() {
    let model = update(create_test_model(), Message::ShowExamples);
    assert_eq!(
        App::handle_key(key(KeyCode::Char('2')), &model),
        Some(Message::LoadExample(1))
    );
    assert_eq!(App::handle_key(key(KeyCode::Char('0')), &model), None);
    assert_eq!(App::handle_key(key(KeyCode::Char('x')), &model), None);
    assert_eq!(App::handle_key(key(KeyCode::Esc), &model), Some(Message::HideExamples));
}

#[test]
fn test_search_popover_typing_edits_filter() {
    let mut model = update(create_test_model(), Message::OpenSearch);
    assert_eq!(
        App::handle_key(key(KeyCode::Char('s')), &model),
        Some(Message::PopoverFilter("s".to_string()))
    );
    model = update(model, Message::PopoverFilter("su".to_string()));
    assert_eq!(
        App::handle_key(key(KeyCode::Backspace), &model),
        Some(Message::PopoverFilter("s".to_string()))
    );
    assert_eq!(App::handle_key(key(KeyCode::Enter), &model), Some(Message::PopoverConfirm));
    assert_eq!(App::handle_key(key(KeyCode::Down), &model), Some(Message::PopoverDown));
}

#[test]
fn test_group_popover_ignores_typing() {
    let model = update(create_test_model(), Message::OpenGroup);
    assert_eq!(App::handle_key(key(KeyCode::Char('s')), &model), None);
    assert_eq!(App::handle_key(key(KeyCode::Esc), &model), Some(Message::ClosePopover));
}

#[test]
fn test_toolbar_keys() {
    let model = update(create_test_model(), Message::SwitchFocus);
    assert_eq!(App::handle_key(key(KeyCode::Left), &model), Some(Message::ToolbarPrev));
    assert_eq!(App::handle_key(key(KeyCode::Right), &model), Some(Message::ToolbarNext));
    assert_eq!(App::handle_key(key(KeyCode::Enter), &model), Some(Message::OpenGroup));
    assert_eq!(App::handle_key(key(KeyCode::Down), &model), Some(Message::OpenGroup));
    assert_eq!(App::handle_key(key(KeyCode::Esc), &model), Some(Message::SwitchFocus));
    assert_eq!(App::handle_key(key(KeyCode::Char('a')), &model), None);
}

#[test]
fn test_global_shortcuts() {
    let model = create_test_model();
    assert_eq!(App::handle_key(ctrl('p'), &model), Some(Message::OpenSearch));
    assert_eq!(App::handle_key(ctrl('e'), &model), Some(Message::ShowExamples));
    assert_eq!(App::handle_key(ctrl('l'), &model), Some(Message::Clear));
    assert_eq!(App::handle_key(ctrl('s'), &model), Some(Message::Export));
    assert_eq!(App::handle_key(ctrl('y'), &model), Some(Message::CopyMarkup));
    assert_eq!(App::handle_key(key(KeyCode::F(1)), &model), Some(Message::ToggleHelp));
    assert_eq!(App::handle_key(key(KeyCode::Tab), &model), Some(Message::SwitchFocus));
}

#[test]
fn test_editor_keys() {
    let model = create_test_model();
    assert_eq!(
        App::handle_key(key(KeyCode::Char('z')), &model),
        Some(Message::InsertChar('z'))
    );
    assert_eq!(App::handle_key(key(KeyCode::Enter), &model), Some(Message::Newline));
    assert_eq!(App::handle_key(ctrl('a'), &model), Some(Message::SelectAll));
    assert_eq!(
        App::handle_key(KeyEvent::new(KeyCode::Left, KeyModifiers::SHIFT), &model),
        Some(Message::MoveCursor(Direction::Left, true))
    );
    assert_eq!(
        App::handle_key(KeyEvent::new(KeyCode::Right, KeyModifiers::CONTROL), &model),
        Some(Message::MoveWordRight(false))
    );
    assert_eq!(
        App::handle_key(
            KeyEvent::new(KeyCode::End, KeyModifiers::SHIFT),
            &model
        ),
        Some(Message::MoveEnd(true))
    );
}

#[test]
fn test_key_release_is_ignored() {
    let model = create_test_model();
    let mut debouncer = ResizeDebouncer::new(100);
    let release = Event::Key(KeyEvent::new_with_kind(
        KeyCode::Char('a'),
        KeyModifiers::NONE,
        KeyEventKind::Release,
    ));
    assert_eq!(App::handle_event(&release, &model, 0, &mut debouncer), None);
}

#[test]
fn test_paste_inserts_normalized_snippet() {
    let model = create_test_model();
    let mut debouncer = ResizeDebouncer::new(100);
    let paste = Event::Paste("a\r\nb".to_string());
    assert_eq!(
        App::handle_event(&paste, &model, 0, &mut debouncer),
        Some(Message::InsertSnippet("a\nb".to_string()))
    );

    let toolbar = update(create_test_model(), Message::SwitchFocus);
    assert_eq!(App::handle_event(&paste, &toolbar, 0, &mut debouncer), None);
}

#[test]
fn test_paste_with_carriage_returns_keeps_editor_lines_in_step() {
    let model = Model::new("", (80, 24));
    let mut debouncer = ResizeDebouncer::new(100);
    let paste = Event::Paste("a\rb".to_string());
    let message = App::handle_event(&paste, &model, 0, &mut debouncer).expect("paste message");
    assert_eq!(message, Message::InsertSnippet("a\nb".to_string()));

    let model = update(model, message);
    let text = model.buffer.text();
    assert_eq!(text, "a\nb");
    assert_eq!(model.buffer.line_count(), 2);
    assert_eq!(
        crate::highlight::highlight_markup(&text).len(),
        model.buffer.line_count()
    );
    assert_eq!(model.buffer.caret_position().line, 1);
}

// ---------------------------------------------------------------------------
// Event loop helpers

#[test]
fn test_resize_event_is_debounced() {
    let model = create_test_model();
    let mut debouncer = ResizeDebouncer::new(100);
    assert_eq!(
        App::handle_event(&Event::Resize(100, 30), &model, 0, &mut debouncer),
        None
    );
    assert!(debouncer.is_pending());
    assert_eq!(debouncer.take_ready(50), None);
    assert_eq!(debouncer.take_ready(100), Some((100, 30)));
    assert!(!debouncer.is_pending());
}

#[test]
fn test_later_resize_replaces_earlier() {
    let mut debouncer = ResizeDebouncer::new(100);
    debouncer.queue(100, 30, 0);
    debouncer.queue(120, 40, 80);
    assert_eq!(debouncer.take_ready(120), None);
    assert_eq!(debouncer.take_ready(180), Some((120, 40)));
}

#[test]
fn test_poll_timeout_is_zero_when_frame_is_due() {
    let model = create_test_model();
    assert_eq!(poll_timeout(&model, Instant::now(), true, false), Duration::ZERO);
}

#[test]
fn test_poll_timeout_idles_while_loading() {
    let model = create_test_model();
    assert_eq!(poll_timeout(&model, Instant::now(), false, false), ms(250));
    assert_eq!(poll_timeout(&model, Instant::now(), false, true), ms(10));
}

#[test]
fn test_poll_timeout_is_short_while_rendering() {
    let mut model = create_test_model();
    model.apply_worker_event(WorkerEvent::EngineReady);
    assert_eq!(model.scheduler.state(), RenderState::Rendering);
    assert_eq!(poll_timeout(&model, Instant::now(), false, false), ms(25));
}

#[test]
fn test_poll_timeout_wakes_for_debounce_deadline() {
    let mut model = ready_model("x");
    let now = Instant::now();
    model = type_text(model, "y");
    model.sync_text_changes(now);
    assert_eq!(poll_timeout(&model, now + ms(400), false, false), ms(100));
    assert_eq!(poll_timeout(&model, now + ms(600), false, false), Duration::ZERO);
}
