use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::model::{Focus, PopoverSource};
use crate::app::{App, Message, Model};
use crate::commands;
use crate::editor::{Direction, normalize_line_breaks};

use super::event_loop::ResizeDebouncer;

impl App {
    pub(super) fn handle_event(
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::handle_key(*key, model),
            Event::Paste(text) if !model.overlay_active() && model.focus == Focus::Editor => {
                Some(Message::InsertSnippet(normalize_line_breaks(text)))
            }
            Event::Resize(w, h) => {
                crate::perf::log_event("event.resize.queue", format!("width={w} height={h}"));
                resize_debouncer.queue(*w, *h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        if model.alert.is_some() {
            return Some(Message::DismissAlert);
        }

        if ctrl && matches!(key.code, KeyCode::Char('q' | 'c')) {
            return Some(Message::Quit);
        }

        if model.help_visible {
            return Some(Message::HideHelp);
        }

        if model.example_picker_visible {
            return match key.code {
                KeyCode::Char(c @ '1'..='9') => {
                    let index = (c as usize) - ('1' as usize);
                    (index < commands::examples().len()).then_some(Message::LoadExample(index))
                }
                KeyCode::Esc => Some(Message::HideExamples),
                KeyCode::Char('e') if ctrl => Some(Message::HideExamples),
                _ => None,
            };
        }

        if let Some(popover) = model.popover.as_ref() {
            return match key.code {
                KeyCode::Esc => Some(Message::ClosePopover),
                KeyCode::Up => Some(Message::PopoverUp),
                KeyCode::Down => Some(Message::PopoverDown),
                KeyCode::Enter => Some(Message::PopoverConfirm),
                KeyCode::Char('p') if ctrl => Some(Message::ClosePopover),
                KeyCode::Backspace if popover.source == PopoverSource::Search => {
                    let mut next = popover.filter.clone();
                    next.pop();
                    Some(Message::PopoverFilter(next))
                }
                KeyCode::Char(c) if popover.source == PopoverSource::Search && !ctrl => {
                    let mut next = popover.filter.clone();
                    next.push(c);
                    Some(Message::PopoverFilter(next))
                }
                _ => None,
            };
        }

        // Shortcuts available in both panes
        match key.code {
            KeyCode::Char('p') if ctrl => return Some(Message::OpenSearch),
            KeyCode::Char('e') if ctrl => return Some(Message::ShowExamples),
            KeyCode::Char('l') if ctrl => return Some(Message::Clear),
            KeyCode::Char('s') if ctrl => return Some(Message::Export),
            KeyCode::Char('y') if ctrl => return Some(Message::CopyMarkup),
            KeyCode::F(1) => return Some(Message::ToggleHelp),
            KeyCode::Tab | KeyCode::BackTab => return Some(Message::SwitchFocus),
            _ => {}
        }

        if model.focus == Focus::Toolbar {
            return match key.code {
                KeyCode::Left => Some(Message::ToolbarPrev),
                KeyCode::Right => Some(Message::ToolbarNext),
                KeyCode::Enter | KeyCode::Down => Some(Message::OpenGroup),
                KeyCode::Esc => Some(Message::SwitchFocus),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Char('a') if ctrl => Some(Message::SelectAll),
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                Some(Message::InsertChar(c))
            }
            KeyCode::Enter => Some(Message::Newline),
            KeyCode::Backspace => Some(Message::DeleteBack),
            KeyCode::Delete => Some(Message::DeleteForward),
            KeyCode::Left if ctrl => Some(Message::MoveWordLeft(shift)),
            KeyCode::Right if ctrl => Some(Message::MoveWordRight(shift)),
            KeyCode::Left => Some(Message::MoveCursor(Direction::Left, shift)),
            KeyCode::Right => Some(Message::MoveCursor(Direction::Right, shift)),
            KeyCode::Up => Some(Message::MoveCursor(Direction::Up, shift)),
            KeyCode::Down => Some(Message::MoveCursor(Direction::Down, shift)),
            KeyCode::Home => Some(Message::MoveHome(shift)),
            KeyCode::End => Some(Message::MoveEnd(shift)),
            _ => None,
        }
    }
}
