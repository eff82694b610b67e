use crate::app::Model;
use crate::app::model::{Focus, Popover};
use crate::commands;
use crate::editor::Direction;

/// All possible events and actions in the application.
///
/// These represent user input and system events. Engine traffic does not go
/// through here; the event loop feeds it to the model directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Editing
    /// Insert a character at the caret
    InsertChar(char),
    /// Split the line at the caret (Enter)
    Newline,
    /// Delete selection or the char before the caret (Backspace)
    DeleteBack,
    /// Delete selection or the char at the caret (Delete)
    DeleteForward,
    /// Move the caret, optionally extending the selection
    MoveCursor(Direction, bool),
    MoveHome(bool),
    MoveEnd(bool),
    MoveWordLeft(bool),
    MoveWordRight(bool),
    SelectAll,
    /// Splice a snippet at the caret, replacing any selection
    InsertSnippet(String),

    // Toolbar and popover
    /// Move focus between editor and toolbar
    SwitchFocus,
    ToolbarPrev,
    ToolbarNext,
    /// Open the popover for the highlighted toolbar group
    OpenGroup,
    /// Open palette-wide command search
    OpenSearch,
    PopoverUp,
    PopoverDown,
    /// Replace the search filter
    PopoverFilter(String),
    /// Insert the highlighted command
    PopoverConfirm,
    ClosePopover,

    // Examples
    ShowExamples,
    HideExamples,
    /// Replace the document with example `n` (0-based)
    LoadExample(usize),
    /// Empty the document
    Clear,

    // Side-effecting actions (see `handle_message_side_effects`)
    /// Write the rendered formula to an SVG file
    Export,
    /// Copy the markup to the clipboard
    CopyMarkup,

    ToggleHelp,
    HideHelp,
    DismissAlert,
    /// Terminal resized
    Resize(u16, u16),
    /// Force redraw
    Redraw,
    Quit,
}

/// Pure function that updates the model based on a message.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::InsertChar(ch) => model.buffer.insert_char(ch),
        Message::Newline => model.buffer.split_line(),
        Message::DeleteBack => {
            model.buffer.delete_back();
        }
        Message::DeleteForward => {
            model.buffer.delete_forward();
        }
        Message::MoveCursor(dir, extend) => model.buffer.move_cursor(dir, extend),
        Message::MoveHome(extend) => model.buffer.move_home(extend),
        Message::MoveEnd(extend) => model.buffer.move_end(extend),
        Message::MoveWordLeft(extend) => model.buffer.move_word_left(extend),
        Message::MoveWordRight(extend) => model.buffer.move_word_right(extend),
        Message::SelectAll => model.buffer.select_all(),
        Message::InsertSnippet(snippet) => insert_and_refocus(&mut model, &snippet),

        Message::SwitchFocus => {
            model.focus_restore_pending = false;
            model.focus = match model.focus {
                Focus::Editor => Focus::Toolbar,
                Focus::Toolbar => Focus::Editor,
            };
        }
        Message::ToolbarPrev => {
            let count = commands::groups().len().max(1);
            model.toolbar_group = (model.toolbar_group + count - 1) % count;
        }
        Message::ToolbarNext => {
            let count = commands::groups().len().max(1);
            model.toolbar_group = (model.toolbar_group + 1) % count;
        }
        Message::OpenGroup => {
            model.focus = Focus::Toolbar;
            model.popover = Some(Popover::group(model.toolbar_group));
        }
        Message::OpenSearch => {
            model.popover = Some(Popover::search());
        }
        Message::PopoverUp => {
            if let Some(popover) = model.popover.as_mut() {
                popover.selected = popover.selected.saturating_sub(1);
            }
        }
        Message::PopoverDown => {
            if let Some(popover) = model.popover.as_mut() {
                let last = popover.entries().len().saturating_sub(1);
                popover.selected = (popover.selected + 1).min(last);
            }
        }
        Message::PopoverFilter(filter) => {
            if let Some(popover) = model.popover.as_mut() {
                popover.filter = filter;
                popover.selected = 0;
            }
        }
        Message::PopoverConfirm => {
            if let Some(popover) = model.popover.take()
                && let Some(entry) = popover.selected_entry()
            {
                insert_and_refocus(&mut model, &entry.snippet);
            }
        }
        Message::ClosePopover => {
            model.popover = None;
        }

        Message::ShowExamples => {
            model.popover = None;
            model.example_picker_visible = true;
        }
        Message::HideExamples => {
            model.example_picker_visible = false;
        }
        Message::LoadExample(index) => {
            model.example_picker_visible = false;
            if let Some(example) = commands::examples().get(index) {
                model.buffer.replace_all(&example.markup);
                model.editor_scroll_offset = 0;
                model.focus = Focus::Editor;
            }
        }
        Message::Clear => {
            model.buffer.clear();
            model.editor_scroll_offset = 0;
            model.focus = Focus::Editor;
        }

        Message::ToggleHelp => {
            model.help_visible = !model.help_visible;
        }
        Message::HideHelp => {
            model.help_visible = false;
        }
        Message::DismissAlert => {
            model.alert = None;
        }
        Message::Resize(width, height) => {
            model.terminal_size = (width, height);
        }
        Message::Quit => {
            model.should_quit = true;
        }
        Message::Export | Message::CopyMarkup | Message::Redraw => {}
    }
    model
}

/// Snippet insertion closes the palette and hands focus back to the editor
/// once the new text has been drawn.
fn insert_and_refocus(model: &mut Model, snippet: &str) {
    model.popover = None;
    model.buffer.insert_snippet(snippet);
    if model.focus != Focus::Editor {
        model.focus_restore_pending = true;
    }
}
