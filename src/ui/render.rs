use image::imageops::FilterType;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui_image::protocol::StatefulProtocolType;
use ratatui_image::{Resize, StatefulImage};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{Focus, Model};
use crate::commands;
use crate::highlight::{self, HighlightSpan};
use crate::scheduler::{LOADING_MESSAGE, PLACEHOLDER_MESSAGE, Preview};

use super::{
    EDITOR_WIDTH_PERCENT, FOOTER_HEIGHT, PREVIEW_WIDTH_PERCENT, TOOLBAR_HEIGHT, overlays, status,
};

/// Screen regions of the main view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppLayout {
    pub toolbar: Rect,
    pub editor: Rect,
    pub preview: Rect,
    pub toast: Rect,
    pub status: Rect,
}

pub fn split_layout(area: Rect) -> AppLayout {
    let rows = Layout::vertical([
        Constraint::Length(TOOLBAR_HEIGHT),
        Constraint::Min(3),
        Constraint::Length(FOOTER_HEIGHT),
    ])
    .split(area);
    let panes = Layout::horizontal([
        Constraint::Percentage(EDITOR_WIDTH_PERCENT),
        Constraint::Percentage(PREVIEW_WIDTH_PERCENT),
    ])
    .split(rows[1]);
    let footer = rows[2];
    AppLayout {
        toolbar: rows[0],
        editor: panes[0],
        preview: panes[1],
        toast: Rect {
            height: footer.height.min(1),
            ..footer
        },
        status: Rect {
            y: footer.y + footer.height.saturating_sub(1),
            height: footer.height.min(1),
            ..footer
        },
    }
}

/// Text area of the editor pane inside its border.
pub fn editor_inner_area(area: Rect) -> Rect {
    Block::bordered().inner(split_layout(area).editor)
}

/// Drawing area of the preview pane inside its border.
pub fn preview_inner_area(area: Rect) -> Rect {
    Block::bordered().inner(split_layout(area).preview)
}

/// Render the complete UI.
pub fn render(model: &mut Model, frame: &mut Frame) {
    let area = frame.area();
    let layout = split_layout(area);

    render_toolbar(model, frame, layout.toolbar);
    render_editor(model, frame, layout.editor);
    render_preview(model, frame, layout.preview);
    status::render_toast_bar(model, frame, layout.toast);
    status::render_status_bar(model, frame, layout.status);

    if model.alert.is_some() {
        overlays::render_alert_overlay(model, frame, area);
    } else if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    } else if model.example_picker_visible {
        overlays::render_example_picker(frame, area);
    } else if model.popover.is_some() {
        overlays::render_popover(model, frame, area);
    }
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        })
}

/// First group label to draw so that `selected` fits in `width` columns.
pub(super) fn toolbar_window_start(labels: &[String], selected: usize, width: u16) -> usize {
    let width = usize::from(width);
    let mut start = 0;
    while start < selected {
        let marker = usize::from(start > 0);
        let used: usize = labels[start..=selected]
            .iter()
            .map(|label| label.width() + 1)
            .sum::<usize>()
            + marker;
        if used <= width {
            break;
        }
        start += 1;
    }
    start
}

fn render_toolbar(model: &Model, frame: &mut Frame, area: Rect) {
    let focused = model.focus == Focus::Toolbar && !model.focus_restore_pending;
    let block = pane_block(" Commands ".to_string(), focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let dim = Style::default().fg(Color::DarkGray);
    let labels: Vec<String> = commands::groups()
        .iter()
        .map(|group| format!(" {} ", group.name))
        .collect();
    if labels.is_empty() {
        return;
    }
    let selected = model.toolbar_group.min(labels.len() - 1);
    let start = toolbar_window_start(&labels, selected, inner.width);

    let mut spans = Vec::new();
    if start > 0 {
        spans.push(Span::styled("\u{2039}", dim));
    }
    for (i, label) in labels.into_iter().enumerate().skip(start) {
        let style = if i != selected {
            Style::default()
        } else if focused {
            Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
        } else {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::styled("\u{2502}", dim));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn render_editor(model: &Model, frame: &mut Frame, area: Rect) {
    let buf = &model.buffer;
    let focused = model.focus == Focus::Editor && !model.overlay_active();
    let selection = buf.selection();
    let title = if selection.is_empty() {
        " Formula ".to_string()
    } else {
        format!(" Formula ({} selected) ", selection.end() - selection.start())
    };
    let block = pane_block(title, focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let caret = buf.caret_position();
    let caret_x: usize = buf
        .line_at(caret.line)
        .unwrap_or_default()
        .chars()
        .take(caret.col)
        .map(|ch| ch.width().unwrap_or(0))
        .sum();
    let hscroll = caret_x.saturating_sub(usize::from(inner.width).saturating_sub(1));

    let text = buf.text();
    let highlighted = highlight::highlight_markup(&text);
    let height = usize::from(inner.height);
    let start = model.editor_scroll_offset;
    let lines: Vec<Line> = highlighted
        .iter()
        .enumerate()
        .skip(start)
        .take(height)
        .map(|(line_idx, spans)| {
            styled_line(
                spans,
                buf.line_start(line_idx),
                (selection.start(), selection.end()),
                buf.len_chars(),
            )
        })
        .collect();
    let paragraph =
        Paragraph::new(lines).scroll((0, u16::try_from(hscroll).unwrap_or(u16::MAX)));
    frame.render_widget(paragraph, inner);

    if focused && caret.line >= start && caret.line < start + height {
        let x = inner.x + u16::try_from(caret_x - hscroll).unwrap_or(0);
        let y = inner.y + u16::try_from(caret.line - start).unwrap_or(0);
        frame.set_cursor_position(Position::new(x, y));
    }
}

/// Highlighted spans for one line with the selection drawn reversed.
fn styled_line(
    spans: &[HighlightSpan],
    line_start: usize,
    (sel_start, sel_end): (usize, usize),
    total_chars: usize,
) -> Line<'static> {
    let in_selection = |offset: usize| offset >= sel_start && offset < sel_end;
    let mut out: Vec<Span<'static>> = Vec::new();
    let mut offset = line_start;

    for span in spans {
        let base = span.fg.map_or_else(Style::default, |c| {
            Style::default().fg(Color::Rgb(c.r, c.g, c.b))
        });
        let style_for = |selected: bool| {
            if selected {
                base.add_modifier(Modifier::REVERSED)
            } else {
                base
            }
        };
        let mut run = String::new();
        let mut run_selected = false;
        for ch in span.text.chars() {
            let selected = in_selection(offset);
            if !run.is_empty() && selected != run_selected {
                out.push(Span::styled(std::mem::take(&mut run), style_for(run_selected)));
            }
            run_selected = selected;
            run.push(ch);
            offset += 1;
        }
        if !run.is_empty() {
            out.push(Span::styled(run, style_for(run_selected)));
        }
    }

    // A selected line break shows as one reversed cell.
    if offset < total_chars && in_selection(offset) {
        out.push(Span::styled(
            " ",
            Style::default().add_modifier(Modifier::REVERSED),
        ));
    }
    Line::from(out)
}

fn render_preview(model: &mut Model, frame: &mut Frame, area: Rect) {
    let block = pane_block(format!(" Preview \u{00b7} {} ", status::render_state_label(model)), false);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let dim = Style::default().fg(Color::DarkGray);
    let preview = model.scheduler.preview().clone();
    match preview {
        Preview::Loading => centered_message(frame, inner, LOADING_MESSAGE, dim),
        Preview::Placeholder => centered_message(frame, inner, PLACEHOLDER_MESSAGE, dim),
        Preview::Error(message) => {
            centered_message(frame, inner, &message, Style::default().fg(Color::Red));
        }
        Preview::Output(typeset) => {
            if render_preview_image(model, frame, inner) {
                return;
            }
            let lines = vec![
                Line::styled(
                    crate::preview::svg_summary(&typeset.svg),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Line::raw(""),
                Line::styled(typeset.markup.clone(), dim),
            ];
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
        }
    }
}

fn centered_message(frame: &mut Frame, area: Rect, message: &str, style: Style) {
    let width = usize::from(area.width.max(1));
    let rows = u16::try_from(message.width().div_ceil(width)).unwrap_or(u16::MAX);
    // Word wrapping can spill one row past the character estimate.
    let rows = rows.saturating_add(u16::from(rows > 1));
    let height = rows.clamp(1, area.height);
    let block = Rect {
        y: area.y + (area.height - height) / 2,
        height,
        ..area
    };
    frame.render_widget(
        Paragraph::new(Line::styled(message.to_string(), style))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        block,
    );
}

/// Draw the rasterized formula centered in `inner`. Returns `false` when
/// there is no image for the current render.
fn render_preview_image(model: &mut Model, frame: &mut Frame, inner: Rect) -> bool {
    let seq = model.scheduler.applied_seq();
    let Some(image) = model.preview_image.as_mut() else {
        return false;
    };
    if image.seq != seq {
        return false;
    }
    let Some((protocol, cols, rows)) = image.protocol.as_mut() else {
        return false;
    };

    let width = (*cols).min(inner.width);
    let height = (*rows).min(inner.height);
    let rect = Rect::new(
        inner.x + (inner.width - width) / 2,
        inner.y + (inner.height - height) / 2,
        width,
        height,
    );
    let halfblocks = matches!(protocol.protocol_type(), StatefulProtocolType::Halfblocks(_));
    let resize = if halfblocks {
        // Nearest-neighbor causes strong color aliasing artifacts in half-cell mode.
        Resize::Scale(Some(FilterType::CatmullRom))
    } else {
        Resize::Scale(None)
    };
    frame.render_stateful_widget(StatefulImage::default().resize(resize), rect, protocol);

    if halfblocks && !crate::preview::supports_truecolor_terminal() {
        let buf = frame.buffer_mut();
        for y in rect.top()..rect.bottom() {
            for x in rect.left()..rect.right() {
                let cell = &mut buf[(x, y)];
                if let Color::Rgb(r, g, b) = cell.fg {
                    cell.fg = Color::Indexed(crate::preview::rgb_to_xterm_256(r, g, b));
                }
                if let Color::Rgb(r, g, b) = cell.bg {
                    cell.bg = Color::Indexed(crate::preview::rgb_to_xterm_256(r, g, b));
                }
            }
        }
    }
    true
}
