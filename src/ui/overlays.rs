use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};

use crate::app::{Model, PopoverSource};
use crate::commands;

use super::{FOOTER_HEIGHT, TOOLBAR_HEIGHT};

const POPOVER_WIDTH: u16 = 64;

fn dim_style() -> Style {
    Style::default().fg(Color::Indexed(245))
}

fn overlay_block(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::Black).fg(Color::White))
}

pub fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}

/// Where the command popover goes: group lists drop down from the toolbar,
/// search is centered.
pub fn popover_rect(area: Rect, source: PopoverSource, entries: usize) -> Rect {
    let width = POPOVER_WIDTH.min(area.width.saturating_sub(4)).max(20);
    let room = area
        .height
        .saturating_sub(TOOLBAR_HEIGHT + FOOTER_HEIGHT)
        .max(4);
    let wanted = u16::try_from(entries).unwrap_or(u16::MAX).saturating_add(2);
    match source {
        PopoverSource::Group(_) => {
            let height = wanted.clamp(4, room);
            let x = area.x + 2.min(area.width.saturating_sub(width));
            Rect::new(
                x,
                area.y + TOOLBAR_HEIGHT.min(area.height),
                width.min(area.width),
                height.min(area.height),
            )
        }
        // Search keeps a stable size while the list shrinks.
        PopoverSource::Search => centered_popup_rect(width, room.min(20), area),
    }
}

pub fn render_popover(model: &Model, frame: &mut Frame, area: Rect) {
    let Some(popover) = model.popover.as_ref() else {
        return;
    };
    let entries = popover.entries();
    let title = match popover.source {
        PopoverSource::Group(index) => format!(
            " {} ",
            commands::group(index).map_or("Commands", |group| group.name.as_str())
        ),
        PopoverSource::Search => format!(" Search: {}_ ", popover.filter),
    };
    let popup = popover_rect(area, popover.source, entries.len());
    let block = overlay_block(title).title_bottom(Line::styled(
        " \u{2191}\u{2193} move \u{00b7} Enter insert \u{00b7} Esc close ",
        dim_style(),
    ));
    let inner = block.inner(popup);
    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    if entries.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::styled(" No matching commands", dim_style())),
            inner,
        );
        return;
    }

    let visible = usize::from(inner.height).max(1);
    let start = popover.selected.saturating_sub(visible - 1);
    let show_group = popover.source == PopoverSource::Search;
    let lines: Vec<Line> = entries
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(i, (group, entry))| {
            let mut spans = vec![
                Span::styled(format!(" {:<4}", entry.glyph), Style::default().fg(Color::Cyan)),
                Span::raw(format!("{:<22} ", entry.label)),
                Span::styled(entry.snippet.clone(), dim_style()),
            ];
            if show_group {
                spans.push(Span::styled(format!("  [{group}]"), dim_style()));
            }
            let line = Line::from(spans);
            if i == popover.selected {
                line.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                line
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

pub fn render_example_picker(frame: &mut Frame, area: Rect) {
    let examples = commands::examples();
    let shown = examples.len().min(9);
    let popup_width = area.width.saturating_sub(16).max(44);
    let needed_rows = u16::try_from(shown * 2 + 5).unwrap_or(u16::MAX);
    let popup_height = needed_rows.min(area.height.saturating_sub(2).max(8));
    let popup = centered_popup_rect(popup_width, popup_height, area);

    let mut lines: Vec<Line> = Vec::new();
    for (idx, example) in examples.iter().take(shown).enumerate() {
        lines.push(Line::from(vec![
            Span::raw(" "),
            Span::styled(
                format!("{}: ", idx + 1),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                example.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]));
        lines.push(Line::from(vec![
            Span::raw("    "),
            Span::styled(example.markup.clone(), Style::default().fg(Color::Cyan)),
        ]));
    }
    lines.push(Line::raw(" "));
    lines.push(Line::styled(
        " 1-9 load \u{00b7} Esc cancels",
        dim_style(),
    ));

    let block = overlay_block(" Examples ".to_string()).padding(Padding::horizontal(1));
    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

pub fn render_help_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup_width = area.width.saturating_sub(12).max(48);
    let popup_height = area.height.saturating_sub(4).max(12);
    let popup = centered_popup_rect(popup_width, popup_height, area);

    let global_cfg = model
        .config_global_path
        .as_ref()
        .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string());
    let local_cfg = model
        .config_local_path
        .as_ref()
        .map_or_else(|| "<none>".to_string(), |p| p.display().to_string());

    let section_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::styled("Editing", section_style));
    lines.push(Line::raw("  Arrows (+Shift)     Move (select)"));
    lines.push(Line::raw("  Ctrl+Left/Right     Word movement"));
    lines.push(Line::raw("  Home / End          Line start / end"));
    lines.push(Line::raw("  Ctrl+A              Select all"));
    lines.push(Line::raw("  Ctrl+L              Clear formula"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Palette", section_style));
    lines.push(Line::raw("  Tab                 Editor / toolbar"));
    lines.push(Line::raw("  Left / Right        Choose group"));
    lines.push(Line::raw("  Enter / Down        Open group"));
    lines.push(Line::raw("  Ctrl+P              Search commands"));
    lines.push(Line::raw("  Up/Down, Enter      Pick and insert"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Other", section_style));
    lines.push(Line::raw("  Ctrl+E              Examples (1-9)"));
    lines.push(Line::raw("  Ctrl+S              Export SVG"));
    lines.push(Line::raw("  Ctrl+Y              Copy markup"));
    lines.push(Line::raw("  Ctrl+Q / Ctrl+C     Quit"));
    lines.push(Line::raw("  F1                  Toggle help"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Config", section_style));
    lines.push(Line::raw(format!("  Engine: {}", model.engine_name)));
    lines.push(Line::raw(format!("  Export dir: {}", model.export_dir.display())));
    lines.push(Line::raw(format!("  Global: {global_cfg}")));
    lines.push(Line::raw(format!("  Local override: {local_cfg}")));

    let block = overlay_block(" Help ".to_string())
        .padding(Padding::uniform(1))
        .title_bottom(Line::styled(" any key closes ", dim_style()));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

pub fn render_alert_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let Some(message) = model.alert.as_deref() else {
        return;
    };
    let popup = centered_popup_rect(area.width.saturating_sub(8).clamp(20, 60), 8, area);
    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .padding(Padding::uniform(1))
        .style(Style::default().bg(Color::Black).fg(Color::White));
    let lines = vec![
        Line::raw(message.to_string()),
        Line::raw(""),
        Line::styled("Press any key to continue", dim_style()),
    ];
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(block),
        popup,
    );
}
