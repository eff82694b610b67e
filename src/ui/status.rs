use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Focus, Model, ToastLevel};
use crate::scheduler::RenderState;

/// Short description of the render pipeline state.
pub fn render_state_label(model: &Model) -> &'static str {
    match model.scheduler.state() {
        RenderState::EngineLoading => "loading engine",
        RenderState::Idle if model.scheduler.next_deadline().is_some() => "pending",
        RenderState::Idle => "ready",
        RenderState::Rendering => "rendering",
        RenderState::Error => "error",
    }
}

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let caret = model.buffer.caret_position();
    let (mode, style) = match model.focus {
        Focus::Editor => (
            "EDIT",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        Focus::Toolbar => (
            "PALETTE",
            Style::default().bg(Color::Magenta).fg(Color::White),
        ),
    };
    let engine = if model.engine_name.is_empty() {
        "engine"
    } else {
        model.engine_name.as_str()
    };

    let status = format!(
        " {mode}  {engine} [{}]  Ln {}, Col {}  Tab:palette  Ctrl+P:search  Ctrl+E:examples  Ctrl+S:export  F1:help",
        render_state_label(model),
        caret.line + 1,
        caret.col + 1,
    );

    frame.render_widget(Paragraph::new(status).style(style), area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
