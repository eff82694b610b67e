use std::io::{Write, stdout};

use base64::Engine;
use chrono::Local;

use crate::app::{App, Message, Model, ToastLevel};

impl App {
    pub(super) fn handle_message_side_effects(model: &mut Model, msg: &Message) {
        match msg {
            Message::Export => Self::export_formula(model),
            Message::CopyMarkup => Self::copy_markup(model),
            _ => {}
        }
    }

    fn export_formula(model: &mut Model) {
        if !model.scheduler.is_engine_ready() {
            model.show_toast(
                ToastLevel::Warning,
                "Typesetting engine is still loading; export is not available yet",
            );
            return;
        }
        let _scope = crate::perf::scope("export.write");
        let result = crate::export::prepare_from_preview(
            model.scheduler.preview(),
            &model.export_options,
        )
        .and_then(|svg| crate::export::write_export(&model.export_dir, &svg, Local::now()));
        match result {
            Ok(path) => {
                crate::perf::log_event("export.ok", path.display().to_string());
                model.show_toast(ToastLevel::Info, format!("Exported {}", path.display()));
            }
            Err(err) => {
                tracing::warn!(%err, "export failed");
                crate::perf::log_event("export.error", err.to_string());
                model.alert = Some(err.to_string());
            }
        }
    }

    fn copy_markup(model: &mut Model) {
        let text = model
            .buffer
            .selected_text()
            .unwrap_or_else(|| model.buffer.text());
        if text.trim().is_empty() {
            model.show_toast(ToastLevel::Info, "Nothing to copy");
            return;
        }
        match copy_to_clipboard(&text) {
            Ok(()) => model.show_toast(
                ToastLevel::Info,
                format!("Copied {} char(s)", text.chars().count()),
            ),
            Err(err) => model.show_toast(ToastLevel::Error, format!("Copy failed: {err}")),
        }
    }
}

fn copy_to_clipboard(text: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        if copy_to_pbcopy(text).is_ok() {
            return Ok(());
        }
    }
    copy_to_clipboard_osc52(text)
}

#[cfg(target_os = "macos")]
fn copy_to_pbcopy(text: &str) -> std::io::Result<()> {
    use std::process::{Command, Stdio};

    let mut child = Command::new("pbcopy").stdin(Stdio::piped()).spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other("pbcopy failed"))
    }
}

fn copy_to_clipboard_osc52(text: &str) -> std::io::Result<()> {
    let osc = osc52_sequence(text);
    let mut out = stdout();
    out.write_all(osc.as_bytes())?;
    out.flush()
}

fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}
