//! mathpad - A terminal editor for LaTeX math with live preview.
//!
//! # Usage
//!
//! ```bash
//! mathpad
//! mathpad --example euler
//! mathpad --engine "tex2svg --inline {}" --export-dir ~/formulas
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use mathpad::app::App;
use mathpad::commands;
use mathpad::config::{
    ConfigFlags, ThemeMode, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use mathpad::engine::{DEFAULT_ENGINE_COMMAND, ProcessEngine};
use mathpad::highlight::{HighlightBackground, set_background_mode};
use mathpad::perf;

/// A terminal editor for LaTeX math with live preview and SVG export
#[derive(Parser, Debug)]
#[command(name = "mathpad", version, about, long_about = None)]
struct Cli {
    /// Typesetting command; `{}` is replaced by the markup
    #[arg(long, value_name = "COMMAND")]
    engine: Option<String>,

    /// Quiet period after typing before the preview is rendered
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Directory exported SVG files are written to
    #[arg(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,

    /// Start with the named example instead of the quadratic formula
    #[arg(long, value_name = "NAME")]
    example: Option<String>,

    /// Show the rendered output as text instead of an image
    #[arg(long)]
    no_preview: bool,

    /// Force syntax highlight theme background (light or dark)
    #[arg(long, value_enum, default_value = "auto")]
    theme: ThemeMode,

    /// Enable startup performance logging
    #[arg(long)]
    perf: bool,

    /// Write detailed render/preview debug events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Force image rendering to use half-cell fallback mode
    #[arg(long)]
    force_half_cell: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

// Query the terminal background using OSC 11.
// We talk to /dev/tty so the terminal responds even when stdout is piped.
// Non-Unix platforms skip the query: the stdin fallback leaves a reader
// thread behind that swallows console input.
#[cfg(not(unix))]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    Ok(None)
}

#[cfg(unix)]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    use std::io::{Read, Write};
    use std::sync::mpsc;

    let (tx, rx) = mpsc::channel();

    let mut io = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/tty")?;
    let reader = io.try_clone()?;

    // OSC 11 query: ESC ] 11 ; ? BEL
    io.write_all(b"\x1b]11;?\x07")?;
    io.flush()?;

    std::thread::spawn(move || {
        let mut reader = reader;
        let mut buf = [0u8; 256];
        let mut collected: Vec<u8> = Vec::new();
        loop {
            match reader.read(&mut buf) {
                Ok(0) => continue,
                Ok(n) => {
                    collected.extend_from_slice(&buf[..n]);
                    if collected.contains(&b'\x07') || collected.windows(2).any(|w| w == b"\x1b\\")
                    {
                        let _ = tx.send(collected);
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let Ok(collected) = rx.recv_timeout(Duration::from_millis(75)) else {
        return Ok(None);
    };
    let text = String::from_utf8_lossy(&collected);
    Ok(parse_osc11_reply(&text))
}

fn theme_from_rgb(r: u8, g: u8, b: u8) -> HighlightBackground {
    let luma = 0.0722f32.mul_add(
        f32::from(b),
        0.2126f32.mul_add(f32::from(r), 0.7152 * f32::from(g)),
    );
    if luma >= 140.0 {
        HighlightBackground::Light
    } else {
        HighlightBackground::Dark
    }
}

fn detect_theme() -> Option<HighlightBackground> {
    let _raw = enable_raw_mode();
    let result = query_terminal_background();
    let _ = disable_raw_mode();
    result.ok().flatten().map(|(r, g, b)| theme_from_rgb(r, g, b))
}

fn parse_osc11_reply(reply: &str) -> Option<(u8, u8, u8)> {
    // Expect: ESC ] 11 ; rgb:RRRR/GGGG/BBBB BEL or ST
    let start = reply.find("rgb:")?;
    let data = &reply[start + 4..];
    let mut parts = data.split(['/', '\x07', '\x1b']);
    let r = parts.next()?;
    let g = parts.next()?;
    let b = parts.next()?;
    Some((
        parse_osc_component(r)?,
        parse_osc_component(g)?,
        parse_osc_component(b)?,
    ))
}

fn parse_osc_component(s: &str) -> Option<u8> {
    let hex = s.trim();
    if hex.len() >= 4 {
        let v = u16::from_str_radix(&hex[..4], 16).ok()?;
        u8::try_from(v >> 8).ok()
    } else if hex.len() == 2 {
        u8::from_str_radix(hex, 16).ok()
    } else {
        None
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("MATHPAD_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        tracing::warn!(
            path = %render_debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            %err,
            "failed to initialize render debug log"
        );
    }

    match effective.theme.unwrap_or(cli.theme) {
        ThemeMode::Auto => set_background_mode(detect_theme()),
        ThemeMode::Light => set_background_mode(Some(HighlightBackground::Light)),
        ThemeMode::Dark => set_background_mode(Some(HighlightBackground::Dark)),
    }

    let initial_markup = match effective.example.as_deref() {
        Some(name) => commands::find_example(name)
            .map(|example| example.markup.clone())
            .with_context(|| {
                let known = commands::examples()
                    .iter()
                    .map(|example| example.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Unknown example '{name}'. Available: {known}")
            })?,
        None => commands::default_example().to_string(),
    };

    let engine_line = effective
        .engine
        .clone()
        .unwrap_or_else(|| DEFAULT_ENGINE_COMMAND.to_string());
    let engine = ProcessEngine::from_command_line(&engine_line)
        .with_context(|| format!("Invalid engine command '{engine_line}'"))?;
    tracing::debug!(engine = engine.program(), "using typesetting engine");

    let mut app = App::new(Arc::new(engine))
        .with_initial_markup(initial_markup)
        .with_export_dir(
            effective
                .export_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
        )
        .with_preview_enabled(!effective.no_preview)
        .with_force_half_cell(effective.force_half_cell)
        .with_config_paths(
            Some(global_path.clone()),
            if local_path.exists() {
                Some(local_path.clone())
            } else {
                None
            },
        );
    if let Some(ms) = effective.debounce_ms {
        app = app.with_debounce(Duration::from_millis(ms));
    }

    app.run().context("Application error")
}
