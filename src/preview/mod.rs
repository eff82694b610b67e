//! In-terminal preview of rendered formulas.
//!
//! SVG output from the engine is rasterized with `resvg` and shown through
//! whatever graphics protocol the terminal supports:
//! - Kitty graphics protocol
//! - Sixel
//! - iTerm2
//! - Unicode half-blocks (fallback)

use std::sync::Arc;
#[cfg(unix)]
use std::time::Duration;

use anyhow::Result;
use image::{DynamicImage, RgbaImage};
use ratatui_image::picker::Picker;
#[cfg(unix)]
use ratatui_image::picker::cap_parser::QueryStdioOptions;
use once_cell::sync::Lazy;
use regex::Regex;
use resvg::usvg::fontdb;

#[cfg(unix)]
const PICKER_QUERY_TIMEOUT_MS: u64 = 250;

/// Upper bound on enlargement so tiny formulas do not turn into blobs.
const MAX_UPSCALE: f32 = 6.0;

static ROOT_WIDTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<svg\b[^>]*?\swidth\s*=\s*["']([^"']+)["']"#).expect("valid width regex")
});
static ROOT_HEIGHT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<svg\b[^>]*?\sheight\s*=\s*["']([^"']+)["']"#).expect("valid height regex")
});

/// System fonts, loaded on first use and shared by every SVG parse.
static SYSTEM_FONTS: Lazy<Arc<fontdb::Database>> = Lazy::new(|| {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    tracing::debug!(faces = db.len(), "loaded system fonts");
    Arc::new(db)
});

pub(crate) fn system_fonts() -> Arc<fontdb::Database> {
    Arc::clone(&SYSTEM_FONTS)
}

/// Create a picker for terminal image rendering.
///
/// The picker detects terminal capabilities and chooses the best protocol.
pub fn create_picker(force_half_cell: bool) -> Option<Picker> {
    if force_half_cell {
        crate::perf::log_event("preview.create_picker", "force_half_cell=true protocol=Halfblocks");
        return Some(Picker::halfblocks());
    }

    // The stdio capability query can leave orphaned reader threads on the
    // Windows console input buffer.
    #[cfg(not(unix))]
    {
        crate::perf::log_event("preview.create_picker", "windows fallback protocol=Halfblocks");
        return Some(Picker::halfblocks());
    }

    #[cfg(unix)]
    {
        let picker = Picker::from_query_stdio_with_options(query_options()).ok()?;
        crate::perf::log_event(
            "preview.create_picker",
            format!(
                "term={} colorterm={} protocol={:?}",
                std::env::var("TERM").unwrap_or_else(|_| "<unset>".to_string()),
                std::env::var("COLORTERM").unwrap_or_else(|_| "<unset>".to_string()),
                picker.protocol_type()
            ),
        );
        Some(picker)
    }
}

#[cfg(unix)]
fn query_options() -> QueryStdioOptions {
    let mut options = QueryStdioOptions::default();
    options.timeout = Duration::from_millis(PICKER_QUERY_TIMEOUT_MS);
    options
}

/// Rasterize an SVG so it fits inside `max_width_px` x `max_height_px`.
///
/// The formula is drawn black-on-white so it stays readable on dark
/// terminal themes.
///
/// # Errors
///
/// Returns an error if the SVG cannot be parsed or the pixmap cannot be
/// allocated.
pub fn rasterize_svg(svg: &str, max_width_px: u32, max_height_px: u32) -> Result<DynamicImage> {
    let opts = resvg::usvg::Options {
        fontdb: system_fonts(),
        ..Default::default()
    };

    let tree = resvg::usvg::Tree::from_str(svg, &opts)?;
    let size = tree.size();
    let scale = fit_scale(
        size.width(),
        size.height(),
        max_width_px as f32,
        max_height_px as f32,
    )
    .ok_or_else(|| anyhow::anyhow!("formula has no visible size"))?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let width = (size.width() * scale).ceil().max(1.0) as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let height = (size.height() * scale).ceil().max(1.0) as u32;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| anyhow::anyhow!("failed to create pixmap {width}x{height}"))?;
    pixmap.fill(resvg::tiny_skia::Color::WHITE);

    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let rgba = pixmap.data().to_vec();
    let img_buf = RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| anyhow::anyhow!("failed to create image from pixmap data"))?;

    Ok(DynamicImage::ImageRgba8(img_buf))
}

/// Scale factor that fits `(w, h)` into `(max_w, max_h)`.
fn fit_scale(w: f32, h: f32, max_w: f32, max_h: f32) -> Option<f32> {
    if w <= 0.0 || h <= 0.0 || max_w <= 0.0 || max_h <= 0.0 {
        return None;
    }
    Some((max_w / w).min(max_h / h).min(MAX_UPSCALE))
}

/// How many terminal cells an image of `px` pixels occupies.
pub fn cells_for_image(px: (u32, u32), font_size: (u16, u16)) -> (u16, u16) {
    let (fw, fh) = (u32::from(font_size.0.max(1)), u32::from(font_size.1.max(1)));
    let cols = px.0.div_ceil(fw);
    let rows = px.1.div_ceil(fh);
    (
        u16::try_from(cols).unwrap_or(u16::MAX),
        u16::try_from(rows).unwrap_or(u16::MAX),
    )
}

/// One-line description of rendered output, for panes without images.
pub fn svg_summary(svg: &str) -> String {
    let attr = |re: &Regex| {
        re.captures(svg)
            .and_then(|c| c.get(1))
            .map_or("?", |m| m.as_str())
            .to_string()
    };
    format!(
        "Rendered SVG {} x {} ({} bytes)",
        attr(&ROOT_WIDTH),
        attr(&ROOT_HEIGHT),
        svg.len()
    )
}

/// Whether terminal output should be treated as truecolor-capable.
pub fn supports_truecolor_terminal() -> bool {
    if let Ok(force) = std::env::var("MATHPAD_TRUECOLOR") {
        let value = force.to_ascii_lowercase();
        return matches!(value.as_str(), "1" | "true" | "yes" | "on");
    }
    if std::env::var("TERM_PROGRAM")
        .ok()
        .as_deref()
        .is_some_and(|v| v == "Apple_Terminal")
    {
        return false;
    }
    supports_truecolor_from_env(
        std::env::var("COLORTERM").ok().as_deref(),
        std::env::var("TERM").ok().as_deref(),
    )
}

fn supports_truecolor_from_env(colorterm: Option<&str>, term: Option<&str>) -> bool {
    let has = |value: Option<&str>, needles: &[&str]| {
        value.is_some_and(|v| {
            let lower = v.to_ascii_lowercase();
            needles.iter().any(|n| lower.contains(n))
        })
    };
    has(colorterm, &["truecolor", "24bit"]) || has(term, &["direct", "truecolor"])
}

/// Nearest index in the xterm 6x6x6 color cube.
///
/// Half-block cells on terminals without truecolor look far better with
/// indexed colors than with approximated RGB escapes.
pub fn rgb_to_xterm_256(r: u8, g: u8, b: u8) -> u8 {
    let to_cube = |v: u8| u8::try_from(u16::from(v) * 5 / 255).unwrap_or(5);
    16 + 36 * to_cube(r) + 6 * to_cube(g) + to_cube(b)
}
