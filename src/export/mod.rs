//! SVG export.
//!
//! Takes the last successful render and writes a self-contained SVG file:
//! references are resolved by round-tripping through `usvg`, and the root
//! size is clamped into a bounded box without changing the aspect ratio.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use resvg::usvg;
use thiserror::Error;

use crate::scheduler::Preview;

static ROOT_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<svg\b[^>]*>").expect("valid root tag regex"));
static SIZE_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\s(?:width|height|viewBox)\s*=\s*("[^"]*"|'[^']*')"#).expect("valid attr regex")
});

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No formula to export. Render a formula first.")]
    NoFormula,
    #[error("Could not read rendered SVG: {0}")]
    Parse(#[from] usvg::Error),
    #[error("Rendered formula has no visible size")]
    EmptyBounds,
    #[error("Could not write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Size limits for exported files, in SVG user units (px).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    pub max_width: f32,
    pub max_height: f32,
    pub min_width: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            max_width: 800.0,
            max_height: 400.0,
            min_width: 200.0,
        }
    }
}

/// A serialized, size-fitted SVG ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedSvg {
    pub contents: String,
    pub width: f32,
    pub height: f32,
}

/// Scale `(width, height)` into the export box.
///
/// Small formulas are enlarged up to `min_width`, then the result is capped
/// by both maxima. Aspect ratio is always preserved.
pub fn fit_size(width: f32, height: f32, opts: &ExportOptions) -> Option<(f32, f32)> {
    if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
        return None;
    }
    let mut scale = 1.0_f32;
    if width < opts.min_width {
        scale = opts.min_width / width;
    }
    scale = scale
        .min(opts.max_width / width)
        .min(opts.max_height / height);
    Some((width * scale, height * scale))
}

/// Produce the export for whatever the preview shows.
///
/// # Errors
///
/// [`ExportError::NoFormula`] unless the preview holds a successful render,
/// plus parse and bounds errors from [`prepare_svg`].
pub fn prepare_from_preview(
    preview: &Preview,
    opts: &ExportOptions,
) -> Result<ExportedSvg, ExportError> {
    let typeset = preview.output().ok_or(ExportError::NoFormula)?;
    prepare_svg(&typeset.svg, opts)
}

/// Make `svg` self-contained and fit it into the export box.
///
/// # Errors
///
/// Returns an error if the SVG cannot be parsed or has zero size.
pub fn prepare_svg(svg: &str, opts: &ExportOptions) -> Result<ExportedSvg, ExportError> {
    let parse_opts = usvg::Options {
        fontdb: crate::preview::system_fonts(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(svg, &parse_opts)?;
    let size = tree.size();
    let (width, height) =
        fit_size(size.width(), size.height(), opts).ok_or(ExportError::EmptyBounds)?;

    let standalone = tree.to_string(&usvg::WriteOptions::default());
    let contents = set_root_size(&standalone, width, height, size.width(), size.height());
    Ok(ExportedSvg {
        contents,
        width,
        height,
    })
}

/// Rewrite the root element's `width`, `height` and `viewBox`.
fn set_root_size(svg: &str, width: f32, height: f32, natural_w: f32, natural_h: f32) -> String {
    let Some(root) = ROOT_TAG.find(svg) else {
        return svg.to_string();
    };
    let tag = root.as_str();
    let stripped = SIZE_ATTR.replace_all(tag, "");
    let (head, tail) = if let Some(head) = stripped.strip_suffix("/>") {
        (head, "/>")
    } else {
        (stripped.strip_suffix('>').unwrap_or(&stripped), ">")
    };
    let new_tag = format!(
        "{} width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\"{tail}",
        head.trim_end(),
        fmt_num(width),
        fmt_num(height),
        fmt_num(natural_w),
        fmt_num(natural_h),
    );
    format!("{}{}{}", &svg[..root.start()], new_tag, &svg[root.end()..])
}

fn fmt_num(v: f32) -> String {
    let rounded = (v * 1000.0).round() / 1000.0;
    let s = format!("{rounded:.3}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// `formula-YYYYMMDD-HHMMSS.svg`
pub fn export_filename(at: DateTime<Local>) -> String {
    format!("formula-{}.svg", at.format("%Y%m%d-%H%M%S"))
}

/// Write `export` into `dir` with a timestamped name.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if the directory or file cannot be written.
pub fn write_export(
    dir: &Path,
    export: &ExportedSvg,
    at: DateTime<Local>,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(export_filename(at));
    std::fs::write(&path, &export.contents).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(path = %path.display(), width = export.width, height = export.height, "exported svg");
    Ok(path)
}
