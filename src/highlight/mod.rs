//! Syntax highlighting for the markup in the editor pane.
//!
//! Uses syntect's bundled LaTeX definition. Colors are adjusted for light
//! terminal backgrounds so bright theme colors stay readable.

use std::sync::{Mutex, OnceLock, PoisonError};

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A run of text with one foreground color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub text: String,
    pub fg: Option<Rgb>,
}

impl HighlightSpan {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            fg: None,
        }
    }
}

/// Split on the same line breaks the editor's rope counts, so the drawn
/// lines line up with buffer positions. `\r\n` is a single break.
fn split_lines(markup: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = markup.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        let end = match ch {
            '\r' => chars
                .next_if(|&(_, next)| next == '\n')
                .map_or(idx + 1, |(next, _)| next + 1),
            '\n' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}' => {
                idx + ch.len_utf8()
            }
            _ => continue,
        };
        lines.push(&markup[start..idx]);
        start = end;
    }
    lines.push(&markup[start..]);
    lines
}

/// Highlight `markup` line by line.
///
/// Always returns one entry per line of input (an empty document yields one
/// empty line), and the span texts of each line concatenate to the line.
pub fn highlight_markup(markup: &str) -> Vec<Vec<HighlightSpan>> {
    let source_lines = split_lines(markup);

    let Some(syntax) = latex_syntax() else {
        return source_lines
            .iter()
            .map(|line| vec![HighlightSpan::plain(line)])
            .collect();
    };

    let mode = background_mode();
    let mut highlighter = HighlightLines::new(syntax, theme());
    let mut lines = Vec::with_capacity(source_lines.len());
    for line in source_lines {
        let with_newline = format!("{line}\n");
        let Ok(ranges) = highlighter.highlight_line(&with_newline, syntax_set()) else {
            lines.push(vec![HighlightSpan::plain(line)]);
            continue;
        };
        let mut spans = Vec::new();
        for (style, text) in ranges {
            let text = text.strip_suffix('\n').unwrap_or(text);
            if text.is_empty() {
                continue;
            }
            let fg = Rgb {
                r: style.foreground.r,
                g: style.foreground.g,
                b: style.foreground.b,
            };
            spans.push(HighlightSpan {
                text: text.to_string(),
                fg: Some(adjust_fg_for_background(fg, mode)),
            });
        }
        lines.push(spans);
    }
    lines
}

fn latex_syntax() -> Option<&'static SyntaxReference> {
    let set = syntax_set();
    set.find_syntax_by_extension("tex")
        .or_else(|| set.find_syntax_by_name("LaTeX"))
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set.load_defaults");
        SyntaxSet::load_defaults_newlines()
    })
}

fn theme() -> &'static Theme {
    static THEME: OnceLock<Theme> = OnceLock::new();
    THEME.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.theme.load_defaults");
        let theme_set = ThemeSet::load_defaults();
        let preferred = match background_mode() {
            BackgroundMode::Dark => ["base16-ocean.dark", "Solarized (dark)", "base16-eighties.dark"].as_slice(),
            BackgroundMode::Light => ["InspiredGitHub", "Solarized (light)", "base16-ocean.light"].as_slice(),
        };

        preferred
            .iter()
            .find_map(|name| theme_set.themes.get(*name).cloned())
            .or_else(|| theme_set.themes.values().next().cloned())
            .unwrap_or_default()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackgroundMode {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightBackground {
    Light,
    Dark,
}

static BACKGROUND_OVERRIDE: Mutex<Option<HighlightBackground>> = Mutex::new(None);

/// Force a background mode; `None` falls back to `COLORFGBG` detection.
pub fn set_background_mode(mode: Option<HighlightBackground>) {
    *BACKGROUND_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = mode;
}

/// Whether the effective background is light.
pub fn is_light_background() -> bool {
    background_mode() == BackgroundMode::Light
}

fn background_mode() -> BackgroundMode {
    let forced = *BACKGROUND_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    match forced {
        Some(HighlightBackground::Light) => BackgroundMode::Light,
        Some(HighlightBackground::Dark) => BackgroundMode::Dark,
        None => background_mode_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref()),
    }
}

fn background_mode_from_colorfgbg(colorfgbg: Option<&str>) -> BackgroundMode {
    let bg = colorfgbg
        .and_then(|value| value.rsplit(';').next())
        .and_then(|bg| bg.parse::<u8>().ok());
    match bg {
        Some(bg) if bg >= 7 => BackgroundMode::Light,
        _ => BackgroundMode::Dark,
    }
}

fn luma(color: Rgb) -> f32 {
    0.0722f32.mul_add(
        f32::from(color.b),
        0.2126f32.mul_add(f32::from(color.r), 0.7152 * f32::from(color.g)),
    )
}

fn adjust_fg_for_background(color: Rgb, mode: BackgroundMode) -> Rgb {
    if mode == BackgroundMode::Dark || luma(color) < 155.0 {
        return color;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let darken = |c: u8| (f32::from(c) * 0.42).round() as u8;
    Rgb {
        r: darken(color.r),
        g: darken(color.g),
        b: darken(color.b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(line: &[HighlightSpan]) -> String {
        line.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_lines_match_editor_line_count() {
        for markup in ["a\rb", "a\r\nb\rc", "x\u{2028}y\n", "", "\n\n"] {
            let buffer = crate::editor::EditorBuffer::from_text(markup);
            assert_eq!(
                highlight_markup(markup).len(),
                buffer.line_count(),
                "{markup:?}"
            );
        }
    }

    #[test]
    fn test_crlf_is_one_break() {
        let lines = highlight_markup("a\r\nb");
        assert_eq!(lines.len(), 2);
        assert_eq!(joined(&lines[0]), "a");
        assert_eq!(joined(&lines[1]), "b");
    }

    #[test]
    fn test_highlight_preserves_text_per_line() {
        let markup = "x = \\frac{a}{b}\n\\alpha + \\beta";
        let lines = highlight_markup(markup);
        assert_eq!(lines.len(), 2);
        assert_eq!(joined(&lines[0]), "x = \\frac{a}{b}");
        assert_eq!(joined(&lines[1]), "\\alpha + \\beta");
    }

    #[test]
    fn test_highlight_empty_markup_has_one_line() {
        let lines = highlight_markup("");
        assert_eq!(lines.len(), 1);
        assert_eq!(joined(&lines[0]), "");
    }

    #[test]
    fn test_highlight_trailing_newline_adds_empty_line() {
        let lines = highlight_markup("a\n");
        assert_eq!(lines.len(), 2);
        assert!(lines[1].is_empty() || joined(&lines[1]).is_empty());
    }

    #[test]
    fn test_highlight_sets_colors() {
        let lines = highlight_markup("\\sum_{i=1}^n i");
        assert!(lines.iter().flatten().any(|span| span.fg.is_some()));
    }

    #[test]
    fn test_colorfgbg_dark_background() {
        assert_eq!(background_mode_from_colorfgbg(Some("15;0")), BackgroundMode::Dark);
        assert_eq!(background_mode_from_colorfgbg(None), BackgroundMode::Dark);
    }

    #[test]
    fn test_colorfgbg_light_background() {
        assert_eq!(background_mode_from_colorfgbg(Some("0;15")), BackgroundMode::Light);
    }

    #[test]
    fn test_background_override() {
        set_background_mode(Some(HighlightBackground::Light));
        assert!(is_light_background());
        set_background_mode(Some(HighlightBackground::Dark));
        assert!(!is_light_background());
        set_background_mode(None);
    }

    #[test]
    fn test_light_mode_darkens_bright_fg() {
        let bright = Rgb {
            r: 240,
            g: 230,
            b: 120,
        };
        let adjusted = adjust_fg_for_background(bright, BackgroundMode::Light);
        assert!(adjusted.r < bright.r);
        assert!(luma(adjusted) < 120.0);
        assert_eq!(adjust_fg_for_background(bright, BackgroundMode::Dark), bright);
    }
}
