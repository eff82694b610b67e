//! Command palette table and example formulas.
//!
//! The table is data, not code: it lives in `assets/palette.json`, is
//! embedded at build time, and is parsed exactly once on first access.

use once_cell::sync::Lazy;
use serde::Deserialize;

const PALETTE_JSON: &str = include_str!("../../assets/palette.json");

static PALETTE: Lazy<Palette> = Lazy::new(|| {
    serde_json::from_str(PALETTE_JSON).unwrap_or_else(|err| {
        tracing::error!("embedded palette is malformed: {err}");
        Palette::default()
    })
});

/// A single insertable command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandEntry {
    /// Short glyph shown in the palette
    pub glyph: String,
    /// Markup inserted at the caret
    pub snippet: String,
    /// Human-readable tooltip
    pub label: String,
}

/// A named group of commands (one toolbar slot).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandGroup {
    pub name: String,
    pub commands: Vec<CommandEntry>,
}

/// A ready-made formula the user can load wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Example {
    pub name: String,
    pub markup: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Palette {
    groups: Vec<CommandGroup>,
    examples: Vec<Example>,
}

/// A search hit: where the command lives and the command itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandRef<'a> {
    pub group: &'a str,
    pub entry: &'a CommandEntry,
}

/// The process-wide palette.
pub fn palette() -> &'static Palette {
    &PALETTE
}

/// All command groups in toolbar order.
pub fn groups() -> &'static [CommandGroup] {
    &palette().groups
}

pub fn group(index: usize) -> Option<&'static CommandGroup> {
    groups().get(index)
}

/// Total number of commands across all groups.
pub fn command_count() -> usize {
    groups().iter().map(|g| g.commands.len()).sum()
}

/// Example formulas, default example first.
pub fn examples() -> &'static [Example] {
    &palette().examples
}

/// Markup the editor starts with.
pub fn default_example() -> &'static str {
    examples().first().map_or("", |e| e.markup.as_str())
}

/// Find an example by case-insensitive name prefix.
pub fn find_example(name: &str) -> Option<&'static Example> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    examples()
        .iter()
        .find(|e| e.name.to_lowercase().starts_with(&needle))
}

/// Case-insensitive search over labels, snippets and group names.
///
/// Results keep table order. An empty query matches everything.
pub fn search(query: &str) -> Vec<CommandRef<'static>> {
    search_in(groups(), query)
}

fn search_in<'a>(groups: &'a [CommandGroup], query: &str) -> Vec<CommandRef<'a>> {
    let needle = query.trim().to_lowercase();
    groups
        .iter()
        .flat_map(|g| {
            g.commands.iter().map(move |entry| CommandRef {
                group: g.name.as_str(),
                entry,
            })
        })
        .filter(|hit| {
            needle.is_empty()
                || hit.entry.label.to_lowercase().contains(&needle)
                || hit.entry.snippet.to_lowercase().contains(&needle)
                || hit.group.to_lowercase().contains(&needle)
        })
        .collect()
}
