//! Markup editing.
//!
//! Provides a rope-backed text buffer with caret and selection tracking,
//! designed for integration into the TEA architecture. Palette commands
//! land here through [`EditorBuffer::insert_snippet`].

mod buffer;

pub use buffer::{Direction, EditorBuffer, Position, Selection, normalize_line_breaks};
