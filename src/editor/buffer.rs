use ropey::Rope;

/// Caret and selection as char offsets into the buffer.
///
/// `anchor` stays put while extending; `head` is where the caret is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    /// A collapsed selection (plain caret).
    pub const fn caret(at: usize) -> Self {
        Self {
            anchor: at,
            head: at,
        }
    }

    pub const fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub const fn is_empty(&self) -> bool {
        self.anchor == self.head
    }
}

/// Line/column of a char offset, both zero-based and counted in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

/// Direction for caret movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The markup source being edited.
///
/// Every text-changing operation bumps [`EditorBuffer::revision`], which the
/// event loop compares to decide whether the preview must be re-rendered.
pub struct EditorBuffer {
    rope: Rope,
    selection: Selection,
    /// Remembered column for vertical movement (sticky column).
    col_memory: usize,
    revision: u64,
}

/// Rewrite `\r\n` and lone `\r` line breaks as `\n`.
pub fn normalize_line_breaks(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

impl EditorBuffer {
    /// Create a buffer holding `text` with the caret at the end.
    pub fn from_text(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let end = rope.len_chars();
        let mut buf = Self {
            rope,
            selection: Selection::caret(end),
            col_memory: 0,
            revision: 0,
        };
        buf.remember_column();
        buf
    }

    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// The full text content of the buffer.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Length in chars.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_blank(&self) -> bool {
        self.rope.chars().all(char::is_whitespace)
    }

    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub const fn selection(&self) -> Selection {
        self.selection
    }

    /// Caret offset (the selection head).
    pub const fn caret(&self) -> usize {
        self.selection.head
    }

    /// Text covered by the selection, if any.
    pub fn selected_text(&self) -> Option<String> {
        if self.selection.is_empty() {
            return None;
        }
        Some(
            self.rope
                .slice(self.selection.start()..self.selection.end())
                .to_string(),
        )
    }

    /// Set the selection, clamping both ends into the buffer.
    pub fn set_selection(&mut self, anchor: usize, head: usize) {
        let len = self.len_chars();
        self.selection = Selection::new(anchor.min(len), head.min(len));
        self.remember_column();
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Content of a line without its trailing newline.
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let s = self.rope.line(line_idx).to_string();
        Some(s.trim_end_matches('\n').trim_end_matches('\r').to_string())
    }

    /// Char offset where `line_idx` begins (clamped to the buffer end).
    pub fn line_start(&self, line_idx: usize) -> usize {
        self.rope.line_to_char(line_idx.min(self.rope.len_lines()))
    }

    /// Length of a line in chars (without trailing newline).
    pub fn line_len(&self, line_idx: usize) -> usize {
        self.line_at(line_idx).map_or(0, |s| s.chars().count())
    }

    /// Line/column of an arbitrary char offset.
    pub fn position_of(&self, char_idx: usize) -> Position {
        let idx = char_idx.min(self.len_chars());
        let line = self.rope.char_to_line(idx);
        Position {
            line,
            col: idx - self.rope.line_to_char(line),
        }
    }

    /// Line/column of the caret.
    pub fn caret_position(&self) -> Position {
        self.position_of(self.selection.head)
    }

    /// Replace the selection with `snippet` and collapse the caret after it.
    ///
    /// The result is `text[..start] + snippet + text[end..]` and the new
    /// caret is `start + snippet.chars().count()`, which is returned.
    pub fn insert_snippet(&mut self, snippet: &str) -> usize {
        let start = self.selection.start();
        let end = self.selection.end();
        if snippet.is_empty() && start == end {
            return start;
        }
        if end > start {
            self.rope.remove(start..end);
        }
        self.rope.insert(start, snippet);
        let caret = start + snippet.chars().count();
        self.selection = Selection::caret(caret);
        self.remember_column();
        self.revision += 1;
        caret
    }

    pub fn insert_char(&mut self, ch: char) {
        let mut tmp = [0u8; 4];
        self.insert_snippet(ch.encode_utf8(&mut tmp));
    }

    /// Insert a line break at the caret (Enter key).
    pub fn split_line(&mut self) {
        self.insert_char('\n');
    }

    /// Replace the whole text and put the caret at the end.
    ///
    /// Loading the text that is already present leaves the revision alone.
    pub fn replace_all(&mut self, text: &str) {
        let changed = self.rope != text;
        if changed {
            self.rope = Rope::from_str(text);
            self.revision += 1;
        }
        self.selection = Selection::caret(self.len_chars());
        self.remember_column();
    }

    pub fn clear(&mut self) {
        self.replace_all("");
    }

    /// Delete the selection, or the char before the caret (Backspace).
    ///
    /// Returns `true` if anything was deleted.
    pub fn delete_back(&mut self) -> bool {
        if !self.selection.is_empty() {
            return self.delete_selection();
        }
        let caret = self.selection.head;
        if caret == 0 {
            return false;
        }
        self.rope.remove(caret - 1..caret);
        self.selection = Selection::caret(caret - 1);
        self.remember_column();
        self.revision += 1;
        true
    }

    /// Delete the selection, or the char at the caret (Delete key).
    ///
    /// Returns `true` if anything was deleted.
    pub fn delete_forward(&mut self) -> bool {
        if !self.selection.is_empty() {
            return self.delete_selection();
        }
        let caret = self.selection.head;
        if caret >= self.len_chars() {
            return false;
        }
        self.rope.remove(caret..=caret);
        self.revision += 1;
        true
    }

    /// Move the caret; with `extend` the anchor stays where it is.
    pub fn move_cursor(&mut self, direction: Direction, extend: bool) {
        match direction {
            Direction::Left => {
                let target = if !extend && !self.selection.is_empty() {
                    self.selection.start()
                } else {
                    self.selection.head.saturating_sub(1)
                };
                self.place_head(target, extend);
                self.remember_column();
            }
            Direction::Right => {
                let target = if !extend && !self.selection.is_empty() {
                    self.selection.end()
                } else {
                    (self.selection.head + 1).min(self.len_chars())
                };
                self.place_head(target, extend);
                self.remember_column();
            }
            Direction::Up => {
                let pos = self.caret_position();
                if pos.line > 0 {
                    let target = self.offset_at(pos.line - 1, self.col_memory);
                    self.place_head(target, extend);
                }
            }
            Direction::Down => {
                let pos = self.caret_position();
                if pos.line + 1 < self.line_count() {
                    let target = self.offset_at(pos.line + 1, self.col_memory);
                    self.place_head(target, extend);
                }
            }
        }
    }

    /// Move the caret to the beginning of its line (Home).
    pub fn move_home(&mut self, extend: bool) {
        let line = self.caret_position().line;
        let target = self.rope.line_to_char(line);
        self.place_head(target, extend);
        self.remember_column();
    }

    /// Move the caret to the end of its line (End).
    pub fn move_end(&mut self, extend: bool) {
        let line = self.caret_position().line;
        let target = self.offset_at(line, usize::MAX);
        self.place_head(target, extend);
        self.remember_column();
    }

    /// Move the caret one word to the left (Ctrl+Left).
    pub fn move_word_left(&mut self, extend: bool) {
        let chars: Vec<char> = self.rope.slice(..self.selection.head).chars().collect();
        let mut idx = chars.len();
        while idx > 0 && !is_word_char(chars[idx - 1]) {
            idx -= 1;
        }
        while idx > 0 && is_word_char(chars[idx - 1]) {
            idx -= 1;
        }
        self.place_head(idx, extend);
        self.remember_column();
    }

    /// Move the caret one word to the right (Ctrl+Right).
    pub fn move_word_right(&mut self, extend: bool) {
        let head = self.selection.head;
        let mut idx = head;
        let mut chars = self.rope.slice(head..).chars().peekable();
        while chars.peek().is_some_and(|c| is_word_char(*c)) {
            chars.next();
            idx += 1;
        }
        while chars.peek().is_some_and(|c| !is_word_char(*c)) {
            chars.next();
            idx += 1;
        }
        self.place_head(idx, extend);
        self.remember_column();
    }

    pub fn select_all(&mut self) {
        self.selection = Selection::new(0, self.len_chars());
        self.remember_column();
    }

    // --- Private helpers ---

    fn delete_selection(&mut self) -> bool {
        let start = self.selection.start();
        let end = self.selection.end();
        self.rope.remove(start..end);
        self.selection = Selection::caret(start);
        self.remember_column();
        self.revision += 1;
        true
    }

    const fn place_head(&mut self, target: usize, extend: bool) {
        if extend {
            self.selection.head = target;
        } else {
            self.selection = Selection::caret(target);
        }
    }

    /// Char offset of `(line, col)`, clamping the column to the line.
    fn offset_at(&self, line: usize, col: usize) -> usize {
        let line = line.min(self.line_count().saturating_sub(1));
        self.rope.line_to_char(line) + col.min(self.line_len(line))
    }

    fn remember_column(&mut self) {
        self.col_memory = self.caret_position().col;
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl Default for EditorBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field(
                "rope",
                &format_args!("Rope({} chars)", self.rope.len_chars()),
            )
            .field("selection", &self.selection)
            .field("revision", &self.revision)
            .finish()
    }
}
