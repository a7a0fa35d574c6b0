use std::borrow::Cow;

use ropey::Rope;

/// Spaces inserted by the Tab key.
pub const INDENT: &str = "  ";

/// Characters other than `\n` that the rope counts as line breaks.
const FOREIGN_BREAKS: [char; 6] = ['\r', '\u{0B}', '\u{0C}', '\u{85}', '\u{2028}', '\u{2029}'];

/// Rewrite every line ending to `\n`.
///
/// The cursor tracks lines by `\n` alone, so nothing else the rope would
/// treat as a break may reach it. `\r\n` collapses to a single break.
pub fn normalize_line_breaks(text: &str) -> Cow<'_, str> {
    if !text.contains(FOREIGN_BREAKS) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace(FOREIGN_BREAKS, "\n"))
}

/// Cursor position in the source buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based byte offset within the line.
    pub col: usize,
    /// Column to aim for when moving vertically.
    col_memory: usize,
}

impl Cursor {
    pub const fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            col_memory: col,
        }
    }

    const fn set_col(&mut self, col: usize) {
        self.col = col;
        self.col_memory = col;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Rope-backed diagram source with a single cursor.
///
/// Every mutation bumps [`SourceBuffer::revision`], which is what the app
/// watches to decide when the preview needs re-rendering.
pub struct SourceBuffer {
    rope: Rope,
    cursor: Cursor,
    revision: u64,
}

impl SourceBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(&normalize_line_breaks(text)),
            cursor: Cursor::default(),
            revision: 0,
        }
    }

    pub fn empty() -> Self {
        Self::from_text("")
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Monotonic change counter.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Line content without its line ending.
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let mut s = self.rope.line(line_idx).to_string();
        let trimmed = s.trim_end_matches('\n').len();
        s.truncate(trimmed);
        Some(s)
    }

    /// Byte length of a line, excluding its line ending.
    pub fn line_len(&self, line_idx: usize) -> usize {
        self.line_at(line_idx).map_or(0, |s| s.len())
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// True when the buffer holds only whitespace.
    pub fn is_blank(&self) -> bool {
        self.rope.chars().all(char::is_whitespace)
    }

    /// Swap in entirely new content and park the cursor at the origin.
    pub fn replace_all(&mut self, text: &str) {
        self.rope = Rope::from_str(&normalize_line_breaks(text));
        self.cursor = Cursor::default();
        self.touch();
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' || FOREIGN_BREAKS.contains(&ch) {
            self.split_line();
            return;
        }
        let idx = self.cursor_char_idx();
        self.rope.insert_char(idx, ch);
        self.cursor.set_col(self.cursor.col + ch.len_utf8());
        self.touch();
    }

    /// Insert text at the cursor, leaving the cursor after it.
    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let normalized = normalize_line_breaks(s);
        let idx = self.cursor_char_idx();
        self.rope.insert(idx, &normalized);
        match normalized.rsplit_once('\n') {
            Some((head, tail)) => {
                self.cursor.line += head.matches('\n').count() + 1;
                self.cursor.set_col(tail.len());
            }
            None => self.cursor.set_col(self.cursor.col + normalized.len()),
        }
        self.touch();
    }

    pub fn indent(&mut self) {
        self.insert_str(INDENT);
    }

    /// Break the line at the cursor (Enter).
    pub fn split_line(&mut self) {
        let idx = self.cursor_char_idx();
        self.rope.insert_char(idx, '\n');
        self.cursor.line += 1;
        self.cursor.set_col(0);
        self.touch();
    }

    /// Backspace. Returns `false` at the start of the buffer.
    pub fn delete_back(&mut self) -> bool {
        let idx = self.cursor_char_idx();
        if idx == 0 {
            return false;
        }
        if self.cursor.col == 0 {
            let prev_len = self.line_len(self.cursor.line - 1);
            // Drop the whole line ending, CRLF included.
            let ending_start = self.line_content_end_char(self.cursor.line - 1);
            self.rope.remove(ending_start..idx);
            self.cursor.line -= 1;
            self.cursor.set_col(prev_len);
        } else {
            let prev_len = self
                .rope
                .char(idx - 1)
                .len_utf8();
            self.rope.remove(idx - 1..idx);
            self.cursor.set_col(self.cursor.col - prev_len);
        }
        self.touch();
        true
    }

    /// Delete. Returns `false` at the end of the buffer.
    pub fn delete_forward(&mut self) -> bool {
        if self.cursor.col >= self.line_len(self.cursor.line) {
            if self.cursor.line + 1 >= self.line_count() {
                return false;
            }
            let from = self.line_content_end_char(self.cursor.line);
            let to = self.rope.line_to_char(self.cursor.line + 1);
            self.rope.remove(from..to);
        } else {
            let idx = self.cursor_char_idx();
            self.rope.remove(idx..=idx);
        }
        self.touch();
        true
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.move_left(),
            Direction::Right => self.move_right(),
            Direction::Up => self.move_vertical(-1),
            Direction::Down => self.move_vertical(1),
        }
    }

    /// Move by `delta` lines at once (PageUp/PageDown).
    pub fn move_lines(&mut self, delta: isize) {
        self.move_vertical(delta);
    }

    pub const fn move_home(&mut self) {
        self.cursor.set_col(0);
    }

    pub fn move_end(&mut self) {
        self.cursor.set_col(self.line_len(self.cursor.line));
    }

    /// Ctrl+Left: start of the previous word, or the end of the previous line.
    pub fn move_word_left(&mut self) {
        if self.cursor.col == 0 {
            if self.cursor.line > 0 {
                self.cursor.line -= 1;
                self.move_end();
            }
            return;
        }
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let before = line.get(..self.cursor.col).unwrap_or(&line);
        let word_end = before.trim_end_matches(|c: char| !is_word_char(c));
        let word_start = word_end.trim_end_matches(is_word_char);
        self.cursor.set_col(word_start.len());
    }

    /// Ctrl+Right: past the current word and any separators after it.
    pub fn move_word_right(&mut self) {
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        if self.cursor.col >= line.len() {
            if self.cursor.line + 1 < self.line_count() {
                self.cursor.line += 1;
                self.cursor.set_col(0);
            }
            return;
        }
        let after = line.get(self.cursor.col..).unwrap_or("");
        let word_end = after.find(|c: char| !is_word_char(c)).unwrap_or(after.len());
        let rest = &after[word_end..];
        let gap = rest.find(is_word_char).unwrap_or(rest.len());
        self.cursor.set_col(self.cursor.col + word_end + gap);
    }

    /// Place the cursor, clamping to the buffer and to a char boundary.
    pub fn move_to(&mut self, line: usize, col: usize) {
        self.cursor.line = line.min(self.line_count().saturating_sub(1));
        let text = self.line_at(self.cursor.line).unwrap_or_default();
        let mut col = col.min(text.len());
        while !text.is_char_boundary(col) {
            col -= 1;
        }
        self.cursor.set_col(col);
    }

    pub const fn move_to_start(&mut self) {
        self.cursor = Cursor::at(0, 0);
    }

    pub fn move_to_end(&mut self) {
        self.cursor.line = self.line_count().saturating_sub(1);
        self.move_end();
    }

    // --- Private helpers ---

    const fn touch(&mut self) {
        self.revision += 1;
    }

    fn cursor_char_idx(&self) -> usize {
        let line_start_byte = self.rope.line_to_byte(self.cursor.line);
        let col = self.cursor.col.min(self.line_len(self.cursor.line));
        self.rope.byte_to_char(line_start_byte + col)
    }

    /// Char index just past the visible content of `line_idx`.
    fn line_content_end_char(&self, line_idx: usize) -> usize {
        let start_byte = self.rope.line_to_byte(line_idx);
        self.rope.byte_to_char(start_byte + self.line_len(line_idx))
    }

    fn move_left(&mut self) {
        if self.cursor.col > 0 {
            let prev = self.rope.char(self.cursor_char_idx() - 1).len_utf8();
            self.cursor.set_col(self.cursor.col - prev);
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.move_end();
        }
    }

    fn move_right(&mut self) {
        if self.cursor.col < self.line_len(self.cursor.line) {
            let next = self.rope.char(self.cursor_char_idx()).len_utf8();
            self.cursor.set_col(self.cursor.col + next);
        } else if self.cursor.line + 1 < self.line_count() {
            self.cursor.line += 1;
            self.cursor.set_col(0);
        }
    }

    fn move_vertical(&mut self, delta: isize) {
        let last = self.line_count().saturating_sub(1);
        let target = self.cursor.line.saturating_add_signed(delta).min(last);
        if target == self.cursor.line {
            return;
        }
        self.cursor.line = target;
        let text = self.line_at(target).unwrap_or_default();
        let mut col = self.cursor.col_memory.min(text.len());
        while !text.is_char_boundary(col) {
            col -= 1;
        }
        self.cursor.col = col;
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl std::fmt::Debug for SourceBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceBuffer")
            .field("rope", &format_args!("Rope({} lines)", self.rope.len_lines()))
            .field("cursor", &self.cursor)
            .field("revision", &self.revision)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_at(text: &str, line: usize, col: usize) -> SourceBuffer {
        let mut buf = SourceBuffer::from_text(text);
        buf.move_to(line, col);
        buf
    }

    // --- Queries ---

    #[test]
    fn test_empty_buffer_has_one_blank_line() {
        let buf = SourceBuffer::empty();
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line_at(0), Some(String::new()));
        assert!(buf.is_blank());
    }

    #[test]
    fn test_line_at_strips_crlf() {
        let buf = SourceBuffer::from_text("graph TD\r\nA-->B");
        assert_eq!(buf.line_at(0).as_deref(), Some("graph TD"));
        assert_eq!(buf.line_len(0), 8);
        assert_eq!(buf.line_at(2), None);
    }

    #[test]
    fn test_whitespace_only_is_blank() {
        assert!(SourceBuffer::from_text(" \n\t \r\n").is_blank());
        assert!(!SourceBuffer::from_text("  pie").is_blank());
    }

    // --- Revision tracking ---

    #[test]
    fn test_every_mutation_bumps_revision() {
        let mut buf = SourceBuffer::from_text("ab");
        let mut last = buf.revision();
        let mut check = |buf: &SourceBuffer| {
            assert!(buf.revision() > last);
            last = buf.revision();
        };
        buf.insert_char('x');
        check(&buf);
        buf.split_line();
        check(&buf);
        buf.delete_back();
        check(&buf);
        buf.indent();
        check(&buf);
        buf.replace_all("pie");
        check(&buf);
    }

    #[test]
    fn test_cursor_movement_does_not_bump_revision() {
        let mut buf = SourceBuffer::from_text("ab\ncd");
        buf.move_cursor(Direction::Down);
        buf.move_word_right();
        buf.move_to_end();
        assert_eq!(buf.revision(), 0);
    }

    #[test]
    fn test_noop_deletes_do_not_bump_revision() {
        let mut buf = SourceBuffer::from_text("ab");
        assert!(!buf.delete_back());
        buf.move_to_end();
        assert!(!buf.delete_forward());
        assert_eq!(buf.revision(), 0);
    }

    // --- Editing ---

    #[test]
    fn test_insert_char_advances_by_utf8_len() {
        let mut buf = SourceBuffer::from_text("AB");
        buf.move_to(0, 1);
        buf.insert_char('é');
        assert_eq!(buf.text(), "AéB");
        assert_eq!(buf.cursor().col, 3);
    }

    #[test]
    fn test_insert_multiline_str_moves_cursor_to_end() {
        let mut buf = SourceBuffer::from_text("graph TD\n");
        buf.move_to(1, 0);
        buf.insert_str("A-->B\nB-->C");
        assert_eq!(buf.text(), "graph TD\nA-->B\nB-->C");
        assert_eq!(buf.cursor(), Cursor::at(2, 5));
    }

    #[test]
    fn test_insert_str_turns_lone_carriage_returns_into_lines() {
        let mut buf = SourceBuffer::empty();
        buf.insert_str("graph TD\rA-->B");
        assert_eq!(buf.text(), "graph TD\nA-->B");
        assert_eq!(buf.cursor(), Cursor::at(1, 5));
        buf.move_word_left();
        assert_eq!(buf.cursor(), Cursor::at(1, 4));
    }

    #[test]
    fn test_mixed_line_endings_collapse_to_newlines() {
        assert_eq!(normalize_line_breaks("a\r\nb\rc\u{2028}d\u{0C}e"), "a\nb\nc\nd\ne");
        assert!(matches!(normalize_line_breaks("a\nb"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_unicode_line_separator_typed_splits_line() {
        let mut buf = buffer_at("AB", 0, 1);
        buf.insert_char('\u{2028}');
        assert_eq!(buf.text(), "A\nB");
        assert_eq!(buf.cursor(), Cursor::at(1, 0));
        buf.move_word_left();
        assert_eq!(buf.line_count(), 2);
    }

    #[test]
    fn test_tab_inserts_two_spaces() {
        let mut buf = SourceBuffer::from_text("A");
        buf.indent();
        assert_eq!(buf.text(), "  A");
        assert_eq!(buf.cursor().col, 2);
    }

    #[test]
    fn test_split_line_mid_text() {
        let mut buf = buffer_at("graph TD", 0, 5);
        buf.split_line();
        assert_eq!(buf.text(), "graph\n TD");
        assert_eq!(buf.cursor(), Cursor::at(1, 0));
    }

    #[test]
    fn test_backspace_joins_lines() {
        let mut buf = buffer_at("A\nB", 1, 0);
        assert!(buf.delete_back());
        assert_eq!(buf.text(), "AB");
        assert_eq!(buf.cursor(), Cursor::at(0, 1));
    }

    #[test]
    fn test_backspace_joins_crlf_lines() {
        let mut buf = buffer_at("A\r\nB", 1, 0);
        assert!(buf.delete_back());
        assert_eq!(buf.text(), "AB");
    }

    #[test]
    fn test_backspace_removes_multibyte_char() {
        let mut buf = buffer_at("a→b", 0, 4);
        assert!(buf.delete_back());
        assert_eq!(buf.text(), "ab");
        assert_eq!(buf.cursor().col, 1);
    }

    #[test]
    fn test_delete_forward_joins_next_line() {
        let mut buf = buffer_at("A\r\nB", 0, 1);
        assert!(buf.delete_forward());
        assert_eq!(buf.text(), "AB");
    }

    #[test]
    fn test_replace_all_resets_cursor() {
        let mut buf = buffer_at("graph TD\nA-->B", 1, 3);
        buf.replace_all("pie\n\"A\" : 1");
        assert_eq!(buf.text(), "pie\n\"A\" : 1");
        assert_eq!(buf.cursor(), Cursor::default());
    }

    // --- Movement ---

    #[test]
    fn test_vertical_movement_remembers_column() {
        let mut buf = buffer_at("long line\nab\nanother line", 0, 7);
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor().col, 2);
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor().col, 7);
    }

    #[test]
    fn test_move_lines_clamps_to_buffer() {
        let mut buf = SourceBuffer::from_text("1\n2\n3");
        buf.move_lines(10);
        assert_eq!(buf.cursor().line, 2);
        buf.move_lines(-10);
        assert_eq!(buf.cursor().line, 0);
    }

    #[test]
    fn test_left_right_wrap_across_lines() {
        let mut buf = buffer_at("ab\ncd", 1, 0);
        buf.move_cursor(Direction::Left);
        assert_eq!(buf.cursor(), Cursor::at(0, 2));
        buf.move_cursor(Direction::Right);
        assert_eq!(buf.cursor(), Cursor::at(1, 0));
    }

    #[test]
    fn test_word_movement() {
        let mut buf = buffer_at("A-->B_node text", 0, 0);
        buf.move_word_right();
        assert_eq!(buf.cursor().col, 4);
        buf.move_word_right();
        assert_eq!(buf.cursor().col, 11);
        buf.move_word_left();
        assert_eq!(buf.cursor().col, 4);
        buf.move_word_left();
        assert_eq!(buf.cursor().col, 0);
    }

    #[test]
    fn test_move_to_clamps_inside_multibyte_char() {
        let mut buf = SourceBuffer::from_text("a→b");
        buf.move_to(5, 2);
        assert_eq!(buf.cursor(), Cursor::at(0, 1));
    }

    #[test]
    fn test_start_and_end_of_buffer() {
        let mut buf = SourceBuffer::from_text("ab\ncde");
        buf.move_to_end();
        assert_eq!(buf.cursor(), Cursor::at(1, 3));
        buf.move_to_start();
        assert_eq!(buf.cursor(), Cursor::at(0, 0));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Type(char),
            Enter,
            Back,
            Del,
            Move(u8),
            Word(bool),
            Paste(String),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                prop::sample::select(vec!['a', ' ', '\u{e9}', '\u{4e2d}', '-', '>'])
                    .prop_map(Op::Type),
                Just(Op::Enter),
                Just(Op::Back),
                Just(Op::Del),
                (0u8..4).prop_map(Op::Move),
                any::<bool>().prop_map(Op::Word),
                "[a\\r\\n\u{0B}\u{0C}\u{85}\u{2028}\u{2029} -]{0,12}".prop_map(Op::Paste),
            ]
        }

        proptest! {
            #[test]
            fn cursor_stays_on_a_char_boundary(ops in prop::collection::vec(op(), 0..80)) {
                let mut buf = SourceBuffer::from_text("graph TD\n  A --> B");
                for op in ops {
                    match op {
                        Op::Type(ch) => buf.insert_char(ch),
                        Op::Enter => buf.split_line(),
                        Op::Back => {
                            buf.delete_back();
                        }
                        Op::Del => {
                            buf.delete_forward();
                        }
                        Op::Move(d) => buf.move_cursor(match d {
                            0 => Direction::Left,
                            1 => Direction::Right,
                            2 => Direction::Up,
                            _ => Direction::Down,
                        }),
                        Op::Word(true) => buf.move_word_left(),
                        Op::Word(false) => buf.move_word_right(),
                        Op::Paste(text) => buf.insert_str(&text),
                    }
                    let cursor = buf.cursor();
                    prop_assert!(cursor.line < buf.line_count());
                    let line = buf.line_at(cursor.line).unwrap_or_default();
                    prop_assert!(cursor.col <= line.len());
                    prop_assert!(line.is_char_boundary(cursor.col));
                }
            }
        }
    }
}
