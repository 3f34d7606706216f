//! Text buffer implementation using ropey.

use ropey::Rope;

/// A text buffer backed by a rope data structure.
/// All offsets are character indices.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
}

impl TextBuffer {
    /// Creates a new empty text buffer.
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Creates a text buffer from a string.
    pub fn from_str(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Returns the total number of characters in the buffer.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns the total number of lines in the buffer.
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Inserts a string at the given character index.
    pub fn insert(&mut self, char_idx: usize, text: &str) {
        let idx = char_idx.min(self.len_chars());
        self.rope.insert(idx, text);
    }

    /// Removes text in the given character range.
    pub fn remove(&mut self, start: usize, end: usize) {
        let start = start.min(self.len_chars());
        let end = end.min(self.len_chars());
        if start < end {
            self.rope.remove(start..end);
        }
    }

    /// Returns the character at the given index, if it exists.
    pub fn char_at(&self, char_idx: usize) -> Option<char> {
        if char_idx < self.len_chars() {
            Some(self.rope.char(char_idx))
        } else {
            None
        }
    }

    /// Returns the text in the given character range.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let start = start.min(self.len_chars());
        let end = end.min(self.len_chars()).max(start);
        self.rope.slice(start..end).to_string()
    }

    /// Converts a character index to a (line, column) position.
    /// Both line and column are 0-indexed.
    pub fn char_to_line_col(&self, char_idx: usize) -> (usize, usize) {
        let char_idx = char_idx.min(self.len_chars());
        let line = self.rope.char_to_line(char_idx);
        let line_start = self.rope.line_to_char(line);
        let col = char_idx - line_start;
        (line, col)
    }

    /// Converts a (line, column) position to a character index.
    /// Both line and column are 0-indexed; the column clamps to the line.
    pub fn line_col_to_char(&self, line: usize, col: usize) -> usize {
        if line >= self.len_lines() {
            return self.len_chars();
        }
        let line_start = self.rope.line_to_char(line);
        line_start + col.min(self.line_len_chars(line))
    }

    /// Returns the length of a line in characters (excluding newline).
    pub fn line_len_chars(&self, line: usize) -> usize {
        if line >= self.len_lines() {
            return 0;
        }
        let line_slice = self.rope.line(line);
        let len = line_slice.len_chars();
        // Subtract newline character if present
        if len > 0 && line_slice.char(len - 1) == '\n' {
            return len - 1;
        }
        len
    }

    /// Returns the character index of the start of a line.
    pub fn line_start(&self, line: usize) -> usize {
        if line >= self.len_lines() {
            self.len_chars()
        } else {
            self.rope.line_to_char(line)
        }
    }

    /// Returns the character index of the end of a line (before newline).
    pub fn line_end(&self, line: usize) -> usize {
        if line >= self.len_lines() {
            self.len_chars()
        } else {
            self.rope.line_to_char(line) + self.line_len_chars(line)
        }
    }

    /// Returns the line at the given index as a string, without its newline.
    pub fn line(&self, line: usize) -> Option<String> {
        if line >= self.len_lines() {
            None
        } else {
            let mut s = self.rope.line(line).to_string();
            if s.ends_with('\n') {
                s.pop();
            }
            Some(s)
        }
    }
}

impl std::fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.rope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer() {
        let buf = TextBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len_chars(), 0);
        assert_eq!(buf.len_lines(), 1); // Empty buffer has 1 line
    }

    #[test]
    fn test_insert_and_remove() {
        let mut buf = TextBuffer::from_str("hello world");
        buf.remove(5, 11);
        assert_eq!(buf.to_string(), "hello");
        buf.insert(5, ", there");
        assert_eq!(buf.to_string(), "hello, there");
    }

    #[test]
    fn test_slice() {
        let buf = TextBuffer::from_str("hello world");
        assert_eq!(buf.slice(6, 11), "world");
        assert_eq!(buf.slice(6, 100), "world");
        assert_eq!(buf.slice(8, 3), "");
    }

    #[test]
    fn test_line_operations() {
        let buf = TextBuffer::from_str("line1\nline2\nline3");
        assert_eq!(buf.len_lines(), 3);
        assert_eq!(buf.line(0), Some("line1".to_string()));
        assert_eq!(buf.line(2), Some("line3".to_string()));
        assert_eq!(buf.line(3), None);
        assert_eq!(buf.line_start(1), 6);
        assert_eq!(buf.line_end(1), 11);
    }

    #[test]
    fn test_char_to_line_col() {
        let buf = TextBuffer::from_str("abc\ndefgh");
        assert_eq!(buf.char_to_line_col(0), (0, 0));
        assert_eq!(buf.char_to_line_col(3), (0, 3)); // newline char
        assert_eq!(buf.char_to_line_col(4), (1, 0));
        assert_eq!(buf.char_to_line_col(6), (1, 2));
    }

    #[test]
    fn test_line_col_to_char() {
        let buf = TextBuffer::from_str("abc\ndefgh");
        assert_eq!(buf.line_col_to_char(0, 0), 0);
        assert_eq!(buf.line_col_to_char(1, 2), 6);
        // Column past the line clamps to the line end.
        assert_eq!(buf.line_col_to_char(0, 10), 3);
        // Line past the buffer clamps to the buffer end.
        assert_eq!(buf.line_col_to_char(5, 0), 9);
    }

    #[test]
    fn test_line_len_chars() {
        let buf = TextBuffer::from_str("abc\ndefgh\n");
        assert_eq!(buf.line_len_chars(0), 3);
        assert_eq!(buf.line_len_chars(1), 5);
        assert_eq!(buf.line_len_chars(2), 0);
    }
}
