//! Editable text with a byte-offset cursor
//!
//! Used for the single-line form fields and for the multi-line JSON preview.
//! The cursor always sits on a char boundary; up/down keep the column in
//! chars, clamped to the target line.

use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    content: String,
    cursor: usize,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer holding `content` with the cursor at the end
    pub fn with_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            cursor: content.len(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the content, keeping the cursor where it was if possible
    pub fn set_content(&mut self, content: &str) {
        self.content = content.to_string();
        self.cursor = self.cursor.min(self.content.len());
        while !self.content.is_char_boundary(self.cursor) {
            self.cursor -= 1;
        }
    }

    /// Insert a character at the cursor position
    pub fn insert_char(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    /// Delete the character before the cursor
    pub fn delete_char(&mut self) -> bool {
        let Some(prev) = self.prev_boundary() else {
            return false;
        };
        self.content.drain(prev..self.cursor);
        self.cursor = prev;
        true
    }

    /// Delete the character under the cursor
    pub fn delete_char_forward(&mut self) -> bool {
        let Some(next) = self.next_boundary() else {
            return false;
        };
        self.content.drain(self.cursor..next);
        true
    }

    pub fn move_cursor_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.cursor = next;
        }
    }

    /// Move to the start of the current line
    pub fn move_cursor_start(&mut self) {
        self.cursor = self.line_start(self.cursor);
    }

    /// Move to the end of the current line
    pub fn move_cursor_end(&mut self) {
        self.cursor = self.line_end(self.cursor);
    }

    /// Move to the same column on the previous line
    pub fn move_cursor_up(&mut self) -> bool {
        let start = self.line_start(self.cursor);
        if start == 0 {
            return false;
        }
        let column = self.content[start..self.cursor].chars().count();
        let prev_start = self.line_start(start - 1);
        self.cursor = self.offset_in_line(prev_start, column);
        true
    }

    /// Move to the same column on the next line
    pub fn move_cursor_down(&mut self) -> bool {
        let end = self.line_end(self.cursor);
        if end == self.content.len() {
            return false;
        }
        let column = self.content[self.line_start(self.cursor)..self.cursor]
            .chars()
            .count();
        self.cursor = self.offset_in_line(end + 1, column);
        true
    }

    /// Cursor position as (line, column in chars)
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let before = &self.content[..self.cursor];
        let line = before.matches('\n').count();
        let column = before[self.line_start(self.cursor)..].chars().count();
        (line, column)
    }

    /// Number of lines, counting a trailing empty line
    pub fn line_count(&self) -> usize {
        self.content.matches('\n').count() + 1
    }

    /// Render one line of the content with the cursor cell highlighted
    pub fn styled_line(text: &str, cursor_col: Option<usize>, style: Style) -> Line<'static> {
        let Some(col) = cursor_col else {
            return Line::from(Span::styled(text.to_string(), style));
        };
        let split = text
            .char_indices()
            .nth(col)
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        let (before, rest) = text.split_at(split);
        let mut chars = rest.chars();
        let under = chars.next().map(String::from).unwrap_or_else(|| " ".to_string());
        let after: String = chars.collect();

        Line::from(vec![
            Span::styled(before.to_string(), style),
            Span::styled(under, Style::default().bg(Color::White).fg(Color::Black)),
            Span::styled(after, style),
        ])
    }

    fn prev_boundary(&self) -> Option<usize> {
        if self.cursor == 0 {
            return None;
        }
        let mut pos = self.cursor - 1;
        while !self.content.is_char_boundary(pos) && pos > 0 {
            pos -= 1;
        }
        Some(pos)
    }

    fn next_boundary(&self) -> Option<usize> {
        if self.cursor >= self.content.len() {
            return None;
        }
        let mut pos = self.cursor + 1;
        while !self.content.is_char_boundary(pos) && pos < self.content.len() {
            pos += 1;
        }
        Some(pos)
    }

    fn line_start(&self, offset: usize) -> usize {
        self.content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    fn line_end(&self, offset: usize) -> usize {
        self.content[offset..]
            .find('\n')
            .map(|i| offset + i)
            .unwrap_or(self.content.len())
    }

    /// Byte offset of `column` chars into the line starting at `start`
    fn offset_in_line(&self, start: usize, column: usize) -> usize {
        let end = self.line_end(start);
        self.content[start..end]
            .char_indices()
            .nth(column)
            .map(|(i, _)| start + i)
            .unwrap_or(end)
    }
}
