//! Preview pane: the raw JSON buffer, editable in place

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::controller::SchemaController;

use super::text::TextBuffer;

/// Raw JSON editor state
#[derive(Debug, Clone, Default)]
pub struct Preview {
    text: TextBuffer,
    scroll: usize,
}

impl Preview {
    pub fn new(ctl: &SchemaController) -> Self {
        Self {
            text: TextBuffer::with_content(ctl.buffer()),
            scroll: 0,
        }
    }

    pub fn content(&self) -> &str {
        self.text.content()
    }

    /// Pick up a buffer regenerated by a structured edit
    pub fn sync(&mut self, ctl: &SchemaController) {
        if self.text.content() != ctl.buffer() {
            self.text.set_content(ctl.buffer());
        }
    }

    pub fn insert_char(&mut self, ctl: &mut SchemaController, c: char) {
        self.text.insert_char(c);
        ctl.edit_raw_text(self.text.content());
    }

    pub fn insert_newline(&mut self, ctl: &mut SchemaController) {
        self.text.insert_newline();
        ctl.edit_raw_text(self.text.content());
    }

    pub fn delete_char(&mut self, ctl: &mut SchemaController) {
        if self.text.delete_char() {
            ctl.edit_raw_text(self.text.content());
        }
    }

    pub fn delete_char_forward(&mut self, ctl: &mut SchemaController) {
        if self.text.delete_char_forward() {
            ctl.edit_raw_text(self.text.content());
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.text.move_cursor_left();
    }

    pub fn move_cursor_right(&mut self) {
        self.text.move_cursor_right();
    }

    pub fn move_cursor_up(&mut self) {
        self.text.move_cursor_up();
    }

    pub fn move_cursor_down(&mut self) {
        self.text.move_cursor_down();
    }

    pub fn move_cursor_start(&mut self) {
        self.text.move_cursor_start();
    }

    pub fn move_cursor_end(&mut self) {
        self.text.move_cursor_end();
    }

    pub fn page_up(&mut self, lines: usize) {
        for _ in 0..lines {
            if !self.text.move_cursor_up() {
                break;
            }
        }
    }

    pub fn page_down(&mut self, lines: usize) {
        for _ in 0..lines {
            if !self.text.move_cursor_down() {
                break;
            }
        }
    }

    /// Adjust scroll so the cursor line is inside `height` lines
    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        let (line, _) = self.text.cursor_line_col();
        if line < self.scroll {
            self.scroll = line;
        } else if line >= self.scroll + height {
            self.scroll = line + 1 - height;
        }
        let max_scroll = self.text.line_count().saturating_sub(1);
        self.scroll = self.scroll.min(max_scroll);
    }

    pub fn widget(&self, focused: bool, stale: bool) -> PreviewWidget<'_> {
        PreviewWidget {
            state: self,
            focused,
            stale,
        }
    }
}

/// Preview pane widget
pub struct PreviewWidget<'a> {
    state: &'a Preview,
    focused: bool,
    /// The text could not be parsed; the builder shows older state
    stale: bool,
}

impl Widget for PreviewWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = match (self.stale, self.focused) {
            (true, _) => Color::Red,
            (false, true) => Color::Cyan,
            (false, false) => Color::DarkGray,
        };
        let block = Block::default()
            .title(" Preview ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));

        let (cursor_line, cursor_col) = self.state.text.cursor_line_col();
        let style = Style::default().fg(Color::White);
        let lines: Vec<Line> = self
            .state
            .text
            .content()
            .split('\n')
            .enumerate()
            .skip(self.state.scroll)
            .map(|(i, text)| {
                let cursor = (self.focused && i == cursor_line).then_some(cursor_col);
                TextBuffer::styled_line(text, cursor, style)
            })
            .collect();

        Paragraph::new(lines).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{DescriptorField, SchemaError};
    use crate::schema::PropertyNaming;
    use ratatui::{backend::TestBackend, Terminal};

    fn controller() -> SchemaController {
        SchemaController::new(PropertyNaming::LiveCount)
    }

    #[test]
    fn test_typing_keeps_buffer_verbatim() {
        let mut ctl = controller();
        let mut preview = Preview::new(&ctl);
        preview.move_cursor_end();
        preview.insert_char(&mut ctl, ',');

        assert_eq!(ctl.buffer(), preview.content());
        assert!(ctl.buffer().ends_with("},"));
        assert!(matches!(ctl.error(), Some(SchemaError::Parse { .. })));

        preview.delete_char(&mut ctl);
        assert_eq!(ctl.error(), None);
    }

    #[test]
    fn test_sync_follows_structured_edits() {
        let mut ctl = controller();
        let mut preview = Preview::new(&ctl);
        ctl.update_field(DescriptorField::Name, "lookup");
        assert_ne!(preview.content(), ctl.buffer());

        preview.sync(&ctl);
        assert_eq!(preview.content(), ctl.buffer());
    }

    #[test]
    fn test_ensure_visible_tracks_cursor() {
        let ctl = controller();
        let mut preview = Preview::new(&ctl);
        let lines = ctl.buffer().lines().count();

        preview.ensure_visible(3);
        assert_eq!(preview.scroll, lines - 3);

        preview.page_up(100);
        preview.ensure_visible(3);
        assert_eq!(preview.scroll, 0);
    }

    #[test]
    fn test_render_shows_json() {
        let ctl = controller();
        let preview = Preview::new(&ctl);

        let backend = TestBackend::new(40, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| frame.render_widget(preview.widget(false, false), frame.area()))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let mut rendered = String::new();
        for y in 0..12 {
            for x in 0..40 {
                rendered.push_str(buffer.cell((x, y)).unwrap().symbol());
            }
            rendered.push('\n');
        }
        assert!(rendered.contains("Preview"), "{}", rendered);
        assert!(rendered.contains("\"type\": \"object\""), "{}", rendered);
    }
}
