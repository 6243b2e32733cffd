//! Acknowledgment dialog shown after a successful validation

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

/// Modal message dismissed by any key
pub struct MessageDialog<'a> {
    message: &'a str,
}

impl<'a> MessageDialog<'a> {
    pub fn new(message: &'a str) -> Self {
        Self { message }
    }

    /// Rect of `width` x `height` cells centered in `r`, shrunk to fit
    fn centered_rect(width: u16, height: u16, r: Rect) -> Rect {
        let width = width.min(r.width);
        let height = height.min(r.height);
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length((r.height - height) / 2),
                Constraint::Length(height),
                Constraint::Min(0),
            ])
            .split(r);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length((r.width - width) / 2),
                Constraint::Length(width),
                Constraint::Min(0),
            ])
            .split(vertical[1])[1]
    }
}

impl Widget for MessageDialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let dialog_area = Self::centered_rect(40, 6, area);
        Clear.render(dialog_area, buf);

        let block = Block::default()
            .title(" Validation ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .style(Style::default().bg(Color::Black));

        let lines = vec![
            Line::from(Span::styled(
                self.message,
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from(Span::styled(
                "Press any key to continue",
                Style::default().fg(Color::Gray),
            )),
        ];

        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .render(dialog_area, buf);
    }
}
