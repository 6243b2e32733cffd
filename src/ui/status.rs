//! Status bar component

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::controller::SchemaError;

/// Outcome of the last check of the buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    /// Edited since the last validation
    Unchecked,
    Valid,
    Invalid(String),
}

impl SchemaStatus {
    /// Status from the controller's current error and whether the buffer
    /// passed validation since its last change
    pub fn from_state(error: Option<&SchemaError>, validated: bool) -> Self {
        match error {
            Some(e) => SchemaStatus::Invalid(e.to_string()),
            None if validated => SchemaStatus::Valid,
            None => SchemaStatus::Unchecked,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            SchemaStatus::Unchecked => "○",
            SchemaStatus::Valid => "●",
            SchemaStatus::Invalid(_) => "✗",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            SchemaStatus::Unchecked => Color::Gray,
            SchemaStatus::Valid => Color::Green,
            SchemaStatus::Invalid(_) => Color::Red,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            SchemaStatus::Unchecked => "Not validated",
            SchemaStatus::Valid => "Valid",
            SchemaStatus::Invalid(_) => "Invalid",
        }
    }
}

const KEY_HINTS: &str = "Tab pane  ^V validate  ^D remove  ^Q quit";

/// Status bar widget
pub struct StatusBar<'a> {
    app_name: &'a str,
    version: &'a str,
    pane: &'a str,
    properties: usize,
    status: &'a SchemaStatus,
    show_help: bool,
}

impl<'a> StatusBar<'a> {
    pub fn new(app_name: &'a str, version: &'a str, pane: &'a str, status: &'a SchemaStatus) -> Self {
        Self {
            app_name,
            version,
            pane,
            properties: 0,
            status,
            show_help: true,
        }
    }

    /// Number of top-level properties
    pub fn properties(mut self, count: usize) -> Self {
        self.properties = count;
        self
    }

    pub fn show_help(mut self, show: bool) -> Self {
        self.show_help = show;
        self
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().bg(Color::DarkGray).fg(Color::White);
        buf.set_style(area, style);

        let mut spans = vec![
            Span::styled(
                format!(" {} v{} ", self.app_name, self.version),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("│ "),
            Span::styled(format!("{} ", self.pane), Style::default().fg(Color::White)),
            Span::raw("│ "),
            Span::styled(
                format!("Properties: {} ", self.properties),
                Style::default().fg(Color::White),
            ),
            Span::raw("│ "),
            Span::styled(
                format!("{} ", self.status.symbol()),
                Style::default().fg(self.status.color()),
            ),
            Span::styled(self.status.text(), Style::default().fg(self.status.color())),
        ];

        if self.show_help {
            spans.push(Span::raw(" │ "));
            spans.push(Span::styled(KEY_HINTS, Style::default().fg(Color::Gray)));
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
