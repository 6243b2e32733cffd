use crate::config::{Config, UiConfig};
use crate::controller::{SchemaController, SchemaError, VALID_MESSAGE};
use crate::ui::{Form, MessageDialog, Preview, SchemaStatus, StatusBar};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    terminal::{
        disable_raw_mode, enable_raw_mode, BeginSynchronizedUpdate, EndSynchronizedUpdate,
        EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::io::{self, Stdout, Write};

const APP_NAME: &str = "fnschema";
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const PAGE_LINES: usize = 10;

/// The two side-by-side views of the descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Builder,
    Preview,
}

impl Pane {
    fn label(&self) -> &'static str {
        match self {
            Pane::Builder => "Builder",
            Pane::Preview => "Preview",
        }
    }
}

/// Input modes determine which keybindings are active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Builder,
    Preview,
    /// The validation dialog is open
    Acknowledge,
}

/// Actions that can be triggered by key events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    InsertChar(char),
    InsertNewline,
    DeleteBack,
    DeleteForward,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Activate,
    SwitchPane,
    Remove,
    Validate,
    Dismiss,
    Quit,
}

/// Map a key event to an action based on the current input mode
pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    // Global shortcuts (work in all modes)
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => return Some(Action::Quit),
            _ => {}
        }
    }

    match mode {
        InputMode::Acknowledge => Some(Action::Dismiss),
        InputMode::Builder => map_key_builder(key),
        InputMode::Preview => map_key_preview(key),
    }
}

/// Keys shared by both panes
fn map_key_common(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('v') => Some(Action::Validate),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Tab | KeyCode::BackTab => Some(Action::SwitchPane),
        KeyCode::Char(c) => Some(Action::InsertChar(c)),
        KeyCode::Backspace => Some(Action::DeleteBack),
        KeyCode::Delete => Some(Action::DeleteForward),
        KeyCode::Left => Some(Action::Left),
        KeyCode::Right => Some(Action::Right),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Home => Some(Action::Home),
        KeyCode::End => Some(Action::End),
        _ => None,
    }
}

fn map_key_builder(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::Remove)
        }
        KeyCode::Enter => Some(Action::Activate),
        _ => map_key_common(key),
    }
}

fn map_key_preview(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Enter => Some(Action::InsertNewline),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::PageDown => Some(Action::PageDown),
        _ => map_key_common(key),
    }
}

/// Everything the editor shows, independent of the terminal
pub struct EditorState {
    controller: SchemaController,
    form: Form,
    preview: Preview,
    pane: Pane,
    /// Validation dialog open
    acknowledging: bool,
    /// The buffer passed validation and has not changed since
    validated: bool,
    should_quit: bool,
}

impl EditorState {
    pub fn new(controller: SchemaController) -> Self {
        let preview = Preview::new(&controller);
        Self {
            controller,
            form: Form::new(),
            preview,
            pane: Pane::Builder,
            acknowledging: false,
            validated: false,
            should_quit: false,
        }
    }

    pub fn controller(&self) -> &SchemaController {
        &self.controller
    }

    pub fn pane(&self) -> Pane {
        self.pane
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn mode(&self) -> InputMode {
        match (self.acknowledging, self.pane) {
            (true, _) => InputMode::Acknowledge,
            (false, Pane::Builder) => InputMode::Builder,
            (false, Pane::Preview) => InputMode::Preview,
        }
    }

    pub fn status(&self) -> SchemaStatus {
        SchemaStatus::from_state(self.controller.error(), self.validated)
    }

    /// Handle an action
    pub fn handle_action(&mut self, action: Action) {
        let before = self.controller.buffer().to_string();
        let ctl = &mut self.controller;

        match (self.pane, action) {
            (_, Action::Quit) => self.should_quit = true,
            (_, Action::Dismiss) => self.acknowledging = false,
            (_, Action::SwitchPane) => {
                self.form.blur(ctl);
                self.pane = match self.pane {
                    Pane::Builder => Pane::Preview,
                    Pane::Preview => Pane::Builder,
                };
            }
            (_, Action::Validate) => {
                self.form.blur(ctl);
                match ctl.validate() {
                    Ok(()) => {
                        self.validated = true;
                        self.acknowledging = true;
                    }
                    Err(_) => self.validated = false,
                }
            }

            (Pane::Builder, Action::InsertChar(c)) => self.form.insert_char(ctl, c),
            (Pane::Builder, Action::DeleteBack) => self.form.delete_char(ctl),
            (Pane::Builder, Action::DeleteForward) => self.form.delete_char_forward(ctl),
            (Pane::Builder, Action::Left) => self.form.left(ctl),
            (Pane::Builder, Action::Right) => self.form.right(ctl),
            (Pane::Builder, Action::Up) => self.form.focus_prev(ctl),
            (Pane::Builder, Action::Down) => self.form.focus_next(ctl),
            (Pane::Builder, Action::Home) => self.form.home(ctl),
            (Pane::Builder, Action::End) => self.form.end(ctl),
            (Pane::Builder, Action::Activate) => self.form.activate(ctl),
            (Pane::Builder, Action::Remove) => self.form.remove_focused(ctl),

            (Pane::Preview, Action::InsertChar(c)) => self.preview.insert_char(ctl, c),
            (Pane::Preview, Action::InsertNewline) => self.preview.insert_newline(ctl),
            (Pane::Preview, Action::DeleteBack) => self.preview.delete_char(ctl),
            (Pane::Preview, Action::DeleteForward) => self.preview.delete_char_forward(ctl),
            (Pane::Preview, Action::Left) => self.preview.move_cursor_left(),
            (Pane::Preview, Action::Right) => self.preview.move_cursor_right(),
            (Pane::Preview, Action::Up) => self.preview.move_cursor_up(),
            (Pane::Preview, Action::Down) => self.preview.move_cursor_down(),
            (Pane::Preview, Action::Home) => self.preview.move_cursor_start(),
            (Pane::Preview, Action::End) => self.preview.move_cursor_end(),
            (Pane::Preview, Action::PageUp) => self.preview.page_up(PAGE_LINES),
            (Pane::Preview, Action::PageDown) => self.preview.page_down(PAGE_LINES),

            (pane, action) => tracing::trace!("{:?} ignored in {:?}", action, pane),
        }

        if self.controller.buffer() != before {
            self.validated = false;
            self.preview.sync(&self.controller);
            self.form.clamp(&self.controller);
        }
    }

    /// Draw the whole screen into `frame`
    pub fn render(&mut self, frame: &mut Frame, ui: &UiConfig) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Panes
                Constraint::Length(1), // Error line
                Constraint::Length(1), // Status bar
            ])
            .split(frame.area());

        let percent = ui.builder_percent();
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(percent),
                Constraint::Percentage(100 - percent),
            ])
            .split(chunks[0]);

        let visible = usize::from(chunks[0].height.saturating_sub(2));
        self.form.ensure_visible(visible);
        self.preview.ensure_visible(visible);

        let ctl = &self.controller;
        let stale = ctl.error().is_some_and(SchemaError::is_stale);
        frame.render_widget(self.form.widget(ctl, self.pane == Pane::Builder), panes[0]);
        frame.render_widget(
            self.preview.widget(self.pane == Pane::Preview, stale),
            panes[1],
        );

        if let Some(err) = ctl.error() {
            let alert = Paragraph::new(err.to_string()).style(Style::default().fg(Color::Red));
            frame.render_widget(alert, chunks[1]);
        }

        let status = self.status();
        let properties = ctl.descriptor().root_tree().properties.len();
        frame.render_widget(
            StatusBar::new(APP_NAME, APP_VERSION, self.pane.label(), &status)
                .properties(properties)
                .show_help(ui.show_help),
            chunks[2],
        );

        if self.acknowledging {
            frame.render_widget(MessageDialog::new(VALID_MESSAGE), frame.area());
        }
    }
}

/// Application state
pub struct App {
    config: Config,
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: EditorState,
}

impl App {
    /// Create a new application
    pub fn new(config: Config, controller: SchemaController) -> Result<Self> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            crossterm::terminal::SetTitle(format!("{} v{}", APP_NAME, APP_VERSION)),
            crossterm::event::PushKeyboardEnhancementFlags(
                crossterm::event::KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | crossterm::event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .context("Failed to setup terminal")?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("Failed to create terminal")?;

        Ok(Self {
            config,
            terminal,
            state: EditorState::new(controller),
        })
    }

    /// Run the event loop until the user quits; returns the final buffer
    pub fn run(&mut self) -> Result<String> {
        tracing::info!("Editor started");
        self.draw()?;

        while !self.state.should_quit() {
            match event::read().context("Failed to read terminal event")? {
                Event::Key(key) => {
                    if let Some(action) = map_key(self.state.mode(), key) {
                        self.state.handle_action(action);
                        self.draw()?;
                    }
                }
                Event::Resize(..) => self.draw()?,
                _ => {}
            }
        }

        tracing::info!("Editor closed");
        Ok(self.state.controller().buffer().to_string())
    }

    /// Draw the UI with synchronized updates to prevent tearing
    fn draw(&mut self) -> Result<()> {
        queue!(self.terminal.backend_mut(), BeginSynchronizedUpdate)?;

        let ui = &self.config.ui;
        let state = &mut self.state;
        self.terminal.draw(|frame| state.render(frame, ui))?;

        queue!(self.terminal.backend_mut(), EndSynchronizedUpdate)?;
        self.terminal.backend_mut().flush()?;

        Ok(())
    }

    /// Cleanup terminal
    fn cleanup(&mut self) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::event::PopKeyboardEnhancementFlags
        )
        .context("Failed to cleanup terminal")?;
        self.terminal
            .show_cursor()
            .context("Failed to show cursor")?;

        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ValidationError, PARSE_ERROR_MESSAGE};
    use crate::schema::PropertyNaming;
    use crossterm::event::KeyEventState;
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn state() -> EditorState {
        EditorState::new(SchemaController::new(PropertyNaming::LiveCount))
    }

    fn type_text(state: &mut EditorState, text: &str) {
        for c in text.chars() {
            state.handle_action(Action::InsertChar(c));
        }
    }

    fn render(state: &mut EditorState, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| state.render(frame, &UiConfig::default()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let mut rendered = String::new();
        for y in 0..height {
            for x in 0..width {
                rendered.push_str(buffer.cell((x, y)).unwrap().symbol());
            }
            rendered.push('\n');
        }
        rendered
    }

    #[test]
    fn test_global_keys() {
        for mode in [InputMode::Builder, InputMode::Preview, InputMode::Acknowledge] {
            assert_eq!(map_key(mode, ctrl('c')), Some(Action::Quit));
            assert_eq!(map_key(mode, ctrl('q')), Some(Action::Quit));
        }
        assert_eq!(map_key(InputMode::Builder, ctrl('v')), Some(Action::Validate));
        assert_eq!(map_key(InputMode::Preview, ctrl('v')), Some(Action::Validate));
        assert_eq!(map_key(InputMode::Builder, key(KeyCode::Tab)), Some(Action::SwitchPane));
        assert_eq!(map_key(InputMode::Preview, key(KeyCode::BackTab)), Some(Action::SwitchPane));
    }

    #[test]
    fn test_mode_specific_keys() {
        assert_eq!(map_key(InputMode::Builder, key(KeyCode::Enter)), Some(Action::Activate));
        assert_eq!(map_key(InputMode::Preview, key(KeyCode::Enter)), Some(Action::InsertNewline));
        assert_eq!(map_key(InputMode::Builder, ctrl('d')), Some(Action::Remove));
        assert_eq!(map_key(InputMode::Preview, ctrl('d')), None);
        assert_eq!(map_key(InputMode::Preview, key(KeyCode::PageDown)), Some(Action::PageDown));
        assert_eq!(map_key(InputMode::Builder, key(KeyCode::PageDown)), None);
        assert_eq!(
            map_key(InputMode::Builder, key(KeyCode::Char('x'))),
            Some(Action::InsertChar('x'))
        );
        assert_eq!(map_key(InputMode::Acknowledge, key(KeyCode::Char('x'))), Some(Action::Dismiss));
        assert_eq!(map_key(InputMode::Acknowledge, key(KeyCode::Esc)), Some(Action::Dismiss));
    }

    #[test]
    fn test_key_release_is_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('x'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(map_key(InputMode::Builder, release), None);
    }

    #[test]
    fn test_validate_flow() {
        let mut state = state();
        state.handle_action(Action::Validate);
        assert_eq!(
            state.controller().error(),
            Some(&SchemaError::Validation(ValidationError::MissingFields))
        );
        assert_eq!(state.mode(), InputMode::Builder);

        type_text(&mut state, "get_weather");
        state.handle_action(Action::Down);
        type_text(&mut state, "Look up weather");
        state.handle_action(Action::Validate);

        assert_eq!(state.controller().error(), None);
        assert_eq!(state.mode(), InputMode::Acknowledge);
        assert_eq!(state.status(), SchemaStatus::Valid);

        state.handle_action(Action::Dismiss);
        assert_eq!(state.mode(), InputMode::Builder);
        assert_eq!(state.status(), SchemaStatus::Valid);

        type_text(&mut state, "!");
        assert_eq!(state.status(), SchemaStatus::Unchecked);
    }

    #[test]
    fn test_raw_edit_in_preview() {
        let mut state = state();
        state.handle_action(Action::SwitchPane);
        assert_eq!(state.pane(), Pane::Preview);

        state.handle_action(Action::InsertChar(','));
        assert!(matches!(state.controller().error(), Some(SchemaError::Parse { .. })));
        assert!(state.controller().buffer().ends_with("},"));

        state.handle_action(Action::DeleteBack);
        assert_eq!(state.controller().error(), None);
    }

    #[test]
    fn test_builder_edit_keeps_pasted_integer_property() {
        let mut ctl = SchemaController::new(PropertyNaming::LiveCount);
        ctl.edit_raw_text(
            r#"{"name": "get_weather", "description": "d", "parameters": {"type": "object",
                "properties": {"days": {"type": "integer"}}, "required": ["days"]}}"#,
        );
        let mut state = EditorState::new(ctl);
        assert_eq!(state.controller().error(), None);

        state.handle_action(Action::End);
        type_text(&mut state, "_v2");
        let content = state.preview.content();
        assert!(content.contains("\"name\": \"get_weather_v2\""), "{}", content);
        assert!(content.contains("\"days\": {\n        \"type\": \"integer\"\n      }"), "{}", content);
        assert!(render(&mut state, 100, 20).contains("Properties: 1"));
    }

    #[test]
    fn test_builder_edits_reach_preview() {
        let mut state = state();
        type_text(&mut state, "lookup");
        state.handle_action(Action::SwitchPane);
        assert!(state.preview.content().contains("\"name\": \"lookup\""));
        assert_eq!(state.preview.content(), state.controller().buffer());
    }

    #[test]
    fn test_quit() {
        let mut state = state();
        assert!(!state.should_quit());
        state.handle_action(Action::Quit);
        assert!(state.should_quit());
    }

    #[test]
    fn test_render_layout() {
        let mut state = state();
        let screen = render(&mut state, 100, 20);
        assert!(screen.contains("Builder"), "{}", screen);
        assert!(screen.contains("Preview"), "{}", screen);
        assert!(screen.contains("Properties: 0"), "{}", screen);
        assert!(!screen.contains(PARSE_ERROR_MESSAGE), "{}", screen);
    }

    #[test]
    fn test_render_parse_error_and_dialog() {
        let mut state = state();
        state.handle_action(Action::SwitchPane);
        state.handle_action(Action::InsertChar(','));
        let screen = render(&mut state, 100, 20);
        assert!(screen.contains(PARSE_ERROR_MESSAGE), "{}", screen);

        state.handle_action(Action::DeleteBack);
        state.handle_action(Action::SwitchPane);
        type_text(&mut state, "f");
        state.handle_action(Action::Down);
        type_text(&mut state, "d");
        state.handle_action(Action::Validate);
        let screen = render(&mut state, 100, 20);
        assert!(screen.contains(VALID_MESSAGE), "{}", screen);
        assert!(screen.contains("Press any key to continue"), "{}", screen);
    }
}
