use crate::tui::{Action, Component, Focusable, Theme};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    text::Line,
    widgets::{Block, Borders},
    Frame,
};
use tui_textarea::{Input, TextArea};

/// Single-line input for the data source URL
pub struct UrlInput {
    textarea: TextArea<'static>,
    error: Option<String>,
    focused: bool,
    supported_actions: Vec<Action>,
}

impl UrlInput {
    pub fn new(initial: &str) -> Self {
        let mut textarea = TextArea::default();
        textarea.set_placeholder_text("https://example.com/records.json");
        textarea.insert_str(initial);
        Self {
            textarea,
            error: None,
            focused: false,
            supported_actions: vec![Action::Confirm, Action::Cancel, Action::NextFocus],
        }
    }

    /// Current text, trimmed
    pub fn value(&self) -> String {
        self.textarea.lines().join("").trim().to_string()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    /// Whether a key should be typed into the field rather than resolved
    /// through the keybindings
    pub fn accepts(key: &KeyEvent) -> bool {
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return false;
        }
        matches!(
            key.code,
            KeyCode::Char(_)
                | KeyCode::Backspace
                | KeyCode::Delete
                | KeyCode::Left
                | KeyCode::Right
                | KeyCode::Home
                | KeyCode::End
        )
    }

    /// Feed a key to the text area; returns true when the text changed
    pub fn input(&mut self, key: KeyEvent) -> bool {
        let before = self.value();
        self.textarea.input(Input::from(key));
        self.value() != before
    }
}

impl Component for UrlInput {
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::Cancel if self.error.is_some() => {
                self.error = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .title(" Source URL ")
            .border_style(theme.pane_border(self.focused));
        if let Some(error) = &self.error {
            block = block.title_bottom(Line::styled(format!(" {error} "), theme.error_style()));
        }
        self.textarea.set_block(block);
        self.textarea.set_style(theme.normal_style());
        self.textarea.set_cursor_line_style(theme.normal_style());
        if self.focused {
            self.textarea.set_cursor_style(theme.selected_style());
        } else {
            self.textarea.set_cursor_style(theme.normal_style());
        }
        frame.render_widget(&self.textarea, area);
    }

    fn supported_actions(&self) -> &[Action] {
        &self.supported_actions
    }

    fn name(&self) -> &str {
        "UrlInput"
    }
}

impl Focusable for UrlInput {
    fn is_focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}
